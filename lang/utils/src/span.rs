use std::{
    fmt::{Debug, Display},
    ops::Range,
    sync::Arc,
};

/// Byte offset into a source text, as produced by the lexer.
pub type Cursor1 = usize;

/// A line/column pair; both are 1-based.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Position { line, column } = self;
        write!(f, "{line}:{column}")
    }
}

/// Line table of one source file.
#[derive(Clone, Debug)]
pub struct FileInfo {
    /// byte offset of the first character of every line
    line_starts: Vec<Cursor1>,
    source: Arc<str>,
    file: Option<Arc<str>>,
}

impl FileInfo {
    pub fn new(s: &str, file: Option<Arc<str>>) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in s.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        FileInfo { line_starts, source: s.into(), file }
    }
    pub fn file(&self) -> Option<&Arc<str>> {
        self.file.as_ref()
    }
    /// Clamp a byte offset to the file and back onto a character boundary.
    fn clamp(&self, offset: Cursor1) -> Cursor1 {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
    /// Translate a byte offset into a line/column position; columns count characters.
    /// Offsets past the end of the file are clamped to the end.
    pub fn position(&self, offset: Cursor1) -> Position {
        let offset = self.clamp(offset);
        // the last line start that is `<= offset`
        let idx = {
            let mut l = 0;
            let mut r = self.line_starts.len();
            while l < r {
                let mid = l + (r - l) / 2;
                if self.line_starts[mid] <= offset {
                    l = mid + 1;
                } else {
                    r = mid;
                }
            }
            l - 1
        };
        let column = self.source[self.line_starts[idx]..offset].chars().count() + 1;
        Position { line: idx + 1, column }
    }
    pub fn location(&self, l: Cursor1, r: Cursor1) -> Location {
        Location {
            file: self.file.clone(),
            begin: self.position(l),
            end: self.position(r),
            span: self.clamp(l)..self.clamp(r),
        }
    }
}

/// A source span attached to every syntax node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Option<Arc<str>>,
    pub begin: Position,
    pub end: Position,
    /// byte offsets into the source
    pub span: Range<Cursor1>,
}

impl Location {
    /// The location of nodes that were not read from any source.
    pub fn dummy() -> Self {
        Location { file: None, begin: Position::default(), end: Position::default(), span: 0..0 }
    }
    pub fn is_dummy(&self) -> bool {
        self == &Location::dummy()
    }
    /// The file name, or a placeholder for anonymous sources.
    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or("<anonymous>")
    }
    /// Source id and byte range, as diagnostics label them.
    pub fn to_ariadne_span(&self) -> (String, Range<Cursor1>) {
        (self.file_name().to_string(), self.span.clone())
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::dummy()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dummy() {
            return write!(f, "<internal>");
        }
        if let Some(file) = &self.file {
            write!(f, "{file}:")?;
        }
        write!(f, "{}-{}", self.begin, self.end)
    }
}

impl Debug for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn positions_are_one_based() {
        let info = FileInfo::new("ab\ncd\n\nef", Some("t.stg".into()));
        assert_eq!(info.position(0), Position::new(1, 1));
        assert_eq!(info.position(1), Position::new(1, 2));
        assert_eq!(info.position(2), Position::new(1, 3));
        assert_eq!(info.position(3), Position::new(2, 1));
        assert_eq!(info.position(6), Position::new(3, 1));
        assert_eq!(info.position(7), Position::new(4, 1));
        assert_eq!(info.position(100), Position::new(4, 3));
    }

    #[test]
    fn location_display() {
        let info = FileInfo::new("f = g;\n", Some("t.stg".into()));
        assert_eq!(info.location(4, 5).to_string(), "t.stg:1:5-1:6");
        assert_eq!(Location::dummy().to_string(), "<internal>");
        let anon = FileInfo::new("x", None);
        assert_eq!(anon.location(0, 1).to_string(), "1:1-1:2");
    }

    #[test]
    fn columns_count_characters() {
        let info = FileInfo::new("é = λ;\nλé", Some("t.stg".into()));
        assert_eq!(info.position(2), Position::new(1, 2));
        assert_eq!(info.position(5), Position::new(1, 5));
        assert_eq!(info.position(6), Position::new(1, 5));
        let second = "é = λ;\n".len();
        assert_eq!(info.position(second + 2), Position::new(2, 2));
        let loc = info.location(second, second + 2);
        assert_eq!(loc.to_string(), "t.stg:2:1-2:2");
        assert_eq!(loc.span, second..second + 2);
        assert_eq!(loc.to_ariadne_span(), ("t.stg".to_string(), second..second + 2));
    }
}
