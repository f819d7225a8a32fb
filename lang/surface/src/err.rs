use crate::lexer::Tok;
use ariadne::{Config, IndexType, Label, Report, ReportKind};
use std::ops::Range;
use tagless_utils::span::{Cursor1, FileInfo, Location};
use thiserror::Error;

/// An error raised by the lexer or by a grammar action, positioned by byte offsets.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub begin: Cursor1,
    pub end: Cursor1,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, begin: Cursor1, end: Cursor1) -> Self {
        SyntaxError { message: message.into(), begin, end }
    }
}

/// A parse failure: what went wrong, and where.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{loc}: {message}{}", fmt_expected(.expected))]
pub struct ParseError {
    pub message: String,
    /// tokens the grammar would have accepted instead
    pub expected: Vec<String>,
    pub loc: Location,
}

pub type Result<T> = std::result::Result<T, ParseError>;

impl ParseError {
    pub fn new(
        error: lalrpop_util::ParseError<Cursor1, Tok<'_>, SyntaxError>, info: &FileInfo,
    ) -> Self {
        use lalrpop_util::ParseError::*;
        let (message, expected, loc) = match error {
            | User { error: SyntaxError { message, begin, end } } => {
                (message, Vec::new(), info.location(begin, end))
            }
            | InvalidToken { location } => {
                ("invalid token".to_string(), Vec::new(), info.location(location, location))
            }
            | UnrecognizedEof { location, expected } => {
                ("unexpected end of file".to_string(), expected, info.location(location, location))
            }
            | UnrecognizedToken { token: (start, token, end), expected } => {
                (format!("unrecognized token `{token}`"), expected, info.location(start, end))
            }
            | ExtraToken { token: (start, token, end) } => {
                (format!("extra token `{token}`"), Vec::new(), info.location(start, end))
            }
        };
        ParseError { message, expected, loc }
    }

    /// Create an Ariadne report for this parse error.
    pub fn to_report(&self) -> Report<'static, (String, Range<usize>)> {
        let (file_path, range) = self.loc.to_ariadne_span();
        let mut report = Report::build(ReportKind::Error, file_path.clone(), range.start)
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_message("Parse error")
            .with_label(Label::new((file_path, range)).with_message(&self.message));
        if !self.expected.is_empty() {
            report = report.with_note(fmt_expected(&self.expected).trim_start_matches("; "));
        }
        report.finish()
    }
}

fn fmt_expected(expected: &[String]) -> String {
    let mut res = String::new();
    if !expected.is_empty() {
        res += "; ";
        for (i, e) in expected.iter().enumerate() {
            let sep = match i {
                | 0 => "expected one of",
                | _ if i < expected.len() - 1 => ",",
                // last one
                | _ => " or",
            };
            res += &format!("{} {}", sep, e);
        }
    }
    res
}
