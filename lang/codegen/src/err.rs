use ariadne::{Config, IndexType, Label, Report, ReportKind};
use std::ops::Range;
use tagless_syntax::PrimOpcode;
use tagless_utils::span::Location;
use thiserror::Error;

/// Failures of the scoped symbol table, before a location is attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("popped a local frame with none open")]
    Underflow,
    #[error("bound a name with no local frame open")]
    NoFrame,
    #[error("name is already bound in this frame")]
    Duplicate,
    #[error("name is not bound")]
    Unbound,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("{loc}: `{name}` is bound more than once in the same scope")]
    DuplicateBinding { name: String, loc: Location },
    #[error("{loc}: unbound name `{name}`")]
    UnboundName { name: String, loc: Location },
    #[error("{loc}: `{op}` expects {expected} argument(s), found {found}")]
    ArityMismatch { op: PrimOpcode, expected: usize, found: usize, loc: Location },
    #[error("{loc}: local frame underflow")]
    FrameUnderflow { loc: Location },
    #[error("{loc}: more than one catch-all alternative")]
    MultipleDefaults { loc: Location },
    #[error("{loc}: a catch-all alternative must come last")]
    DefaultNotLast { loc: Location },
    #[error("{loc}: local binder `{name}` reuses the name of a top-level binding")]
    ShadowsGlobal { name: String, loc: Location },
    #[error("{loc}: `{op}` only takes integer operands")]
    UnsupportedOperand { op: PrimOpcode, loc: Location },
}

impl CompileError {
    /// Attach a name and location to a symbol table failure.
    pub fn scope(err: ScopeError, name: &str, loc: &Location) -> Self {
        let (name, loc) = (name.to_string(), loc.clone());
        match err {
            | ScopeError::Duplicate => CompileError::DuplicateBinding { name, loc },
            | ScopeError::Unbound => CompileError::UnboundName { name, loc },
            | ScopeError::Underflow | ScopeError::NoFrame => CompileError::FrameUnderflow { loc },
        }
    }

    pub fn loc(&self) -> &Location {
        match self {
            | CompileError::DuplicateBinding { loc, .. }
            | CompileError::UnboundName { loc, .. }
            | CompileError::ArityMismatch { loc, .. }
            | CompileError::FrameUnderflow { loc }
            | CompileError::MultipleDefaults { loc }
            | CompileError::DefaultNotLast { loc }
            | CompileError::ShadowsGlobal { loc, .. }
            | CompileError::UnsupportedOperand { loc, .. } => loc,
        }
    }

    /// Create an Ariadne report for this compile error.
    pub fn to_report(&self) -> Report<'static, (String, Range<usize>)> {
        let (title, label) = match self {
            | CompileError::DuplicateBinding { name, .. } => {
                ("Duplicate binding", format!("`{name}` is already bound in this scope"))
            }
            | CompileError::UnboundName { name, .. } => {
                ("Unbound name", format!("`{name}` is not defined"))
            }
            | CompileError::ArityMismatch { op, expected, found, .. } => (
                "Arity mismatch",
                format!("`{op}` expects {expected} argument(s), found {found}"),
            ),
            | CompileError::FrameUnderflow { .. } => {
                ("Local frame underflow", "no local frame is open here".to_string())
            }
            | CompileError::MultipleDefaults { .. } => {
                ("Multiple catch-all alternatives", "second catch-all alternative".to_string())
            }
            | CompileError::DefaultNotLast { .. } => (
                "Catch-all alternative is not last",
                "alternatives follow this catch-all".to_string(),
            ),
            | CompileError::ShadowsGlobal { name, .. } => {
                ("Local binder shadows a global", format!("`{name}` is a top-level binding"))
            }
            | CompileError::UnsupportedOperand { op, .. } => {
                ("Unsupported operand", format!("`{op}` only takes integer operands"))
            }
        };
        let loc = self.loc();
        if loc.is_dummy() {
            return Report::build(ReportKind::Error, "<internal>".to_string(), 0)
                .with_message(title)
                .with_note(label)
                .finish();
        }
        let (file_path, range) = loc.to_ariadne_span();
        Report::build(ReportKind::Error, file_path.clone(), range.start)
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_message(title)
            .with_label(Label::new((file_path, range)).with_message(label))
            .finish()
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
