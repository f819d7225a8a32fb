use ariadne::Report;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] tagless_surface::ParseError),
    #[error("{0}")]
    Compile(#[from] tagless_codegen::CompileError),
}

impl DriverError {
    /// An Ariadne report for errors that point into the source.
    pub fn to_report(&self) -> Option<Report<'static, (String, Range<usize>)>> {
        match self {
            | DriverError::Io(_) => None,
            | DriverError::Parse(err) => Some(err.to_report()),
            | DriverError::Compile(err) => Some(err.to_report()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
