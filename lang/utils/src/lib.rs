#![allow(clippy::style)]
#![allow(clippy::useless_format)]

pub mod span;

pub mod prelude {
    /// Source code location.
    pub use crate::span::{FileInfo, Location, Position};
}
