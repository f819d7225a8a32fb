//! The STG syntax tree of tagless.
//!
//! Every node carries its source [`Location`]; the tree is exclusively owned
//! and never mutated once built.

pub mod syntax;
pub use syntax::*;

pub mod prim;
pub use prim::PrimOpcode;

pub mod node;
pub use node::{Node, NodeRef};

pub mod fmt;
pub use fmt::*;

mod impls;

pub use tagless_utils::span::Location;

#[cfg(test)]
mod tests;
