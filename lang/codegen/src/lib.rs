//! Lowering of STG programs to the tagless execution model.
//!
//! Lowering walks a [`tagless_syntax::Program`] once and hands info tables,
//! continuations and static closures to a [`backend::Emit`] implementation;
//! [`c::CBackend`] prints them as C.

pub mod backend;
pub mod c;
pub mod context;
pub mod err;
pub mod free;
pub mod lir;
mod lower;
pub mod scope;

pub use backend::{Backend, Emit, Types};
pub use c::CBackend;
pub use context::{Context, Lowered, Template, DEFAULT_ENTRY, ENTRY_SYMBOL};
pub use err::*;
pub use free::free_variables;
pub use lower::slots_of;
pub use scope::ScopedMap;

#[cfg(test)]
mod tests;
