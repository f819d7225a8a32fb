//! The compilation pipeline of tagless: parse, register globals, lower, print C.

pub mod conf;
pub mod diagnostics;
pub mod err;

pub use conf::Conf;
pub use err::*;

use std::{path::Path, sync::Arc};
use tagless_codegen::{CBackend, Context, Lowered};
use tagless_syntax::{Formatter, Node, Pretty, Program};

/// Everything a successful compilation produces.
#[derive(Debug)]
pub struct Artifact {
    pub program: Program,
    pub lowered: Lowered,
    /// one C translation unit
    pub c_source: String,
}

pub struct Driver {
    pub conf: Conf,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    /// A driver configured from `tagless.toml`.
    pub fn new() -> Self {
        Driver { conf: Conf::load() }
    }
    pub fn with_conf(conf: Conf) -> Self {
        Driver { conf }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<(String, String)> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Ok((path.display().to_string(), source))
    }

    pub fn parse(&self, name: &str, source: &str) -> Result<Program> {
        log::info!("parsing {name}");
        let file: Arc<str> = name.into();
        Ok(tagless_surface::parse(source, Some(file))?)
    }

    fn lower(&self, program: &Program) -> Result<(Lowered, CBackend)> {
        let mut ctx = Context::new(CBackend::new(self.conf.line_directives), program)?;
        ctx.set_entry(self.conf.entry.clone());
        log::info!("lowering {} binding(s)", program.len());
        let lowered = ctx.lower(program)?;
        Ok((lowered, ctx.into_backend()))
    }

    /// Parse and lower without keeping the output.
    pub fn check(&self, name: &str, source: &str) -> Result<Lowered> {
        let program = self.parse(name, source)?;
        let (lowered, _) = self.lower(&program)?;
        Ok(lowered)
    }

    pub fn compile(&self, name: &str, source: &str) -> Result<Artifact> {
        let program = self.parse(name, source)?;
        let (lowered, backend) = self.lower(&program)?;
        log::info!("emitting C for {name}");
        Ok(Artifact { program, lowered, c_source: backend.to_string() })
    }

    /// The structural dump of the syntax tree.
    pub fn ast(&self, name: &str, source: &str) -> Result<String> {
        let program = self.parse(name, source)?;
        Ok(program.format(0))
    }

    /// The program in canonical concrete syntax.
    pub fn pretty(&self, name: &str, source: &str) -> Result<String> {
        let program = self.parse(name, source)?;
        let fmt = Formatter::new();
        Ok(fmt.render(program.pretty(&fmt)))
    }
}
