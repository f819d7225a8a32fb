//! The compilation context: target types, one global per top-level binding,
//! and the driver of lowering.

use crate::{backend::*, err::*, lir::*, scope::ScopedMap};
use indexmap::{IndexMap, IndexSet};
use tagless_syntax::{Node, NodeRef, Program};
use tagless_utils::span::Location;

/// The storage of a top-level binding.
#[derive(Clone, Debug)]
pub struct Global<G> {
    pub symbol: Symbol,
    pub handle: G,
    pub loc: Location,
}

/// One lowered lambda template.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub name: String,
    pub info: Symbol,
    pub arity: usize,
    pub updatable: bool,
    pub loc: Location,
}

/// What lowering produced besides the code handed to the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lowered {
    /// user lambda templates, in the order they were lowered
    pub templates: Vec<Template>,
    /// constructor info tables, by name and field count
    pub constructors: Vec<(String, usize)>,
    /// the exported entry continuation, if the entry binding exists
    pub entry: Option<Symbol>,
}

pub struct Context<B: Emit> {
    pub(crate) backend: B,
    pub(crate) types: Types<B::Type, B::Field>,
    pub(crate) symbols: ScopedMap<String, Operand>,
    pub(crate) globals: IndexMap<String, Global<B::Global>>,
    pub(crate) templates: Vec<Template>,
    entry: String,
    fresh: usize,
}

pub const DEFAULT_ENTRY: &str = "main";
pub const ENTRY_SYMBOL: &str = "tagless_entry";

pub(crate) fn adapt<B: Backend + ?Sized>(backend: &mut B, loc: &Location) -> Option<B::Location> {
    if loc.is_dummy() {
        return None;
    }
    Some(backend.new_location(loc.file_name(), loc.begin.line, loc.begin.column))
}

impl<B: Emit> Context<B> {
    /// Lay out the types and register every top-level binding as a global,
    /// so that bindings may refer to each other regardless of order.
    pub fn new(mut backend: B, program: &Program) -> Result<Self> {
        let types = Types::new(&mut backend);
        let mut globals: IndexMap<String, Global<B::Global>> = IndexMap::new();
        for binding in program {
            let name = &binding.lhs.name;
            if globals.contains_key(name) {
                Err(CompileError::DuplicateBinding {
                    name: name.clone(),
                    loc: binding.lhs.loc.clone(),
                })?
            }
            let symbol = Symbol::global(name);
            let loc = adapt(&mut backend, &binding.loc);
            let handle =
                backend.new_global(Linkage::Internal, &types.closure, symbol.as_str(), loc.as_ref());
            log::debug!("global `{name}` as {symbol}");
            globals.insert(name.clone(), Global { symbol, handle, loc: binding.loc.clone() });
        }
        let table = globals
            .iter()
            .map(|(name, global)| (name.clone(), Operand::Global(global.symbol.clone())))
            .collect();
        Ok(Context {
            backend,
            types,
            symbols: ScopedMap::new(table),
            globals,
            templates: Vec::new(),
            entry: DEFAULT_ENTRY.to_string(),
            fresh: 0,
        })
    }

    /// The binding entered by the exported entry point.
    pub fn set_entry(&mut self, name: impl Into<String>) {
        self.entry = name.into();
    }

    pub fn symbols(&self) -> &ScopedMap<String, Operand> {
        &self.symbols
    }

    pub fn types(&self) -> &Types<B::Type, B::Field> {
        &self.types
    }

    pub fn globals(&self) -> &IndexMap<String, Global<B::Global>> {
        &self.globals
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn adapt_loc(&mut self, loc: &Location) -> Option<B::Location> {
        adapt(&mut self.backend, loc)
    }

    pub(crate) fn fresh(&mut self) -> usize {
        let n = self.fresh;
        self.fresh += 1;
        n
    }

    /// Lower every binding of `program`, which must be the program the
    /// context was built from. Stops at the first error.
    pub fn lower(&mut self, program: &Program) -> Result<Lowered> {
        self.define_builtins();

        let mut constructors = IndexSet::new();
        program.as_node().walk(&mut |node| match node {
            | NodeRef::Construct(c) => {
                constructors.insert((c.con.name.clone(), c.args.len()));
            }
            | NodeRef::AlgebraicAlt(alt) => {
                constructors.insert((alt.con.name.clone(), alt.vars.len()));
            }
            | _ => {}
        });
        for (name, arity) in &constructors {
            self.define_constructor(name, *arity);
        }

        for binding in program {
            log::info!("lowering `{}`", binding.lhs.name);
            self.lower_binding(binding)?;
        }

        let entry = match self.globals.get(&self.entry) {
            | Some(global) => {
                let name = Symbol::export(ENTRY_SYMBOL);
                let cont = Continuation {
                    name: name.clone(),
                    linkage: Linkage::Exported,
                    temps: 0,
                    body: vec![Stmt::Enter(Operand::Global(global.symbol.clone()))],
                };
                let loc = global.loc.clone();
                let loc = self.adapt_loc(&loc);
                self.backend.define_continuation(&self.types, cont, loc.as_ref());
                Some(name)
            }
            | None => {
                log::warn!("no binding named `{}`; no entry point is exported", self.entry);
                None
            }
        };

        Ok(Lowered {
            templates: std::mem::take(&mut self.templates),
            constructors: constructors.into_iter().collect(),
            entry,
        })
    }

    /* -------------------------------- Support ------------------------------- */

    fn define(&mut self, name: Symbol, temps: u32, body: Block, loc: Option<&B::Location>) {
        debug_assert!(ends_in_transfer(&body), "{name} falls through");
        let cont = Continuation { name, linkage: Linkage::Internal, temps, body };
        self.backend.define_continuation(&self.types, cont, loc);
    }

    /// Garbage collection hooks for closures of `slots` slots, the first
    /// `pointers` of which point at closures.
    pub(crate) fn define_gc_hooks(
        &mut self, base: &Symbol, slots: usize, pointers: usize, loc: Option<&B::Location>,
    ) {
        let t = Temp(0);
        let evac = vec![
            Stmt::Assign(t, Rvalue::Copy(slots)),
            Stmt::SetNode(Operand::Temp(t)),
            Stmt::Done,
        ];
        self.define(base.evac(), 1, evac, loc);

        let mut scav = Vec::new();
        for i in 0..pointers {
            let (old, new) = (Temp(2 * i as u32), Temp(2 * i as u32 + 1));
            scav.push(Stmt::Assign(old, Rvalue::Field(Operand::Node, i)));
            scav.push(Stmt::Assign(new, Rvalue::Evacuate(Operand::Temp(old))));
            scav.push(Stmt::Store { base: Operand::Node, slot: i, value: Operand::Temp(new) });
        }
        scav.push(Stmt::Done);
        self.define(base.scav(), 2 * pointers as u32, scav, loc);
    }

    pub(crate) fn define_info_table(
        &mut self, base: &Symbol, arity: usize, loc: Option<&B::Location>,
    ) -> Symbol {
        let table = InfoTable {
            name: base.info(),
            entry: base.entry(),
            arity,
            evacuation: base.evac(),
            scavenge: base.scav(),
        };
        self.backend.define_info_table(&self.types, table, loc);
        base.info()
    }

    /// Literal boxes, blackholes and indirections.
    fn define_builtins(&mut self) {
        let literal = Symbol::builtin("literal");
        let t = Temp(0);
        let entry = vec![
            Stmt::Assign(t, Rvalue::Unbox(Operand::Node)),
            Stmt::SetR1(Operand::Temp(t)),
            Stmt::SetNode(Operand::Null),
            Stmt::Return,
        ];
        self.define(literal.entry(), 1, entry, None);
        self.define_gc_hooks(&literal, 1, 0, None);
        self.define_info_table(&literal, 0, None);

        let blackhole = Symbol::builtin("blackhole");
        self.define(blackhole.entry(), 0, vec![Stmt::Fail("<<loop>>".to_string())], None);
        self.define_gc_hooks(&blackhole, 1, 0, None);
        self.define_info_table(&blackhole, 0, None);

        let indirection = Symbol::builtin("indirection");
        self.define(indirection.entry(), 0, vec![Stmt::Enter(Operand::Free(0))], None);
        self.define_gc_hooks(&indirection, 1, 1, None);
        self.define_info_table(&indirection, 0, None);
    }

    /// A constructor returns itself when entered; alternatives compare info tables.
    fn define_constructor(&mut self, name: &str, arity: usize) {
        let base = Symbol::constructor(name, arity);
        log::debug!("constructor {name}/{arity} as {base}");
        self.define(base.entry(), 0, vec![Stmt::Return], None);
        self.define_gc_hooks(&base, arity, arity, None);
        self.define_info_table(&base, 0, None);
    }

    /// Overwrite the thunk saved under the continuation with its value.
    pub(crate) fn define_update(&mut self, base: &Symbol, loc: Option<&B::Location>) {
        let thunk = Operand::Temp(Temp(0));
        let body = vec![
            Stmt::Assign(Temp(0), Rvalue::Pop),
            Stmt::Match {
                arms: vec![(
                    Cond::NonNull(Operand::Node),
                    vec![
                        Stmt::SetInfo {
                            base: thunk.clone(),
                            info: Symbol::builtin("indirection").info(),
                        },
                        Stmt::Store { base: thunk.clone(), slot: 0, value: Operand::Node },
                    ],
                )],
                default: vec![
                    Stmt::SetInfo { base: thunk.clone(), info: Symbol::builtin("literal").info() },
                    Stmt::Store { base: thunk, slot: 0, value: Operand::R1 },
                ],
            },
            Stmt::Return,
        ];
        self.define(base.update(), 1, body, loc);
    }
}
