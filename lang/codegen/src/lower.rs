//! Lowering of lambdas and expressions to continuations.

use crate::{backend::Emit, context::*, err::*, free::free_variables, lir::*, scope::ScopedMap};
use tagless_syntax::*;

/// The code of one continuation under construction.
pub(crate) struct FnBuilder {
    name: Symbol,
    /// the template nested lambdas and continuations are named after
    base: Symbol,
    scope: ScopedMap<String, Operand>,
    blocks: Vec<Block>,
    temps: u32,
}

impl FnBuilder {
    fn new(name: Symbol, base: Symbol, scope: ScopedMap<String, Operand>) -> Self {
        FnBuilder { name, base, scope, blocks: vec![Vec::new()], temps: 0 }
    }
    fn emit(&mut self, stmt: Stmt) {
        if let Some(block) = self.blocks.last_mut() {
            block.push(stmt);
        }
    }
    fn assign(&mut self, rvalue: Rvalue) -> Operand {
        let t = Temp(self.temps);
        self.temps += 1;
        self.emit(Stmt::Assign(t, rvalue));
        Operand::Temp(t)
    }
    fn enter_block(&mut self) {
        self.blocks.push(Vec::new());
    }
    fn exit_block(&mut self) -> Block {
        self.blocks.pop().unwrap_or_default()
    }
    fn push_frame(&mut self) {
        self.scope.push();
    }
    fn pop_frame(&mut self, loc: &Location) -> Result<()> {
        self.scope.pop().map_err(|_| CompileError::FrameUnderflow { loc: loc.clone() })
    }
    fn finish(mut self) -> Continuation {
        let body = self.exit_block();
        debug_assert!(ends_in_transfer(&body), "{} falls through", self.name);
        Continuation { name: self.name, linkage: Linkage::Internal, temps: self.temps, body }
    }
}

/// How a case alternative sees the value it matches on.
enum Scrutinee {
    /// computed in place, unboxed
    Unboxed(Operand),
    /// computed in place, a constructor
    Boxed(Operand),
    /// returned to a continuation
    Returned { node: Operand, r1: Operand },
}

/// Closure slots of a lambda; updatable thunks need one for their value.
pub fn slots_of(lambda: &Lambda) -> usize {
    let reserved = if lambda.is_updatable_thunk() { 1 } else { 0 };
    lambda.freevars.len().max(reserved)
}

fn unboxed(lit: &Literal) -> Operand {
    match lit.value {
        | LitValue::Int(i) => Operand::Int(i),
        | LitValue::Double(d) => Operand::Double(d),
    }
}

/// At most one catch-all alternative, and only in last position.
fn validate(alts: &Sequence<Alternative>) -> Result<()> {
    let mut catch_all: Option<&Location> = None;
    for alt in alts {
        if let Some(first) = catch_all {
            Err(if alt.is_catch_all() {
                CompileError::MultipleDefaults { loc: alt.loc().clone() }
            } else {
                CompileError::DefaultNotLast { loc: first.clone() }
            })?
        }
        if alt.is_catch_all() {
            catch_all = Some(alt.loc());
        }
    }
    Ok(())
}

impl<B: Emit> Context<B> {
    pub(crate) fn lower_binding(&mut self, binding: &Binding) -> Result<()> {
        let name = &binding.lhs.name;
        let Some(global) = self.globals.get(name) else {
            return Err(CompileError::UnboundName { name: name.clone(), loc: binding.lhs.loc.clone() });
        };
        let (symbol, handle) = (global.symbol.clone(), global.handle.clone());
        // top-level captures can only be other top-level closures
        let mut fields = Vec::new();
        for var in &binding.rhs.freevars {
            match self.symbols.lookup(&var.name) {
                | Ok(Operand::Global(global)) => fields.push(global.clone()),
                | _ => Err(CompileError::UnboundName {
                    name: var.name.clone(),
                    loc: var.loc.clone(),
                })?,
            }
        }
        let info = self.lower_template(symbol, name, &binding.rhs)?;
        let closure = StaticClosure { info, fields, slots: slots_of(&binding.rhs) };
        self.backend.define_global(&self.types, &handle, closure);
        Ok(())
    }

    /// Entry code, hooks and info table of one lambda; returns the info table.
    fn lower_template(&mut self, base: Symbol, name: &str, lambda: &Lambda) -> Result<Symbol> {
        let arity = lambda.args.len();
        let updatable = lambda.is_updatable_thunk();
        if lambda.update && arity > 0 {
            log::warn!("{}: `{name}` takes arguments; its update flag is ignored", lambda.loc);
        }

        let mut fb = FnBuilder::new(base.entry(), base.clone(), self.symbols.fork());
        fb.push_frame();
        for (i, var) in lambda.freevars.iter().enumerate() {
            // a captured global is the global itself
            if fb.scope.is_global(&var.name) {
                continue;
            }
            fb.scope
                .bind(var.name.clone(), Operand::Free(i))
                .map_err(|err| CompileError::scope(err, &var.name, &var.loc))?;
        }
        if arity > 0 {
            fb.emit(Stmt::ArgCheck(arity));
            for arg in &lambda.args {
                let value = fb.assign(Rvalue::Pop);
                self.bind_local(&mut fb, arg, value)?;
            }
        }
        if updatable {
            fb.emit(Stmt::Push(Operand::Node));
            fb.emit(Stmt::PushCont(base.update()));
            fb.emit(Stmt::SetInfo {
                base: Operand::Node,
                info: Symbol::builtin("blackhole").info(),
            });
        }
        self.lower_tail(&mut fb, &lambda.body)?;
        fb.pop_frame(&lambda.loc)?;

        let loc = self.adapt_loc(&lambda.loc);
        let entry = fb.finish();
        self.backend.define_continuation(&self.types, entry, loc.as_ref());
        if updatable {
            self.define_update(&base, loc.as_ref());
        }
        self.define_gc_hooks(&base, slots_of(lambda), lambda.freevars.len(), loc.as_ref());
        let info = self.define_info_table(&base, arity, loc.as_ref());
        log::debug!("template {info} for `{name}` with arity {arity}");
        self.templates.push(Template {
            name: name.to_string(),
            info: info.clone(),
            arity,
            updatable,
            loc: lambda.loc.clone(),
        });
        Ok(info)
    }

    /// Lower a lambda bound locally by `binding`; returns its info table.
    fn lower_nested(&mut self, fb: &FnBuilder, binding: &Binding) -> Result<Symbol> {
        let base = fb.base.nested(self.fresh(), &binding.lhs.name);
        self.lower_template(base, &binding.lhs.name, &binding.rhs)
    }

    fn bind_local(&self, fb: &mut FnBuilder, var: &Variable, value: Operand) -> Result<()> {
        if fb.scope.is_global(&var.name) {
            Err(CompileError::ShadowsGlobal { name: var.name.clone(), loc: var.loc.clone() })?
        }
        fb.scope.bind(var.name.clone(), value).map_err(|err| CompileError::scope(err, &var.name, &var.loc))
    }

    fn resolve(&self, fb: &FnBuilder, var: &Variable) -> Result<Operand> {
        fb.scope.lookup(&var.name).cloned().map_err(|err| CompileError::scope(err, &var.name, &var.loc))
    }

    fn literal_box(&self, fb: &mut FnBuilder, value: Operand) -> Operand {
        let info = Symbol::builtin("literal").info();
        fb.assign(Rvalue::Alloc { info, fields: vec![value], slots: 1 })
    }

    /// An atom as a closure.
    fn boxed(&self, fb: &mut FnBuilder, atom: &Atom) -> Result<Operand> {
        match atom {
            | Atom::Var(var) => self.resolve(fb, var),
            | Atom::Lit(lit) => Ok(self.literal_box(fb, unboxed(lit))),
        }
    }

    fn construct(&self, fb: &mut FnBuilder, construct: &Construct) -> Result<Operand> {
        let Construct { con, args, .. } = construct;
        let mut fields = Vec::new();
        for arg in args {
            fields.push(self.boxed(fb, arg)?);
        }
        let info = Symbol::constructor(&con.name, args.len()).info();
        Ok(fb.assign(Rvalue::Alloc { info, fields, slots: args.len() }))
    }

    /// Evaluate a primitive application to an unboxed temporary.
    fn prim(&self, fb: &mut FnBuilder, prim: &PrimApply) -> Result<Operand> {
        let PrimApply { op, args, loc } = prim;
        let opcode = op.opcode;
        if args.len() != op.arity() {
            Err(CompileError::ArityMismatch {
                op: opcode,
                expected: op.arity(),
                found: args.len(),
                loc: loc.clone(),
            })?
        }
        let mut operands = Vec::new();
        for arg in args {
            let operand = match arg {
                | Atom::Var(var) => {
                    let value = self.resolve(fb, var)?;
                    fb.assign(Rvalue::Unbox(value))
                }
                | Atom::Lit(Literal { value: LitValue::Int(i), .. }) => Operand::Int(*i),
                | Atom::Lit(Literal { value: LitValue::Double(_), loc }) => {
                    Err(CompileError::UnsupportedOperand { op: opcode, loc: loc.clone() })?
                }
            };
            operands.push(operand);
        }
        Ok(fb.assign(Rvalue::Prim(opcode, operands)))
    }

    /// Lower `expr` in tail position: the current block ends in a transfer.
    fn lower_tail(&mut self, fb: &mut FnBuilder, expr: &Expr) -> Result<()> {
        match expr {
            | Expr::LocalDefinition(LocalBindings { bindings, body, loc }) => {
                let mut closures = Vec::new();
                for binding in bindings {
                    let info = self.lower_nested(fb, binding)?;
                    let mut fields = Vec::new();
                    for var in &binding.rhs.freevars {
                        fields.push(self.resolve(fb, var)?);
                    }
                    let slots = slots_of(&binding.rhs);
                    closures.push((&binding.lhs, fb.assign(Rvalue::Alloc { info, fields, slots })));
                }
                fb.push_frame();
                for (var, closure) in closures {
                    self.bind_local(fb, var, closure)?;
                }
                self.lower_tail(fb, body)?;
                fb.pop_frame(loc)
            }
            | Expr::LocalRecursion(LocalBindings { bindings, body, loc }) => {
                fb.push_frame();
                let mut closures = Vec::new();
                for binding in bindings {
                    let info = self.lower_nested(fb, binding)?;
                    let slots = slots_of(&binding.rhs);
                    let closure = fb.assign(Rvalue::Alloc { info, fields: Vec::new(), slots });
                    self.bind_local(fb, &binding.lhs, closure.clone())?;
                    closures.push((binding, closure));
                }
                // every name is bound, fill the slots
                for (binding, closure) in closures {
                    for (slot, var) in binding.rhs.freevars.iter().enumerate() {
                        let value = self.resolve(fb, var)?;
                        fb.emit(Stmt::Store { base: closure.clone(), slot, value });
                    }
                }
                self.lower_tail(fb, body)?;
                fb.pop_frame(loc)
            }
            | Expr::Case(case) => self.lower_case(fb, case),
            | Expr::Construct(construct) => {
                let value = self.construct(fb, construct)?;
                fb.emit(Stmt::SetNode(value));
                fb.emit(Stmt::Return);
                Ok(())
            }
            | Expr::Apply(Apply { var, args, .. }) => {
                let function = self.resolve(fb, var)?;
                let mut values = Vec::new();
                for arg in args {
                    values.push(self.boxed(fb, arg)?);
                }
                // the first argument ends up on top
                for value in values.into_iter().rev() {
                    fb.emit(Stmt::Push(value));
                }
                fb.emit(Stmt::Enter(function));
                Ok(())
            }
            | Expr::PrimApply(prim) => {
                let value = self.prim(fb, prim)?;
                fb.emit(Stmt::SetR1(value));
                fb.emit(Stmt::SetNode(Operand::Null));
                fb.emit(Stmt::Return);
                Ok(())
            }
            | Expr::LitExpr(LitExpr { lit, .. }) => {
                fb.emit(Stmt::SetR1(unboxed(lit)));
                fb.emit(Stmt::SetNode(Operand::Null));
                fb.emit(Stmt::Return);
                Ok(())
            }
        }
    }

    fn lower_case(&mut self, fb: &mut FnBuilder, case: &Case) -> Result<()> {
        let Case { scrutinee, alts, loc } = case;
        validate(alts)?;
        match scrutinee.as_ref() {
            | Expr::PrimApply(prim) => {
                let value = self.prim(fb, prim)?;
                self.dispatch(fb, Scrutinee::Unboxed(value), alts, loc)
            }
            | Expr::LitExpr(LitExpr { lit, .. }) => {
                self.dispatch(fb, Scrutinee::Unboxed(unboxed(lit)), alts, loc)
            }
            | Expr::Construct(construct) => {
                let value = self.construct(fb, construct)?;
                self.dispatch(fb, Scrutinee::Boxed(value), alts, loc)
            }
            | scrutinee => {
                // save what the alternatives need, evaluate, continue in `k`
                let live: Vec<(String, Location)> = free_variables(NodeRef::Alternatives(alts))
                    .into_iter()
                    .filter(|(name, _)| !fb.scope.is_global(*name))
                    .map(|(name, loc)| (name.to_string(), loc.clone()))
                    .collect();
                for (name, loc) in &live {
                    let value = fb
                        .scope
                        .lookup(name)
                        .cloned()
                        .map_err(|err| CompileError::scope(err, name, loc))?;
                    fb.emit(Stmt::Push(value));
                }
                let k = fb.base.continuation(self.fresh());
                fb.emit(Stmt::PushCont(k.clone()));
                self.lower_tail(fb, scrutinee)?;

                let mut kb = FnBuilder::new(k, fb.base.clone(), fb.scope.fork());
                kb.push_frame();
                for (name, loc) in live.iter().rev() {
                    let value = kb.assign(Rvalue::Pop);
                    kb.scope
                        .bind(name.clone(), value)
                        .map_err(|err| CompileError::scope(err, name, loc))?;
                }
                let node = kb.assign(Rvalue::Use(Operand::Node));
                let r1 = kb.assign(Rvalue::Use(Operand::R1));
                self.dispatch(&mut kb, Scrutinee::Returned { node, r1 }, alts, loc)?;
                kb.pop_frame(loc)?;
                let loc = self.adapt_loc(loc);
                self.backend.define_continuation(&self.types, kb.finish(), loc.as_ref());
                Ok(())
            }
        }
    }

    /// Test the alternatives in order; the catch-all, if any, is the fallback.
    fn dispatch(
        &mut self, fb: &mut FnBuilder, scrutinee: Scrutinee, alts: &Sequence<Alternative>,
        loc: &Location,
    ) -> Result<()> {
        let mut arms = Vec::new();
        let mut default = None;
        for alt in alts {
            match alt {
                | Alternative::Prim(PrimAlt { lit, body, .. }) => {
                    let cond = match &scrutinee {
                        | Scrutinee::Unboxed(value) => Cond::Equals(value.clone(), unboxed(lit)),
                        | Scrutinee::Boxed(_) => continue,
                        | Scrutinee::Returned { node, r1 } => Cond::And(vec![
                            Cond::IsNull(node.clone()),
                            Cond::Equals(r1.clone(), unboxed(lit)),
                        ]),
                    };
                    fb.enter_block();
                    self.lower_tail(fb, body)?;
                    arms.push((cond, fb.exit_block()));
                }
                | Alternative::Algebraic(AlgebraicAlt { con, vars, body, loc }) => {
                    let info = Symbol::constructor(&con.name, vars.len()).info();
                    let (cond, value) = match &scrutinee {
                        | Scrutinee::Unboxed(_) => continue,
                        | Scrutinee::Boxed(value) => (Cond::InfoIs(value.clone(), info), value),
                        | Scrutinee::Returned { node, .. } => (
                            Cond::And(vec![
                                Cond::NonNull(node.clone()),
                                Cond::InfoIs(node.clone(), info),
                            ]),
                            node,
                        ),
                    };
                    fb.enter_block();
                    fb.push_frame();
                    for (i, var) in vars.iter().enumerate() {
                        let field = fb.assign(Rvalue::Field(value.clone(), i));
                        self.bind_local(fb, var, field)?;
                    }
                    self.lower_tail(fb, body)?;
                    fb.pop_frame(loc)?;
                    arms.push((cond, fb.exit_block()));
                }
                | Alternative::Default(DefaultAlt { body, .. }) => {
                    fb.enter_block();
                    self.lower_tail(fb, body)?;
                    default = Some(fb.exit_block());
                }
                | Alternative::Binding(BindingAlt { var, body, loc }) => {
                    fb.enter_block();
                    fb.push_frame();
                    let value = match &scrutinee {
                        | Scrutinee::Unboxed(value) => self.literal_box(fb, value.clone()),
                        | Scrutinee::Boxed(value) => value.clone(),
                        | Scrutinee::Returned { .. } => fb.assign(Rvalue::Returned),
                    };
                    self.bind_local(fb, var, value)?;
                    self.lower_tail(fb, body)?;
                    fb.pop_frame(loc)?;
                    default = Some(fb.exit_block());
                }
            }
        }
        let default =
            default.unwrap_or_else(|| vec![Stmt::Fail(format!("{loc}: no alternative matched"))]);
        fb.emit(Stmt::Match { arms, default });
        Ok(())
    }
}
