//! A backend that prints portable C.
//!
//! The output is one translation unit to be linked against a runtime that
//! provides the registers, the stack, allocation, garbage collection and the
//! trampoline loop; see the `extern` declarations at the top of the output.

use crate::{
    backend::{Backend, Emit, Types},
    lir::*,
};
use indexmap::IndexMap;
use std::fmt::{self, Write};
use tagless_syntax::PrimOpcode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CType {
    Void,
    Word,
    UWord,
    Pointer(Box<CType>),
    FunctionPtr { ret: Box<CType>, params: Vec<CType> },
    Struct(String),
    /// `0` is a flexible array member
    Array(Box<CType>, usize),
}

impl CType {
    /// A declarator of `name` with this type.
    pub fn declare(&self, name: &str) -> String {
        match self {
            | CType::Void => format!("void {name}").trim_end().to_string(),
            | CType::Word => format!("word {name}").trim_end().to_string(),
            | CType::UWord => format!("uword {name}").trim_end().to_string(),
            | CType::Struct(s) => format!("struct {s} {name}").trim_end().to_string(),
            | CType::Pointer(to) => match to.as_ref() {
                | CType::Array(..) | CType::FunctionPtr { .. } => to.declare(&format!("(*{name})")),
                | _ => to.declare(&format!("*{name}")),
            },
            | CType::Array(elem, len) => {
                let len = if *len == 0 { String::new() } else { len.to_string() };
                elem.declare(&format!("{name}[{len}]"))
            }
            | CType::FunctionPtr { ret, params } => {
                let params = if params.is_empty() {
                    "void".to_string()
                } else {
                    params.iter().map(CType::spelling).collect::<Vec<_>>().join(", ")
                };
                ret.declare(&format!("(*{name})({params})"))
            }
        }
    }
    /// The abstract declarator, as used in casts.
    pub fn spelling(&self) -> String {
        self.declare("")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CField {
    pub name: String,
    pub ty: CType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CGlobal {
    pub name: String,
    pub ty: CType,
    pub linkage: Linkage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// Field and type spellings the printed code refers to.
#[derive(Clone, Debug)]
struct Names {
    closure: String,
    info: String,
    freevars: String,
    entry_code: String,
}

impl Names {
    fn new(types: &Types<CType, CField>) -> Self {
        Names {
            closure: types.closure_ptr.spelling(),
            info: types.info.name.clone(),
            freevars: types.freevars.name.clone(),
            entry_code: types.entry_code.name.clone(),
        }
    }
    /// A word as a closure pointer.
    fn closure(&self, op: &Operand) -> String {
        match op {
            | Operand::Node => "rt_node".to_string(),
            | Operand::Global(s) => format!("(({}) &{s})", self.closure),
            | op => format!("(({}) {})", self.closure, self.operand(op)),
        }
    }
    fn slot(&self, op: &Operand, i: usize) -> String {
        format!("{}->{}[{i}]", self.closure(op), self.freevars)
    }
    fn operand(&self, op: &Operand) -> String {
        match op {
            | Operand::Node => "(word) rt_node".to_string(),
            | Operand::R1 => "rt_r1".to_string(),
            | Operand::Temp(t) => t.to_string(),
            | Operand::Free(i) => format!("(word) {}", self.slot(&Operand::Node, *i)),
            | Operand::Global(s) => format!("(word) &{s}"),
            | Operand::Int(i) => format!("((word) {i})"),
            | Operand::Double(d) => format!("rt_double_bits({})", double(*d)),
            | Operand::Null => "(word) 0".to_string(),
        }
    }
    fn prim(&self, op: PrimOpcode, args: &[Operand]) -> String {
        let args: Vec<_> = args.iter().map(|a| self.operand(a)).collect();
        let sym = match (op, args.len()) {
            | (PrimOpcode::Invert, 1) => return format!("(~{})", args[0]),
            | (PrimOpcode::Negate, 1) => return format!("(-{})", args[0]),
            | (PrimOpcode::Pow, 2) => return format!("rt_pow({}, {})", args[0], args[1]),
            | (PrimOpcode::Add, 2) => "+",
            | (PrimOpcode::Sub, 2) => "-",
            | (PrimOpcode::Mul, 2) => "*",
            | (PrimOpcode::Div, 2) => "/",
            | (PrimOpcode::Mod, 2) => "%",
            | (PrimOpcode::LShift, 2) => "<<",
            | (PrimOpcode::RShift, 2) => ">>",
            | (PrimOpcode::BitOr, 2) => "|",
            | (PrimOpcode::BitAnd, 2) => "&",
            | (PrimOpcode::BitXor, 2) => "^",
            | (PrimOpcode::Lt, 2) => "<",
            | (PrimOpcode::Le, 2) => "<=",
            | (PrimOpcode::Eq, 2) => "==",
            | (PrimOpcode::Ne, 2) => "!=",
            | (PrimOpcode::Ge, 2) => ">=",
            | (PrimOpcode::Gt, 2) => ">",
            // arity is checked during lowering
            | _ => return "0".to_string(),
        };
        if op.is_comparison() {
            // truth values are words
            format!("(word) ({} {sym} {})", args[0], args[1])
        } else {
            format!("({} {sym} {})", args[0], args[1])
        }
    }
    fn cond(&self, cond: &Cond) -> String {
        match cond {
            | Cond::InfoIs(op, info) => format!("{}->{} == &{info}", self.closure(op), self.info),
            | Cond::Equals(a, b) => format!("{} == {}", self.operand(a), self.operand(b)),
            | Cond::IsNull(op) => format!("{} == 0", self.operand(op)),
            | Cond::NonNull(op) => format!("{} != 0", self.operand(op)),
            | Cond::And(conds) if conds.is_empty() => "1".to_string(),
            | Cond::And(conds) => {
                conds.iter().map(|c| format!("({})", self.cond(c))).collect::<Vec<_>>().join(" && ")
            }
        }
    }
    fn block(&self, out: &mut String, block: &Block, depth: usize) {
        for stmt in block {
            self.stmt(out, stmt, depth);
        }
    }
    fn stmt(&self, out: &mut String, stmt: &Stmt, depth: usize) {
        let pad = "    ".repeat(depth);
        let line = |out: &mut String, s: String| {
            let _ = writeln!(out, "{pad}{s}");
        };
        match stmt {
            | Stmt::Assign(t, rvalue) => {
                let rvalue = match rvalue {
                    | Rvalue::Alloc { info, fields, slots } => {
                        line(out, format!("{t} = (word) rt_alloc({slots});"));
                        let target = Operand::Temp(*t);
                        line(out, format!("{}->{} = &{info};", self.closure(&target), self.info));
                        for (i, field) in fields.iter().enumerate() {
                            line(out, format!("{} = {};", self.slot(&target, i), self.closure(field)));
                        }
                        return;
                    }
                    | Rvalue::Use(op) => self.operand(op),
                    | Rvalue::Field(op, i) => format!("(word) {}", self.slot(op, *i)),
                    | Rvalue::Unbox(op) => format!("(word) {}", self.slot(op, 0)),
                    | Rvalue::Pop => "*rt_sp++".to_string(),
                    | Rvalue::Prim(op, args) => self.prim(*op, args),
                    | Rvalue::Returned => "(word) rt_box_returned()".to_string(),
                    | Rvalue::Evacuate(op) => format!("(word) rt_evacuate({})", self.closure(op)),
                    | Rvalue::Copy(slots) => format!("(word) rt_copy(rt_node, {slots})"),
                };
                line(out, format!("{t} = {rvalue};"))
            }
            | Stmt::Store { base, slot, value } => {
                line(out, format!("{} = {};", self.slot(base, *slot), self.closure(value)))
            }
            | Stmt::SetInfo { base, info } => {
                line(out, format!("{}->{} = &{info};", self.closure(base), self.info))
            }
            | Stmt::Push(op) => line(out, format!("*--rt_sp = {};", self.operand(op))),
            | Stmt::PushCont(k) => line(out, format!("*--rt_sp = (word) &{k};")),
            | Stmt::SetR1(op) => line(out, format!("rt_r1 = {};", self.operand(op))),
            | Stmt::SetNode(Operand::Null) => line(out, "rt_node = 0;".to_string()),
            | Stmt::SetNode(op) => line(out, format!("rt_node = {};", self.closure(op))),
            | Stmt::ArgCheck(n) => line(
                out,
                format!("if (!rt_args_available({n})) {{ rt_partial_application({n}); return; }}"),
            ),
            | Stmt::Match { arms, default } => {
                for (i, (cond, body)) in arms.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "} else if" };
                    line(out, format!("{keyword} ({}) {{", self.cond(cond)));
                    self.block(out, body, depth + 1);
                }
                line(out, if arms.is_empty() { "{".to_string() } else { "} else {".to_string() });
                self.block(out, default, depth + 1);
                line(out, "}".to_string());
            }
            | Stmt::Enter(op) => {
                if op != &Operand::Node {
                    line(out, format!("rt_node = {};", self.closure(op)));
                }
                line(out, format!("rt_next = rt_node->{}->{}; return;", self.info, self.entry_code))
            }
            | Stmt::Return => {
                line(out, "rt_next = (void (*)(void)) *rt_sp++; return;".to_string())
            }
            | Stmt::Fail(message) => line(out, format!("rt_fail({message:?}); return;")),
            | Stmt::Done => line(out, "return;".to_string()),
        }
    }
}

fn double(d: f64) -> String {
    if d.is_nan() {
        "(0.0 / 0.0)".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "(1.0 / 0.0)".to_string() } else { "(-1.0 / 0.0)".to_string() }
    } else {
        format!("{d:?}")
    }
}

fn storage(linkage: Linkage) -> &'static str {
    match linkage {
        | Linkage::Internal => "static ",
        | Linkage::Exported => "",
    }
}

#[derive(Clone, Debug, Default)]
struct GlobalDef {
    linkage: Option<Linkage>,
    closure: Option<StaticClosure>,
    names: Option<Names>,
}

/// Collects declarations and definitions, printed in dependency order by
/// its [`Display`](fmt::Display) implementation.
#[derive(Clone, Debug, Default)]
pub struct CBackend {
    line_directives: bool,
    structs: Vec<(String, Option<Vec<CField>>)>,
    runtime: Option<String>,
    prototypes: Vec<String>,
    tables: Vec<String>,
    globals: IndexMap<String, GlobalDef>,
    functions: Vec<String>,
}

impl CBackend {
    /// With `line_directives`, functions are preceded by `#line` pointing back
    /// at the source.
    pub fn new(line_directives: bool) -> Self {
        CBackend { line_directives, ..CBackend::default() }
    }

    fn runtime(&mut self, types: &Types<CType, CField>) {
        if self.runtime.is_some() {
            return;
        }
        let closure = types.closure_ptr.spelling();
        let cont = types.continuation.declare("rt_next");
        let word = types.word.spelling();
        let mut s = String::new();
        let _ = writeln!(s, "extern {closure} rt_node;");
        let _ = writeln!(s, "extern {word} rt_r1;");
        let _ = writeln!(s, "extern {word} *rt_sp;");
        let _ = writeln!(s, "extern {cont};");
        let _ = writeln!(s, "extern {closure} rt_alloc({word} slots);");
        let _ = writeln!(s, "extern {closure} rt_copy({closure} c, {word} slots);");
        let _ = writeln!(s, "extern {closure} rt_evacuate({closure} c);");
        let _ = writeln!(s, "extern int rt_args_available({word} n);");
        let _ = writeln!(s, "extern void rt_partial_application({word} n);");
        let _ = writeln!(s, "extern {closure} rt_box_returned(void);");
        let _ = writeln!(s, "extern void rt_fail(const char *message);");
        let _ = writeln!(s, "extern {word} rt_pow({word} base, {word} exponent);");
        let _ = writeln!(
            s,
            "static inline {word} rt_double_bits(double d) {{ union {{ double d; {word} w; }} u = {{ d }}; return u.w; }}"
        );
        self.runtime = Some(s);
    }

    fn line(&self, loc: Option<&CLocation>) -> String {
        match loc {
            | Some(CLocation { file, line, .. }) if self.line_directives => {
                format!("#line {line} {file:?}\n")
            }
            | _ => String::new(),
        }
    }
}

impl Backend for CBackend {
    type Type = CType;
    type Field = CField;
    type Global = CGlobal;
    type Location = CLocation;

    fn void_type(&mut self) -> CType {
        CType::Void
    }
    fn word_type(&mut self) -> CType {
        CType::Word
    }
    fn unsigned_word_type(&mut self) -> CType {
        CType::UWord
    }
    fn pointer_type(&mut self, to: &CType) -> CType {
        CType::Pointer(Box::new(to.clone()))
    }
    fn function_ptr_type(&mut self, ret: &CType, params: &[CType]) -> CType {
        CType::FunctionPtr { ret: Box::new(ret.clone()), params: params.to_vec() }
    }
    fn new_field(&mut self, ty: &CType, name: &str, _loc: Option<&CLocation>) -> CField {
        CField { name: name.to_string(), ty: ty.clone() }
    }
    fn new_struct_type(
        &mut self, name: &str, fields: Vec<CField>, _loc: Option<&CLocation>,
    ) -> CType {
        self.structs.push((name.to_string(), Some(fields)));
        CType::Struct(name.to_string())
    }
    fn new_opaque_struct_type(&mut self, name: &str, _loc: Option<&CLocation>) -> CType {
        self.structs.push((name.to_string(), None));
        CType::Struct(name.to_string())
    }
    fn set_fields(&mut self, ty: &CType, fields: Vec<CField>, _loc: Option<&CLocation>) {
        if let CType::Struct(name) = ty {
            if let Some((_, slot)) = self.structs.iter_mut().find(|(n, _)| n == name) {
                *slot = Some(fields);
            }
        }
    }
    fn array_type(&mut self, elem: &CType, len: usize) -> CType {
        CType::Array(Box::new(elem.clone()), len)
    }
    fn new_global(
        &mut self, linkage: Linkage, ty: &CType, name: &str, _loc: Option<&CLocation>,
    ) -> CGlobal {
        let def = self.globals.entry(name.to_string()).or_default();
        def.linkage = Some(linkage);
        CGlobal { name: name.to_string(), ty: ty.clone(), linkage }
    }
    fn new_location(&mut self, file: &str, line: usize, column: usize) -> CLocation {
        CLocation { file: file.to_string(), line, column }
    }
}

impl Emit for CBackend {
    fn define_info_table(
        &mut self, types: &Types<CType, CField>, table: InfoTable, _loc: Option<&CLocation>,
    ) {
        self.runtime(types);
        let InfoTable { name, entry, arity, evacuation, scavenge } = table;
        let ty = types.info_table.declare(name.as_str());
        self.tables.push(format!(
            "static {ty} = {{ .{} = {entry}, .{} = {arity}, .{} = {evacuation}, .{} = {scavenge} }};",
            types.entry_code.name, types.arity.name, types.evacuation_code.name, types.scavenge_code.name,
        ));
    }

    fn define_continuation(
        &mut self, types: &Types<CType, CField>, cont: Continuation, loc: Option<&CLocation>,
    ) {
        self.runtime(types);
        let names = Names::new(types);
        let Continuation { name, linkage, temps, body } = cont;
        let storage = storage(linkage);
        self.prototypes.push(format!("{storage}void {name}(void);"));

        let mut s = self.line(loc);
        let _ = writeln!(s, "{storage}void {name}(void) {{");
        if temps > 0 {
            let temps: Vec<_> = (0..temps).map(|t| Temp(t).to_string()).collect();
            let _ = writeln!(s, "    {} {};", types.word.spelling(), temps.join(", "));
        }
        names.block(&mut s, &body, 1);
        s.push('}');
        self.functions.push(s);
    }

    fn define_global(
        &mut self, types: &Types<CType, CField>, global: &CGlobal, closure: StaticClosure,
    ) {
        self.runtime(types);
        let def = self.globals.entry(global.name.clone()).or_default();
        def.linkage.get_or_insert(global.linkage);
        def.closure = Some(closure);
        def.names = Some(Names::new(types));
    }
}

impl fmt::Display for CBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#include <stdint.h>")?;
        writeln!(f)?;
        writeln!(f, "typedef intptr_t word;")?;
        writeln!(f, "typedef uintptr_t uword;")?;
        writeln!(f)?;

        for (name, _) in &self.structs {
            writeln!(f, "struct {name};")?;
        }
        for (name, fields) in &self.structs {
            let Some(fields) = fields else { continue };
            writeln!(f, "struct {name} {{")?;
            for CField { name, ty } in fields {
                writeln!(f, "    {};", ty.declare(name))?;
            }
            writeln!(f, "}};")?;
        }
        writeln!(f)?;

        if let Some(runtime) = &self.runtime {
            writeln!(f, "{runtime}")?;
        }

        for prototype in &self.prototypes {
            writeln!(f, "{prototype}")?;
        }
        if !self.prototypes.is_empty() {
            writeln!(f)?;
        }

        // one layout per global, sized by its slots
        for (name, def) in &self.globals {
            let linkage = def.linkage.unwrap_or(Linkage::Internal);
            let slots = def.closure.as_ref().map_or(1, |c| c.slots.max(1));
            let (info, freevars) = match &def.names {
                | Some(names) => (names.info.as_str(), names.freevars.as_str()),
                | None => ("info_table", "freevars"),
            };
            writeln!(
                f,
                "struct {name}_closure {{ struct info_table *{info}; struct closure *{freevars}[{slots}]; }};"
            )?;
            writeln!(f, "{}struct {name}_closure {name};", storage(linkage))?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }

        for table in &self.tables {
            writeln!(f, "{table}")?;
        }
        if !self.tables.is_empty() {
            writeln!(f)?;
        }

        for (name, def) in &self.globals {
            let (Some(closure), Some(names)) = (&def.closure, &def.names) else { continue };
            let fields = if closure.fields.is_empty() {
                "0".to_string()
            } else {
                closure
                    .fields
                    .iter()
                    .map(|s| names.closure(&Operand::Global(s.clone())))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            writeln!(
                f,
                "{}struct {name}_closure {name} = {{ .{} = &{}, .{} = {{ {fields} }} }};",
                storage(def.linkage.unwrap_or(Linkage::Internal)),
                names.info,
                closure.info,
                names.freevars,
            )?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }

        for function in &self.functions {
            writeln!(f, "{function}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}
