//! Machine IR for the tagless execution model.
//!
//! Every piece of code is a [`Continuation`]: a named block taking no
//! arguments and returning nothing. Control passes between continuations
//! through a trampoline; values travel in two registers, `node` (the closure
//! being evaluated, or a returned constructor) and `r1` (an unboxed value,
//! returned with `node` cleared), and on the stack.

use derive_more::Display;
use tagless_syntax::PrimOpcode;

/* --------------------------------- Symbols -------------------------------- */

/// A linker-level name.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{_0}")]
pub struct Symbol(String);

/// Escape a source name into the identifier alphabet.
/// `_` doubles so that single underscores stay free for generated suffixes.
pub fn mangle(name: &str) -> String {
    let mut s = String::new();
    for c in name.chars() {
        match c {
            | '_' => s += "__",
            | '\'' => s += "_q",
            | c if c.is_ascii_alphanumeric() => s.push(c),
            | c => {
                let mut buf = [0; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    s += &format!("_x{b:02x}");
                }
            }
        }
    }
    s
}

impl Symbol {
    /// The closure of a top-level binding.
    pub fn global(name: &str) -> Self {
        Symbol(format!("g_{}", mangle(name)))
    }
    /// The info table prefix of a constructor with `arity` fields.
    pub fn constructor(name: &str, arity: usize) -> Self {
        Symbol(format!("con_{}_{arity}", mangle(name)))
    }
    /// Support code shared by every program.
    pub fn builtin(name: &str) -> Self {
        Symbol(format!("stg_{name}"))
    }
    /// An exported, unmangled name.
    pub fn export(name: &str) -> Self {
        Symbol(name.to_string())
    }
    /// A lambda nested in the template `self`.
    pub fn nested(&self, n: usize, name: &str) -> Self {
        Symbol(format!("{self}_l{n}_{}", mangle(name)))
    }
    /// A case continuation of the template `self`.
    pub fn continuation(&self, n: usize) -> Self {
        Symbol(format!("{self}_k{n}"))
    }
    pub fn info(&self) -> Self {
        self.suffix("info")
    }
    pub fn entry(&self) -> Self {
        self.suffix("entry")
    }
    pub fn evac(&self) -> Self {
        self.suffix("evac")
    }
    pub fn scav(&self) -> Self {
        self.suffix("scav")
    }
    pub fn update(&self) -> Self {
        self.suffix("update")
    }
    fn suffix(&self, suffix: &str) -> Self {
        Symbol(format!("{self}_{suffix}"))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/* ---------------------------------- Code ---------------------------------- */

/// A function-local temporary; every temporary holds one machine word.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("t{_0}")]
pub struct Temp(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// the closure under evaluation
    Node,
    /// the unboxed return register
    R1,
    Temp(Temp),
    /// slot `i` of the closure under evaluation
    Free(usize),
    /// the address of a static closure
    Global(Symbol),
    Int(i64),
    /// the bit pattern of a double
    Double(f64),
    Null,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rvalue {
    Use(Operand),
    /// slot `i` of a closure
    Field(Operand, usize),
    /// the payload of a literal box
    Unbox(Operand),
    /// a fresh closure; `fields` fill the first slots, `slots >= fields.len()`
    Alloc { info: Symbol, fields: Vec<Operand>, slots: usize },
    Pop,
    Prim(PrimOpcode, Vec<Operand>),
    /// the returned value as a closure: `node`, or `r1` boxed when `node` is null
    Returned,
    /// the new address of a closure after garbage collection
    Evacuate(Operand),
    /// copy `node` with its first `slots` slots into to-space
    Copy(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cond {
    InfoIs(Operand, Symbol),
    Equals(Operand, Operand),
    IsNull(Operand),
    NonNull(Operand),
    And(Vec<Cond>),
}

pub type Block = Vec<Stmt>;

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Assign(Temp, Rvalue),
    Store { base: Operand, slot: usize, value: Operand },
    SetInfo { base: Operand, info: Symbol },
    Push(Operand),
    PushCont(Symbol),
    SetR1(Operand),
    SetNode(Operand),
    /// bail out to a partial application unless `n` arguments are on the stack
    ArgCheck(usize),
    /// the first arm whose condition holds runs, otherwise `default`
    Match { arms: Vec<(Cond, Block)>, default: Block },
    // transfers
    Enter(Operand),
    /// pop a continuation and jump to it
    Return,
    Fail(String),
    /// return to the runtime; ends garbage collection hooks
    Done,
}

impl Stmt {
    pub fn is_transfer(&self) -> bool {
        match self {
            | Stmt::Enter(_) | Stmt::Return | Stmt::Fail(_) | Stmt::Done => true,
            | Stmt::Match { arms, default } => {
                arms.iter().all(|(_, block)| ends_in_transfer(block)) && ends_in_transfer(default)
            }
            | _ => false,
        }
    }
}

pub fn ends_in_transfer(block: &Block) -> bool {
    block.last().is_some_and(Stmt::is_transfer)
}

/* -------------------------------- Top Level ------------------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Linkage {
    Internal,
    Exported,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Continuation {
    pub name: Symbol,
    pub linkage: Linkage,
    /// number of temporaries used by `body`
    pub temps: u32,
    pub body: Block,
}

/// The static descriptor shared by every closure of one template.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoTable {
    pub name: Symbol,
    pub entry: Symbol,
    pub arity: usize,
    pub evacuation: Symbol,
    pub scavenge: Symbol,
}

/// The initializer of a top-level closure.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticClosure {
    pub info: Symbol,
    pub fields: Vec<Symbol>,
    pub slots: usize,
}
