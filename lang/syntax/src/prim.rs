//! The primitive operations on unboxed values and their symbols.

use std::fmt;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitAnd,
    BitXor,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    Invert,
    Negate,
}

static FROM_SYMBOL: phf::Map<&'static str, PrimOpcode> = phf::phf_map! {
    "+#" => PrimOpcode::Add,
    "-#" => PrimOpcode::Sub,
    "*#" => PrimOpcode::Mul,
    "/#" => PrimOpcode::Div,
    "%#" => PrimOpcode::Mod,
    "**#" => PrimOpcode::Pow,
    "<<#" => PrimOpcode::LShift,
    ">>#" => PrimOpcode::RShift,
    "|#" => PrimOpcode::BitOr,
    "&#" => PrimOpcode::BitAnd,
    "^#" => PrimOpcode::BitXor,
    "<#" => PrimOpcode::Lt,
    "<=#" => PrimOpcode::Le,
    "==#" => PrimOpcode::Eq,
    "/=#" => PrimOpcode::Ne,
    ">=#" => PrimOpcode::Ge,
    ">#" => PrimOpcode::Gt,
    "~#" => PrimOpcode::Invert,
    "~-#" => PrimOpcode::Negate,
};

impl PrimOpcode {
    pub const ALL: [PrimOpcode; 19] = [
        PrimOpcode::Add,
        PrimOpcode::Sub,
        PrimOpcode::Mul,
        PrimOpcode::Div,
        PrimOpcode::Mod,
        PrimOpcode::Pow,
        PrimOpcode::LShift,
        PrimOpcode::RShift,
        PrimOpcode::BitOr,
        PrimOpcode::BitAnd,
        PrimOpcode::BitXor,
        PrimOpcode::Lt,
        PrimOpcode::Le,
        PrimOpcode::Eq,
        PrimOpcode::Ne,
        PrimOpcode::Ge,
        PrimOpcode::Gt,
        PrimOpcode::Invert,
        PrimOpcode::Negate,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            | PrimOpcode::Add => "+#",
            | PrimOpcode::Sub => "-#",
            | PrimOpcode::Mul => "*#",
            | PrimOpcode::Div => "/#",
            | PrimOpcode::Mod => "%#",
            | PrimOpcode::Pow => "**#",
            | PrimOpcode::LShift => "<<#",
            | PrimOpcode::RShift => ">>#",
            | PrimOpcode::BitOr => "|#",
            | PrimOpcode::BitAnd => "&#",
            | PrimOpcode::BitXor => "^#",
            | PrimOpcode::Lt => "<#",
            | PrimOpcode::Le => "<=#",
            | PrimOpcode::Eq => "==#",
            | PrimOpcode::Ne => "/=#",
            | PrimOpcode::Ge => ">=#",
            | PrimOpcode::Gt => ">#",
            | PrimOpcode::Invert => "~#",
            | PrimOpcode::Negate => "~-#",
        }
    }

    /// Look up an opcode by its symbol; unknown symbols yield `None`.
    pub fn from_symbol(symbol: &str) -> Option<PrimOpcode> {
        FROM_SYMBOL.get(symbol).copied()
    }

    pub fn arity(self) -> usize {
        match self {
            | PrimOpcode::Invert | PrimOpcode::Negate => 1,
            | _ => 2,
        }
    }

    /// Whether the result is a truth value (`1#` or `0#`).
    pub fn is_comparison(self) -> bool {
        use PrimOpcode::*;
        matches!(self, Lt | Le | Eq | Ne | Ge | Gt)
    }
}

impl fmt::Display for PrimOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
