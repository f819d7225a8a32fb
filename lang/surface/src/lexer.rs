use crate::err::SyntaxError;
use logos::{Logos, SpannedIter};
use std::fmt::Display;

#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(subpattern ident = r"[a-zA-Z0-9_']")]
pub enum Tok<'input> {
    /// line comments; outranks `PrimSym`, which also matches `--#`
    #[regex(r"--[^\n]*", logos::skip, priority = 10)]
    Comment,

    #[regex(r"[A-Z](?&ident)*")]
    UpperIdent(&'input str),
    #[regex(r"[a-z_](?&ident)*")]
    LowerIdent(&'input str),

    #[token("let")]
    Let,
    #[token("letrec")]
    Letrec,
    #[token("in")]
    In,
    #[token("case")]
    Case,
    #[token("of")]
    Of,
    #[token("default")]
    Default,

    #[regex(r"-?[0-9]+#")]
    IntLit(&'input str),
    #[regex(r"-?[0-9]+(\.[0-9]+([eE][-+]?[0-9]+)?|[eE][-+]?[0-9]+)#")]
    DoubleLit(&'input str),
    #[regex(r"[-+*/%<>|&^=~]+#")]
    PrimSym(&'input str),

    #[token("\\")]
    Backslash,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Equals,
    #[token("->")]
    Arrow,
}

impl Display for Tok<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            | Tok::Comment => write!(f, "--"),
            | Tok::UpperIdent(s) => write!(f, "UpperIdent({})", s),
            | Tok::LowerIdent(s) => write!(f, "LowerIdent({})", s),
            | Tok::Let => write!(f, "let"),
            | Tok::Letrec => write!(f, "letrec"),
            | Tok::In => write!(f, "in"),
            | Tok::Case => write!(f, "case"),
            | Tok::Of => write!(f, "of"),
            | Tok::Default => write!(f, "default"),
            | Tok::IntLit(s) => write!(f, "IntLit({})", s),
            | Tok::DoubleLit(s) => write!(f, "DoubleLit({})", s),
            | Tok::PrimSym(s) => write!(f, "PrimSym({})", s),
            | Tok::Backslash => write!(f, "\\"),
            | Tok::BraceOpen => write!(f, "{{"),
            | Tok::BraceClose => write!(f, "}}"),
            | Tok::Comma => write!(f, ","),
            | Tok::Semicolon => write!(f, ";"),
            | Tok::Equals => write!(f, "="),
            | Tok::Arrow => write!(f, "->"),
        }
    }
}

pub struct Lexer<'source> {
    source: &'source str,
    inner: SpannedIter<'source, Tok<'source>>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self { source, inner: Tok::lexer(source).spanned() }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<(usize, Tok<'source>, usize), SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            | (Ok(tok), range) => Some(Ok((range.start, tok, range.end))),
            | (Err(()), range) => {
                let text = &self.source[range.clone()];
                Some(Err(SyntaxError::new(
                    format!("invalid token `{}`", text),
                    range.start,
                    range.end,
                )))
            }
        }
    }
}
