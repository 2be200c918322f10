//! Lexer output: token kinds, per-token flags and the token list.

use std::fmt;

use bitflags::bitflags;

use crate::{Name, Span};

/// A single token.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Token kinds.
///
/// Literals carry their decoded payload; string literals and identifiers are
/// interned.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(Name),
    Ident(Name),

    // Keywords
    Fn,
    Let,
    Cst,
    If,
    Else,
    Return,
    For,
    In,
    Break,
    Continue,
    Use,
    As,
    Pick,
    Task,
    Expose,
    Typeof,
    True,
    False,
    Nil,
    End,
    Switch,
    Case,
    Default,
    Wait,
    To,
    Catch,
    And,
    Or,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Bang,
    AmpAmp,
    PipePipe,

    // Delimiters
    Comma,
    Semicolon,
    Dot,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    /// Human-readable description used in parser errors.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Str(_) => "string",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Eof => "end of input",
            other => other.symbol(),
        }
    }

    /// Source spelling of keywords, operators and delimiters.
    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Fn => "fn",
            TokenKind::Let => "let",
            TokenKind::Cst => "cst",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Return => "return",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Use => "use",
            TokenKind::As => "as",
            TokenKind::Pick => "pick",
            TokenKind::Task => "task",
            TokenKind::Expose => "expose",
            TokenKind::Typeof => "typeof",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Nil => "nil",
            TokenKind::End => "end",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Wait => "wait",
            TokenKind::To => "to",
            TokenKind::Catch => "catch",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Bang => "!",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::Ident(_)
            | TokenKind::Eof => "",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(v) => write!(f, "{v}"),
            TokenKind::Float(v) => write!(f, "{v}"),
            TokenKind::Str(_) | TokenKind::Ident(_) | TokenKind::Eof => {
                f.write_str(self.describe())
            }
            other => write!(f, "`{}`", other.symbol()),
        }
    }
}

bitflags! {
    /// Trivia that preceded a token.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// Spaces or tabs preceded this token.
        const SPACE_BEFORE = 1 << 0;
        /// A line break (possibly after a comment) preceded this token.
        const NEWLINE_BEFORE = 1 << 1;
    }
}

/// Tokens of one source file, terminated by an `Eof` token.
///
/// Flags are kept in a parallel array so the common path (kind checks) stays
/// on the compact `Token` vector.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
    flags: Vec<TokenFlags>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TokenList {
            tokens: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, token: Token, flags: TokenFlags) {
        self.tokens.push(token);
        self.flags.push(flags);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Flags for the token at `index` (empty past the end).
    #[inline]
    pub fn flags(&self, index: usize) -> TokenFlags {
        self.flags.get(index).copied().unwrap_or_default()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_keywords_and_literals() {
        assert_eq!(TokenKind::End.describe(), "end");
        assert_eq!(TokenKind::PlusAssign.describe(), "+=");
        assert_eq!(TokenKind::Int(3).describe(), "integer");
        assert_eq!(TokenKind::Eof.describe(), "end of input");
    }

    #[test]
    fn display_quotes_symbols() {
        assert_eq!(TokenKind::Colon.to_string(), "`:`");
        assert_eq!(TokenKind::Int(42).to_string(), "42");
        assert_eq!(TokenKind::Ident(Name::EMPTY).to_string(), "identifier");
    }

    #[test]
    fn token_list_flags_parallel() {
        let mut list = TokenList::new();
        list.push(Token::new(TokenKind::Let, Span::new(0, 3)), TokenFlags::empty());
        list.push(
            Token::new(TokenKind::Ident(Name::EMPTY), Span::new(4, 5)),
            TokenFlags::SPACE_BEFORE,
        );
        assert_eq!(list.len(), 2);
        assert_eq!(list.flags(1), TokenFlags::SPACE_BEFORE);
        assert_eq!(list.flags(9), TokenFlags::empty());
    }
}
