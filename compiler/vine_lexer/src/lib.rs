//! Lexer for vine using logos with string interning.
//!
//! Produces a [`TokenList`] terminated by `Eof`. Whitespace, newlines and
//! `#` comments never become tokens; they are folded into the
//! [`TokenFlags`] of the token that follows them, which the parser uses to
//! tell `f\n(x)` (two statements) from `f(x)` (a call).

use logos::Logos;
use thiserror::Error;
use vine_diagnostic::{Diagnostic, LineIndex, Location};
use vine_ir::{Span, StringInterner, Token, TokenFlags, TokenKind, TokenList};

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
    #[regex(r"[ \t\r]+")]
    Whitespace,
    #[token("\n")]
    Newline,
    #[regex(r"#[^\n]*")]
    Comment,

    #[token("fn")]
    Fn,
    #[token("let")]
    Let,
    #[token("cst")]
    Cst,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("use")]
    Use,
    #[token("as")]
    As,
    #[token("pick")]
    Pick,
    #[token("task")]
    Task,
    #[token("expose")]
    Expose,
    #[token("typeof")]
    Typeof,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("end")]
    End,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("wait")]
    Wait,
    #[token("to")]
    To,
    #[token("catch")]
    Catch,
    #[token("and")]
    And,
    #[token("or")]
    Or,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

/// Lexing failure. Lexing stops at the first one.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub span: Span,
    /// Input ended inside a token; more text could complete it.
    incomplete: bool,
}

impl LexError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        LexError {
            message: message.into(),
            span,
            incomplete: false,
        }
    }

    /// Whether the error comes from input that stopped too early, such as
    /// an open string literal.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    /// Resolve against the source it came from.
    pub fn to_diagnostic(&self, file: &str, source: &str) -> Diagnostic {
        let (line, column) = LineIndex::new(source).span_start(source, self.span);
        Diagnostic::lexer(self.message.clone()).with_location(Location::new(file, line, column))
    }
}

/// Lex source code into a token list.
pub fn lex(source: &str, interner: &StringInterner) -> Result<TokenList, LexError> {
    let mut result = TokenList::with_capacity(source.len() / 4);
    let mut logos = RawToken::lexer(source);
    let mut pending = TokenFlags::empty();

    while let Some(token_result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();

        let raw = token_result.map_err(|()| classify_error(slice, span))?;
        match raw {
            RawToken::Whitespace => pending |= TokenFlags::SPACE_BEFORE,
            RawToken::Newline => pending |= TokenFlags::NEWLINE_BEFORE,
            RawToken::Comment => {}
            _ => {
                let kind = convert_token(raw, slice, interner, span)?;
                result.push(Token::new(kind, span), pending);
                pending = TokenFlags::empty();
            }
        }
    }

    let eof = Span::point(u32::try_from(source.len()).unwrap_or(u32::MAX));
    result.push(Token::new(TokenKind::Eof, eof), pending);
    Ok(result)
}

fn classify_error(slice: &str, span: Span) -> LexError {
    if slice.starts_with('"') {
        LexError {
            incomplete: true,
            ..LexError::new("unterminated string literal", span)
        }
    } else if slice.bytes().all(|b| b.is_ascii_digit()) && !slice.is_empty() {
        LexError::new(format!("integer literal {slice} is too large"), span)
    } else {
        LexError::new(format!("unexpected character '{slice}'"), span)
    }
}

/// Convert a raw token to a `TokenKind`, interning strings.
fn convert_token(
    raw: RawToken,
    slice: &str,
    interner: &StringInterner,
    span: Span,
) -> Result<TokenKind, LexError> {
    let kind = match raw {
        RawToken::Int(n) => TokenKind::Int(n),
        RawToken::Float(f) => TokenKind::Float(f),
        RawToken::Str => {
            let content = slice
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or_default();
            let text = unescape_string(content).map_err(|msg| LexError::new(msg, span))?;
            TokenKind::Str(interner.intern(&text))
        }
        RawToken::Ident => TokenKind::Ident(interner.intern(slice)),

        RawToken::Fn => TokenKind::Fn,
        RawToken::Let => TokenKind::Let,
        RawToken::Cst => TokenKind::Cst,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::Return => TokenKind::Return,
        RawToken::For => TokenKind::For,
        RawToken::In => TokenKind::In,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::Use => TokenKind::Use,
        RawToken::As => TokenKind::As,
        RawToken::Pick => TokenKind::Pick,
        RawToken::Task => TokenKind::Task,
        RawToken::Expose => TokenKind::Expose,
        RawToken::Typeof => TokenKind::Typeof,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Nil => TokenKind::Nil,
        RawToken::End => TokenKind::End,
        RawToken::Switch => TokenKind::Switch,
        RawToken::Case => TokenKind::Case,
        RawToken::Default => TokenKind::Default,
        RawToken::Wait => TokenKind::Wait,
        RawToken::To => TokenKind::To,
        RawToken::Catch => TokenKind::Catch,
        RawToken::And => TokenKind::And,
        RawToken::Or => TokenKind::Or,

        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Assign => TokenKind::Assign,
        RawToken::PlusAssign => TokenKind::PlusAssign,
        RawToken::MinusAssign => TokenKind::MinusAssign,
        RawToken::StarAssign => TokenKind::StarAssign,
        RawToken::SlashAssign => TokenKind::SlashAssign,
        RawToken::PlusPlus => TokenKind::PlusPlus,
        RawToken::MinusMinus => TokenKind::MinusMinus,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Bang => TokenKind::Bang,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,

        RawToken::Comma => TokenKind::Comma,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Colon => TokenKind::Colon,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,

        RawToken::Whitespace | RawToken::Newline | RawToken::Comment => {
            return Err(LexError::new("unexpected trivia", span));
        }
    };
    Ok(kind)
}

/// Process escape sequences in a string literal body.
fn unescape_string(s: &str) -> Result<String, String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('0') => result.push('\0'),
            Some(other) => return Err(format!("invalid escape sequence '\\{other}'")),
            None => return Err("string literal ends with a lone backslash".to_owned()),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str, interner: &StringInterner) -> Vec<TokenKind> {
        lex(source, interner)
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_basic() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        assert_eq!(
            kinds("let x = 42", &interner),
            vec![
                TokenKind::Let,
                TokenKind::Ident(x),
                TokenKind::Assign,
                TokenKind::Int(42),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_keywords_and_compound_operators() {
        let interner = StringInterner::new();
        assert_eq!(
            kinds("task fn end wait to catch += ++ <= != &&", &interner),
            vec![
                TokenKind::Task,
                TokenKind::Fn,
                TokenKind::End,
                TokenKind::Wait,
                TokenKind::To,
                TokenKind::Catch,
                TokenKind::PlusAssign,
                TokenKind::PlusPlus,
                TokenKind::LtEq,
                TokenKind::NotEq,
                TokenKind::AmpAmp,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        let interner = StringInterner::new();
        assert_eq!(
            kinds("7 3.5 0", &interner),
            vec![
                TokenKind::Int(7),
                TokenKind::Float(3.5),
                TokenKind::Int(0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_string_escapes() {
        let interner = StringInterner::new();
        let tokens = lex(r#""a\tb\n\"q\"""#, &interner).unwrap();
        let TokenKind::Str(name) = tokens.get(0).unwrap().kind else {
            panic!("expected string token");
        };
        assert_eq!(interner.lookup(name), "a\tb\n\"q\"");
    }

    #[test]
    fn comments_and_newlines_become_flags() {
        let interner = StringInterner::new();
        let tokens = lex("a # note\n  (b)", &interner).unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(tokens.flags(1).contains(TokenFlags::NEWLINE_BEFORE));
        assert!(tokens.flags(1).contains(TokenFlags::SPACE_BEFORE));
        assert_eq!(tokens.flags(2), TokenFlags::empty());
    }

    #[test]
    fn identifier_prefixed_by_keyword() {
        let interner = StringInterner::new();
        let ending = interner.intern("ending");
        let format = interner.intern("format");
        assert_eq!(
            kinds("ending format", &interner),
            vec![TokenKind::Ident(ending), TokenKind::Ident(format), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string() {
        let interner = StringInterner::new();
        let err = lex("let s = \"open", &interner).unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.span.start, 8);
        assert!(err.is_incomplete());
    }

    #[test]
    fn unexpected_character_diagnostic() {
        let interner = StringInterner::new();
        let source = "let a = 1\nlet b = @";
        let err = lex(source, &interner).unwrap_err();
        let diag = err.to_diagnostic("main.vine", source);
        assert_eq!(
            diag.to_string(),
            "[Line 2, Column 9] Lexer Error: unexpected character '@'"
        );
    }

    #[test]
    fn integer_overflow() {
        let interner = StringInterner::new();
        let err = lex("99999999999999999999", &interner).unwrap_err();
        assert!(err.message.contains("too large"));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn invalid_escape() {
        let interner = StringInterner::new();
        let err = lex(r#""\q""#, &interner).unwrap_err();
        assert_eq!(err.message, "invalid escape sequence '\\q'");
    }
}
