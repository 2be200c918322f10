//! Token cursor for navigating the token stream.

use vine_ir::{Name, Span, StringInterner, Token, TokenFlags, TokenKind, TokenList};

use crate::ParseError;

static EOF: Token = Token::new(TokenKind::Eof, Span::DUMMY);

/// Position in a token list with lookahead and consumption helpers.
///
/// Reads past the end yield the list's final token (always `Eof` for lexer
/// output), so callers never index out of bounds.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    interner: &'a StringInterner,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        Cursor {
            tokens,
            interner,
            pos: 0,
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        self.nth(0)
    }

    /// The token `n` positions ahead of the current one.
    pub fn nth(&self, n: usize) -> &'a Token {
        let tokens = self.tokens.as_slice();
        tokens
            .get(self.pos + n)
            .or_else(|| tokens.last())
            .unwrap_or(&EOF)
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub fn peek_kind(&self) -> TokenKind {
        self.nth(1).kind
    }

    pub fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|prev| self.tokens.get(prev))
            .map_or(Span::DUMMY, |token| token.span)
    }

    /// Whether a line break separates the current token from the previous one.
    #[inline]
    pub fn newline_before(&self) -> bool {
        self.tokens
            .flags(self.pos)
            .contains(TokenFlags::NEWLINE_BEFORE)
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Compare token kinds by variant, ignoring literal payloads.
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current_kind()) == std::mem::discriminant(kind)
    }

    pub fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|kind| self.check(kind))
    }

    pub fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` or fail naming what was expected.
    pub fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("`{}`", kind.describe())))
        }
    }

    pub fn expect_ident(&mut self) -> Result<Name, ParseError> {
        if let TokenKind::Ident(name) = self.current_kind() {
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// Error for the current token; at end of input the error is incomplete.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        if matches!(token.kind, TokenKind::Eof) {
            ParseError::incomplete(
                format!("unexpected end of input, expected {expected}"),
                token.span,
            )
        } else {
            ParseError::new(
                format!("unexpected {}, expected {expected}", token.kind),
                token.span,
            )
        }
    }
}
