//! Shared front-end types for vine.
//!
//! Everything the lexer, parser and evaluator exchange lives here:
//!
//! - [`Span`]: byte range into a source file
//! - [`Name`] / [`StringInterner`]: interned identifiers and string literals
//! - [`Token`], [`TokenKind`], [`TokenList`]: lexer output
//! - [`ast`]: the immutable syntax tree produced by the parser
//!
//! The tree is `Send + Sync`: function bodies and continuation blocks are held
//! behind `Arc` so closures and tasks can carry them onto worker threads.

pub mod ast;
mod name;
mod span;
mod token;

pub use name::{Name, SharedInterner, StringInterner};
pub use span::Span;
pub use token::{Token, TokenFlags, TokenKind, TokenList};
