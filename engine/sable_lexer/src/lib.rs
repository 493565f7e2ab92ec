//! Lexicon and tokenizer for the Sable engine.
//!
//! A [`Lexicon`] holds the token types of a language: name, matching
//! pattern, human-readable description and skip flag, in registration order.
//! A [`Lexer`] scans one immutable input against a lexicon, resolving
//! overlapping matches by start offset and registration-order priority.
//!
//! Input that no type matches is skipped silently; a lexicon that needs to
//! reject stray characters should register a catch-all "erroneous" type.

mod error;
mod lexer;
mod lexicon;

pub use error::LexiconError;
pub use lexer::Lexer;
pub use lexicon::{Lexicon, LexiconBuilder, TokenType, TypeId};
