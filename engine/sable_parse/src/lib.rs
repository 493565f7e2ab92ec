//! Grammar table and backtracking parser for the Sable engine.
//!
//! A [`Grammar`] stores ordered rule alternatives per head and rejects
//! infinite left recursion at registration time. The [`Parser`] matches the
//! grammar's axiom over a lexer's input with ordered choice, packrat
//! memoization and furthest-failure diagnostics, producing an immutable
//! [`SyntaxTree`] that the semantic layer walks.
//!
//! Backtracking is internal and non-exceptional: a failed alternative is an
//! ordinary "no match" outcome. Only total failure surfaces, as one
//! [`SyntaxError`] built from the furthest failure observed.

mod error;
mod grammar;
mod parser;
mod tree;

#[cfg(test)]
mod tests;

pub use error::{ExpectedTerminal, GrammarError, SyntaxError};
pub use grammar::{Grammar, HeadId, Production};
pub use parser::Parser;
pub use tree::{Children, NodeId, NodeRef, SyntaxTree};
