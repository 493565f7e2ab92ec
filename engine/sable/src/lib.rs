//! Sable: a reusable engine for building custom text-processing languages.
//!
//! A language is three declarations: a lexicon (token types with matching
//! patterns), a grammar (rule heads over terminal/non-terminal symbols,
//! `$`-prefix marking terminals) and a table of semantic actions bound to
//! token types and rule patterns. [`Compiler::builder`] assembles and
//! validates all three; [`Compiler::compile`] then tokenizes, parses and
//! walks the syntax tree to a final value.
//!
//! ```
//! use sable::{ActionError, Actions, Compiler, Outcome};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let compiler: Compiler<i64> = Compiler::builder()
//!     .token_type("int", "[0-9]+", "integer literal")?
//!     .token_type("plus", r"\+", "plus operator")?
//!     .skip_type("ws", r"[ \t\n]+", "whitespace")?
//!     .rule("sum", &["term", "$plus", "sum"])?
//!     .rule("sum", &["term"])?
//!     .rule("term", &["$int"])?
//!     .actions(
//!         Actions::new("calc")
//!             .terminal("int", |node| {
//!                 node.text()
//!                     .parse::<i64>()
//!                     .map(Outcome::Value)
//!                     .map_err(|e| ActionError::with_cause("invalid integer literal", e))
//!             })
//!             .rule("sum", &[], |_, values| Ok(Outcome::Value(values.iter().sum()))),
//!     )
//!     .build()?;
//!
//! assert_eq!(compiler.compile("1 + 2 + 39")?, Some(42));
//! # Ok(())
//! # }
//! ```
//!
//! Once built, a compiler is immutable: the lexicon, grammar and bindings
//! can be shared freely across threads, and every `compile` call owns its
//! lexer, memoization table and failure tracker.

mod compiler;

#[cfg(test)]
mod tests;

pub use compiler::{BuildError, CompileError, Compiler, CompilerBuilder};

pub use sable_diagnostic::{Diagnostic, ErrorCode, Label, LineCol, Severity};
pub use sable_ir::{Span, Symbol};
pub use sable_lexer::{Lexer, Lexicon, LexiconBuilder, LexiconError, TokenType};
pub use sable_parse::{
    ExpectedTerminal, Grammar, GrammarError, NodeRef, Parser, SyntaxError, SyntaxTree,
};
pub use sable_semantic::{
    ActionError, ActionResult, Actions, AnalyzeError, BindError, Dispatcher, Outcome,
    SemanticError,
};
