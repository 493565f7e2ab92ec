//! Grammar construction errors and the surfaced syntax failure.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use sable_diagnostic::{line_col, Diagnostic, ErrorCode};
use sable_ir::{Span, RULE_NAME_PATTERN};

/// Build-time grammar errors. Fail fast at registration.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The head name does not match the required naming pattern.
    #[error("invalid rule name `{name}` (must match {})", RULE_NAME_PATTERN)]
    InvalidRuleName { name: String },

    /// The rule closes a cycle of "first symbol is a non-terminal" edges.
    /// `head -> first` is the closing edge.
    #[error("rule `{head}` closes an infinite left-recursion cycle through `{first}`")]
    LeftRecursion { head: String, first: String },
}

impl GrammarError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GrammarError::InvalidRuleName { .. } => ErrorCode::E1001,
            GrammarError::LeftRecursion { .. } => ErrorCode::E1002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code()).with_message(self.to_string())
    }
}

/// One terminal the parser expected at the failure offset.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExpectedTerminal {
    pub type_name: Arc<str>,
    pub description: Arc<str>,
}

/// Total parse failure, built from the furthest failure observed while
/// backtracking: the offset, everything that was expected there, and what
/// the input actually held.
#[derive(Clone, Debug)]
pub struct SyntaxError {
    /// Terminal types expected at the failure offset. Empty when the only
    /// acceptable continuation was end of input.
    pub expected: Vec<ExpectedTerminal>,
    /// The offending text; empty at end of input.
    pub found: Box<str>,
    /// Byte offset of the failure.
    pub offset: u32,
    /// 1-based line of the failure.
    pub line: u32,
    /// 1-based column of the failure.
    pub column: u32,
    /// The full source that was being parsed.
    pub source_text: Arc<str>,
}

impl SyntaxError {
    pub(crate) fn new(
        expected: Vec<ExpectedTerminal>,
        found: Box<str>,
        offset: u32,
        source_text: Arc<str>,
    ) -> Self {
        let position = line_col(&source_text, offset);
        SyntaxError {
            expected,
            found,
            offset,
            line: position.line,
            column: position.column,
            source_text,
        }
    }

    fn found_display(&self) -> String {
        if self.found.is_empty() {
            "end of input".to_string()
        } else {
            format!("`{}`", self.found)
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::E1003
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let end = self.offset + u32::try_from(self.found.len()).unwrap_or(0);
        let mut diag = Diagnostic::error(self.code())
            .with_message(format!("unexpected symbol: found {}", self.found_display()))
            .with_label(Span::new(self.offset, end), "here");
        for exp in &self.expected {
            diag = diag.with_note(format!("expected {} (`{}`)", exp.description, exp.type_name));
        }
        if self.expected.is_empty() {
            diag = diag.with_note("expected end of input");
        }
        diag
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected symbol at line {}, column {}: found {}",
            self.line,
            self.column,
            self.found_display()
        )?;
        if self.expected.is_empty() {
            write!(f, ", expected end of input")?;
        } else {
            write!(f, ", expected ")?;
            for (i, exp) in self.expected.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{}", exp.description)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new(
            vec![ExpectedTerminal {
                type_name: "a".into(),
                description: "the letter a".into(),
            }],
            "b".into(),
            2,
            "aab".into(),
        );
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 3);
        assert_eq!(
            err.to_string(),
            "unexpected symbol at line 1, column 3: found `b`, expected the letter a"
        );
    }

    #[test]
    fn test_syntax_error_end_of_input() {
        let err = SyntaxError::new(Vec::new(), "".into(), 3, "abc".into());
        assert!(err.to_string().contains("end of input"));
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E1003);
    }
}
