use std::fmt;

/// Error codes for all engine diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E0xxx: Lexicon construction errors
/// - E1xxx: Grammar construction and parse errors
/// - E2xxx: Action binding errors
/// - E3xxx: Semantic analysis errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexicon errors (E0xxx)
    /// Token type pattern failed to compile
    E0001,
    /// Token type name registered twice
    E0002,
    /// Token type pattern can match the empty string
    E0003,

    // Grammar / parse errors (E1xxx)
    /// Rule head name does not match the required pattern
    E1001,
    /// Rule closes an infinite left-recursion cycle
    E1002,
    /// Unexpected symbol in the input
    E1003,

    // Binding errors (E2xxx)
    /// Terminal action bound to an unknown token type
    E2001,
    /// Non-terminal action bound to an unknown rule or alternative prefix
    E2002,
    /// Conflicting terminal actions for one token type
    E2003,
    /// Conflicting non-terminal actions for one rule pattern
    E2004,
    /// Axiom action declared as buffer-keeping
    E2005,

    // Semantic errors (E3xxx)
    /// Semantic action reported a domain error
    E3001,
    /// Axiom left more than one result in the buffer
    E3002,
}

impl ErrorCode {
    /// The stable code string, e.g. `"E1002"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
        }
    }

    /// One-line description of the error class.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "invalid token pattern",
            ErrorCode::E0002 => "duplicate token type",
            ErrorCode::E0003 => "token pattern matches the empty string",
            ErrorCode::E1001 => "invalid rule name",
            ErrorCode::E1002 => "infinite left recursion",
            ErrorCode::E1003 => "unexpected symbol",
            ErrorCode::E2001 => "unknown token type in binding",
            ErrorCode::E2002 => "unknown rule in binding",
            ErrorCode::E2003 => "conflicting terminal bindings",
            ErrorCode::E2004 => "conflicting rule bindings",
            ErrorCode::E2005 => "axiom action must clear the buffer",
            ErrorCode::E3001 => "semantic error",
            ErrorCode::E3002 => "axiom produced multiple results",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code_strings() {
        assert_eq!(ErrorCode::E1002.as_str(), "E1002");
        assert_eq!(ErrorCode::E1002.to_string(), "E1002");
        assert_eq!(ErrorCode::E3002.description(), "axiom produced multiple results");
    }
}
