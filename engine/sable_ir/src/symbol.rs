//! Grammar production symbols.
//!
//! A production is written as a sequence of symbol names; terminal symbols
//! (token types) are distinguished from non-terminal symbols (rule heads) by
//! the reserved `$` prefix, e.g. `["term", "$plus", "sum"]`.

use std::fmt;
use std::sync::Arc;

/// Reserved prefix marking a symbol as terminal in a production.
pub const TERMINAL_PREFIX: char = '$';

/// Pattern that every rule head name must match.
///
/// Kept as a display string for diagnostics; the actual check is
/// [`is_valid_rule_name`].
pub const RULE_NAME_PATTERN: &str = "[a-zA-Z][a-zA-Z0-9_.#]*";

/// Check a rule head name against [`RULE_NAME_PATTERN`].
pub fn is_valid_rule_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#'))
}

/// One symbol of a grammar production.
///
/// Terminal symbols consume input (they refer to a token type); non-terminal
/// symbols refer to another rule head.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Symbol {
    Terminal(Arc<str>),
    NonTerminal(Arc<str>),
}

impl Symbol {
    /// Parse the surface syntax: a leading [`TERMINAL_PREFIX`] marks a
    /// terminal, anything else is a non-terminal head reference.
    pub fn parse(raw: &str) -> Symbol {
        match raw.strip_prefix(TERMINAL_PREFIX) {
            Some(ty) => Symbol::Terminal(ty.into()),
            None => Symbol::NonTerminal(raw.into()),
        }
    }

    /// The symbol's name, without the terminal prefix.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(name) => write!(f, "{TERMINAL_PREFIX}{name}"),
            Symbol::NonTerminal(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_terminal() {
        let sym = Symbol::parse("$int");
        assert!(sym.is_terminal());
        assert_eq!(sym.name(), "int");
        assert_eq!(sym.to_string(), "$int");
    }

    #[test]
    fn test_parse_non_terminal() {
        let sym = Symbol::parse("expr");
        assert!(!sym.is_terminal());
        assert_eq!(sym.name(), "expr");
        assert_eq!(sym.to_string(), "expr");
    }

    #[test]
    fn test_rule_name_validation() {
        assert!(is_valid_rule_name("expr"));
        assert!(is_valid_rule_name("json.value"));
        assert!(is_valid_rule_name("A1_b#c"));
        assert!(!is_valid_rule_name(""));
        assert!(!is_valid_rule_name("1expr"));
        assert!(!is_valid_rule_name("_expr"));
        assert!(!is_valid_rule_name("ex pr"));
        assert!(!is_valid_rule_name("$expr"));
    }
}
