//! The registered token-type set of a language.

use std::sync::Arc;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::LexiconError;

/// Index of a token type in its [`Lexicon`], in registration order.
///
/// Registration order doubles as priority: when several types match at the
/// same offset, the earliest-registered one is the default.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> TypeId {
        // Lexicon sizes are far below u32::MAX.
        TypeId(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// One registered token type. Immutable once added.
#[derive(Clone, Debug)]
pub struct TokenType {
    name: Arc<str>,
    pattern: Regex,
    description: Arc<str>,
    skip: bool,
}

impl TokenType {
    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The source text of the matching pattern.
    #[inline]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[inline]
    pub fn description(&self) -> &Arc<str> {
        &self.description
    }

    /// Skippable types are silently discarded when they win a scan position.
    #[inline]
    pub fn skip(&self) -> bool {
        self.skip
    }

    #[inline]
    pub(crate) fn regex(&self) -> &Regex {
        &self.pattern
    }
}

/// Builder for a [`Lexicon`]. The type set can be reset and rebuilt; once
/// built, the lexicon is immutable and freely shareable.
#[derive(Default, Debug)]
pub struct LexiconBuilder {
    types: Vec<TokenType>,
    by_name: FxHashMap<Arc<str>, TypeId>,
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token type.
    ///
    /// Fails if the name is taken, the pattern does not compile, or the
    /// pattern can match the empty string (zero-length tokens would stall
    /// the scanner).
    pub fn add_type(
        &mut self,
        name: &str,
        pattern: &str,
        description: &str,
        skip: bool,
    ) -> Result<(), LexiconError> {
        if self.by_name.contains_key(name) {
            return Err(LexiconError::DuplicateType {
                name: name.to_string(),
            });
        }
        let regex = Regex::new(pattern).map_err(|e| LexiconError::InvalidPattern {
            name: name.to_string(),
            source: Box::new(e),
        })?;
        if regex.is_match("") {
            return Err(LexiconError::MatchesEmpty {
                name: name.to_string(),
            });
        }

        let name: Arc<str> = name.into();
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.types.push(TokenType {
            name: Arc::clone(&name),
            pattern: regex,
            description: description.into(),
            skip,
        });
        self.by_name.insert(name, id);
        Ok(())
    }

    /// Discard every registered type.
    pub fn reset(&mut self) {
        self.types.clear();
        self.by_name.clear();
    }

    pub fn build(self) -> Lexicon {
        Lexicon {
            types: self.types,
            by_name: self.by_name,
        }
    }
}

/// An immutable set of token types, ready for scanning.
#[derive(Debug)]
pub struct Lexicon {
    types: Vec<TokenType>,
    by_name: FxHashMap<Arc<str>, TypeId>,
}

impl Lexicon {
    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> &TokenType {
        &self.types[id.index()]
    }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterate types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TokenType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(u32::try_from(i).unwrap_or(u32::MAX)), t))
    }

    /// Human-readable description of a type, by name.
    pub fn description(&self, name: &str) -> Option<&Arc<str>> {
        self.id_of(name).map(|id| self.get(id).description())
    }

    /// Pattern source of a type, by name.
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.id_of(name).map(|id| self.get(id).pattern())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registration_order_and_lookup() {
        let mut builder = Lexicon::builder();
        builder.add_type("int", "[0-9]+", "integer literal", false).unwrap();
        builder.add_type("id", "[a-zA-Z0-9]+", "identifier", false).unwrap();
        builder.add_type("ws", r"\s+", "whitespace", true).unwrap();
        let lexicon = builder.build();

        assert_eq!(lexicon.len(), 3);
        let int_id = lexicon.id_of("int").unwrap();
        assert_eq!(int_id.index(), 0);
        assert!(!lexicon.get(int_id).skip());
        assert!(lexicon.get(lexicon.id_of("ws").unwrap()).skip());
        assert_eq!(lexicon.description("id").unwrap().as_ref(), "identifier");
        assert_eq!(lexicon.pattern("int").unwrap(), "[0-9]+");
        assert_eq!(lexicon.pattern("nope"), None);
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut builder = Lexicon::builder();
        builder.add_type("int", "[0-9]+", "integer", false).unwrap();
        let err = builder.add_type("int", "[0-9]+", "integer", false);
        assert!(matches!(err, Err(LexiconError::DuplicateType { .. })));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut builder = Lexicon::builder();
        let err = builder.add_type("broken", "[", "broken", false);
        assert!(matches!(err, Err(LexiconError::InvalidPattern { .. })));
    }

    #[test]
    fn test_empty_matching_pattern_rejected() {
        let mut builder = Lexicon::builder();
        let err = builder.add_type("maybe", "a*", "zero or more", false);
        assert!(matches!(err, Err(LexiconError::MatchesEmpty { .. })));
    }

    #[test]
    fn test_reset_discards_types() {
        let mut builder = Lexicon::builder();
        builder.add_type("int", "[0-9]+", "integer", false).unwrap();
        builder.reset();
        builder.add_type("int", "[0-9]+", "integer", false).unwrap();
        assert_eq!(builder.build().len(), 1);
    }
}
