//! The grammar table: ordered rule alternatives per head.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use sable_ir::{is_valid_rule_name, Symbol};

use crate::GrammarError;

/// Index of a rule head in its [`Grammar`], in registration order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct HeadId(u32);

impl HeadId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One ordered alternative of a rule. Productions are short, so they are
/// stored inline.
pub type Production = SmallVec<[Symbol; 4]>;

#[derive(Debug)]
struct HeadData {
    name: Arc<str>,
    alternatives: Vec<Production>,
}

/// Map from rule head to its ordered alternative list, plus the axiom and
/// the left-recursion detection graph.
///
/// Alternative order is preference order: the parser tries them in
/// registration order and the first full match wins.
#[derive(Default, Debug)]
pub struct Grammar {
    heads: Vec<HeadData>,
    by_name: FxHashMap<Arc<str>, HeadId>,
    axiom: Option<Arc<str>>,
    /// "First symbol is a non-terminal" edges, by name. Targets may be
    /// registered later: forward references are legal.
    first_edges: FxHashMap<Arc<str>, Vec<Arc<str>>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule alternative for `head`.
    ///
    /// Symbols use the `$` prefix to mark terminals, e.g.
    /// `grammar.add_rule("sum", &["term", "$plus", "sum"])`. An empty
    /// production is an epsilon alternative.
    ///
    /// The first head ever registered becomes the axiom unless
    /// [`set_axiom`](Grammar::set_axiom) overrides it. An exact duplicate
    /// of an existing (head, production) pair is silently ignored.
    ///
    /// Fails if the head name does not match the required pattern, or if
    /// the rule would close a cycle of "first symbol is a non-terminal"
    /// edges (infinite left recursion).
    pub fn add_rule(&mut self, head: &str, production: &[&str]) -> Result<(), GrammarError> {
        if !is_valid_rule_name(head) {
            return Err(GrammarError::InvalidRuleName {
                name: head.to_string(),
            });
        }

        let production: Production = production.iter().map(|raw| Symbol::parse(raw)).collect();

        if let Some(Symbol::NonTerminal(first)) = production.first() {
            // Entering `first` consumes no input; a path from it back to
            // `head` would recurse forever.
            if self.path_exists(first, head) {
                return Err(GrammarError::LeftRecursion {
                    head: head.to_string(),
                    first: first.to_string(),
                });
            }
            let head_key: Arc<str> = head.into();
            let targets = self.first_edges.entry(head_key).or_default();
            if !targets.contains(first) {
                targets.push(Arc::clone(first));
            }
        }

        let id = match self.by_name.get(head) {
            Some(id) => *id,
            None => {
                let name: Arc<str> = head.into();
                let id = HeadId(u32::try_from(self.heads.len()).unwrap_or(u32::MAX));
                self.heads.push(HeadData {
                    name: Arc::clone(&name),
                    alternatives: Vec::new(),
                });
                self.by_name.insert(name, id);
                id
            }
        };

        let data = &mut self.heads[id.index()];
        if !data.alternatives.contains(&production) {
            data.alternatives.push(production);
        }

        if self.axiom.is_none() {
            self.axiom = Some(Arc::clone(&self.heads[id.index()].name));
        }
        Ok(())
    }

    /// Override the start head for parsing.
    pub fn set_axiom(&mut self, head: &str) {
        self.axiom = Some(head.into());
    }

    /// The designated start head, if any rule has been registered.
    pub fn axiom(&self) -> Option<&Arc<str>> {
        self.axiom.as_ref()
    }

    /// Check whether a head is registered and, with a non-empty `prefix`,
    /// whether some alternative of it starts with those symbols.
    ///
    /// This backs the dispatcher's validation that an action binding
    /// targets a real rule / alternative prefix.
    pub fn rule_exists(&self, head: &str, prefix: &[&str]) -> bool {
        let Some(id) = self.id_of(head) else {
            return false;
        };
        if prefix.is_empty() {
            return true;
        }
        let prefix: Vec<Symbol> = prefix.iter().map(|raw| Symbol::parse(raw)).collect();
        self.heads[id.index()]
            .alternatives
            .iter()
            .any(|alt| alt.len() >= prefix.len() && alt[..prefix.len()] == prefix[..])
    }

    /// The ordered alternative list of a head, by name.
    pub fn alternatives(&self, head: &str) -> Option<&[Production]> {
        self.id_of(head)
            .map(|id| self.heads[id.index()].alternatives.as_slice())
    }

    pub fn contains(&self, head: &str) -> bool {
        self.by_name.contains_key(head)
    }

    pub(crate) fn id_of(&self, head: &str) -> Option<HeadId> {
        self.by_name.get(head).copied()
    }

    pub(crate) fn head_name(&self, id: HeadId) -> &Arc<str> {
        &self.heads[id.index()].name
    }

    pub(crate) fn alternatives_of(&self, id: HeadId) -> &[Production] {
        &self.heads[id.index()].alternatives
    }

    /// Reachability over the left-recursion edge graph.
    fn path_exists(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut pending: Vec<&str> = vec![from];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(targets) = self.first_edges.get(current) {
                for target in targets {
                    if target.as_ref() == to {
                        return true;
                    }
                    pending.push(target.as_ref());
                }
            }
        }
        false
    }
}
