//! Binding resolution and the explicit-stack tree walk.

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::trace;

use sable_lexer::Lexicon;
use sable_parse::{Grammar, NodeId, NodeRef, SyntaxTree};

use crate::actions::{Actions, Outcome, RuleAction, RuleReg, TerminalAction, TerminalReg};
use crate::error::{AnalyzeError, BindError, SemanticError};

struct TerminalBinding<V> {
    owner: Arc<str>,
    depth: u32,
    action: TerminalAction<V>,
}

struct RuleBinding<V> {
    prefix: Vec<Box<str>>,
    keep_buffer: bool,
    owner: Arc<str>,
    depth: u32,
    action: RuleAction<V>,
}

/// Resolved, validated semantic bindings plus the tree-walk machinery.
///
/// Immutable after construction; one dispatcher can analyze any number of
/// trees, concurrently if `V` permits.
pub struct Dispatcher<V> {
    terminals: FxHashMap<Box<str>, TerminalBinding<V>>,
    /// Per head, sorted most specific first: longest explicit prefix,
    /// shallower composition depth on ties.
    rules: FxHashMap<Box<str>, Vec<RuleBinding<V>>>,
    axiom: Option<Arc<str>>,
}

impl<V> std::fmt::Debug for Dispatcher<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("terminals", &self.terminals.keys().collect::<Vec<_>>())
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("axiom", &self.axiom)
            .finish()
    }
}

impl<V> Dispatcher<V> {
    /// Resolve an action table against the grammar and lexicon it will
    /// serve, validating every binding target and rejecting conflicts.
    pub fn new(
        actions: Actions<V>,
        grammar: &Grammar,
        lexicon: &Lexicon,
    ) -> Result<Self, BindError> {
        let axiom = grammar.axiom().cloned();
        let mut dispatcher = Dispatcher {
            terminals: FxHashMap::default(),
            rules: FxHashMap::default(),
            axiom,
        };

        for reg in actions.terminals {
            dispatcher.add_terminal(reg, lexicon)?;
        }
        for reg in actions.rules {
            dispatcher.add_rule(reg, grammar)?;
        }

        for bindings in dispatcher.rules.values_mut() {
            bindings.sort_by_key(|b| (Reverse(b.prefix.len()), b.depth));
        }
        Ok(dispatcher)
    }

    fn add_terminal(&mut self, reg: TerminalReg<V>, lexicon: &Lexicon) -> Result<(), BindError> {
        if !lexicon.contains(&reg.type_name) {
            return Err(BindError::UnknownTerminal {
                type_name: reg.type_name.into(),
                owner: reg.owner.as_ref().to_string(),
            });
        }

        match self.terminals.entry(reg.type_name) {
            Entry::Vacant(slot) => {
                slot.insert(TerminalBinding {
                    owner: reg.owner,
                    depth: reg.depth,
                    action: reg.action,
                });
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get();
                if reg.depth == existing.depth && reg.owner == existing.owner {
                    return Err(BindError::DuplicateTerminal {
                        type_name: slot.key().as_ref().to_string(),
                        owner: reg.owner.as_ref().to_string(),
                    });
                }
                // The shallower binding wins; first registration wins on
                // equal depth across modules.
                if reg.depth < existing.depth {
                    slot.insert(TerminalBinding {
                        owner: reg.owner,
                        depth: reg.depth,
                        action: reg.action,
                    });
                }
            }
        }
        Ok(())
    }

    fn add_rule(&mut self, reg: RuleReg<V>, grammar: &Grammar) -> Result<(), BindError> {
        if !grammar.contains(&reg.head) {
            return Err(BindError::UnknownRule {
                head: reg.head.into(),
                owner: reg.owner.as_ref().to_string(),
            });
        }
        let is_shape_marker = matches!(reg.prefix.as_slice(), [only] if only.as_ref() == "#" || only.as_ref() == "!#");
        if !reg.prefix.is_empty() && !is_shape_marker {
            let prefix: Vec<&str> = reg.prefix.iter().map(AsRef::as_ref).collect();
            if !grammar.rule_exists(&reg.head, &prefix) {
                return Err(BindError::UnknownRulePrefix {
                    head: reg.head.into(),
                    prefix: prefix.join(" "),
                    owner: reg.owner.as_ref().to_string(),
                });
            }
        }
        if reg.keep_buffer && self.axiom.as_deref() == Some(reg.head.as_ref()) {
            return Err(BindError::AxiomKeepBuffer {
                head: reg.head.into(),
            });
        }

        if let Some(bindings) = self.rules.get(reg.head.as_ref()) {
            for existing in bindings {
                // Identical patterns are tolerable only when composition
                // depth orders them; same module or equal depth is a
                // conflict.
                if existing.prefix == reg.prefix
                    && (existing.owner == reg.owner || existing.depth == reg.depth)
                {
                    return Err(BindError::DuplicateRule {
                        head: reg.head.into(),
                        owner: reg.owner.as_ref().to_string(),
                    });
                }
            }
        }
        self.rules.entry(reg.head).or_default().push(RuleBinding {
            prefix: reg.prefix,
            keep_buffer: reg.keep_buffer,
            owner: reg.owner,
            depth: reg.depth,
            action: reg.action,
        });
        Ok(())
    }

    /// Walk a syntax tree post-order, invoking the best-matching action
    /// per node and threading the results buffer upward.
    ///
    /// Returns the axiom's single value, or `None` when the axiom buffer
    /// ended empty or an action halted the walk.
    pub fn analyze(&self, tree: &SyntaxTree) -> Result<Option<V>, AnalyzeError> {
        // Explicit post-order traversal: frames own their buffer, parents
        // sit below their children on the stack, so a frame index stays
        // valid for as long as its children are being processed.
        let mut frames: Vec<WalkFrame<V>> = vec![WalkFrame::new(tree.root().id(), None)];
        let mut final_results: Vec<V> = Vec::new();

        while let Some(top) = frames.len().checked_sub(1) {
            let node = tree.node(frames[top].node);

            if node.terminal() {
                match self.run_terminal(node)? {
                    Flow::Halt => return Ok(None),
                    Flow::Value(value) => {
                        let parent = frames[top].parent;
                        frames.pop();
                        match parent {
                            Some(p) => frames[p].results.push(value),
                            None => final_results.push(value),
                        }
                    }
                    Flow::Nothing => {
                        frames.pop();
                    }
                }
                continue;
            }

            if !frames[top].expanded {
                frames[top].expanded = true;
                // Push right to left so children are processed left to
                // right.
                for child in node.children().rev() {
                    frames.push(WalkFrame::new(child.id(), Some(top)));
                }
                continue;
            }

            let mut results = std::mem::take(&mut frames[top].results);
            if self.run_rule(node, &mut results)? {
                return Ok(None);
            }
            let parent = frames[top].parent;
            frames.pop();
            match parent {
                Some(p) => frames[p].results.append(&mut results),
                None => final_results = results,
            }
        }

        match final_results.len() {
            0 => Ok(None),
            1 => Ok(final_results.pop()),
            count => Err(AnalyzeError::AxiomValues {
                head: tree.root().type_name().to_string(),
                count,
            }),
        }
    }

    fn run_terminal(&self, node: NodeRef<'_>) -> Result<Flow<V>, AnalyzeError> {
        let Some(binding) = self.terminals.get(node.type_name()) else {
            return Ok(Flow::Nothing);
        };
        trace!(terminal = node.type_name(), "invoking terminal action");
        match (binding.action)(node) {
            Ok(Outcome::Value(value)) => Ok(Flow::Value(value)),
            Ok(Outcome::Nothing) => Ok(Flow::Nothing),
            Ok(Outcome::Halt) => Ok(Flow::Halt),
            Err(error) => Err(SemanticError::wrap(error, node, &binding.owner).into()),
        }
    }

    /// Invoke the first binding whose structural pattern matches the node.
    /// Returns true when the walk must halt. Without a matching binding
    /// the buffer passes through to the parent untouched.
    fn run_rule(&self, node: NodeRef<'_>, results: &mut Vec<V>) -> Result<bool, AnalyzeError> {
        let Some(bindings) = self.rules.get(node.type_name()) else {
            return Ok(false);
        };
        for binding in bindings {
            let prefix: Vec<&str> = binding.prefix.iter().map(AsRef::as_ref).collect();
            if !node.query(node.type_name(), &prefix) {
                continue;
            }
            trace!(
                head = node.type_name(),
                prefix = %prefix.join(" "),
                "invoking rule action"
            );
            match (binding.action)(node, results) {
                Ok(Outcome::Halt) => return Ok(true),
                Ok(outcome) => {
                    if !binding.keep_buffer {
                        results.clear();
                    }
                    if let Outcome::Value(value) = outcome {
                        results.push(value);
                    }
                    return Ok(false);
                }
                Err(error) => {
                    return Err(SemanticError::wrap(error, node, &binding.owner).into())
                }
            }
        }
        Ok(false)
    }
}

/// One node on the walk stack.
struct WalkFrame<V> {
    node: NodeId,
    /// Stack index of the parent frame, which is always below this one.
    parent: Option<usize>,
    expanded: bool,
    results: Vec<V>,
}

impl<V> WalkFrame<V> {
    fn new(node: NodeId, parent: Option<usize>) -> Self {
        WalkFrame {
            node,
            parent,
            expanded: false,
            results: Vec::new(),
        }
    }
}

enum Flow<V> {
    Value(V),
    Nothing,
    Halt,
}
