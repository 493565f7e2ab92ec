//! The semantic action registration table.

use std::sync::Arc;

use sable_parse::NodeRef;

use crate::ActionError;

/// What a semantic action hands back to the dispatcher.
#[derive(Debug)]
pub enum Outcome<V> {
    /// A value to propagate to the enclosing results buffer.
    Value(V),
    /// No value; nothing is propagated.
    Nothing,
    /// Control signal: abort the whole walk immediately. The overall
    /// analysis result is empty, not an error.
    Halt,
}

impl<V> From<Option<V>> for Outcome<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(v) => Outcome::Value(v),
            None => Outcome::Nothing,
        }
    }
}

/// Result type every semantic action returns.
pub type ActionResult<V> = Result<Outcome<V>, ActionError>;

pub(crate) type TerminalAction<V> =
    Box<dyn Fn(NodeRef<'_>) -> ActionResult<V> + Send + Sync>;
pub(crate) type RuleAction<V> =
    Box<dyn Fn(NodeRef<'_>, &mut Vec<V>) -> ActionResult<V> + Send + Sync>;

pub(crate) struct TerminalReg<V> {
    pub(crate) type_name: Box<str>,
    pub(crate) owner: Arc<str>,
    pub(crate) depth: u32,
    pub(crate) action: TerminalAction<V>,
}

pub(crate) struct RuleReg<V> {
    pub(crate) head: Box<str>,
    /// Explicit child-symbol prefix in production surface syntax, or one
    /// of the reserved markers `"#"` / `"!#"`. Empty means "any shape".
    pub(crate) prefix: Vec<Box<str>>,
    pub(crate) keep_buffer: bool,
    pub(crate) owner: Arc<str>,
    pub(crate) depth: u32,
    pub(crate) action: RuleAction<V>,
}

/// Registration table for one interpreter module, generic over the
/// semantic value type `V`.
///
/// Tables compose hierarchically with [`include`](Actions::include): an
/// included table's bindings sit one composition level deeper, which makes
/// them lose specificity ties against the including module's own bindings.
pub struct Actions<V> {
    owner: Arc<str>,
    pub(crate) terminals: Vec<TerminalReg<V>>,
    pub(crate) rules: Vec<RuleReg<V>>,
}

impl<V> Actions<V> {
    /// Create an empty table. The owner tag identifies this module in
    /// conflict diagnostics and in semantic errors raised by its actions.
    pub fn new(owner: impl Into<Arc<str>>) -> Self {
        Actions {
            owner: owner.into(),
            terminals: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn owner(&self) -> &Arc<str> {
        &self.owner
    }

    /// Bind an action to a terminal token type. The action receives the
    /// matched terminal node; its value is appended to the parent's
    /// results buffer.
    #[must_use]
    pub fn terminal(
        mut self,
        type_name: &str,
        action: impl Fn(NodeRef<'_>) -> ActionResult<V> + Send + Sync + 'static,
    ) -> Self {
        self.terminals.push(TerminalReg {
            type_name: type_name.into(),
            owner: Arc::clone(&self.owner),
            depth: 0,
            action: Box::new(action),
        });
        self
    }

    /// Bind an action to a rule head, optionally constrained to nodes
    /// whose first children match `prefix` (production surface syntax;
    /// `"#"` / `"!#"` assert an empty / non-empty node). The action
    /// receives the node and the accumulated child results; afterwards the
    /// buffer is cleared and replaced by the action's value.
    #[must_use]
    pub fn rule(
        self,
        head: &str,
        prefix: &[&str],
        action: impl Fn(NodeRef<'_>, &mut Vec<V>) -> ActionResult<V> + Send + Sync + 'static,
    ) -> Self {
        self.rule_entry(head, prefix, false, action)
    }

    /// Like [`rule`](Actions::rule), but the buffer is not cleared: the
    /// child results stay and the action's value is appended after them.
    /// Not allowed for the axiom, which must reduce to at most one value.
    #[must_use]
    pub fn rule_keep_buffer(
        self,
        head: &str,
        prefix: &[&str],
        action: impl Fn(NodeRef<'_>, &mut Vec<V>) -> ActionResult<V> + Send + Sync + 'static,
    ) -> Self {
        self.rule_entry(head, prefix, true, action)
    }

    fn rule_entry(
        mut self,
        head: &str,
        prefix: &[&str],
        keep_buffer: bool,
        action: impl Fn(NodeRef<'_>, &mut Vec<V>) -> ActionResult<V> + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(RuleReg {
            head: head.into(),
            prefix: prefix.iter().map(|p| Box::from(*p)).collect(),
            keep_buffer,
            owner: Arc::clone(&self.owner),
            depth: 0,
            action: Box::new(action),
        });
        self
    }

    /// Compose a nested module into this table. Every binding of `child`
    /// moves one composition level deeper, so on equal specificity this
    /// module's own bindings win.
    #[must_use]
    pub fn include(mut self, child: Actions<V>) -> Self {
        for mut reg in child.terminals {
            reg.depth += 1;
            self.terminals.push(reg);
        }
        for mut reg in child.rules {
            reg.depth += 1;
            self.rules.push(reg);
        }
        self
    }
}
