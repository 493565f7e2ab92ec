//! The syntax tree produced by a successful parse.
//!
//! Nodes live in a flat arena indexed by [`NodeId`]; memoized sub-parses
//! are shared by id, so one node can be the child of several speculative
//! parents without aliasing issues. Slots reached only by abandoned
//! speculation stay in the arena but are unreachable from the root.

use std::fmt;
use std::sync::Arc;

use sable_ir::{Span, Symbol};
use sable_lexer::Lexicon;

/// Index of a node in its [`SyntaxTree`] arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub(crate) terminal: bool,
    pub(crate) type_name: Arc<str>,
    pub(crate) span: Span,
    /// Every token type that matched with this exact span; empty for
    /// non-terminal nodes.
    pub(crate) similar: Vec<Arc<str>>,
    /// Ordered children; empty for terminal nodes.
    pub(crate) children: Vec<NodeId>,
}

/// Immutable, ordered m-ary tree representing one successful parse.
///
/// Keeps a back-reference to the source and to the lexicon that produced
/// it, so descriptions and patterns stay reachable from any node.
#[derive(Debug)]
pub struct SyntaxTree {
    source: Arc<str>,
    lexicon: Arc<Lexicon>,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        debug_assert!(id.index() < self.nodes.len(), "node id out of bounds");
        NodeRef { tree: self, id }
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    /// Indented rendering of the reachable tree, for tests and debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut pending: Vec<(NodeId, usize)> = vec![(self.root, 0)];
        while let Some((id, depth)) = pending.pop() {
            let node = self.node(id);
            for _ in 0..depth {
                out.push_str("  ");
            }
            let kind = if node.terminal() { "$" } else { "" };
            out.push_str(&format!(
                "{kind}{} {} {:?}\n",
                node.type_name(),
                node.span(),
                node.text()
            ));
            for child in node.children().rev() {
                pending.push((child.id(), depth + 1));
            }
        }
        out
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// A borrowed view of one node.
#[derive(Copy, Clone)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    /// Whether this node represents a terminal token.
    #[inline]
    pub fn terminal(&self) -> bool {
        self.tree.data(self.id).terminal
    }

    /// The primary type: token type for terminals, rule head otherwise.
    #[inline]
    pub fn type_name(&self) -> &'t str {
        &self.tree.data(self.id).type_name
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.tree.data(self.id).span
    }

    /// The source text covered by this node.
    pub fn text(&self) -> &'t str {
        self.span().text(self.tree.source())
    }

    /// Every token type that matched this terminal with the same span,
    /// including the primary type. Empty for non-terminal nodes.
    pub fn similar_types(&self) -> impl Iterator<Item = &'t str> {
        self.tree.data(self.id).similar.iter().map(|s| s.as_ref())
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        self.tree
            .data(self.id)
            .children
            .get(index)
            .map(|id| self.tree.node(*id))
    }

    /// Iterate children left to right; the iterator is double-ended, so
    /// `.rev()` walks them right to left.
    pub fn children(&self) -> Children<'t> {
        Children {
            tree: self.tree,
            inner: self.tree.data(self.id).children.iter(),
        }
    }

    /// Structural pattern query: true iff this node's type is `type_name`
    /// and its first children match the given symbol prefix in order.
    ///
    /// Symbols use the production surface syntax: `$`-prefixed names match
    /// terminal children, bare names match non-terminal children. Two
    /// reserved one-element prefixes assert the shape without naming types:
    /// `"#"` matches a node with no children, `"!#"` one with at least one
    /// child.
    pub fn query(&self, type_name: &str, prefix: &[&str]) -> bool {
        if self.type_name() != type_name {
            return false;
        }
        if let [only] = prefix {
            if *only == "#" {
                return self.child_count() == 0;
            }
            if *only == "!#" {
                return self.child_count() > 0;
            }
        }
        if prefix.len() > self.child_count() {
            return false;
        }
        prefix
            .iter()
            .zip(self.children())
            .all(|(raw, child)| {
                let symbol = Symbol::parse(raw);
                symbol.name() == child.type_name() && symbol.is_terminal() == child.terminal()
            })
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("type", &self.type_name())
            .field("terminal", &self.terminal())
            .field("span", &self.span())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Double-ended iterator over a node's children.
pub struct Children<'t> {
    tree: &'t SyntaxTree,
    inner: std::slice::Iter<'t, NodeId>,
}

impl<'t> Iterator for Children<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|id| self.tree.node(*id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|id| self.tree.node(*id))
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Arena assembly used by the parser while matching.
pub(crate) struct TreeBuilder {
    source: Arc<str>,
    lexicon: Arc<Lexicon>,
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub(crate) fn new(source: Arc<str>, lexicon: Arc<Lexicon>) -> Self {
        TreeBuilder {
            source,
            lexicon,
            nodes: Vec::new(),
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(data);
        id
    }

    pub(crate) fn push_terminal(
        &mut self,
        type_name: Arc<str>,
        span: Span,
        similar: Vec<Arc<str>>,
    ) -> NodeId {
        self.push(NodeData {
            terminal: true,
            type_name,
            span,
            similar,
            children: Vec::new(),
        })
    }

    pub(crate) fn push_rule(
        &mut self,
        head: Arc<str>,
        span: Span,
        children: Vec<NodeId>,
    ) -> NodeId {
        self.push(NodeData {
            terminal: false,
            type_name: head,
            span,
            similar: Vec::new(),
            children,
        })
    }

    pub(crate) fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            source: self.source,
            lexicon: self.lexicon,
            nodes: self.nodes,
            root,
        }
    }
}
