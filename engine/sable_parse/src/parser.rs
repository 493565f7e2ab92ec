//! Backtracking memoized matcher over a grammar's axiom.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use sable_ir::Span;
use sable_lexer::Lexer;

use crate::error::{ExpectedTerminal, SyntaxError};
use crate::grammar::{Grammar, HeadId};
use crate::tree::{NodeId, SyntaxTree, TreeBuilder};

/// Longest raw-text snippet captured into a failure record.
const FOUND_SNIPPET_MAX: usize = 32;

/// Backtracking top-down parser with packrat memoization.
///
/// All mutable state (memo table, furthest-failure tracker, tree arena) is
/// owned by a single [`parse`](Parser::parse) call, so one parser can serve
/// concurrent parses over a shared grammar.
pub struct Parser<'g> {
    grammar: &'g Grammar,
    cache_capacity: usize,
}

impl<'g> Parser<'g> {
    pub const DEFAULT_CACHE_CAPACITY: usize = 100;

    pub fn new(grammar: &'g Grammar) -> Self {
        Parser {
            grammar,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Bound the memoization table to `capacity` entries (least recently
    /// used entries are evicted beyond it). Capacity 0 disables caching.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Match the grammar's axiom over the lexer's entire input.
    ///
    /// Succeeds only if the axiom matches and nothing but skippable input
    /// remains after it. On failure, the furthest failure observed during
    /// backtracking becomes the returned [`SyntaxError`]. A missing or
    /// unregistered axiom fails at offset 0 with an empty expected set.
    pub fn parse(&self, lexer: &mut Lexer) -> Result<SyntaxTree, SyntaxError> {
        let source = Arc::clone(lexer.source());
        let mut builder = TreeBuilder::new(Arc::clone(&source), Arc::clone(lexer.lexicon()));
        let mut memo = MemoTable::new(self.cache_capacity);
        let mut failures = FailureTracker::default();

        let axiom = self
            .grammar
            .axiom()
            .and_then(|name| self.grammar.id_of(name));
        let Some(axiom) = axiom else {
            debug!("axiom is missing or names no registered rule");
            return Err(failures.into_syntax_error(&source));
        };

        match self.match_head(axiom, lexer, &mut builder, &mut memo, &mut failures) {
            Some((root, end)) => {
                lexer.set_start(end);
                if lexer.next() {
                    let at = lexer.start();
                    let found = lexer.token_text().unwrap_or("");
                    return Err(failures.into_trailing_error(at, found, &source));
                }
                if let Some(gap) = lexer.unmatched_start() {
                    let found = snippet(&source, gap);
                    return Err(failures.into_trailing_error(gap, found, &source));
                }
                Ok(builder.finish(root))
            }
            None => Err(failures.into_syntax_error(&source)),
        }
    }

    /// Match one head starting at offset 0, driving an explicit frame
    /// stack instead of native recursion so grammar nesting depth is
    /// bounded by heap, not by the thread stack.
    fn match_head(
        &self,
        head: HeadId,
        lexer: &mut Lexer,
        builder: &mut TreeBuilder,
        memo: &mut MemoTable,
        failures: &mut FailureTracker,
    ) -> Option<(NodeId, u32)> {
        let mut stack: Vec<Frame> = vec![Frame::new(head, 0)];
        // Outcome of the most recently popped frame, pending delivery to
        // the new top of the stack.
        let mut delivery: Option<Outcome> = None;

        while let Some(frame) = stack.last_mut() {
            if let Some(outcome) = delivery.take() {
                match outcome {
                    Outcome::Matched(node, end) => {
                        frame.children.push(node);
                        frame.pos = end;
                        frame.sym += 1;
                    }
                    Outcome::Failed => {
                        if !frame.next_alternative(self.grammar) {
                            delivery = Some(self.fail_frame(frame, memo));
                            stack.pop();
                            continue;
                        }
                    }
                }
            }

            let action = self.drive(frame, lexer, builder, memo, failures);
            let pos = frame.pos;
            match action {
                Action::Descend(child) => stack.push(Frame::new(child, pos)),
                Action::Finished(outcome) => {
                    delivery = Some(outcome);
                    stack.pop();
                }
            }
        }

        match delivery {
            Some(Outcome::Matched(node, end)) => Some((node, end)),
            _ => None,
        }
    }

    /// Advance one frame until it either completes (success or exhaustion)
    /// or needs a child frame for a non-terminal.
    fn drive(
        &self,
        frame: &mut Frame,
        lexer: &mut Lexer,
        builder: &mut TreeBuilder,
        memo: &mut MemoTable,
        failures: &mut FailureTracker,
    ) -> Action {
        loop {
            let alternatives = self.grammar.alternatives_of(frame.head);
            let Some(alternative) = alternatives.get(frame.alt) else {
                // Unreachable while every registered head has at least one
                // alternative; kept as a plain failure.
                return Action::Finished(self.fail_frame(frame, memo));
            };

            if frame.sym == alternative.len() {
                let name = Arc::clone(self.grammar.head_name(frame.head));
                trace!(head = %name, start = frame.start, end = frame.pos, "alternative matched");
                let span = Span::new(frame.start, frame.pos);
                let children = std::mem::take(&mut frame.children);
                let node = builder.push_rule(name, span, children);
                memo.insert(
                    (frame.head, frame.start),
                    MemoEntry::Hit {
                        node,
                        end: frame.pos,
                    },
                );
                return Action::Finished(Outcome::Matched(node, frame.pos));
            }

            let symbol = &alternative[frame.sym];
            let matched = if symbol.is_terminal() {
                self.match_terminal(symbol.name(), frame, lexer, builder, failures)
            } else {
                match self.grammar.id_of(symbol.name()) {
                    None => {
                        debug!(head = symbol.name(), "production references an unregistered head");
                        false
                    }
                    Some(child) => match memo.get(&(child, frame.pos)) {
                        Some(MemoEntry::Hit { node, end }) => {
                            trace!(head = symbol.name(), pos = frame.pos, "memo hit");
                            frame.children.push(node);
                            frame.pos = end;
                            frame.sym += 1;
                            continue;
                        }
                        Some(MemoEntry::Miss) => {
                            trace!(head = symbol.name(), pos = frame.pos, "memo miss record");
                            false
                        }
                        None => return Action::Descend(child),
                    },
                }
            };

            if matched {
                continue;
            }
            if !frame.next_alternative(self.grammar) {
                return Action::Finished(self.fail_frame(frame, memo));
            }
        }
    }

    /// Probe one terminal at the frame's cursor. On success the matched
    /// token becomes a child node; on failure the expectation is recorded
    /// for diagnostics.
    fn match_terminal(
        &self,
        type_name: &str,
        frame: &mut Frame,
        lexer: &mut Lexer,
        builder: &mut TreeBuilder,
        failures: &mut FailureTracker,
    ) -> bool {
        lexer.set_start(frame.pos);
        if !lexer.next() {
            let at = lexer.unmatched_start().unwrap_or_else(|| lexer.start());
            let found = snippet(lexer.source(), at).to_owned();
            failures.record_failure(at, type_name, lexer.description(type_name), &found);
            return false;
        }

        if lexer.token(type_name).is_none() {
            let at = lexer.start();
            let found = lexer.token_text().unwrap_or("").to_owned();
            failures.record_failure(at, type_name, lexer.description(type_name), &found);
            trace!(expected = type_name, at, "terminal mismatch");
            return false;
        }

        let span = Span::new(lexer.start(), lexer.end());
        failures.record_success(span.end);
        let similar = lexer.similar_types();
        let name = similar
            .iter()
            .find(|n| n.as_ref() == type_name)
            .map(Arc::clone)
            .unwrap_or_else(|| type_name.into());
        let node = builder.push_terminal(name, span, similar);
        frame.children.push(node);
        frame.pos = span.end;
        frame.sym += 1;
        true
    }

    fn fail_frame(&self, frame: &Frame, memo: &mut MemoTable) -> Outcome {
        trace!(
            head = %self.grammar.head_name(frame.head),
            start = frame.start,
            "all alternatives exhausted"
        );
        memo.insert((frame.head, frame.start), MemoEntry::Miss);
        Outcome::Failed
    }
}

/// One in-flight rule match on the explicit stack.
struct Frame {
    head: HeadId,
    /// Offset where this head started matching.
    start: u32,
    /// Cursor: offset just past everything matched so far.
    pos: u32,
    /// Current alternative index.
    alt: usize,
    /// Next symbol index within the current alternative.
    sym: usize,
    children: Vec<NodeId>,
}

impl Frame {
    fn new(head: HeadId, start: u32) -> Self {
        Frame {
            head,
            start,
            pos: start,
            alt: 0,
            sym: 0,
            children: Vec::new(),
        }
    }

    /// Abandon the current alternative: discard partial children, restore
    /// the cursor, and step to the next alternative if one remains.
    fn next_alternative(&mut self, grammar: &Grammar) -> bool {
        self.alt += 1;
        self.sym = 0;
        self.pos = self.start;
        self.children.clear();
        self.alt < grammar.alternatives_of(self.head).len()
    }
}

enum Action {
    /// Push a child frame for a non-terminal at the current cursor.
    Descend(HeadId),
    /// This frame is done; deliver the outcome to the parent.
    Finished(Outcome),
}

enum Outcome {
    Matched(NodeId, u32),
    Failed,
}

type MemoKey = (HeadId, u32);

#[derive(Copy, Clone, Debug)]
enum MemoEntry {
    Hit { node: NodeId, end: u32 },
    Miss,
}

/// Packrat table scoped to one `parse` call, bounded by LRU eviction.
struct MemoTable {
    capacity: usize,
    entries: FxHashMap<MemoKey, MemoEntry>,
    /// Keys ordered least → most recently used.
    recency: Vec<MemoKey>,
}

impl MemoTable {
    fn new(capacity: usize) -> Self {
        MemoTable {
            capacity,
            entries: FxHashMap::default(),
            recency: Vec::new(),
        }
    }

    fn touch(&mut self, key: MemoKey) {
        if let Some(index) = self.recency.iter().position(|k| *k == key) {
            self.recency.remove(index);
        }
        self.recency.push(key);
    }

    fn get(&mut self, key: &MemoKey) -> Option<MemoEntry> {
        let entry = self.entries.get(key).copied()?;
        self.touch(*key);
        Some(entry)
    }

    fn insert(&mut self, key: MemoKey, entry: MemoEntry) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self.recency.remove(0);
            self.entries.remove(&oldest);
        }
        self.entries.insert(key, entry);
        self.touch(key);
    }
}

/// Tracks the single furthest offset at which a terminal was expected but
/// not found, with everything expected at exactly that offset.
///
/// The recorded offset never decreases within one parse; a successful
/// match beyond it discards the superseded expectations while keeping the
/// offset as the low-water mark for later records.
#[derive(Default)]
struct FailureTracker {
    has_record: bool,
    offset: u32,
    found: Box<str>,
    expected: Vec<ExpectedTerminal>,
}

impl FailureTracker {
    fn record_failure(
        &mut self,
        at: u32,
        type_name: &str,
        description: Option<&Arc<str>>,
        found: &str,
    ) {
        if !self.has_record || at > self.offset {
            self.has_record = true;
            self.offset = at;
            self.found = found.into();
            self.expected.clear();
        } else if at < self.offset {
            return;
        } else if self.expected.is_empty() {
            self.found = found.into();
        }

        if !self.expected.iter().any(|e| e.type_name.as_ref() == type_name) {
            let type_name: Arc<str> = type_name.into();
            let description = description.map_or_else(|| Arc::clone(&type_name), Arc::clone);
            self.expected.push(ExpectedTerminal {
                type_name,
                description,
            });
        }
    }

    /// A terminal matched through `end`: expectations recorded strictly
    /// before it are superseded.
    fn record_success(&mut self, end: u32) {
        if self.has_record && self.offset < end {
            self.expected.clear();
        }
    }

    fn into_syntax_error(self, source: &Arc<str>) -> SyntaxError {
        let offset = if self.has_record { self.offset } else { 0 };
        SyntaxError::new(self.expected, self.found, offset, Arc::clone(source))
    }

    /// The axiom matched but input remains. The furthest record wins when
    /// it reaches at least as far as the trailing input; otherwise the
    /// trailing token itself is the error and only end of input was
    /// acceptable.
    fn into_trailing_error(self, at: u32, found: &str, source: &Arc<str>) -> SyntaxError {
        if self.has_record && self.offset >= at {
            self.into_syntax_error(source)
        } else {
            SyntaxError::new(Vec::new(), found.into(), at, Arc::clone(source))
        }
    }
}

/// Short raw-text excerpt starting at `offset`, for failure records where
/// no token could be read.
fn snippet(source: &str, offset: u32) -> &str {
    let start = (offset as usize).min(source.len());
    let rest = &source[start..];
    let mut end = rest.len().min(FOUND_SNIPPET_MAX);
    while end < rest.len() && !rest.is_char_boundary(end) {
        end += 1;
    }
    let cut = rest[..end].find('\n').unwrap_or(end);
    &rest[..cut]
}
