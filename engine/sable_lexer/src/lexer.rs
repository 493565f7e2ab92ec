//! Stateful scanner over one immutable input.

use std::sync::Arc;

use sable_ir::Span;

use crate::{Lexicon, TypeId};

/// Per-type search memo: the leftmost match found when searching from
/// `searched_from`. Valid for any later probe position `p` with
/// `searched_from <= p <= found.start`, because no match starts in between.
#[derive(Copy, Clone, Debug)]
struct FindCache {
    searched_from: u32,
    found: Option<Span>,
}

/// The token at the current winning offset.
#[derive(Clone, Debug)]
struct Current {
    /// Winning start offset.
    start: u32,
    /// End of the most recent successful probe (the default type's end
    /// until [`Lexer::token`] probes another type).
    end: u32,
    /// Default type: first registered among the winners.
    default: TypeId,
    /// Every type matching at `start`, with its match end, in
    /// registration order.
    winners: Vec<(TypeId, u32)>,
}

/// Stateful tokenizer over an immutable input sequence.
///
/// [`next`](Lexer::next) advances to the next non-skippable match;
/// [`token`](Lexer::token) probes a specific (possibly non-default) type at
/// the current winning offset. Absence of a match is a `false`/`None`
/// return, never an error.
#[derive(Debug)]
pub struct Lexer {
    lexicon: Arc<Lexicon>,
    source: Arc<str>,
    /// Scan start for the next `next()` call.
    cursor: u32,
    /// Position of the current token, or the input length after a failed
    /// `next()`.
    pos: u32,
    /// First offset since the last scan start that no type matched, set by
    /// `next()`. Input in such a gap is bypassed silently.
    gap: Option<u32>,
    memo: Vec<Option<FindCache>>,
    current: Option<Current>,
}

impl Lexer {
    /// Create a lexer over `source`.
    ///
    /// # Panics
    /// Panics if the input is longer than `u32::MAX` bytes.
    pub fn new(lexicon: Arc<Lexicon>, source: impl Into<Arc<str>>) -> Self {
        let source = source.into();
        assert!(
            u32::try_from(source.len()).is_ok(),
            "input longer than u32::MAX bytes"
        );
        let memo = vec![None; lexicon.len()];
        Lexer {
            lexicon,
            source,
            cursor: 0,
            pos: 0,
            gap: None,
            memo,
            current: None,
        }
    }

    #[inline]
    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    #[inline]
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    #[inline]
    fn input_len(&self) -> u32 {
        // Checked at construction.
        self.source.len() as u32
    }

    /// Reset the scan position and invalidate the current token.
    pub fn set_start(&mut self, pos: u32) {
        debug_assert!(pos <= self.input_len(), "scan position out of bounds");
        self.cursor = pos.min(self.input_len());
        self.pos = self.cursor;
        self.gap = None;
        self.current = None;
    }

    /// Leftmost match of a type starting at or after `pos`.
    fn find_from(&mut self, ty: TypeId, pos: u32) -> Option<Span> {
        if let Some(cache) = self.memo[ty.index()] {
            if cache.searched_from <= pos {
                match cache.found {
                    Some(m) if m.start >= pos => return Some(m),
                    Some(_) => {}
                    // No match from an earlier position means none from a
                    // later one either.
                    None => return None,
                }
            }
        }
        let found = self
            .lexicon
            .get(ty)
            .regex()
            .find_at(&self.source, pos as usize)
            .map(|m| Span::new(m.start() as u32, m.end() as u32));
        self.memo[ty.index()] = Some(FindCache {
            searched_from: pos,
            found,
        });
        found
    }

    /// Advance to the next non-skippable match.
    ///
    /// Scans every registered type for the minimum match start at or after
    /// the cursor; skippable winners are discarded and the scan resumes
    /// past them until a non-skippable winner or end of input. Among the
    /// types matching at the winning offset, the first-registered one
    /// becomes the default token.
    pub fn next(&mut self) -> bool {
        let type_count = self.lexicon.len();
        self.gap = None;
        loop {
            let mut min_start = u32::MAX;
            for index in 0..type_count {
                let ty = TypeId::from_index(index);
                if let Some(m) = self.find_from(ty, self.cursor) {
                    min_start = min_start.min(m.start);
                }
            }

            if min_start == u32::MAX {
                if self.cursor < self.input_len() && self.gap.is_none() {
                    self.gap = Some(self.cursor);
                }
                self.current = None;
                self.cursor = self.input_len();
                self.pos = self.cursor;
                return false;
            }
            if min_start > self.cursor && self.gap.is_none() {
                self.gap = Some(self.cursor);
            }

            let mut winners = Vec::new();
            let mut skip_end = None;
            for index in 0..type_count {
                let ty = TypeId::from_index(index);
                // Memo entries are hot after the scan above.
                if let Some(FindCache {
                    found: Some(m), ..
                }) = self.memo[index]
                {
                    if m.start == min_start {
                        winners.push((ty, m.end));
                        if skip_end.is_none() && self.lexicon.get(ty).skip() {
                            skip_end = Some(m.end);
                        }
                    }
                }
            }

            if let Some(end) = skip_end {
                self.cursor = end;
                continue;
            }

            // Winners are collected in registration order.
            let (default, end) = winners[0];
            self.pos = min_start;
            self.current = Some(Current {
                start: min_start,
                end,
                default,
                winners,
            });
            return true;
        }
    }

    /// Probe whether `type_name` matches at the token starting at the
    /// current winning offset, returning the matched text.
    ///
    /// A successful probe records its end offset, so a following
    /// [`similar_types`](Lexer::similar_types) call compares against the
    /// probed span. The default token is unaffected.
    pub fn token(&mut self, type_name: &str) -> Option<&str> {
        let ty = self.lexicon.id_of(type_name)?;
        let current = self.current.as_mut()?;
        let (_, end) = current.winners.iter().find(|(id, _)| *id == ty).copied()?;
        current.end = end;
        Some(Span::new(current.start, end).text(&self.source))
    }

    /// Text of the current default token.
    pub fn token_text(&self) -> Option<&str> {
        let current = self.current.as_ref()?;
        let (_, end) = current
            .winners
            .iter()
            .find(|(id, _)| *id == current.default)
            .copied()?;
        Some(Span::new(current.start, end).text(&self.source))
    }

    /// Type name of the current default token.
    pub fn token_type(&self) -> Option<&Arc<str>> {
        let current = self.current.as_ref()?;
        Some(self.lexicon.get(current.default).name())
    }

    /// Start offset of the current token, or the input length after a
    /// failed [`next`](Lexer::next).
    #[inline]
    pub fn start(&self) -> u32 {
        self.pos
    }

    /// End offset (exclusive) of the most recent match or probe.
    #[inline]
    pub fn end(&self) -> u32 {
        self.current.as_ref().map_or(self.pos, |c| c.end)
    }

    /// First offset since the last scan start that no type (skippable or
    /// not) matched, if any. Meaningful after [`next`](Lexer::next)
    /// returned false: it distinguishes input consumed by skip types from
    /// raw text nothing could match.
    #[inline]
    pub fn unmatched_start(&self) -> Option<u32> {
        self.gap
    }

    /// Every type matching with exactly the same span as the most recent
    /// match or probe, in registration order.
    pub fn similar_types(&self) -> Vec<Arc<str>> {
        let Some(current) = self.current.as_ref() else {
            return Vec::new();
        };
        current
            .winners
            .iter()
            .filter(|(_, end)| *end == current.end)
            .map(|(ty, _)| Arc::clone(self.lexicon.get(*ty).name()))
            .collect()
    }

    /// Description of a registered type, by name.
    pub fn description(&self, type_name: &str) -> Option<&Arc<str>> {
        self.lexicon.description(type_name)
    }
}
