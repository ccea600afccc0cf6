/// Mutable, rewindable cursor over an argument list.
///
/// The stream keeps every token it was ever given (consumed or not) so that
/// snapshots can later report what was typed. Consumption order is tracked
/// separately in `remaining`, a list of indices into `tokens`, which lets the
/// flag engine pull tokens out of the middle of the list.
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use super::comp_line::split_comp_line;
use super::data::Data;

/// Identifier returned by [`TokenStream::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u32);

/// A predicate deciding whether a list-consuming leaf may take the next token.
///
/// The check returns `true` to keep consuming. When it returns `false`
/// consumption stops; a discarding breaker also pops the stopping token.
#[derive(Clone)]
pub struct Breaker {
    check: Rc<dyn Fn(&str, &Data) -> bool>,
    discard: bool,
}

impl Breaker {
    /// Breaker that stops when `check` returns `false`.
    #[must_use]
    pub fn new(check: impl Fn(&str, &Data) -> bool + 'static) -> Self {
        Self {
            check: Rc::new(check),
            discard: false,
        }
    }

    /// Breaker that stops at the literal `symbol` and discards it.
    #[must_use]
    pub fn until(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self::new(move |token, _| token != symbol).discard()
    }

    /// Also pop the token that triggered the stop.
    #[must_use]
    pub fn discard(mut self) -> Self {
        self.discard = true;
        self
    }

    /// Whether `token` may be consumed.
    #[must_use]
    pub fn allows(&self, token: &str, data: &Data) -> bool {
        (self.check)(token, data)
    }

    /// Whether the stopping token is discarded.
    #[must_use]
    pub fn discards(&self) -> bool {
        self.discard
    }
}

impl fmt::Debug for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breaker")
            .field("discard", &self.discard)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Token {
    value: String,
    snapshots: BTreeSet<SnapshotId>,
}

/// The token stream a traversal consumes.
///
/// Owned by one top-level invocation; not shared between traversals.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    /// Indices into `tokens` not yet consumed, in order.
    remaining: Vec<usize>,
    /// Stack of relative offsets pushed by [`TokenStream::run_at_offset`].
    offsets: Vec<usize>,
    breakers: Vec<Breaker>,
    next_snapshot: u32,
}

impl TokenStream {
    /// Stream over `args`, cursor at the first token.
    #[must_use]
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<Token> = args
            .into_iter()
            .map(|s| Token {
                value: s.into(),
                snapshots: BTreeSet::new(),
            })
            .collect();
        let remaining = (0..tokens.len()).collect();
        Self {
            tokens,
            remaining,
            ..Self::default()
        }
    }

    /// Stream over a shell completion line (see [`split_comp_line`]).
    #[must_use]
    pub fn from_comp_line(line: &str) -> Self {
        Self::new(split_comp_line(line))
    }

    /// Absolute position in `remaining` that the current window treats as 0.
    fn offset(&self) -> usize {
        self.offsets
            .iter()
            .sum::<usize>()
            .min(self.remaining.len())
    }

    /// Number of unconsumed tokens visible in the current window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remaining.len() - self.offset()
    }

    /// Whether no tokens are visible in the current window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cursor has reached the end.
    #[must_use]
    pub fn fully_processed(&self) -> bool {
        self.is_empty()
    }

    /// The next token, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        self.peek_at(0)
    }

    /// The `i`-th unconsumed token, without consuming it.
    #[must_use]
    pub fn peek_at(&self, i: usize) -> Option<&str> {
        let idx = *self.remaining.get(self.offset() + i)?;
        self.tokens.get(idx).map(|t| t.value.as_str())
    }

    /// Consume the next token. `None` when exhausted.
    pub fn pop(&mut self) -> Option<String> {
        self.pop_at(0)
    }

    /// Consume the `i`-th unconsumed token, leaving the others in place.
    pub fn pop_at(&mut self, i: usize) -> Option<String> {
        let pos = self.offset() + i;
        if pos >= self.remaining.len() {
            return None;
        }
        let idx = self.remaining.remove(pos);
        self.tokens.get(idx).map(|t| t.value.clone())
    }

    /// Unconsumed tokens in the current window.
    #[must_use]
    pub fn remaining(&self) -> Vec<String> {
        self.remaining[self.offset()..]
            .iter()
            .filter_map(|&idx| self.tokens.get(idx))
            .map(|t| t.value.clone())
            .collect()
    }

    /// Insert `tokens` ahead of the cursor.
    ///
    /// The new tokens inherit the snapshot membership of the token they are
    /// inserted before (or, at the end of the stream, the token they follow),
    /// so a rewrite inside a snapshotted region stays attributed to it.
    pub fn push_front<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return;
        }
        let pos = self.offset();
        let at = match self.remaining.get(pos) {
            Some(&idx) => idx,
            None => pos
                .checked_sub(1)
                .and_then(|p| self.remaining.get(p))
                .map_or(self.tokens.len(), |&idx| idx + 1),
        };
        let snapshots = self
            .tokens
            .get(at)
            .or_else(|| at.checked_sub(1).and_then(|p| self.tokens.get(p)))
            .map(|t| t.snapshots.clone())
            .unwrap_or_default();

        let n = values.len();
        for idx in &mut self.remaining {
            if *idx >= at {
                *idx += n;
            }
        }
        self.tokens.splice(
            at..at,
            values.into_iter().map(|value| Token {
                value,
                snapshots: snapshots.clone(),
            }),
        );
        self.remaining.splice(pos..pos, at..at + n);
    }

    // --- Snapshots ---

    /// Tag every unconsumed token with a fresh snapshot id.
    pub fn snapshot(&mut self) -> SnapshotId {
        let id = SnapshotId(self.next_snapshot);
        self.next_snapshot += 1;
        for &idx in &self.remaining {
            if let Some(token) = self.tokens.get_mut(idx) {
                token.snapshots.insert(id);
            }
        }
        id
    }

    /// Tokens currently attributable to snapshot `id`, consumed or not.
    #[must_use]
    pub fn get_snapshot(&self, id: SnapshotId) -> Vec<String> {
        self.tokens
            .iter()
            .filter(|t| t.snapshots.contains(&id))
            .map(|t| t.value.clone())
            .collect()
    }

    // --- Breakers ---

    /// Push breakers onto the active stack. Returns how many were pushed.
    pub fn push_breakers<I: IntoIterator<Item = Breaker>>(&mut self, breakers: I) -> usize {
        let before = self.breakers.len();
        self.breakers.extend(breakers);
        self.breakers.len() - before
    }

    /// Pop the `n` most recently pushed breakers.
    pub fn pop_breakers(&mut self, n: usize) {
        let keep = self.breakers.len().saturating_sub(n);
        self.breakers.truncate(keep);
    }

    /// Evaluate the active breakers plus `local` against `token`.
    ///
    /// Returns `Some(discard)` when consumption must stop.
    #[must_use]
    pub fn check_breakers(&self, token: &str, local: &[Breaker], data: &Data) -> Option<bool> {
        self.breakers
            .iter()
            .chain(local)
            .find(|b| !b.allows(token, data))
            .map(Breaker::discards)
    }

    /// Consume between `min` and `min + optional` tokens (`None` = unbounded),
    /// stopping early at the end of the window or when a breaker fires.
    ///
    /// Returns the consumed tokens and whether `min` was reached.
    pub fn pop_n(
        &mut self,
        min: usize,
        optional: Option<usize>,
        local: &[Breaker],
        data: &Data,
    ) -> (Vec<String>, bool) {
        let limit = optional.map(|o| min.saturating_add(o));
        let mut popped = Vec::new();
        while limit.is_none_or(|l| popped.len() < l) {
            let stop = match self.peek() {
                None => break,
                Some(token) => self.check_breakers(token, local, data),
            };
            if let Some(discard) = stop {
                tracing::trace!(discard, "breaker stopped consumption");
                if discard {
                    self.pop();
                }
                break;
            }
            match self.pop() {
                Some(token) => popped.push(token),
                None => break,
            }
        }
        let enough = popped.len() >= min;
        (popped, enough)
    }

    // --- Offset windows ---

    /// Run `f` with index `offset` of the current window appearing as 0.
    ///
    /// Addressing is restored when `f` returns, whatever it returns.
    pub fn run_at_offset<T>(&mut self, offset: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        self.offsets.push(offset);
        let result = f(self);
        self.offsets.pop();
        result
    }
}
