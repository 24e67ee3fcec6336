//! Hygiene marks and mark sets.
//!
//! A [`Mark`] is stamped onto every identifier one macro expansion
//! introduces. A [`MarkSet`] is the expansion history of an identifier: an
//! ordered list of marks, newest last, stored as a parent-linked node in the
//! [`HygieneTable`].
//!
//! # Canonical sets
//!
//! `add(base, mark)` consults a memo keyed by `(mark, base)` before
//! allocating, so two structurally equal histories are always the same
//! `MarkSet` index. Hygiene comparisons elsewhere rely on this: symbol keys
//! compare mark sets by index, never by walking the marks.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A globally unique hygiene token.
///
/// Ids increase monotonically from 1 in issue order, which gives marks a
/// deterministic order for printing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Mark(u32);

impl Mark {
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mark({})", self.0)
    }
}

/// Canonical handle to an ordered set of marks.
///
/// Equal handles mean equal histories and vice versa.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct MarkSet(u32);

impl MarkSet {
    /// The empty history: an identifier written directly in source.
    pub const EMPTY: MarkSet = MarkSet(0);

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for MarkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "MarkSet::EMPTY")
        } else {
            write!(f, "MarkSet({})", self.0)
        }
    }
}

/// Error when the hygiene table runs out of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HygieneError {
    MarkOverflow,
    SetOverflow { count: usize },
}

impl fmt::Display for HygieneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HygieneError::MarkOverflow => write!(f, "hygiene mark ids exhausted"),
            HygieneError::SetOverflow { count } => {
                write!(f, "hygiene table exceeded capacity: {count} mark sets")
            }
        }
    }
}

impl std::error::Error for HygieneError {}

#[derive(Copy, Clone)]
struct SetNode {
    parent: MarkSet,
    mark: Mark,
    depth: u32,
}

struct HygieneState {
    last_mark: u32,
    /// Index 0 is the empty set; its node is never read.
    sets: Vec<SetNode>,
    memo: FxHashMap<(Mark, MarkSet), MarkSet>,
}

/// Process-wide, append-only store of marks and mark sets.
pub struct HygieneTable {
    state: RwLock<HygieneState>,
}

impl HygieneTable {
    pub fn new() -> Self {
        HygieneTable {
            state: RwLock::new(HygieneState {
                last_mark: 0,
                sets: vec![SetNode {
                    parent: MarkSet::EMPTY,
                    mark: Mark(0),
                    depth: 0,
                }],
                memo: FxHashMap::default(),
            }),
        }
    }

    /// Issue a fresh mark.
    pub fn try_new_mark(&self) -> Result<Mark, HygieneError> {
        let mut state = self.state.write();
        let id = state
            .last_mark
            .checked_add(1)
            .ok_or(HygieneError::MarkOverflow)?;
        state.last_mark = id;
        Ok(Mark(id))
    }

    /// Issue a fresh mark.
    ///
    /// # Panics
    /// Panics if mark ids are exhausted. Use `try_new_mark` for the
    /// fallible form.
    pub fn new_mark(&self) -> Mark {
        self.try_new_mark().unwrap_or_else(|e| panic!("{}", e))
    }

    /// Canonical set for `base` extended with `mark`.
    pub fn try_add(&self, base: MarkSet, mark: Mark) -> Result<MarkSet, HygieneError> {
        if let Some(&set) = self.state.read().memo.get(&(mark, base)) {
            return Ok(set);
        }

        let mut state = self.state.write();
        if let Some(&set) = state.memo.get(&(mark, base)) {
            return Ok(set);
        }
        let count = state.sets.len();
        let index = u32::try_from(count).map_err(|_| HygieneError::SetOverflow { count })?;
        let depth = state.sets[base.index()].depth + 1;
        state.sets.push(SetNode {
            parent: base,
            mark,
            depth,
        });
        let set = MarkSet(index);
        state.memo.insert((mark, base), set);
        Ok(set)
    }

    /// Canonical set for `base` extended with `mark`.
    ///
    /// # Panics
    /// Panics if the table is full. Use `try_add` for the fallible form.
    pub fn add(&self, base: MarkSet, mark: Mark) -> MarkSet {
        self.try_add(base, mark).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Extend `base` with each of `marks`, oldest first.
    pub fn extend(&self, base: MarkSet, marks: impl IntoIterator<Item = Mark>) -> MarkSet {
        marks.into_iter().fold(base, |set, mark| self.add(set, mark))
    }

    /// Drop the most recent mark. The empty set strips to itself.
    pub fn strip(&self, set: MarkSet) -> MarkSet {
        self.pop(set).map_or(MarkSet::EMPTY, |(parent, _)| parent)
    }

    /// Split off the most recent mark, or `None` for the empty set.
    pub fn pop(&self, set: MarkSet) -> Option<(MarkSet, Mark)> {
        if set.is_empty() {
            return None;
        }
        let node = self.state.read().sets[set.index()];
        Some((node.parent, node.mark))
    }

    /// Most recent mark of a set.
    pub fn newest(&self, set: MarkSet) -> Option<Mark> {
        self.pop(set).map(|(_, mark)| mark)
    }

    /// Number of marks in a set.
    pub fn depth(&self, set: MarkSet) -> usize {
        self.state.read().sets[set.index()].depth as usize
    }

    /// Marks of a set, oldest first.
    pub fn marks(&self, set: MarkSet) -> Vec<Mark> {
        let state = self.state.read();
        let mut marks = Vec::with_capacity(state.sets[set.index()].depth as usize);
        let mut cur = set;
        while !cur.is_empty() {
            let node = state.sets[cur.index()];
            marks.push(node.mark);
            cur = node.parent;
        }
        marks.reverse();
        marks
    }

    /// Check whether `prefix` is `set` or one of its ancestors.
    pub fn is_prefix(&self, prefix: MarkSet, set: MarkSet) -> bool {
        let state = self.state.read();
        let mut cur = set;
        loop {
            if cur == prefix {
                return true;
            }
            if cur.is_empty() {
                return false;
            }
            cur = state.sets[cur.index()].parent;
        }
    }

    /// Number of marks issued so far.
    pub fn mark_count(&self) -> usize {
        self.state.read().last_mark as usize
    }

    /// Number of distinct non-empty mark sets allocated so far.
    pub fn set_count(&self) -> usize {
        self.state.read().sets.len() - 1
    }

    /// Render a set as `'1'2`, oldest first. The empty set renders as nothing.
    pub fn display(&self, set: MarkSet) -> MarkSetDisplay {
        MarkSetDisplay {
            marks: self.marks(set),
        }
    }
}

impl Default for HygieneTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Printable form of a [`MarkSet`].
pub struct MarkSetDisplay {
    marks: Vec<Mark>,
}

impl fmt::Display for MarkSetDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mark in &self.marks {
            write!(f, "'{}", mark.0)?;
        }
        Ok(())
    }
}
