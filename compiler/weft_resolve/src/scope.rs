//! Persistent scope chain.
//!
//! Bindings are nodes in an append-only arena, each linking to the node
//! that was visible before it. A [`SymbolTable`] is just two positions in
//! that list:
//!
//! ```text
//!  front ─► n5 ─► n4 ─► n3 ─► n2 ─► n1
//!                       ▲
//!                      back        (n5, n4 = current scope)
//! ```
//!
//! Pushing a scope copies `front` into `back`; popping is dropping the table
//! value and going back to the one it was derived from. Nodes are never
//! mutated after insertion, so any number of tables can share a spine.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use weft_ir::{HygieneTable, Mark};

use crate::{BindingId, SymbolKey};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct NodeFlags: u8 {
        /// Second name for an existing binding.
        const ALIAS = 1 << 0;
        /// Spliced in from another table.
        const IMPORTED = 1 << 1;
        /// Imported from a different scope: not part of this scope for
        /// redeclaration checks, never re-exported.
        const DIFF_SCOPE = 1 << 2;
        /// Compiler-private; never exported.
        const INTERNAL = 1 << 3;
    }
}

#[derive(Clone, Debug)]
pub struct SymbolNode {
    pub key: SymbolKey,
    pub value: BindingId,
    pub flags: NodeFlags,
    pub next: Option<NodeId>,
}

/// View of the chain: `[front, back)` is the current scope, everything
/// from `back` on is enclosing scopes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SymbolTable {
    pub front: Option<NodeId>,
    pub back: Option<NodeId>,
}

impl SymbolTable {
    pub const EMPTY: SymbolTable = SymbolTable {
        front: None,
        back: None,
    };

    /// Push a fresh scope.
    #[must_use]
    pub fn new_scope(self) -> SymbolTable {
        SymbolTable {
            front: self.front,
            back: self.front,
        }
    }

    /// Push a scope that shares the enclosing scope's boundary: what it adds
    /// is invisible to the parent, but redeclaration checks still see the
    /// parent's bindings.
    #[must_use]
    pub fn new_open_scope(self) -> SymbolTable {
        self
    }

    /// The current scope as a frozen range.
    pub fn this_scope(self) -> ScopeRange {
        ScopeRange {
            front: self.front,
            back: self.back,
        }
    }
}

/// Frozen `[front, back)` slice of the chain: a closed module's exports or
/// a type's members.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopeRange {
    pub front: Option<NodeId>,
    pub back: Option<NodeId>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LookupStrategy {
    /// Hygienic resolution. The full key must match; on a miss the newest
    /// mark is popped and the walk resumes at that mark's definition site
    /// (or the same start when the mark has none).
    Exact,
    /// Pop marks and rewalk from the same start until a match or the
    /// unmarked name has been tried. Used once a type's member table has
    /// been entered.
    StripMarks,
    /// Full key, current scope only, ignoring `DIFF_SCOPE` nodes.
    ThisScope,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ImportMode {
    /// Ordinary import: spliced nodes belong to another scope.
    DifferentScope,
    /// A module's own scope re-opened for out-of-line member definitions.
    SameScope,
}

/// Successful lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Found {
    pub node: NodeId,
    pub binding: BindingId,
    /// Marks popped from the query before it matched, in pop order.
    pub stripped: SmallVec<[Mark; 4]>,
}

/// Definition site of each macro mark: the chain position where the macro
/// that issued it was defined. A `None` site is the empty chain.
pub type MarkSites = FxHashMap<Mark, Option<NodeId>>;

/// Append-only node store shared by every table of a session.
#[derive(Default)]
pub struct SymbolArena {
    nodes: Vec<SymbolNode>,
}

impl SymbolArena {
    #[inline]
    pub fn get(&self, id: NodeId) -> &SymbolNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes from `from` up to (not including) `stop`, newest first.
    pub fn walk(&self, from: Option<NodeId>, stop: Option<NodeId>) -> Walk<'_> {
        Walk {
            arena: self,
            cur: from,
            stop,
        }
    }

    /// Prepend a node to `table`.
    pub fn add(
        &mut self,
        table: &mut SymbolTable,
        key: SymbolKey,
        value: BindingId,
        flags: NodeFlags,
    ) -> NodeId {
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .unwrap_or_else(|_| panic!("symbol arena exceeded u32::MAX nodes")),
        );
        self.nodes.push(SymbolNode {
            key,
            value,
            flags,
            next: table.front,
        });
        table.front = Some(id);
        id
    }

    /// First node in `[from, stop)` whose key is exactly `key` and which has
    /// none of the `skip` flags.
    pub fn find(
        &self,
        from: Option<NodeId>,
        stop: Option<NodeId>,
        key: &SymbolKey,
        skip: NodeFlags,
    ) -> Option<NodeId> {
        self.walk(from, stop)
            .find(|(_, node)| node.key == *key && !node.flags.intersects(skip))
            .map(|(id, _)| id)
    }

    /// Resolve `key` starting at `from`; first match wins.
    pub fn lookup(
        &self,
        hygiene: &HygieneTable,
        sites: &MarkSites,
        from: Option<NodeId>,
        stop: Option<NodeId>,
        key: &SymbolKey,
        strategy: LookupStrategy,
    ) -> Option<Found> {
        if strategy == LookupStrategy::ThisScope {
            let node = self.find(from, stop, key, NodeFlags::DIFF_SCOPE)?;
            return Some(Found {
                node,
                binding: self.get(node).value,
                stripped: SmallVec::new(),
            });
        }

        let mut query = *key;
        let mut start = from;
        let mut stripped = SmallVec::new();
        loop {
            if let Some(node) = self.find(start, stop, &query, NodeFlags::empty()) {
                return Some(Found {
                    node,
                    binding: self.get(node).value,
                    stripped,
                });
            }
            let (rest, mark) = hygiene.pop(query.marks)?;
            stripped.push(mark);
            query = query.with_marks(rest);
            if strategy == LookupStrategy::Exact {
                if let Some(&site) = sites.get(&mark) {
                    start = site;
                }
            }
        }
    }

    /// Link the given foreign nodes in front of `table`, oldest first, so
    /// their relative order is preserved. Payloads are shared: each new node
    /// points at the original binding. Returns the number of nodes spliced.
    pub fn splice(
        &mut self,
        table: &mut SymbolTable,
        foreign: &[NodeId],
        mode: ImportMode,
        mut rekey: impl FnMut(SymbolKey) -> SymbolKey,
    ) -> usize {
        let mut extra = NodeFlags::IMPORTED;
        if mode == ImportMode::DifferentScope {
            extra |= NodeFlags::DIFF_SCOPE;
        }
        for &id in foreign.iter().rev() {
            let node = self.get(id);
            let key = rekey(node.key);
            let value = node.value;
            let flags = (node.flags & NodeFlags::ALIAS) | extra;
            self.add(table, key, value, flags);
        }
        foreign.len()
    }

    /// Exportable nodes of a range, newest first: everything that was
    /// declared there rather than imported into it or compiler-private.
    pub fn exports(&self, range: ScopeRange) -> Vec<NodeId> {
        self.walk(range.front, range.back)
            .filter(|(_, node)| {
                !node
                    .flags
                    .intersects(NodeFlags::DIFF_SCOPE | NodeFlags::INTERNAL)
            })
            .map(|(id, _)| id)
            .collect()
    }
}

pub struct Walk<'a> {
    arena: &'a SymbolArena,
    cur: Option<NodeId>,
    stop: Option<NodeId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (NodeId, &'a SymbolNode);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.stop {
            return None;
        }
        let id = self.cur?;
        let node = self.arena.get(id);
        self.cur = node.next;
        Some((id, node))
    }
}
