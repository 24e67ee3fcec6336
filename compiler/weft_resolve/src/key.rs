//! Qualified names: the lookup key of every binding.

use weft_ir::{MarkSet, Name};

use crate::Namespace;

/// `(name, marks, namespace)` triple.
///
/// Two keys name the same binding site iff all three fields are equal. Mark
/// sets are canonical, so this is three integer comparisons.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SymbolKey {
    pub name: Name,
    pub marks: MarkSet,
    pub ns: Namespace,
}

impl SymbolKey {
    #[inline]
    pub const fn new(name: Name, marks: MarkSet, ns: Namespace) -> Self {
        SymbolKey { name, marks, ns }
    }

    /// Key for a name written directly in source.
    #[inline]
    pub const fn plain(name: Name, ns: Namespace) -> Self {
        Self::new(name, MarkSet::EMPTY, ns)
    }

    #[inline]
    #[must_use]
    pub const fn with_marks(self, marks: MarkSet) -> Self {
        SymbolKey {
            name: self.name,
            marks,
            ns: self.ns,
        }
    }
}
