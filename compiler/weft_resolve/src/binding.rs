//! Bindings: what a symbol key resolves to.
//!
//! A binding is created once per declaration and lives for the whole unit.
//! Scope-chain nodes refer to bindings by [`BindingId`]; an import or alias
//! adds a node, never a second binding.

use std::num::NonZeroU32;

use weft_ir::{MarkSet, Name, Span, Syntax};

use crate::scope::{NodeId, ScopeRange};
use crate::Namespace;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct BindingId(u32);

impl BindingId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BindingKind {
    Function,
    Type,
    Module,
    Global,
    /// Field of a type's member table.
    Member,
    Label,
    Local,
}

impl BindingKind {
    /// Definitions that live for the whole unit and take part in unit-wide
    /// uniquification.
    #[inline]
    pub fn is_top_level(self) -> bool {
        matches!(
            self,
            BindingKind::Function | BindingKind::Type | BindingKind::Module | BindingKind::Global
        )
    }

    /// Bindings numbered per function body rather than per unit.
    #[inline]
    pub fn is_frame_local(self) -> bool {
        matches!(self, BindingKind::Label | BindingKind::Local)
    }
}

/// Disambiguation assigned by uniquification.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Disambiguation {
    /// External linkage: emitted under the bare name.
    Unmangled,
    /// Unit-wide number of a top-level symbol.
    Number(NonZeroU32),
    /// Per-function number of a label or local.
    Local(NonZeroU32),
}

/// Two-pass progress of a declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ItemState {
    /// Known by name only; a later declaration may supply the body.
    Declared,
    /// Body queued on a `Collect` worklist.
    BodyPending,
    /// Fully resolved.
    Finished,
}

/// Compile-time property attached to a top-level symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prop {
    pub name: Name,
    pub marks: MarkSet,
    pub value: Syntax,
}

#[derive(Clone, Debug)]
pub struct Binding {
    pub kind: BindingKind,
    /// Bare name as declared, before any aliasing.
    pub name: Name,
    /// Namespace of the defining key.
    pub ns: Namespace,
    pub span: Span,
    /// Node that introduced the binding; lets the binding find its own key.
    pub node: Option<NodeId>,
    pub num: Option<Disambiguation>,
    /// Emission order among top-level symbols.
    pub order: Option<u32>,
    pub mangle: bool,
    pub state: ItemState,
    /// Frozen export range of a closed module, or member range of a type.
    pub scope: Option<ScopeRange>,
    /// Properties, oldest first.
    pub props: Vec<Prop>,
}

impl Binding {
    pub fn new(kind: BindingKind, name: Name, ns: Namespace, span: Span) -> Self {
        Binding {
            kind,
            name,
            ns,
            span,
            node: None,
            num: None,
            order: None,
            mangle: true,
            state: ItemState::Finished,
            scope: None,
            props: Vec::new(),
        }
    }
}

/// Append-only store of every binding in the unit.
#[derive(Default)]
pub struct BindingArena {
    bindings: Vec<Binding>,
}

impl BindingArena {
    pub fn push(&mut self, binding: Binding) -> BindingId {
        let id = u32::try_from(self.bindings.len())
            .unwrap_or_else(|_| panic!("binding arena exceeded u32::MAX entries"));
        self.bindings.push(binding);
        BindingId(id)
    }

    #[inline]
    pub fn get(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.index()]
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
