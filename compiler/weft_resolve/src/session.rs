//! Per-unit resolution state.
//!
//! A [`Session`] owns everything that lives for the whole compilation unit:
//! the interner, the hygiene table, the scope-chain node arena, the binding
//! arena, function frames and dependency sets. Environments borrow it and
//! only ever append to it.

use std::cell::{Ref, RefCell, RefMut};

use rustc_hash::FxHashSet;
use weft_ir::{HygieneTable, Mark, Name, StringInterner, Syntax};

use crate::environ::EnvironFlags;
use crate::scope::{MarkSites, NodeFlags, SymbolArena, SymbolTable};
use crate::uniquify::{self, LocalNumbering};
use crate::binding::Prop;
use crate::{Binding, BindingArena, BindingId, Environ, ItemState, Namespace, ResolveError, SymbolKey};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FrameId(u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DepsId(u32);

/// Function body context: return type, labels and local numbering.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub return_type: Option<BindingId>,
    /// Labels of the whole function, independent of block nesting.
    pub labels: SymbolTable,
    pub numbering: LocalNumbering,
}

/// Globals a compile-time evaluation depends on, first use first.
#[derive(Clone, Debug, Default)]
pub struct DepSet {
    order: Vec<BindingId>,
    seen: FxHashSet<BindingId>,
}

impl DepSet {
    pub fn insert(&mut self, id: BindingId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[BindingId] {
        &self.order
    }
}

#[derive(Default)]
pub(crate) struct State {
    pub symbols: SymbolArena,
    pub bindings: BindingArena,
    pub frames: Vec<Frame>,
    pub deps: Vec<DepSet>,
    pub sites: MarkSites,
    /// Every top-level symbol of the unit, in creation order.
    pub top_level: SymbolTable,
    pub next_order: u32,
}

impl State {
    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0 as usize]
    }

    pub fn frame_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id.0 as usize]
    }

    pub fn new_frame(&mut self) -> FrameId {
        let id = u32::try_from(self.frames.len())
            .unwrap_or_else(|_| panic!("frame count exceeded u32::MAX"));
        self.frames.push(Frame::default());
        FrameId(id)
    }

    pub fn deps_mut(&mut self, id: DepsId) -> &mut DepSet {
        &mut self.deps[id.0 as usize]
    }

    pub fn new_deps(&mut self) -> DepsId {
        let id = u32::try_from(self.deps.len())
            .unwrap_or_else(|_| panic!("dependency set count exceeded u32::MAX"));
        self.deps.push(DepSet::default());
        DepsId(id)
    }

    /// Record a freshly created top-level symbol on the unit-wide chain.
    pub fn register_top_level(&mut self, key: SymbolKey, id: BindingId) {
        let order = self.next_order;
        self.next_order += 1;
        self.bindings.get_mut(id).order = Some(order);
        let mut chain = self.top_level;
        self.symbols.add(&mut chain, key, id, NodeFlags::empty());
        self.top_level = chain;
    }
}

pub struct Session {
    interner: StringInterner,
    hygiene: HygieneTable,
    state: RefCell<State>,
    fluid: Name,
    backtick: Name,
}

impl Session {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let fluid = interner.intern("fluid");
        let backtick = interner.intern("`");
        Session {
            interner,
            hygiene: HygieneTable::new(),
            state: RefCell::new(State::default()),
            fluid,
            backtick,
        }
    }

    /// Environment of the unit's outermost scope.
    pub fn root(&self) -> Environ<'_> {
        Environ::new(self, EnvironFlags::root())
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn hygiene(&self) -> &HygieneTable {
        &self.hygiene
    }

    pub fn intern(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub(crate) fn fluid_tag(&self) -> Name {
        self.fluid
    }

    pub(crate) fn backtick_tag(&self) -> Name {
        self.backtick
    }

    pub(crate) fn state(&self) -> Ref<'_, State> {
        self.state.borrow()
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, State> {
        self.state.borrow_mut()
    }

    /// Fresh mark for a synthetic identifier. It has no definition site:
    /// stripping it resumes lookup where it started.
    pub fn new_mark(&self) -> Mark {
        self.hygiene.new_mark()
    }

    /// Fresh mark for one expansion of a macro defined where `env` is.
    /// Stripping it during lookup resumes at that point of the chain.
    pub fn new_macro_mark(&self, env: &Environ<'_>) -> Mark {
        let mark = self.hygiene.new_mark();
        self.state_mut().sites.insert(mark, env.symbols().front);
        mark
    }

    pub fn binding(&self, id: BindingId) -> Binding {
        self.state().bindings.get(id).clone()
    }

    pub fn item_state(&self, id: BindingId) -> ItemState {
        self.state().bindings.get(id).state
    }

    pub fn binding_count(&self) -> usize {
        self.state().bindings.len()
    }

    /// Attach a property to a top-level symbol. A later property with the
    /// same name hides an earlier one.
    pub fn add_prop(&self, sym: BindingId, name: &Syntax, value: Syntax) -> Result<(), ResolveError> {
        if !name.is_id() {
            return Err(ResolveError::MalformedName {
                span: name.span,
                reason: "property name must be an identifier",
            });
        }
        let mut state = self.state_mut();
        let binding = state.bindings.get_mut(sym);
        if !binding.kind.is_top_level() {
            return Err(ResolveError::invariant(
                self.interner.lookup(binding.name),
                format!("{:?} binding cannot carry properties", binding.kind),
            ));
        }
        binding.props.push(Prop {
            name: name.tag,
            marks: name.marks,
            value,
        });
        Ok(())
    }

    /// Property of a symbol, newest first. On a miss the newest mark is
    /// stripped from `name` and the search repeats, down to the bare name.
    pub fn prop(&self, sym: BindingId, name: &Syntax) -> Option<Syntax> {
        let state = self.state();
        let props = &state.bindings.get(sym).props;
        let mut marks = name.marks;
        loop {
            let hit = props
                .iter()
                .rev()
                .find(|prop| prop.name == name.tag && prop.marks == marks);
            if let Some(prop) = hit {
                return Some(prop.value.clone());
            }
            marks = self.hygiene.pop(marks)?.0;
        }
    }

    /// Number every unnumbered top-level symbol, oldest first, then check that
    /// emitted names are unique. Returns how many symbols were numbered.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn uniquify(&self) -> Result<usize, ResolveError> {
        let mut state = self.state_mut();
        let State {
            symbols,
            bindings,
            top_level,
            ..
        } = &mut *state;

        let mut chain: Vec<BindingId> = symbols
            .walk(top_level.front, None)
            .map(|(_, node)| node.value)
            .collect();
        chain.reverse();

        let mut assigned = 0;
        for &sym in &chain {
            if bindings.get(sym).num.is_none() {
                uniquify::assign_uniq_num(
                    symbols,
                    bindings,
                    &self.interner,
                    sym,
                    top_level.front,
                    None,
                )?;
                assigned += 1;
            }
        }
        uniquify::check_unique(bindings, &self.interner, &chain)?;
        tracing::debug!(symbols = chain.len(), assigned, "uniquified");
        Ok(assigned)
    }

    /// Collision-free emitted name of a binding.
    pub fn uniq_name(&self, id: BindingId) -> Result<String, ResolveError> {
        uniquify::uniq_name(&self.state().bindings, &self.interner, id)
    }

    /// Globals recorded in a dependency set.
    pub fn deps(&self, id: DepsId) -> Vec<BindingId> {
        self.state().deps[id.0 as usize].as_slice().to_vec()
    }

    pub fn return_type(&self, frame: FrameId) -> Option<BindingId> {
        self.state().frame(frame).return_type
    }

    /// Debug form of a key: `name'1'2`, then `` `ns `` unless ordinary.
    pub fn display_key(&self, key: &SymbolKey) -> String {
        let mut out = format!(
            "{}{}",
            self.interner.lookup(key.name),
            self.hygiene.display(key.marks)
        );
        if key.ns != Namespace::Ordinary {
            out.push('`');
            out.push_str(key.ns.as_str());
        }
        out
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
