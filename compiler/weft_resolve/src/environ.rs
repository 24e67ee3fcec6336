//! Resolution environment.
//!
//! An [`Environ`] is the context threaded through parsing: the visible scope
//! chain, the enclosing function frame, the dependency set of a compile-time
//! evaluation and a few flags. It is a small `Copy`-like value; entering a
//! block, a function or a module derives a new one and leaves the parent's
//! view untouched. Adding a binding moves only this value's `front`.

use weft_ir::{Span, Syntax, SyntaxKind};

use crate::scope::{Found, LookupStrategy, NodeFlags, SymbolTable};
use crate::session::{DepsId, FrameId};
use crate::{Binding, BindingId, BindingKind, Disambiguation, Namespace, ResolveError, Session, SymbolKey};

/// Opaque statement or expression insertion handle owned by the AST layer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct InsertPoint(u32);

impl InsertPoint {
    pub const fn new(raw: u32) -> Self {
        InsertPoint(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EnvironFlags {
    /// Record declarations, drop bodies.
    pub interface_only: bool,
    /// Only the root environment of a unit.
    pub true_top_level: bool,
    /// Top-level symbols declared here get disambiguation numbers. Off for
    /// external linkage.
    pub mangle: bool,
}

impl EnvironFlags {
    pub const fn root() -> Self {
        EnvironFlags {
            interface_only: false,
            true_top_level: true,
            mangle: true,
        }
    }
}

#[derive(Clone)]
pub struct Environ<'s> {
    pub(crate) sess: &'s Session,
    pub(crate) symbols: SymbolTable,
    pub(crate) frame: Option<FrameId>,
    pub(crate) deps: Option<DepsId>,
    pub(crate) insert_point: Option<InsertPoint>,
    /// Where temporaries of the enclosing full expression go.
    pub(crate) temp_point: Option<InsertPoint>,
    /// Where statements hoisted out of the current expression branch go.
    pub(crate) exp_point: Option<InsertPoint>,
    pub(crate) flags: EnvironFlags,
}

impl<'s> Environ<'s> {
    pub(crate) fn new(sess: &'s Session, flags: EnvironFlags) -> Self {
        Environ {
            sess,
            symbols: SymbolTable::EMPTY,
            frame: None,
            deps: None,
            insert_point: None,
            temp_point: None,
            exp_point: None,
            flags,
        }
    }

    pub fn session(&self) -> &'s Session {
        self.sess
    }

    pub fn symbols(&self) -> SymbolTable {
        self.symbols
    }

    pub fn flags(&self) -> EnvironFlags {
        self.flags
    }

    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    pub fn deps(&self) -> Option<DepsId> {
        self.deps
    }

    pub fn insert_point(&self) -> Option<InsertPoint> {
        self.insert_point
    }

    pub fn temp_point(&self) -> Option<InsertPoint> {
        self.temp_point
    }

    pub fn exp_point(&self) -> Option<InsertPoint> {
        self.exp_point
    }

    // ── Derived environments ────────────────────────────────────────

    /// Enter a lexical scope. The statement insertion point is not
    /// inherited; expression insertion points are.
    #[must_use]
    pub fn new_scope(&self) -> Environ<'s> {
        self.derive_scope(self.symbols.new_scope())
    }

    /// Enter a scope that does not start a new redeclaration boundary: a
    /// name already bound in the enclosing scope cannot be declared again.
    #[must_use]
    pub fn new_open_scope(&self) -> Environ<'s> {
        self.derive_scope(self.symbols.new_open_scope())
    }

    fn derive_scope(&self, symbols: SymbolTable) -> Environ<'s> {
        Environ {
            sess: self.sess,
            symbols,
            frame: self.frame,
            deps: self.deps,
            insert_point: None,
            temp_point: self.temp_point,
            exp_point: self.exp_point,
            flags: EnvironFlags {
                interface_only: self.flags.interface_only,
                true_top_level: false,
                mangle: self.flags.mangle,
            },
        }
    }

    /// Enter a function body: a new scope with a fresh frame, so no labels or
    /// return type of an enclosing function are visible.
    #[must_use]
    pub fn new_frame(&self) -> Environ<'s> {
        let mut env = self.new_scope();
        env.frame = Some(self.sess.state_mut().new_frame());
        env
    }

    /// Same view, recording globals it resolves into a fresh dependency set.
    #[must_use]
    pub fn with_deps(&self) -> Environ<'s> {
        let mut env = self.clone();
        env.deps = Some(self.sess.state_mut().new_deps());
        env
    }

    #[must_use]
    pub fn with_insert_point(&self, point: InsertPoint) -> Environ<'s> {
        let mut env = self.clone();
        env.insert_point = Some(point);
        env
    }

    /// Enter a full expression that may need temporaries.
    ///
    /// Temporaries and hoisted statements go to `point`, unless an enclosing
    /// expression already owns them and `force_new_scope` is off.
    #[must_use]
    pub fn new_extended_exp(&self, point: InsertPoint, force_new_scope: bool) -> Environ<'s> {
        let mut env = self.clone();
        env.flags.true_top_level = false;
        if force_new_scope || env.temp_point.is_none() {
            env.temp_point = Some(point);
            env.exp_point = Some(point);
        }
        env
    }

    /// Enter one arm of a conditional expression: statements hoisted out of
    /// the arm go to `point`, temporaries stay with the full expression.
    pub fn new_exp_branch(&self, point: InsertPoint) -> Result<Environ<'s>, ResolveError> {
        if self.flags.true_top_level {
            return Err(ResolveError::invariant(
                "<expression>",
                "expression branch at the top level of a unit",
            ));
        }
        let mut env = self.clone();
        env.exp_point = Some(point);
        Ok(env)
    }

    #[must_use]
    pub fn with_interface_only(&self, interface_only: bool) -> Environ<'s> {
        let mut env = self.clone();
        env.flags.interface_only = interface_only;
        env
    }

    #[must_use]
    pub fn with_mangle(&self, mangle: bool) -> Environ<'s> {
        let mut env = self.clone();
        env.flags.mangle = mangle;
        env
    }

    // ── Names ───────────────────────────────────────────────────────

    /// Key under which a new declaration of `id` is inserted.
    pub fn expand_binding(&self, id: &Syntax, ns: Namespace) -> Result<SymbolKey, ResolveError> {
        self.expand(id, ns, false)
    }

    /// Key under which a use of `id` is looked up.
    pub fn expand_reference(&self, id: &Syntax, ns: Namespace) -> Result<SymbolKey, ResolveError> {
        self.expand(id, ns, true)
    }

    fn expand(&self, id: &Syntax, ns: Namespace, reference: bool) -> Result<SymbolKey, ResolveError> {
        if let SyntaxKind::Id = id.kind {
            return Ok(SymbolKey::new(id.tag, id.marks, ns));
        }

        if id.tag == self.sess.backtick_tag() {
            let (Some(name), Some(space)) = (id.part(0), id.part(1)) else {
                return Err(ResolveError::MalformedName {
                    span: id.span,
                    reason: "qualified name needs a name and a namespace",
                });
            };
            if !name.is_id() || !space.is_id() {
                return Err(ResolveError::MalformedName {
                    span: id.span,
                    reason: "qualified name parts must be identifiers",
                });
            }
            let text = self.sess.interner().lookup(space.tag);
            let ns = Namespace::from_name(text).ok_or_else(|| ResolveError::UnknownIdentifier {
                name: text.to_owned(),
                span: space.span,
            })?;
            return Ok(SymbolKey::new(name.tag, name.marks, ns));
        }

        if id.tag == self.sess.fluid_tag() {
            if !reference {
                return Err(ResolveError::MalformedName {
                    span: id.span,
                    reason: "a fluid name cannot introduce a binding",
                });
            }
            return match id.part(0) {
                Some(name) if name.is_id() => Ok(SymbolKey::plain(name.tag, ns)),
                _ => Err(ResolveError::MalformedName {
                    span: id.span,
                    reason: "fluid takes one identifier",
                }),
            };
        }

        Err(ResolveError::MalformedName {
            span: id.span,
            reason: "expected an identifier",
        })
    }

    pub(crate) fn text(&self, key: &SymbolKey) -> String {
        self.sess.interner().lookup(key.name).to_owned()
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Scope-chain search without side effects. Labels are searched in the
    /// frame's label chain; outside a function no label is visible.
    pub(crate) fn find(&self, key: &SymbolKey, strategy: LookupStrategy) -> Option<Found> {
        let state = self.sess.state();
        let hygiene = self.sess.hygiene();
        if key.ns == Namespace::Label {
            let labels = state.frame(self.frame?).labels;
            let strategy = match strategy {
                LookupStrategy::ThisScope => LookupStrategy::ThisScope,
                _ => LookupStrategy::StripMarks,
            };
            return state
                .symbols
                .lookup(hygiene, &state.sites, labels.front, None, key, strategy);
        }
        let stop = match strategy {
            LookupStrategy::ThisScope => self.symbols.back,
            _ => None,
        };
        state
            .symbols
            .lookup(hygiene, &state.sites, self.symbols.front, stop, key, strategy)
    }

    /// Resolve a key. Globals found through an environment with a dependency
    /// set are recorded in it.
    pub fn lookup(&self, key: &SymbolKey, strategy: LookupStrategy) -> Option<Found> {
        let found = self.find(key, strategy)?;
        self.record_dep(found.binding);
        Some(found)
    }

    /// Whether `key` is bound in the current scope itself. Nodes imported from
    /// another scope do not count.
    pub fn exists_this_scope(&self, key: &SymbolKey) -> bool {
        self.find(key, LookupStrategy::ThisScope).is_some()
    }

    /// Resolve a name as written, failing with `UnknownIdentifier`.
    #[tracing::instrument(level = "trace", skip_all, fields(ns = %ns))]
    pub fn resolve(&self, id: &Syntax, ns: Namespace) -> Result<BindingId, ResolveError> {
        let key = self.expand_reference(id, ns)?;
        match self.lookup(&key, LookupStrategy::Exact) {
            Some(found) => Ok(found.binding),
            None => Err(ResolveError::UnknownIdentifier {
                name: self.text(&key),
                span: id.span,
            }),
        }
    }

    fn record_dep(&self, binding: BindingId) {
        let Some(deps) = self.deps else {
            return;
        };
        let mut state = self.sess.state_mut();
        if state.bindings.get(binding).kind == BindingKind::Global
            && state.deps_mut(deps).insert(binding)
        {
            tracing::trace!(binding = binding.index(), "recorded dependency");
        }
    }

    // ── Definition ──────────────────────────────────────────────────

    /// Bind a fresh key in the current scope.
    ///
    /// Fails with `Redeclaration` if the key is already bound in this scope.
    #[tracing::instrument(level = "trace", skip_all, fields(kind = ?kind))]
    pub fn add(&mut self, key: SymbolKey, kind: BindingKind, span: Span) -> Result<BindingId, ResolveError> {
        self.check_fresh(&key, span)?;
        self.insert(key, kind, span, NodeFlags::empty())
    }

    /// Bind a key in the current scope even if it is already bound there.
    /// The new binding hides the old one from then on.
    #[tracing::instrument(level = "trace", skip_all, fields(kind = ?kind))]
    pub fn add_shadowing(&mut self, key: SymbolKey, kind: BindingKind, span: Span) -> Result<BindingId, ResolveError> {
        if let Some(found) = self.find(&key, LookupStrategy::ThisScope) {
            tracing::debug!(
                name = %self.sess.display_key(&key),
                hidden = found.binding.index(),
                "shadowing in the same scope"
            );
        }
        self.insert(key, kind, span, NodeFlags::empty())
    }

    /// Declare a variable: a local inside a function, a global elsewhere.
    pub fn declare_var(&mut self, id: &Syntax) -> Result<BindingId, ResolveError> {
        let key = self.expand_binding(id, Namespace::Ordinary)?;
        let kind = if self.frame.is_some() {
            BindingKind::Local
        } else {
            BindingKind::Global
        };
        self.add(key, kind, id.span)
    }

    /// Declare a label of the enclosing function.
    pub fn declare_label(&mut self, id: &Syntax) -> Result<BindingId, ResolveError> {
        let key = self.expand_binding(id, Namespace::Label)?;
        self.add(key, BindingKind::Label, id.span)
    }

    /// Second name for an existing binding.
    pub fn add_alias(&mut self, key: SymbolKey, target: BindingId, span: Span) -> Result<(), ResolveError> {
        self.check_fresh(&key, span)?;
        let sess = self.sess;
        sess.state_mut()
            .symbols
            .add(&mut self.symbols, key, target, NodeFlags::ALIAS);
        Ok(())
    }

    /// Compiler-private binding: never exported, never numbered, emitted
    /// under its bare name.
    pub fn add_internal(&mut self, key: SymbolKey, kind: BindingKind, span: Span) -> Result<BindingId, ResolveError> {
        let id = self.insert(key, kind, span, NodeFlags::INTERNAL)?;
        self.sess.state_mut().bindings.get_mut(id).num = Some(Disambiguation::Unmangled);
        Ok(id)
    }

    pub(crate) fn check_fresh(&self, key: &SymbolKey, span: Span) -> Result<(), ResolveError> {
        match self.find(key, LookupStrategy::ThisScope) {
            Some(found) => Err(ResolveError::Redeclaration {
                name: self.text(key),
                span,
                previous: self.sess.state().bindings.get(found.binding).span,
            }),
            None => Ok(()),
        }
    }

    /// Create a binding and its node without any redeclaration check.
    pub(crate) fn insert(
        &mut self,
        key: SymbolKey,
        kind: BindingKind,
        span: Span,
        flags: NodeFlags,
    ) -> Result<BindingId, ResolveError> {
        let is_label = key.ns == Namespace::Label;
        let mut binding = Binding::new(kind, key.name, key.ns, span);

        let sess = self.sess;
        let mut guard = sess.state_mut();
        let state = &mut *guard;

        if kind.is_frame_local() || is_label {
            let Some(frame) = self.frame else {
                return Err(ResolveError::MalformedName {
                    span,
                    reason: if is_label {
                        "label outside of a function"
                    } else {
                        "local variable outside of a function"
                    },
                });
            };
            binding.num = Some(state.frame_mut(frame).numbering.next(key.name, key.ns));
        }
        if kind.is_top_level() {
            binding.mangle = self.flags.mangle;
        }

        let id = state.bindings.push(binding);
        let node = match self.frame {
            Some(frame) if is_label => {
                let mut labels = state.frame(frame).labels;
                let node = state.symbols.add(&mut labels, key, id, flags);
                state.frame_mut(frame).labels = labels;
                node
            }
            _ => state.symbols.add(&mut self.symbols, key, id, flags),
        };
        state.bindings.get_mut(id).node = Some(node);
        if kind.is_top_level() && !flags.contains(NodeFlags::INTERNAL) {
            state.register_top_level(key, id);
        }
        Ok(id)
    }

    // ── Frame ───────────────────────────────────────────────────────

    pub fn set_return_type(&self, ty: BindingId) -> Result<(), ResolveError> {
        let Some(frame) = self.frame else {
            return Err(ResolveError::invariant(
                "return",
                "return type set outside of a function",
            ));
        };
        self.sess.state_mut().frame_mut(frame).return_type = Some(ty);
        Ok(())
    }

    pub fn return_type(&self) -> Option<BindingId> {
        self.sess.return_type(self.frame?)
    }

    // ── Debugging ───────────────────────────────────────────────────

    /// One line per binding of the current scope, newest first.
    pub fn dump_this_scope(&self) -> Vec<String> {
        let state = self.sess.state();
        state
            .symbols
            .walk(self.symbols.front, self.symbols.back)
            .map(|(_, node)| {
                let kind = state.bindings.get(node.value).kind;
                let mut line = format!(
                    "{} -> {:?} #{}",
                    self.sess.display_key(&node.key),
                    kind,
                    node.value.index()
                );
                for (flag, label) in [
                    (NodeFlags::ALIAS, " alias"),
                    (NodeFlags::IMPORTED, " imported"),
                    (NodeFlags::DIFF_SCOPE, " foreign"),
                    (NodeFlags::INTERNAL, " internal"),
                ] {
                    if node.flags.contains(flag) {
                        line.push_str(label);
                    }
                }
                line
            })
            .collect()
    }
}
