//! Modules, imports and type member tables.
//!
//! A module body is parsed once in its own scope. Closing it freezes that
//! scope's `[front, back)` on the module binding; importing splices the
//! frozen range into the importer's chain without re-parsing anything.
//!
//! An import reached through macro expansion carries the marks that were
//! stripped while resolving the module reference. They are re-applied to
//! every imported key, newest last, so the imported names match only
//! references written at the same expansion layer as the `import`.

use weft_ir::Syntax;

use crate::scope::{ImportMode, LookupStrategy};
use crate::{BindingId, BindingKind, Environ, ImportFailure, ItemState, Namespace, ResolveError};

impl<'s> Environ<'s> {
    /// Declare a module and return the environment its body is parsed in.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn open_module(&mut self, id: &Syntax) -> Result<(BindingId, Environ<'s>), ResolveError> {
        let key = self.expand_binding(id, Namespace::Outer)?;
        let module = self.add(key, BindingKind::Module, id.span)?;
        self.sess.state_mut().bindings.get_mut(module).state = ItemState::BodyPending;
        Ok((module, self.new_scope()))
    }

    /// Freeze the scope of `body` as the export list of `module`.
    #[tracing::instrument(level = "debug", skip_all, fields(module = module.index()))]
    pub fn close_module(&self, module: BindingId, body: &Environ<'s>) -> Result<(), ResolveError> {
        let mut state = self.sess.state_mut();
        let binding = state.bindings.get_mut(module);
        let text = self.sess.interner().lookup(binding.name);
        if binding.kind != BindingKind::Module {
            return Err(ResolveError::invariant(text, "closing a binding that is not a module"));
        }
        if binding.scope.is_some() {
            return Err(ResolveError::invariant(text, "module closed twice"));
        }
        binding.scope = Some(body.symbols.this_scope());
        binding.state = ItemState::Finished;
        tracing::debug!(module = text, "closed module");
        Ok(())
    }

    /// Splice the exports of the module named by `module_ref` into this
    /// scope. Returns the number of names imported.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn import(&mut self, module_ref: &Syntax) -> Result<usize, ResolveError> {
        self.splice_module(module_ref, ImportMode::DifferentScope)
    }

    /// Re-open a closed module's scope for an out-of-line member definition.
    ///
    /// The module's names are spliced as if declared in the returned scope, so
    /// a definition there continues the module's own forward declaration.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn reopen_module(&self, module_ref: &Syntax) -> Result<Environ<'s>, ResolveError> {
        let mut env = self.new_scope();
        env.splice_module(module_ref, ImportMode::SameScope)?;
        Ok(env)
    }

    fn splice_module(&mut self, module_ref: &Syntax, mode: ImportMode) -> Result<usize, ResolveError> {
        let key = self.expand_reference(module_ref, Namespace::Outer)?;
        let failure = |reason| ResolveError::ImportCycleOrMissingModule {
            name: self.text(&key),
            span: module_ref.span,
            reason,
        };

        let found = self
            .find(&key, LookupStrategy::Exact)
            .ok_or_else(|| failure(ImportFailure::Missing))?;
        let module = self.sess.binding(found.binding);
        if module.kind != BindingKind::Module {
            return Err(failure(ImportFailure::NotAModule));
        }
        let range = module.scope.ok_or_else(|| failure(ImportFailure::Cycle))?;

        let hygiene = self.sess.hygiene();
        let sess = self.sess;
        let mut state = sess.state_mut();
        let exports = state.symbols.exports(range);
        let count = state.symbols.splice(&mut self.symbols, &exports, mode, |k| {
            k.with_marks(hygiene.extend(k.marks, found.stripped.iter().rev().copied()))
        });
        tracing::debug!(
            module = self.sess.interner().lookup(module.name),
            count,
            ?mode,
            reapplied = found.stripped.len(),
            "spliced module"
        );
        Ok(count)
    }

    /// Record the scope of `body` as the member table of type `ty`.
    pub fn close_members(&self, ty: BindingId, body: &Environ<'s>) -> Result<(), ResolveError> {
        let mut state = self.sess.state_mut();
        let binding = state.bindings.get_mut(ty);
        if binding.kind != BindingKind::Type {
            let text = self.sess.interner().lookup(binding.name);
            return Err(ResolveError::invariant(text, "member table on a non-type binding"));
        }
        binding.scope = Some(body.symbols.this_scope());
        Ok(())
    }

    /// Resolve a member of `ty`. Marks on `id` are stripped as needed: once
    /// inside the type, the member name's expansion history is irrelevant.
    pub fn lookup_member(&self, ty: BindingId, id: &Syntax) -> Result<BindingId, ResolveError> {
        let key = self.expand_reference(id, Namespace::Ordinary)?;
        let unknown = || ResolveError::UnknownIdentifier {
            name: self.text(&key),
            span: id.span,
        };
        let range = self.sess.binding(ty).scope.ok_or_else(unknown)?;
        let state = self.sess.state();
        state
            .symbols
            .lookup(
                self.sess.hygiene(),
                &state.sites,
                range.front,
                range.back,
                &key,
                LookupStrategy::StripMarks,
            )
            .map(|found| found.binding)
            .ok_or_else(unknown)
    }
}
