//! Two-pass declarations.
//!
//! The first pass binds every declaration's name so later bodies can refer
//! to items declared after them; bodies are queued on a [`Collect`] worklist.
//! The second pass finishes queued bodies in queue order, each with every
//! placeholder already visible.
//!
//! Each item moves `Declared -> BodyPending -> Finished`. A `Declared` item is
//! a prototype: a later declaration of the same key in the same scope may
//! still supply its body.

use weft_ir::Syntax;

use crate::scope::{LookupStrategy, NodeFlags};
use crate::{BindingId, BindingKind, Environ, ItemState, Namespace, ResolveError};

/// A queued body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectEntry<B> {
    pub binding: BindingId,
    pub kind: BindingKind,
    pub body: B,
}

/// Worklist of bodies awaiting the second pass.
#[derive(Clone, Debug)]
pub struct Collect<B> {
    entries: Vec<CollectEntry<B>>,
}

impl<B> Default for Collect<B> {
    fn default() -> Self {
        Collect {
            entries: Vec::new(),
        }
    }
}

impl<B> Collect<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CollectEntry<B>] {
        &self.entries
    }

    /// Finish every queued body in queue order.
    ///
    /// Functions are finished in a fresh frame derived from `env`, anything
    /// else in a fresh scope. The finisher sees every placeholder declared
    /// through `env`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn finish_all<'s, F>(self, env: &Environ<'s>, mut finisher: F) -> Result<usize, ResolveError>
    where
        F: FnMut(&mut Environ<'s>, BindingId, B) -> Result<(), ResolveError>,
    {
        let sess = env.session();
        tracing::debug!(queued = self.entries.len(), "finishing bodies");
        let mut finished = 0;
        for entry in self.entries {
            let binding = sess.binding(entry.binding);
            if binding.state != ItemState::BodyPending {
                return Err(ResolveError::invariant(
                    sess.interner().lookup(binding.name),
                    format!("finishing an item in state {:?}", binding.state),
                ));
            }

            let mut body_env = if entry.kind == BindingKind::Function {
                env.new_frame()
            } else {
                env.new_scope()
            };
            finisher(&mut body_env, entry.binding, entry.body)?;

            sess.state_mut().bindings.get_mut(entry.binding).state = ItemState::Finished;
            tracing::trace!(binding = entry.binding.index(), "finished");
            finished += 1;
        }
        Ok(finished)
    }
}

impl<'s> Environ<'s> {
    /// First pass of a declaration: bind `id` now, queue `body` for later.
    ///
    /// Without a body, or in an interface-only environment, the item stays
    /// `Declared`. A `Declared` item of the same kind already bound in this
    /// scope is continued instead of redeclared.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = ?kind))]
    pub fn declare_forward<B>(
        &mut self,
        collect: &mut Collect<B>,
        id: &Syntax,
        kind: BindingKind,
        ns: Namespace,
        body: Option<B>,
    ) -> Result<BindingId, ResolveError> {
        let key = self.expand_binding(id, ns)?;
        let body = body.filter(|_| !self.flags.interface_only);

        let (binding, fresh) = match self.find(&key, LookupStrategy::ThisScope) {
            Some(found) => {
                let previous = self.sess.binding(found.binding);
                let continues = previous.kind == kind
                    && (previous.state == ItemState::Declared || body.is_none());
                if !continues {
                    return Err(ResolveError::Redeclaration {
                        name: self.text(&key),
                        span: id.span,
                        previous: previous.span,
                    });
                }
                tracing::debug!(
                    name = %self.sess.display_key(&key),
                    with_body = body.is_some(),
                    "continued forward declaration"
                );
                (found.binding, false)
            }
            None => (self.insert(key, kind, id.span, NodeFlags::empty())?, true),
        };

        // a repeated prototype leaves the item's progress alone
        if body.is_some() || fresh {
            let state = if body.is_some() {
                ItemState::BodyPending
            } else {
                ItemState::Declared
            };
            self.sess.state_mut().bindings.get_mut(binding).state = state;
        }

        if let Some(body) = body {
            collect.entries.push(CollectEntry {
                binding,
                kind,
                body,
            });
        }
        Ok(binding)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
