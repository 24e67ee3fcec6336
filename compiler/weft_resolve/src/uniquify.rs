//! Disambiguation numbers and emitted names.
//!
//! Repeated macro expansion can leave many top-level bindings wanting the
//! same bare name. Each gets a number, assigned once, one above the highest
//! number already held by a symbol with the same name and namespace. The
//! emitted name joins name and number with [`SEPARATOR`], which cannot
//! appear in a source identifier, so emitted names never collide with
//! anything the user wrote.
//!
//! Labels and block locals are numbered per function body
//! ([`LocalNumbering`]) and emitted with [`LOCAL_MARKER`] after the
//! separator. A local can then never print like a global of the same name,
//! even though both counters start at 1.

use std::num::NonZeroU32;

use rustc_hash::{FxHashMap, FxHashSet};
use weft_ir::{Name, StringLookup};

use crate::scope::{NodeFlags, NodeId, SymbolArena};
use crate::{BindingArena, BindingId, BindingKind, Disambiguation, Namespace, ResolveError};

/// Joins a bare name and its disambiguation number.
pub const SEPARATOR: char = '$';

/// Follows [`SEPARATOR`] in the emitted name of a label or local.
pub const LOCAL_MARKER: char = 'L';

/// Number `sym` against the top-level symbols found in `[scan_from, scan_stop)`.
///
/// Only symbols with the same bare name and namespace that already carry a
/// number are considered; `sym`'s own nodes (aliases, imports) are skipped.
/// A symbol declared without mangling gets [`Disambiguation::Unmangled`].
#[tracing::instrument(level = "trace", skip_all, fields(sym = sym.index()))]
pub fn assign_uniq_num(
    arena: &SymbolArena,
    bindings: &mut BindingArena,
    names: &dyn StringLookup,
    sym: BindingId,
    scan_from: Option<NodeId>,
    scan_stop: Option<NodeId>,
) -> Result<Disambiguation, ResolveError> {
    let target = bindings.get(sym);
    let text = names.lookup(target.name);
    if !target.kind.is_top_level() {
        return Err(ResolveError::invariant(
            text,
            format!("{:?} binding is not a top-level symbol", target.kind),
        ));
    }
    if let Some(num) = target.num {
        return Err(ResolveError::invariant(
            text,
            format!("already numbered ({num:?})"),
        ));
    }

    let num = if target.mangle {
        let (name, ns) = (target.name, target.ns);
        let max = arena
            .walk(scan_from, scan_stop)
            .filter(|(_, node)| node.value != sym && !node.flags.contains(NodeFlags::INTERNAL))
            .filter_map(|(_, node)| {
                let other = bindings.get(node.value);
                let same = other.kind.is_top_level() && other.name == name && other.ns == ns;
                match other.num {
                    Some(Disambiguation::Number(n)) if same => Some(n.get()),
                    _ => None,
                }
            })
            .max()
            .unwrap_or(0);
        let next = max
            .checked_add(1)
            .and_then(NonZeroU32::new)
            .ok_or_else(|| ResolveError::invariant(text, "disambiguation numbers exhausted"))?;
        Disambiguation::Number(next)
    } else {
        Disambiguation::Unmangled
    };

    tracing::trace!(name = text, ?num, "numbered");
    bindings.get_mut(sym).num = Some(num);
    Ok(num)
}

/// Emitted form of a bare name under a disambiguation.
pub fn emitted_name(name: &str, num: Disambiguation) -> String {
    match num {
        Disambiguation::Unmangled => name.to_owned(),
        Disambiguation::Number(n) => format!("{name}{SEPARATOR}{n}"),
        Disambiguation::Local(n) => format!("{name}{SEPARATOR}{LOCAL_MARKER}{n}"),
    }
}

/// Emitted name of a binding.
///
/// Members are emitted bare: they live inside their type's namespace in the
/// output. Anything else must have been numbered first.
pub fn uniq_name(
    bindings: &BindingArena,
    names: &dyn StringLookup,
    sym: BindingId,
) -> Result<String, ResolveError> {
    let binding = bindings.get(sym);
    let text = names.lookup(binding.name);
    if binding.kind == BindingKind::Member {
        return Ok(text.to_owned());
    }
    match binding.num {
        Some(num) => Ok(emitted_name(text, num)),
        None => Err(ResolveError::invariant(
            text,
            "emitted name requested before numbering",
        )),
    }
}

/// Check that no two distinct symbols emit the same name in one namespace.
pub fn check_unique(
    bindings: &BindingArena,
    names: &dyn StringLookup,
    symbols: &[BindingId],
) -> Result<(), ResolveError> {
    let mut seen: FxHashMap<(Namespace, String), BindingId> = FxHashMap::default();
    let mut visited = FxHashSet::default();
    for &sym in symbols {
        if !visited.insert(sym) {
            continue;
        }
        let emitted = uniq_name(bindings, names, sym)?;
        let ns = bindings.get(sym).ns;
        if let Some(&other) = seen.get(&(ns, emitted.clone())) {
            return Err(ResolveError::invariant(
                emitted,
                format!(
                    "claimed by two symbols ({} and {})",
                    other.index(),
                    sym.index()
                ),
            ));
        }
        seen.insert((ns, emitted), sym);
    }
    Ok(())
}

/// Per-function numbering of labels and locals, keyed by bare name and
/// namespace. Numbers start at 1.
#[derive(Clone, Debug, Default)]
pub struct LocalNumbering {
    counters: FxHashMap<(Name, Namespace), u32>,
}

impl LocalNumbering {
    pub fn next(&mut self, name: Name, ns: Namespace) -> Disambiguation {
        let counter = self.counters.entry((name, ns)).or_insert(0);
        *counter = counter.saturating_add(1);
        NonZeroU32::new(*counter).map_or(Disambiguation::Unmangled, Disambiguation::Local)
    }
}
