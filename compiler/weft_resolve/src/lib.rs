//! Weft Resolve - hygienic scoped symbol resolution
//!
//! Every name the front end sees, written by hand or synthesized by a macro,
//! goes through this crate to become a binding and, eventually, a
//! collision-free emitted name.
//!
//! # Architecture
//!
//! - [`SymbolKey`]: `(name, marks, namespace)`, the lookup key
//! - [`scope`]: persistent scope chain in an append-only arena
//! - [`Session`]: per-unit arenas, hygiene table and interner
//! - [`Environ`]: the context value threaded through parsing
//! - [`Collect`]: worklist for two-pass declarations
//! - [`uniquify`]: disambiguation numbers and emitted names
//!
//! # Hygiene
//!
//! Each macro expansion stamps a fresh mark onto the identifiers it
//! introduces. Keys compare marks by identity, so a reference only sees
//! bindings with the same expansion history. On a miss, lookup strips the
//! newest mark and resumes where that macro was defined, which is how a
//! macro's free names reach the definitions visible at its definition.

mod binding;
mod collect;
mod environ;
mod error;
mod key;
mod module;
mod namespace;
pub mod scope;
mod session;
pub mod uniquify;

pub use binding::{Binding, BindingArena, BindingId, BindingKind, Disambiguation, ItemState, Prop};
pub use collect::{Collect, CollectEntry};
pub use environ::{Environ, EnvironFlags, InsertPoint};
pub use error::{ImportFailure, ResolveError};
pub use key::SymbolKey;
pub use namespace::Namespace;
pub use scope::{Found, ImportMode, LookupStrategy, NodeFlags, SymbolTable};
pub use session::{DepSet, DepsId, Frame, FrameId, Session};
pub use uniquify::{LOCAL_MARKER, SEPARATOR};
