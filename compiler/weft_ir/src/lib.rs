//! Weft IR - core front-end data
//!
//! This crate holds the leaf data the resolver is built on:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Hygiene marks and canonical mark sets
//! - The generic tagged syntax tree handed over by the surface parser
//!
//! Everything here is append-only for the lifetime of a compilation run:
//! names, marks and mark sets are never freed, so handles are plain `u32`
//! indices with O(1) equality.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod hygiene;
mod interner;
mod name;
mod span;
mod syntax;

pub use hygiene::{HygieneError, HygieneTable, Mark, MarkSet, MarkSetDisplay};
pub use interner::{InternError, StringInterner, StringLookup};
pub use name::Name;
pub use span::Span;
pub use syntax::{Syntax, SyntaxKind};
