//! Diagnostic reporting for the Weft front end.
//!
//! Every resolution failure becomes exactly one [`Diagnostic`]:
//! - Error code for searchability
//! - Clear message (what went wrong)
//! - Primary span (where it went wrong)
//! - Secondary labels (related locations, e.g. a previous definition)

mod diagnostic;
mod error_code;
pub mod span_utils;

pub use diagnostic::{duplicate_definition, unknown_identifier, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
