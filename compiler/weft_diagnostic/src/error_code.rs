//! Error codes for resolver diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E2003`) with the first digit
//! indicating the compiler phase.

use std::fmt;

/// Error codes for all resolver diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Name-form errors (syntax the resolver cannot read as a name)
/// - E2xxx: Resolution errors
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Name-form errors (E1xxx)
    /// Expected an identifier or qualified name
    E1004,

    // Resolution errors (E2xxx)
    /// Unknown identifier
    E2003,
    /// Duplicate definition in the same scope
    E2006,
    /// Imported module cannot be found, is not a module, or imports itself
    E2020,

    // Internal errors (E9xxx)
    /// Symbol bookkeeping invariant violated
    E9001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1004 => "E1004",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2020 => "E2020",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line explanation used by `--explain` style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1004 => "expected an identifier",
            ErrorCode::E2003 => "identifier not found in any enclosing scope",
            ErrorCode::E2006 => "name already defined in this scope",
            ErrorCode::E2020 => "module cannot be imported",
            ErrorCode::E9001 => "internal symbol bookkeeping error",
        }
    }

    /// Check if this is an internal compiler error rather than a user error.
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
