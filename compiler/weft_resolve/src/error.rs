//! Resolution errors.
//!
//! Every failure is raised at the point of detection and carries enough to
//! render one located diagnostic. Internal invariant violations carry a
//! detail string instead of a user span.

use std::fmt;

use weft_diagnostic::{duplicate_definition, unknown_identifier, Diagnostic, ErrorCode};
use weft_ir::Span;

/// Why an import failed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ImportFailure {
    /// No module binding is visible under that name.
    Missing,
    /// The name resolves, but not to a module.
    NotAModule,
    /// The module is still being parsed: imported from inside its own body.
    Cycle,
}

impl ImportFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportFailure::Missing => "module not found",
            ImportFailure::NotAModule => "not a module",
            ImportFailure::Cycle => "module imported from inside its own body",
        }
    }
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String, span: Span },

    #[error("`{name}` is already defined in this scope")]
    Redeclaration {
        name: String,
        span: Span,
        previous: Span,
    },

    #[error("symbol bookkeeping error for `{name}`: {detail}")]
    UniquificationInvariant { name: String, detail: String },

    #[error("cannot import `{name}`: {reason}")]
    ImportCycleOrMissingModule {
        name: String,
        span: Span,
        reason: ImportFailure,
    },

    #[error("malformed name: {reason}")]
    MalformedName { span: Span, reason: &'static str },
}

impl ResolveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::UnknownIdentifier { .. } => ErrorCode::E2003,
            ResolveError::Redeclaration { .. } => ErrorCode::E2006,
            ResolveError::UniquificationInvariant { .. } => ErrorCode::E9001,
            ResolveError::ImportCycleOrMissingModule { .. } => ErrorCode::E2020,
            ResolveError::MalformedName { .. } => ErrorCode::E1004,
        }
    }

    /// Primary source location, if the error has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ResolveError::UnknownIdentifier { span, .. }
            | ResolveError::Redeclaration { span, .. }
            | ResolveError::ImportCycleOrMissingModule { span, .. }
            | ResolveError::MalformedName { span, .. } => Some(*span),
            ResolveError::UniquificationInvariant { .. } => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnknownIdentifier { name, span } => unknown_identifier(*span, name),
            ResolveError::Redeclaration {
                name,
                span,
                previous,
            } => duplicate_definition(*span, *previous, name),
            ResolveError::UniquificationInvariant { .. } => Diagnostic::error(self.code())
                .with_message(self.to_string())
                .with_note("this is a compiler bug"),
            ResolveError::ImportCycleOrMissingModule { reason, span, .. } => {
                Diagnostic::error(self.code())
                    .with_message(self.to_string())
                    .with_label(*span, reason.as_str())
            }
            ResolveError::MalformedName { span, reason } => Diagnostic::error(self.code())
                .with_message(self.to_string())
                .with_label(*span, *reason),
        }
    }

    pub(crate) fn invariant(name: impl Into<String>, detail: impl Into<String>) -> Self {
        ResolveError::UniquificationInvariant {
            name: name.into(),
            detail: detail.into(),
        }
    }
}
