//! Namespace tags.
//!
//! Namespaces partition the symbol space so one spelling can name an
//! ordinary value, a struct tag, a label and a module at the same time
//! without any of them colliding.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Namespace {
    /// Values, functions and typedef names. Lookups default here.
    #[default]
    Ordinary,
    /// `struct`/`union`/`enum` tags.
    Tag,
    /// Goto labels; resolved against the enclosing function frame.
    Label,
    /// Macro and syntax-form names.
    Syntax,
    /// Operator overloads.
    Operator,
    /// Modules.
    Outer,
    /// Names of namespaces themselves.
    Inner,
    /// Cast tables.
    Cast,
    /// Compiler-private bindings.
    Internal,
    Hidden,
    MacroExport,
}

impl Namespace {
    pub const ALL: [Namespace; 11] = [
        Namespace::Ordinary,
        Namespace::Tag,
        Namespace::Label,
        Namespace::Syntax,
        Namespace::Operator,
        Namespace::Outer,
        Namespace::Inner,
        Namespace::Cast,
        Namespace::Internal,
        Namespace::Hidden,
        Namespace::MacroExport,
    ];

    /// Spelling used in qualified names and debug output.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Ordinary => "default",
            Namespace::Tag => "tag",
            Namespace::Label => "label",
            Namespace::Syntax => "syntax",
            Namespace::Operator => "operator",
            Namespace::Outer => "outer",
            Namespace::Inner => "inner",
            Namespace::Cast => "cast",
            Namespace::Internal => "internal",
            Namespace::Hidden => "hidden",
            Namespace::MacroExport => "macro_export",
        }
    }

    pub fn from_name(name: &str) -> Option<Namespace> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
