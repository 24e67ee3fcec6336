//! Generic tagged syntax tree.
//!
//! The surface parser hands the resolver a tree of tagged nodes: each node
//! has a tag, ordered parts, named flags and a span. Leaves are identifiers,
//! and only identifiers carry a hygiene [`MarkSet`]; a macro expansion step
//! stamps its mark onto every identifier of the code it introduces.

use crate::{HygieneTable, Mark, MarkSet, Name, Span};

/// Shape of a syntax node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxKind {
    /// Identifier leaf; the text is the node's tag.
    Id,
    /// Interior node with ordered parts and named flags. A flag is itself a
    /// node whose tag is the flag name.
    Node {
        parts: Vec<Syntax>,
        flags: Vec<Syntax>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Syntax {
    pub tag: Name,
    pub marks: MarkSet,
    pub span: Span,
    pub kind: SyntaxKind,
}

impl Syntax {
    /// Identifier written directly in source.
    pub fn id(name: Name, span: Span) -> Self {
        Self::marked_id(name, MarkSet::EMPTY, span)
    }

    /// Identifier with an expansion history.
    pub fn marked_id(name: Name, marks: MarkSet, span: Span) -> Self {
        Syntax {
            tag: name,
            marks,
            span,
            kind: SyntaxKind::Id,
        }
    }

    pub fn node(tag: Name, parts: Vec<Syntax>, span: Span) -> Self {
        Syntax {
            tag,
            marks: MarkSet::EMPTY,
            span,
            kind: SyntaxKind::Node {
                parts,
                flags: Vec::new(),
            },
        }
    }

    /// Attach a named flag. No effect on identifier leaves.
    #[must_use]
    pub fn with_flag(mut self, flag: Syntax) -> Self {
        if let SyntaxKind::Node { flags, .. } = &mut self.kind {
            flags.push(flag);
        }
        self
    }

    #[inline]
    pub fn is_id(&self) -> bool {
        matches!(self.kind, SyntaxKind::Id)
    }

    pub fn parts(&self) -> &[Syntax] {
        match &self.kind {
            SyntaxKind::Id => &[],
            SyntaxKind::Node { parts, .. } => parts,
        }
    }

    pub fn part(&self, index: usize) -> Option<&Syntax> {
        self.parts().get(index)
    }

    pub fn flags(&self) -> &[Syntax] {
        match &self.kind {
            SyntaxKind::Id => &[],
            SyntaxKind::Node { flags, .. } => flags,
        }
    }

    pub fn flag(&self, name: Name) -> Option<&Syntax> {
        self.flags().iter().find(|flag| flag.tag == name)
    }

    /// Copy of this tree with `mark` added to every identifier.
    ///
    /// This is what one macro expansion step does to the code it returns.
    #[must_use]
    pub fn marked(&self, table: &HygieneTable, mark: Mark) -> Syntax {
        let kind = match &self.kind {
            SyntaxKind::Id => {
                return Syntax {
                    marks: table.add(self.marks, mark),
                    ..self.clone()
                }
            }
            SyntaxKind::Node { parts, flags } => SyntaxKind::Node {
                parts: parts.iter().map(|p| p.marked(table, mark)).collect(),
                flags: flags.iter().map(|p| p.marked(table, mark)).collect(),
            },
        };
        Syntax {
            tag: self.tag,
            marks: self.marks,
            span: self.span,
            kind,
        }
    }

    /// Identifier leaves in depth-first order, parts before flags.
    pub fn identifiers(&self) -> Vec<&Syntax> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a Syntax>) {
        match &self.kind {
            SyntaxKind::Id => out.push(self),
            SyntaxKind::Node { parts, flags } => {
                for child in parts.iter().chain(flags) {
                    child.collect_identifiers(out);
                }
            }
        }
    }
}
