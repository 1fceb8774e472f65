use crate::document::Document;
use crate::layout::Margins;
use crate::node::{ContainerKind, Node, TextStyle};
use crate::units::Pt;
use id_arena::Id;
use std::collections::BTreeMap;

/// A section of the report. Each page starts on a new physical page and
/// continues onto extra physical pages only when one of its text blocks
/// overflows.
#[derive(Debug)]
pub struct Page {
    pub name: Option<String>,
    /// The markup line the section was opened on
    pub line: usize,
    /// The top-level container holding the section's contents
    pub root: Id<Node>,
    /// Free-form `key: value` pairs from the `metadata` attribute
    pub metadata: BTreeMap<String, String>,
    pub margins: Margins,
    pub spacing: Pt,
    /// Direction of the root container
    pub child_layout: ContainerKind,
    /// Raw `style` declarations
    pub style: BTreeMap<String, String>,
    /// Text style derived from `style`
    pub text_style: TextStyle,
}

impl Page {
    /// Find the first node of this page with the given name, depth-first in
    /// document order
    pub fn find(&self, document: &Document, name: &str) -> Option<Id<Node>> {
        document.find_in(self.root, name)
    }
}
