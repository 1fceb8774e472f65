use crate::node::{Node, TextBlock};
use crate::page::Page;
use id_arena::{Arena, Id};

#[derive(Debug, Default)]
/// A document is the parsed report: its pages in print order, and the arena
/// owning every node of every page
pub struct Document {
    /// The template version declared by the root tag
    pub version: String,
    pub pages: Vec<Page>,
    pub nodes: Arena<Node>,
}

impl Document {
    /// Add a node to the arena. The caller is responsible for attaching it to
    /// exactly one container.
    pub fn alloc(&mut self, node: Node) -> Id<Node> {
        self.nodes.alloc(node)
    }

    /// Add a page to the end of the document, returning its index
    pub fn add_page(&mut self, page: Page) -> usize {
        self.pages.push(page);
        self.pages.len() - 1
    }

    pub fn node(&self, id: Id<Node>) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The children of a node, empty for leaves
    pub fn children(&self, id: Id<Node>) -> &[Id<Node>] {
        self.nodes
            .get(id)
            .and_then(Node::container)
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }

    /// `id` followed by all of its descendants, depth-first in document order
    pub fn descendants(&self, id: Id<Node>) -> Vec<Id<Node>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub(crate) fn find_in(&self, root: Id<Node>, name: &str) -> Option<Id<Node>> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.nodes[*id].name.as_deref() == Some(name))
    }

    /// Find the first node with the given name, searching pages in order
    pub fn find(&self, name: &str) -> Option<Id<Node>> {
        self.pages.iter().find_map(|page| page.find(self, name))
    }

    /// The text block with the given id, if that's what it is
    pub fn text_block(&self, id: Id<Node>) -> Option<&TextBlock> {
        self.nodes.get(id).and_then(Node::text_block)
    }
}
