use crate::attributes::Source;
use crate::colour::Colour;
use crate::layout::{Alignment, Axis, ElasticSizePolicy, Margins, SizePolicy};
use crate::rect::Size;
use crate::units::Pt;
use id_arena::Id;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Stretch weight of nodes that don't declare one
pub const DEFAULT_STRETCH: u32 = 10;

/// A single element of the document tree. Nodes are stored in the
/// [Document](crate::Document)'s arena and refer to their children by id.
#[derive(Debug)]
pub struct Node {
    pub name: Option<String>,
    /// The markup line the node was opened on
    pub line: usize,
    pub policy: ElasticSizePolicy,
    /// Relative share of surplus or deficit among siblings
    pub stretch: u32,
    pub kind: NodeKind,
}

#[derive(Debug)]
pub enum NodeKind {
    Container(Container),
    Label(Label),
    Text(TextBlock),
    Line(Line),
    Image(ImageNode),
    Vector(VectorGraphic),
}

impl Node {
    pub fn container(&self) -> Option<&Container> {
        match &self.kind {
            NodeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.kind {
            NodeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn text_block_mut(&mut self) -> Option<&mut TextBlock> {
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Store formatted character data on nodes that accept it
    pub(crate) fn set_runs(&mut self, runs: Vec<TextRun>) {
        match &mut self.kind {
            NodeKind::Label(label) => label.runs = runs,
            NodeKind::Text(text) => text.runs = runs,
            _ => {}
        }
    }
}

/// Whether a container stacks its children left-to-right or top-to-bottom
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Row,
    Column,
}

impl ContainerKind {
    /// The layout axis along which children are stacked
    pub fn axis(self) -> Axis {
        match self {
            ContainerKind::Row => Axis::Horizontal,
            ContainerKind::Column => Axis::Vertical,
        }
    }
}

#[derive(Debug)]
pub struct Container {
    pub kind: ContainerKind,
    pub spacing: Pt,
    pub margins: Margins,
    pub alignment: Alignment,
    pub children: Vec<Id<Node>>,
}

impl Container {
    pub fn new(kind: ContainerKind) -> Container {
        Container {
            kind,
            spacing: Pt::ZERO,
            margins: Margins::empty(),
            alignment: Alignment::default(),
            children: Vec::new(),
        }
    }
}

/// A styled piece of text produced by a [TextFormatter](crate::TextFormatter).
/// Line breaks inside `text` are hard breaks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl TextRun {
    pub fn plain<S: Into<String>>(text: S) -> TextRun {
        TextRun {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Concatenated text of a list of runs
pub fn runs_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Text styling inherited from the enclosing section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: Pt,
    pub colour: Colour,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: Pt(10.0),
            colour: Colour::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Label {
    pub runs: Vec<TextRun>,
    pub word_wrap: bool,
}

/// Long-form text that may continue over several physical pages
#[derive(Debug, Default)]
pub struct TextBlock {
    pub runs: Vec<TextRun>,
    page_count: usize,
    current_page_index: usize,
}

impl TextBlock {
    /// Number of physical pages the block needs, as of the last render
    pub fn page_count(&self) -> usize {
        self.page_count.max(1)
    }

    /// The page of the block currently being rendered
    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub(crate) fn set_page_count(&mut self, count: usize) {
        self.page_count = count;
    }

    pub(crate) fn set_page_index(&mut self, index: usize) {
        self.current_page_index = index;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub orientation: Orientation,
    pub thickness: Pt,
    pub colour: Colour,
}

/// What could be learned about a raster image when it was loaded
#[derive(Debug, Clone, PartialEq)]
pub enum ImageContent {
    /// The image header was readable; sizes already account for explicit
    /// `width` / `height` attributes
    Raster { width: Pt, height: Pt },
    /// The file exists but isn't a decodable image; its name is shown instead
    Unreadable { label: String },
}

#[derive(Debug, Clone)]
pub struct ImageNode {
    pub path: PathBuf,
    pub content: ImageContent,
}

/// A decoded SVG document, shared between the node and the primitives drawing it
#[derive(Clone)]
pub struct SvgTree(pub Rc<usvg::Tree>);

impl SvgTree {
    pub fn new(tree: usvg::Tree) -> SvgTree {
        SvgTree(Rc::new(tree))
    }

    /// Intrinsic size, from the view box
    pub fn size(&self) -> Size {
        let size = self.0.size();
        Size::new(Pt(size.width()), Pt(size.height()))
    }
}

impl fmt::Debug for SvgTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size();
        write!(f, "SvgTree({}x{})", size.width, size.height)
    }
}

/// Decoded vector content, or why it isn't available
#[derive(Debug, Clone)]
pub enum VectorContent {
    Svg(SvgTree),
    Unavailable { reason: String },
}

impl VectorContent {
    pub fn intrinsic_size(&self) -> Option<Size> {
        match self {
            VectorContent::Svg(tree) => Some(tree.size()),
            VectorContent::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorGraphic {
    pub source: Source,
    pub content: VectorContent,
}

/// Default policies of each leaf tag when the markup doesn't override them
pub(crate) mod defaults {
    use super::*;

    pub fn label() -> ElasticSizePolicy {
        ElasticSizePolicy::new(SizePolicy::Ignored, SizePolicy::Maximum)
    }

    pub fn text() -> ElasticSizePolicy {
        ElasticSizePolicy::new(SizePolicy::MinimumExpanding, SizePolicy::Maximum)
    }

    pub fn line(orientation: Orientation) -> ElasticSizePolicy {
        match orientation {
            Orientation::Horizontal => {
                ElasticSizePolicy::new(SizePolicy::Minimum, SizePolicy::Fixed)
            }
            Orientation::Vertical => ElasticSizePolicy::new(SizePolicy::Fixed, SizePolicy::Minimum),
        }
    }

    pub fn image() -> ElasticSizePolicy {
        ElasticSizePolicy::new(SizePolicy::Preferred, SizePolicy::MinimumExpanding)
    }

    pub fn vector() -> ElasticSizePolicy {
        ElasticSizePolicy::new(SizePolicy::Preferred, SizePolicy::Preferred)
    }
}
