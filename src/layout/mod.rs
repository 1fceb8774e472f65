//! The box sizing engine.
//!
//! Every page is laid out from its root container down. A container splits
//! its inner rectangle (its own rectangle minus its margins) among its
//! children along its primary axis (horizontal for rows, vertical for
//! columns), using each child's preferred extent, [SizePolicy] and stretch
//! weight; see [distribute](crate::layout::distribute). Across the primary
//! axis each child either fills the container or keeps its preferred extent,
//! placed according to the container's [Alignment].
//!
//! Preferred extents come from the nodes themselves: text is measured by a
//! [TextMeasurer], images and vector graphics report their intrinsic size,
//! lines their thickness, and containers the sum (along their axis) or the
//! maximum (across it) of their children plus margins and spacing.
//!
//! Coordinates are in points with the origin at the top-left of the page and
//! y growing downwards.

mod boxes;
mod fit;
mod margins;
mod policy;
mod text;

pub use boxes::*;
pub use fit::*;
pub use margins::*;
pub use policy::*;
pub use text::*;

use crate::document::Document;
use crate::node::{Container, ImageContent, Node, NodeKind, Orientation, TextRun, TextStyle};
use crate::page::Page;
use crate::rect::{Rect, Size};
use crate::units::Pt;
use id_arena::Id;
use std::collections::HashMap;

/// Size given to vector graphics whose source could not be decoded, so the
/// placeholder drawn in their place stays visible
pub const PLACEHOLDER_SIZE: Size = Size {
    width: Pt(120.0),
    height: Pt(40.0),
};

/// The resolved geometry of one page
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// The area given to the page's root container
    pub area: Rect,
    /// The root container's inner area. Its height is the page height used to
    /// paginate overflowing text blocks.
    pub content: Rect,
    rects: HashMap<Id<Node>, Rect>,
}

impl PageLayout {
    pub fn rect(&self, id: Id<Node>) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Lay out a whole page within `area`
pub fn layout_page(
    document: &Document,
    page: &Page,
    area: Rect,
    measurer: &dyn TextMeasurer,
) -> PageLayout {
    LayoutEngine::new(document, measurer, page.text_style).layout(page.root, area)
}

/// The policy a container takes on from its children: it expands along an
/// axis if any child does, is ignored if every child is (or it's empty), and
/// is preferred otherwise
pub fn container_policy(document: &Document, children: &[Id<Node>]) -> ElasticSizePolicy {
    let derive = |axis: Axis| {
        let mut policies = children.iter().map(|id| document.nodes[*id].policy.along(axis));
        if policies.clone().any(SizePolicy::expands) {
            SizePolicy::Expanding
        } else if policies.all(|p| p == SizePolicy::Ignored) {
            SizePolicy::Ignored
        } else {
            SizePolicy::Preferred
        }
    };
    ElasticSizePolicy::new(derive(Axis::Horizontal), derive(Axis::Vertical))
}

/// Resolves preferred extents and rectangles for the nodes of a document
pub struct LayoutEngine<'a> {
    document: &'a Document,
    measurer: &'a dyn TextMeasurer,
    style: TextStyle,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(
        document: &'a Document,
        measurer: &'a dyn TextMeasurer,
        style: TextStyle,
    ) -> LayoutEngine<'a> {
        LayoutEngine {
            document,
            measurer,
            style,
        }
    }

    fn node(&self, id: Id<Node>) -> &'a Node {
        &self.document.nodes[id]
    }

    /// Preferred extent of a node along `axis`. `cross` is the extent the node
    /// will get across `axis`; only heights depend on it.
    pub fn preferred_extent(&self, id: Id<Node>, axis: Axis, cross: Pt) -> Pt {
        match axis {
            Axis::Horizontal => self.preferred_width(id),
            Axis::Vertical => self.preferred_height(id, cross),
        }
    }

    /// What the node contributes to its container's preferred extent
    fn basis(&self, id: Id<Node>, axis: Axis, cross: Pt) -> Pt {
        match self.node(id).policy.along(axis) {
            SizePolicy::Ignored => Pt::ZERO,
            _ => self.preferred_extent(id, axis, cross),
        }
    }

    fn label_size(&self, runs: &[TextRun]) -> Size {
        self.measurer.natural_size(runs, &self.style)
    }

    fn intrinsic(&self, node: &Node) -> Option<Size> {
        match &node.kind {
            NodeKind::Image(image) => Some(match &image.content {
                ImageContent::Raster { width, height } => Size::new(*width, *height),
                ImageContent::Unreadable { label } => self.label_size(&[TextRun::plain(label)]),
            }),
            NodeKind::Vector(vector) => {
                Some(vector.content.intrinsic_size().unwrap_or(PLACEHOLDER_SIZE))
            }
            _ => None,
        }
    }

    pub fn preferred_width(&self, id: Id<Node>) -> Pt {
        let node = self.node(id);
        if let Some(size) = node.policy.size {
            return size.width;
        }
        if let Some(size) = self.intrinsic(node) {
            return size.width;
        }

        match &node.kind {
            NodeKind::Container(c) => {
                let widths = c
                    .children
                    .iter()
                    .map(|child| self.basis(*child, Axis::Horizontal, Pt::ZERO));
                let inner = match c.kind.axis() {
                    Axis::Horizontal => widths.sum::<Pt>() + gaps(c),
                    Axis::Vertical => widths.fold(Pt::ZERO, Pt::max),
                };
                inner + c.margins.horizontal()
            }
            NodeKind::Label(label) => self.label_size(&label.runs).width,
            NodeKind::Line(line) => match line.orientation {
                Orientation::Horizontal => Pt::ZERO,
                Orientation::Vertical => line.thickness,
            },
            NodeKind::Text(_) | NodeKind::Image(_) | NodeKind::Vector(_) => Pt::ZERO,
        }
    }

    pub fn preferred_height(&self, id: Id<Node>, width: Pt) -> Pt {
        let node = self.node(id);
        if let Some(size) = node.policy.size {
            return size.height;
        }
        if let Some(size) = self.intrinsic(node) {
            return size.height;
        }

        match &node.kind {
            NodeKind::Container(c) => {
                let inner_width = (width - c.margins.horizontal()).non_negative();
                let inner = match c.kind.axis() {
                    Axis::Vertical => {
                        c.children
                            .iter()
                            .map(|child| {
                                let w = self.cross_width(c, *child, inner_width);
                                self.basis(*child, Axis::Vertical, w)
                            })
                            .sum::<Pt>()
                            + gaps(c)
                    }
                    Axis::Horizontal => self
                        .row_widths(c, inner_width)
                        .into_iter()
                        .zip(&c.children)
                        .map(|(w, child)| self.basis(*child, Axis::Vertical, w))
                        .fold(Pt::ZERO, Pt::max),
                };
                inner + c.margins.vertical()
            }
            NodeKind::Label(label) if label.word_wrap => {
                self.measurer
                    .wrapped_height(&label.runs, &self.style, width)
            }
            NodeKind::Label(label) => self.label_size(&label.runs).height,
            NodeKind::Text(text) => self.measurer.wrapped_height(&text.runs, &self.style, width),
            NodeKind::Line(line) => match line.orientation {
                Orientation::Horizontal => line.thickness,
                Orientation::Vertical => Pt::ZERO,
            },
            NodeKind::Image(_) | NodeKind::Vector(_) => Pt::ZERO,
        }
    }

    /// Width a column child gets across the column
    fn cross_width(&self, container: &Container, child: Id<Node>, available: Pt) -> Pt {
        let (_, width) = cross_extent(
            self.node(child).policy.horizontal,
            *self.preferred_width(child),
            *available,
            container.alignment,
        );
        Pt(width)
    }

    fn row_widths(&self, container: &Container, available: Pt) -> Vec<Pt> {
        let items: Vec<BoxItem> = container
            .children
            .iter()
            .map(|child| {
                let node = self.node(*child);
                BoxItem::new(
                    *self.preferred_width(*child),
                    node.policy.horizontal,
                    node.stretch,
                )
            })
            .collect();
        distribute(&items, *available, *container.spacing)
            .into_iter()
            .map(Pt)
            .collect()
    }

    /// Resolve the rectangle of `root` and all of its descendants
    pub fn layout(&self, root: Id<Node>, area: Rect) -> PageLayout {
        let content = match self.node(root).container() {
            Some(c) => area.inset(&c.margins),
            None => area,
        };
        let mut layout = PageLayout {
            area,
            content,
            rects: HashMap::new(),
        };
        self.arrange(root, area, &mut layout.rects);
        layout
    }

    fn arrange(&self, id: Id<Node>, rect: Rect, rects: &mut HashMap<Id<Node>, Rect>) {
        rects.insert(id, rect);
        let Some(container) = self.node(id).container() else {
            return;
        };

        let inner = rect.inset(&container.margins);
        match container.kind.axis() {
            Axis::Horizontal => {
                let widths = self.row_widths(container, inner.width());
                let raw: Vec<f32> = widths.iter().map(|w| w.0).collect();
                for ((child, width), x) in container
                    .children
                    .iter()
                    .zip(widths)
                    .zip(offsets(&raw, *container.spacing))
                {
                    let (y, height) = cross_extent(
                        self.node(*child).policy.vertical,
                        *self.preferred_height(*child, width),
                        *inner.height(),
                        container.alignment,
                    );
                    let child_rect = Rect::from_xywh(inner.x1 + Pt(x), inner.y1 + Pt(y), width, Pt(height));
                    self.arrange(*child, child_rect, rects);
                }
            }
            Axis::Vertical => {
                let across: Vec<(f32, f32)> = container
                    .children
                    .iter()
                    .map(|child| {
                        cross_extent(
                            self.node(*child).policy.horizontal,
                            *self.preferred_width(*child),
                            *inner.width(),
                            container.alignment,
                        )
                    })
                    .collect();
                let items: Vec<BoxItem> = container
                    .children
                    .iter()
                    .zip(&across)
                    .map(|(child, (_, width))| {
                        let node = self.node(*child);
                        BoxItem::new(
                            *self.preferred_height(*child, Pt(*width)),
                            node.policy.vertical,
                            node.stretch,
                        )
                    })
                    .collect();
                let heights = distribute(&items, *inner.height(), *container.spacing);
                let ys = offsets(&heights, *container.spacing);
                for (((child, (x, width)), height), y) in
                    container.children.iter().zip(across).zip(heights).zip(ys)
                {
                    let child_rect = Rect::from_xywh(inner.x1 + Pt(x), inner.y1 + Pt(y), width, height);
                    self.arrange(*child, child_rect, rects);
                }
            }
        }
    }
}

/// Total spacing between the children of a container
fn gaps(container: &Container) -> Pt {
    container.spacing * container.children.len().saturating_sub(1) as f32
}
