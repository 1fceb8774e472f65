use crate::layout::Margins;
use crate::units::*;

/// A rectangle, specified by two opposite corners in page space (origin at the
/// top-left of the page, y growing downwards).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    /// The x-coordinate of the top-left corner.
    pub x1: Pt,
    /// The y-coordinate of the top-left corner.
    pub y1: Pt,
    /// The x-coordinate of the bottom-right corner.
    pub x2: Pt,
    /// The y-coordinate of the bottom-right corner.
    pub y2: Pt,
}

/// A width and a height
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn new<W: Into<Pt>, H: Into<Pt>>(width: W, height: H) -> Size {
        Size {
            width: width.into(),
            height: height.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width.0 <= 0.0 || self.height.0 <= 0.0
    }
}

impl Rect {
    /// Create a rectangle from its top-left corner and its size
    pub fn from_xywh<X, Y, W, H>(x: X, y: Y, width: W, height: H) -> Rect
    where
        X: Into<Pt>,
        Y: Into<Pt>,
        W: Into<Pt>,
        H: Into<Pt>,
    {
        let (x, y) = (x.into(), y.into());
        Rect {
            x1: x,
            y1: y,
            x2: x + width.into(),
            y2: y + height.into(),
        }
    }

    pub fn width(&self) -> Pt {
        self.x2 - self.x1
    }

    pub fn height(&self) -> Pt {
        self.y2 - self.y1
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Shrink the rectangle by the given margins, never producing a negative size
    pub fn inset(&self, margins: &Margins) -> Rect {
        let x1 = self.x1 + margins.left;
        let y1 = self.y1 + margins.top;
        Rect {
            x1,
            y1,
            x2: (self.x2 - margins.right).max(x1),
            y2: (self.y2 - margins.bottom).max(y1),
        }
    }

    /// The overlapping area of two rectangles, if any
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (r.x1 < r.x2 && r.y1 < r.y2).then_some(r)
    }
}

impl From<Size> for Rect {
    fn from(s: Size) -> Self {
        Rect::from_xywh(Pt::ZERO, Pt::ZERO, s.width, s.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inset_never_inverts() {
        let r = Rect::from_xywh(0, 0, 10, 10).inset(&Margins::all(Pt(8.0)));
        assert_eq!(r.width(), Pt::ZERO);
        assert_eq!(r.height(), Pt::ZERO);
        assert_eq!(r.x1, Pt(8.0));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = Rect::from_xywh(0, 0, 10, 10);
        let b = Rect::from_xywh(20, 0, 10, 10);
        assert!(a.intersect(&b).is_none());
        let c = Rect::from_xywh(5, 5, 10, 10);
        assert_eq!(a.intersect(&c), Some(Rect::from_xywh(5, 5, 5, 5)));
    }
}
