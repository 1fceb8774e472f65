use crate::units::Pt;

/// Space kept free around the contents of a container or a page. Section and
/// container margins are written in markup as `left, top, right, bottom`.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    /// Create margins by specifying individual components in a clockwise fashion
    /// starting at the top (in the same order as CSS margins)
    pub fn trbl(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Margins {
        Margins {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create margins in the order used by the `margins` attribute
    pub fn ltrb(left: Pt, top: Pt, right: Pt, bottom: Pt) -> Margins {
        Margins::trbl(top, right, bottom, left)
    }

    /// Create margins where all values are equal
    pub fn all<D: Into<Pt>>(value: D) -> Margins {
        let value: Pt = value.into();
        Margins::trbl(value, value, value, value)
    }

    /// Create margins by specifying different values for vertical (top and bottom)
    /// and horizontal (left and right) margins
    pub fn symmetric(vertical: Pt, horizontal: Pt) -> Margins {
        Margins::trbl(vertical, horizontal, vertical, horizontal)
    }

    /// Create margins where all values are 0.0
    pub fn empty() -> Margins {
        Margins::default()
    }

    /// Total horizontal space taken (left + right)
    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    /// Total vertical space taken (top + bottom)
    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }
}
