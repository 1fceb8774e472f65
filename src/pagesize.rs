//! Pre-defined page sizes for common paper formats.
//!
//! All sizes are in portrait orientation. Use
//! [`PageOrientation`](crate::pagesize::PageOrientation) to turn them
//! landscape.
//!
//! ```
//! use report_gen::pagesize::{PageOrientation, A4, LETTER};
//!
//! let portrait = LETTER;
//! let landscape = A4.landscape();
//! assert!(landscape.width > landscape.height);
//! # let _ = portrait;
//! ```

use crate::rect::Size;
use crate::units::Pt;

const INCH: f32 = 72.0;
const MM: f32 = 72.0 / 25.4;

pub const LETTER: Size = Size {
    width: Pt(8.5 * INCH),
    height: Pt(11.0 * INCH),
};
pub const LEGAL: Size = Size {
    width: Pt(8.5 * INCH),
    height: Pt(14.0 * INCH),
};
pub const TABLOID: Size = Size {
    width: Pt(11.0 * INCH),
    height: Pt(17.0 * INCH),
};

pub const A3: Size = Size {
    width: Pt(297.0 * MM),
    height: Pt(420.0 * MM),
};
pub const A4: Size = Size {
    width: Pt(210.0 * MM),
    height: Pt(297.0 * MM),
};
pub const A5: Size = Size {
    width: Pt(148.0 * MM),
    height: Pt(210.0 * MM),
};

/// Look up a page size by its (case-insensitive) name
pub fn named(name: &str) -> Option<Size> {
    match name.to_ascii_lowercase().as_str() {
        "letter" => Some(LETTER),
        "legal" => Some(LEGAL),
        "tabloid" => Some(TABLOID),
        "a3" => Some(A3),
        "a4" => Some(A4),
        "a5" => Some(A5),
        _ => None,
    }
}

/// Convert page sizes between portrait and landscape orientations.
pub trait PageOrientation {
    /// The size with width ≤ height
    fn portrait(self) -> Self;
    /// The size with width ≥ height
    fn landscape(self) -> Self;
}

impl PageOrientation for Size {
    fn portrait(self) -> Size {
        if self.width <= self.height {
            self
        } else {
            Size {
                width: self.height,
                height: self.width,
            }
        }
    }

    fn landscape(self) -> Size {
        if self.width >= self.height {
            self
        } else {
            Size {
                width: self.height,
                height: self.width,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation() {
        let landscape = A4.landscape();
        assert_eq!(landscape.width, A4.height);
        assert_eq!(landscape.portrait(), A4);
        assert_eq!(named("Letter"), Some(LETTER));
        assert_eq!(named("b5"), None);
    }
}
