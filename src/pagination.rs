//! Splitting a text block that is taller than its page into page-sized windows.

use crate::units::Pt;

/// The visible slice of a text block's content on one physical page, in
/// content coordinates (0 is the top of the text)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Window {
    pub start: Pt,
    pub height: Pt,
}

impl Window {
    pub fn end(&self) -> Pt {
        self.start + self.height
    }

    /// How far the content has to move up for the window to line up with the
    /// top of its frame
    pub fn translation(&self) -> Pt {
        -self.start
    }
}

/// Pagination of one text block
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextPagination {
    /// Height of the wrapped content
    pub content_height: Pt,
    /// Height available on every physical page
    pub page_height: Pt,
    /// Distance from the top of the page's content area to the top of the
    /// block on its first page
    pub top_offset: Pt,
}

impl TextPagination {
    pub fn new(content_height: Pt, page_height: Pt, top_offset: Pt) -> TextPagination {
        TextPagination {
            content_height: content_height.non_negative(),
            page_height,
            top_offset: top_offset.non_negative(),
        }
    }

    /// Number of physical pages the block spans, at least one
    pub fn page_count(&self) -> usize {
        if self.page_height <= Pt::ZERO {
            return 1;
        }
        let pages = ((self.top_offset + self.content_height) / self.page_height).ceil();
        (pages as usize).max(1)
    }

    /// The window shown on the block's `index`-th page
    pub fn window(&self, index: usize) -> Window {
        let first = (self.page_height - self.top_offset).non_negative();
        match index {
            0 => Window {
                start: Pt::ZERO,
                height: first,
            },
            k => Window {
                start: first + self.page_height * (k - 1) as f32,
                height: self.page_height,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tall_block_spans_three_pages() {
        let p = TextPagination::new(Pt(2500.0), Pt(1000.0), Pt::ZERO);
        assert_eq!(p.page_count(), 3);
        let last = p.window(2);
        assert_eq!(last.start, Pt(2000.0));
        assert_eq!(last.end(), Pt(3000.0));
        assert_eq!(last.translation(), Pt(-2000.0));
    }

    #[test]
    fn offset_shortens_the_first_window() {
        let p = TextPagination::new(Pt(900.0), Pt(1000.0), Pt(300.0));
        assert_eq!(p.page_count(), 2);
        assert_eq!(p.window(0).height, Pt(700.0));
        assert_eq!(p.window(1).start, Pt(700.0));
    }

    #[test]
    fn empty_and_degenerate_blocks() {
        assert_eq!(TextPagination::new(Pt::ZERO, Pt(1000.0), Pt::ZERO).page_count(), 1);
        assert_eq!(TextPagination::new(Pt(500.0), Pt::ZERO, Pt::ZERO).page_count(), 1);
    }

    proptest! {
        #[test]
        fn page_count_matches_ceiling(height in 0u32..100_000, page in 1u32..5_000) {
            let p = TextPagination::new(Pt(height as f32), Pt(page as f32), Pt::ZERO);
            let expected = (height as usize).div_ceil(page as usize).max(1);
            prop_assert_eq!(p.page_count(), expected);
        }

        #[test]
        fn windows_tile_the_content(height in 1u32..20_000, page in 1u32..2_000, offset in 0u32..1_000) {
            prop_assume!(offset < page);
            let p = TextPagination::new(Pt(height as f32), Pt(page as f32), Pt(offset as f32));
            for k in 1..p.page_count() {
                prop_assert_eq!(p.window(k - 1).end(), p.window(k).start);
            }
            let last = p.window(p.page_count() - 1);
            prop_assert!(last.end() >= Pt(height as f32));
        }
    }
}
