use crate::font::Font;
use crate::node::{runs_text, TextRun, TextStyle};
use crate::rect::Size;
use crate::units::Pt;

const TABSIZE: usize = 4;

/// Measures formatted text for the sizing engine. Implementations must agree
/// with how the [PageSink](crate::PageSink) eventually draws the text, or
/// wrapped content will be clipped.
pub trait TextMeasurer {
    /// Width of the longest line and height of all lines, breaking only at
    /// hard line breaks
    fn natural_size(&self, runs: &[TextRun], style: &TextStyle) -> Size;

    /// Height of the text once wrapped to `width`
    fn wrapped_height(&self, runs: &[TextRun], style: &TextStyle, width: Pt) -> Pt;
}

/// Replace tabs with spaces and normalize newlines
fn normalize(text: &str) -> String {
    text.replace('\t', &" ".repeat(TABSIZE))
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Wrap text into lines no wider than `width`, given the advance of every
/// character.
///
/// Lines break at hard line breaks and, when they overflow, at the last
/// whitespace. A word wider than the whole line is split between characters.
/// Every line holds at least one character, so a very narrow width still
/// makes progress.
pub fn wrap_lines<F: Fn(char) -> f32>(text: &str, width: f32, advance: F) -> Vec<String> {
    let mut lines = Vec::new();
    for hard_line in normalize(text).split('\n') {
        let chars: Vec<char> = hard_line.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let mut x = 0.0;
            let mut end = start;
            // index just after the last whitespace of the current line
            let mut last_break: Option<usize> = None;
            while end < chars.len() {
                let w = advance(chars[end]);
                if x + w > width && end > start {
                    break;
                }
                x += w;
                if chars[end].is_whitespace() {
                    last_break = Some(end + 1);
                }
                end += 1;
            }

            if end < chars.len() && !chars[end].is_whitespace() {
                if let Some(brk) = last_break.filter(|b| *b > start) {
                    end = brk;
                }
            }
            lines.push(chars[start..end].iter().collect::<String>().trim_end().to_string());

            start = end;
            // leading whitespace is swallowed by the break
            while start < chars.len() && chars[start] == ' ' {
                start += 1;
            }
        }
        if chars.is_empty() {
            lines.push(String::new());
        }
    }
    lines
}

fn widest<F: Fn(char) -> f32>(text: &str, advance: F) -> f32 {
    normalize(text)
        .split('\n')
        .map(|line| line.chars().map(&advance).sum::<f32>())
        .fold(0.0, f32::max)
}

/// A font-less measurer that gives every character the same advance, as a
/// fraction of the font size
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ApproximateMeasurer {
    /// Advance of one character, in ems
    pub advance: f32,
    /// Distance between consecutive baselines, in ems
    pub line_spacing: f32,
}

impl Default for ApproximateMeasurer {
    fn default() -> Self {
        ApproximateMeasurer {
            advance: 0.5,
            line_spacing: 1.2,
        }
    }
}

impl ApproximateMeasurer {
    pub fn line_height(&self, style: &TextStyle) -> Pt {
        style.font_size * self.line_spacing
    }

    pub fn lines(&self, text: &str, style: &TextStyle, width: Pt) -> Vec<String> {
        let advance = *style.font_size * self.advance;
        wrap_lines(text, *width, |_| advance)
    }
}

impl TextMeasurer for ApproximateMeasurer {
    fn natural_size(&self, runs: &[TextRun], style: &TextStyle) -> Size {
        let text = runs_text(runs);
        let advance = *style.font_size * self.advance;
        let lines = normalize(&text).split('\n').count();
        Size::new(
            widest(&text, |_| advance),
            self.line_height(style) * lines as f32,
        )
    }

    fn wrapped_height(&self, runs: &[TextRun], style: &TextStyle, width: Pt) -> Pt {
        let lines = self.lines(&runs_text(runs), style, width).len();
        self.line_height(style) * lines as f32
    }
}

/// Measures text with the metrics of a loaded [Font]
pub struct FontMeasurer<'f> {
    pub font: &'f Font,
}

impl<'f> FontMeasurer<'f> {
    pub fn new(font: &'f Font) -> FontMeasurer<'f> {
        FontMeasurer { font }
    }

    /// Lines of `text` wrapped to `width`, the way they will be drawn
    pub fn lines(&self, text: &str, style: &TextStyle, width: Pt) -> Vec<String> {
        wrap_lines(text, *width, |ch| *self.font.advance(ch, style.font_size))
    }
}

impl TextMeasurer for FontMeasurer<'_> {
    fn natural_size(&self, runs: &[TextRun], style: &TextStyle) -> Size {
        let text = runs_text(runs);
        let lines = normalize(&text).split('\n').count();
        Size::new(
            widest(&text, |ch| *self.font.advance(ch, style.font_size)),
            self.font.line_height(style.font_size) * lines as f32,
        )
    }

    fn wrapped_height(&self, runs: &[TextRun], style: &TextStyle, width: Pt) -> Pt {
        let lines = self.lines(&runs_text(runs), style, width).len();
        self.font.line_height(style.font_size) * lines as f32
    }
}
