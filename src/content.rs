//! Low-level PDF content stream generation for drawing primitives.
//!
//! Primitives are positioned in page space (y growing downwards); operators
//! are written in PDF space (y growing upwards), so every y coordinate is
//! flipped against the page height.

use crate::colour::{colours, Colour};
use crate::font::{Font, FONT_RESOURCE};
use crate::layout::FontMeasurer;
use crate::node::{runs_text, TextRun, TextStyle};
use crate::rect::Rect;
use crate::units::Pt;
use std::io::Write;

/// Font size of the message drawn inside placeholders
const PLACEHOLDER_FONT_SIZE: Pt = Pt(8.0);

pub(crate) struct ContentWriter {
    page_height: f32,
    bytes: Vec<u8>,
}

#[allow(clippy::write_with_newline)]
impl ContentWriter {
    pub fn new(page_height: Pt) -> ContentWriter {
        ContentWriter {
            page_height: *page_height,
            bytes: Vec::new(),
        }
    }

    fn y(&self, y: Pt) -> f32 {
        self.page_height - *y
    }

    /// Append `x y w h re` for a page-space rectangle
    fn rect(&mut self, rect: &Rect) -> std::io::Result<()> {
        write!(
            self.bytes,
            "{} {} {} {} re\n",
            *rect.x1,
            self.y(rect.y2),
            *rect.width(),
            *rect.height()
        )
    }

    /// Text wrapped into `frame` the same way [FontMeasurer] measured it,
    /// moved up by `scroll` and clipped to `clip`
    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        font: &Font,
        frame: &Rect,
        clip: &Rect,
        scroll: Pt,
        runs: &[TextRun],
        style: &TextStyle,
        wrap: bool,
    ) -> std::io::Result<()> {
        let width = if wrap { frame.width() } else { Pt(f32::INFINITY) };
        let lines = FontMeasurer::new(font).lines(&runs_text(runs), style, width);
        let line_height = font.line_height(style.font_size);
        let ascent = font.ascent(style.font_size);

        write!(self.bytes, "q\n")?;
        self.rect(clip)?;
        write!(self.bytes, "W n\n")?;
        write!(self.bytes, "BT\n")?;
        write!(self.bytes, "/{FONT_RESOURCE} {} Tf\n", *style.font_size)?;
        write_fill(&mut self.bytes, style.colour)?;
        for (i, line) in lines.iter().enumerate() {
            let top = frame.y1 - scroll + line_height * i as f32;
            if top + line_height < clip.y1 || top > clip.y2 {
                continue;
            }
            write!(
                self.bytes,
                "1 0 0 1 {} {} Tm\n",
                *frame.x1,
                self.y(top + ascent)
            )?;
            write!(self.bytes, "<")?;
            for byte in font.encode(line) {
                write!(self.bytes, "{byte:02x}")?;
            }
            write!(self.bytes, "> Tj\n")?;
        }
        write!(self.bytes, "ET\n")?;
        write!(self.bytes, "Q\n")
    }

    pub fn line(
        &mut self,
        from: (Pt, Pt),
        to: (Pt, Pt),
        thickness: Pt,
        colour: Colour,
    ) -> std::io::Result<()> {
        write!(self.bytes, "q\n")?;
        write!(self.bytes, "{} w\n", *thickness)?;
        write_stroke(&mut self.bytes, colour)?;
        write!(self.bytes, "{} {} m\n", *from.0, self.y(from.1))?;
        write!(self.bytes, "{} {} l\n", *to.0, self.y(to.1))?;
        write!(self.bytes, "S\n")?;
        write!(self.bytes, "Q\n")
    }

    /// Paint a named XObject stretched over `rect`. Images and converted SVGs
    /// both occupy the unit square.
    pub fn x_object(&mut self, name: &str, rect: &Rect) -> std::io::Result<()> {
        write!(self.bytes, "q\n")?;
        write!(
            self.bytes,
            "{} 0 0 {} {} {} cm\n",
            *rect.width(),
            *rect.height(),
            *rect.x1,
            self.y(rect.y2)
        )?;
        write!(self.bytes, "/{name} Do\n")?;
        write!(self.bytes, "Q\n")
    }

    /// A crossed-out grey box, with the message inside when a font is available
    pub fn placeholder(
        &mut self,
        rect: &Rect,
        message: &str,
        font: Option<&Font>,
    ) -> std::io::Result<()> {
        write!(self.bytes, "q\n")?;
        write!(self.bytes, "0.5 w\n")?;
        write_stroke(&mut self.bytes, colours::GREY)?;
        self.rect(rect)?;
        write!(self.bytes, "S\n")?;
        write!(self.bytes, "{} {} m\n", *rect.x1, self.y(rect.y1))?;
        write!(self.bytes, "{} {} l\n", *rect.x2, self.y(rect.y2))?;
        write!(self.bytes, "{} {} m\n", *rect.x2, self.y(rect.y1))?;
        write!(self.bytes, "{} {} l\n", *rect.x1, self.y(rect.y2))?;
        write!(self.bytes, "S\n")?;
        write!(self.bytes, "Q\n")?;

        match font {
            Some(font) => {
                let style = TextStyle {
                    font_size: PLACEHOLDER_FONT_SIZE,
                    colour: colours::DARK_GREY,
                };
                let runs = [TextRun::plain(message)];
                self.text(font, rect, rect, Pt::ZERO, &runs, &style, true)
            }
            None => Ok(()),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[allow(clippy::write_with_newline)]
fn write_fill(content: &mut Vec<u8>, colour: Colour) -> std::io::Result<()> {
    match colour {
        Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} rg\n"),
        Colour::CMYK { c, m, y, k } => write!(content, "{c} {m} {y} {k} k\n"),
        Colour::Grey { g } => write!(content, "{g} g\n"),
    }
}

#[allow(clippy::write_with_newline)]
fn write_stroke(content: &mut Vec<u8>, colour: Colour) -> std::io::Result<()> {
    match colour {
        Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} RG\n"),
        Colour::CMYK { c, m, y, k } => write!(content, "{c} {m} {y} {k} K\n"),
        Colour::Grey { g } => write!(content, "{g} G\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_flipped() {
        let mut content = ContentWriter::new(Pt(800.0));
        content
            .line((Pt(10.0), Pt(100.0)), (Pt(200.0), Pt(100.0)), Pt(1.0), colours::RED)
            .unwrap();
        content
            .x_object("I0", &Rect::from_xywh(Pt(10.0), Pt(20.0), Pt(30.0), Pt(40.0)))
            .unwrap();
        let text = String::from_utf8(content.finish()).unwrap();
        assert!(text.contains("10 700 m\n200 700 l\n"));
        assert!(text.contains("1 0 0 RG\n"));
        assert!(text.contains("30 0 0 40 10 740 cm\n/I0 Do\n"));
    }

    #[test]
    fn placeholder_without_font_is_a_crossed_box() {
        let mut content = ContentWriter::new(Pt(100.0));
        content
            .placeholder(&Rect::from_xywh(Pt(0.0), Pt(0.0), Pt(50.0), Pt(20.0)), "bad svg", None)
            .unwrap();
        let text = String::from_utf8(content.finish()).unwrap();
        assert!(text.contains("0 80 50 20 re\nS\n"));
        assert!(!text.contains("BT"));
    }
}
