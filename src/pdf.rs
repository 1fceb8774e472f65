use crate::content::ContentWriter;
use crate::error::ReportError;
use crate::font::{Font, FONT_RESOURCE};
use crate::image::{write_svg, EncodedImage};
use crate::info::Info;
use crate::refs::{ObjectReferences, RefType};
use crate::rect::Size;
use crate::render::{PageSink, Primitive};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Name, Pdf, Ref};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

struct PageInProgress {
    size: Size,
    content: ContentWriter,
    /// Resource name and object of every XObject the page paints
    x_objects: Vec<(String, Ref)>,
    uses_font: bool,
}

/// A [PageSink] writing a PDF document.
///
/// Text is drawn with a single embedded font, which should be the one the
/// document was measured with (see [FontMeasurer](crate::layout::FontMeasurer)).
/// Without a font, text primitives are skipped with a warning.
///
/// The whole document is held in memory until [finish](PdfSink::finish).
pub struct PdfSink<'f> {
    font: Option<&'f Font>,
    info: Option<Info>,
    writer: Pdf,
    refs: ObjectReferences,
    pages: Vec<Ref>,
    /// Raster images already embedded, by path
    images: HashMap<PathBuf, (String, Ref)>,
    svg_count: usize,
    current: Option<PageInProgress>,
}

impl<'f> PdfSink<'f> {
    pub fn new(font: Option<&'f Font>) -> PdfSink<'f> {
        let mut refs = ObjectReferences::new();
        refs.gen(RefType::Catalog);
        refs.gen(RefType::PageTree);
        PdfSink {
            font,
            info: None,
            writer: Pdf::new(),
            refs,
            pages: Vec::new(),
            images: HashMap::new(),
            svg_count: 0,
            current: None,
        }
    }

    pub fn set_info(&mut self, info: Info) -> &mut Self {
        self.info = Some(info);
        self
    }

    /// Number of pages completed so far
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self) -> Result<&mut PageInProgress, ReportError> {
        self.current
            .as_mut()
            .ok_or_else(|| ReportError::render("draw outside of a page"))
    }

    /// The resource name and object of the image at `path`, embedding it on
    /// first use
    fn image(&mut self, path: PathBuf) -> Result<(String, Ref), ReportError> {
        if let Some(image) = self.images.get(&path) {
            return Ok(image.clone());
        }
        let index = self.images.len();
        let id = EncodedImage::from_path(&path)?.write(&mut self.refs, index, &mut self.writer);
        let image = (format!("I{index}"), id);
        self.images.insert(path, image.clone());
        Ok(image)
    }

    /// Write out the remaining objects and return the PDF's bytes
    pub fn finish(mut self) -> Result<Vec<u8>, ReportError> {
        if self.current.is_some() {
            return Err(ReportError::render("document finished inside a page"));
        }
        if let (Some(font), true) = (self.font, self.refs.get(RefType::Font).is_some()) {
            font.write(&mut self.refs, &mut self.writer);
        }
        if let Some(info) = &self.info {
            info.write(&mut self.refs, &mut self.writer);
        }

        let catalog_id = self.refs.get_or_gen(RefType::Catalog);
        let page_tree_id = self.refs.get_or_gen(RefType::PageTree);
        self.writer
            .pages(page_tree_id)
            .count(self.pages.len() as i32)
            .kids(self.pages.iter().copied());
        self.writer.catalog(catalog_id).pages(page_tree_id);

        log::debug!("finished pdf with {} page(s)", self.pages.len());
        Ok(self.writer.finish())
    }

    /// [finish](PdfSink::finish) into a writer
    pub fn write_to<W: Write>(self, mut w: W) -> Result<(), ReportError> {
        let bytes = self.finish()?;
        w.write_all(&bytes).map_err(Into::into)
    }
}

impl PageSink for PdfSink<'_> {
    fn begin_page(&mut self, size: Size) -> Result<(), ReportError> {
        if self.current.is_some() {
            return Err(ReportError::render(
                "page begun before the previous one ended",
            ));
        }
        self.current = Some(PageInProgress {
            size,
            content: ContentWriter::new(size.height),
            x_objects: Vec::new(),
            uses_font: false,
        });
        Ok(())
    }

    fn draw(&mut self, primitive: Primitive) -> Result<(), ReportError> {
        let font = self.font;
        match primitive {
            Primitive::Text {
                frame,
                clip,
                scroll,
                runs,
                style,
                wrap,
            } => {
                let Some(font) = font else {
                    log::warn!("no font to draw text with, skipping");
                    return Ok(());
                };
                let page = self.page()?;
                page.uses_font = true;
                page.content
                    .text(font, &frame, &clip, scroll, &runs, &style, wrap)?;
            }
            Primitive::Line {
                from,
                to,
                thickness,
                colour,
            } => self.page()?.content.line(from, to, thickness, colour)?,
            Primitive::Image { rect, path } => {
                self.page()?;
                let (name, id) = self.image(path)?;
                let page = self.page()?;
                page.content.x_object(&name, &rect)?;
                page.x_objects.push((name, id));
            }
            Primitive::Vector { rect, tree } => {
                self.page()?;
                let id = write_svg(&tree.0, &mut self.refs, &mut self.writer)?;
                let name = format!("S{}", self.svg_count);
                self.svg_count += 1;
                let page = self.page()?;
                page.content.x_object(&name, &rect)?;
                page.x_objects.push((name, id));
            }
            Primitive::Placeholder { rect, message } => {
                let page = self.page()?;
                page.uses_font |= font.is_some();
                page.content.placeholder(&rect, &message, font)?;
            }
        }
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), ReportError> {
        let page = self
            .current
            .take()
            .ok_or_else(|| ReportError::render("no page to end"))?;
        let index = self.pages.len();
        let page_id = self.refs.gen(RefType::Page(index));
        let content_id = self.refs.gen(RefType::Content(index));
        let font_id = page.uses_font.then(|| self.refs.get_or_gen(RefType::Font));
        let page_tree_id = self.refs.get_or_gen(RefType::PageTree);

        let content = compress_to_vec_zlib(
            &page.content.finish(),
            CompressionLevel::DefaultLevel as u8,
        );
        self.writer
            .stream(content_id, &content)
            .filter(Filter::FlateDecode);

        let mut pdf_page = self.writer.page(page_id);
        pdf_page.media_box(pdf_writer::Rect::new(
            0.0,
            0.0,
            *page.size.width,
            *page.size.height,
        ));
        pdf_page.parent(page_tree_id);
        pdf_page.contents(content_id);

        let mut resources = pdf_page.resources();
        if let Some(font_id) = font_id {
            resources.fonts().pair(Name(FONT_RESOURCE.as_bytes()), font_id);
        }
        let mut x_objects = resources.x_objects();
        for (name, id) in page.x_objects.iter() {
            x_objects.pair(Name(name.as_bytes()), *id);
        }
        x_objects.finish();
        resources.finish();
        pdf_page.finish();

        self.pages.push(page_id);
        Ok(())
    }
}
