//! Turning a laid out [Document] into drawing primitives for a [PageSink].
//!
//! Rendering walks every page of the document in order. A page is laid out
//! against the physical page size, and each of its text blocks is paginated
//! against the height of the page's content area. Blocks that don't fit
//! continue on extra physical pages that are emitted right after their page,
//! one sub-page per block and window.

use crate::colour::{colours, Colour};
use crate::document::Document;
use crate::error::ReportError;
use crate::layout::{
    fit_aspect, fit_raster, layout_page, Margins, PageLayout, TextMeasurer,
};
use crate::node::{
    ImageContent, Node, NodeKind, Orientation, SvgTree, TextRun, TextStyle, VectorContent,
};
use crate::pagesize::A4;
use crate::pagination::TextPagination;
use crate::rect::{Rect, Size};
use crate::units::Pt;
use id_arena::Id;
use std::collections::VecDeque;
use std::path::PathBuf;

/// A single drawing operation, in page space (origin at the top-left)
#[derive(Debug, Clone)]
pub enum Primitive {
    /// Text laid out in `frame`. Only the part inside `clip` is visible, and
    /// the content is moved up by `scroll` before drawing.
    Text {
        frame: Rect,
        clip: Rect,
        scroll: Pt,
        runs: Vec<TextRun>,
        style: TextStyle,
        wrap: bool,
    },
    Line {
        from: (Pt, Pt),
        to: (Pt, Pt),
        thickness: Pt,
        colour: Colour,
    },
    /// A raster image stretched over `rect`
    Image { rect: Rect, path: PathBuf },
    /// A vector graphic scaled to fill `rect`
    Vector { rect: Rect, tree: SvgTree },
    /// Drawn instead of content that couldn't be loaded
    Placeholder { rect: Rect, message: String },
}

/// Receives the output of a render, one physical page at a time
pub trait PageSink {
    fn begin_page(&mut self, size: Size) -> Result<(), ReportError>;
    fn draw(&mut self, primitive: Primitive) -> Result<(), ReportError>;
    fn end_page(&mut self) -> Result<(), ReportError>;
}

impl<S: PageSink + ?Sized> PageSink for &mut S {
    fn begin_page(&mut self, size: Size) -> Result<(), ReportError> {
        (**self).begin_page(size)
    }

    fn draw(&mut self, primitive: Primitive) -> Result<(), ReportError> {
        (**self).draw(primitive)
    }

    fn end_page(&mut self) -> Result<(), ReportError> {
        (**self).end_page()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordedPage {
    pub size: Size,
    pub primitives: Vec<Primitive>,
}

/// A sink that keeps everything it is given, for inspection or for replaying
/// into another sink
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub pages: Vec<RecordedPage>,
    open: bool,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink::default()
    }

    /// Send every recorded page to another sink
    pub fn replay<S: PageSink + ?Sized>(&self, sink: &mut S) -> Result<(), ReportError> {
        for page in self.pages.iter() {
            sink.begin_page(page.size)?;
            for primitive in page.primitives.iter() {
                sink.draw(primitive.clone())?;
            }
            sink.end_page()?;
        }
        Ok(())
    }
}

impl PageSink for RecordingSink {
    fn begin_page(&mut self, size: Size) -> Result<(), ReportError> {
        if self.open {
            return Err(ReportError::render("page begun before the previous one ended"));
        }
        self.open = true;
        self.pages.push(RecordedPage {
            size,
            primitives: Vec::new(),
        });
        Ok(())
    }

    fn draw(&mut self, primitive: Primitive) -> Result<(), ReportError> {
        match self.pages.last_mut() {
            Some(page) if self.open => {
                page.primitives.push(primitive);
                Ok(())
            }
            _ => Err(ReportError::render("draw outside of a page")),
        }
    }

    fn end_page(&mut self) -> Result<(), ReportError> {
        if !self.open {
            return Err(ReportError::render("no page to end"));
        }
        self.open = false;
        Ok(())
    }
}

/// Physical page setup
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub page_size: Size,
    /// Space kept clear around every physical page, outside of the pages' own
    /// margins
    pub page_margins: Margins,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            page_size: A4,
            page_margins: Margins::empty(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> RenderOptions {
        RenderOptions::default()
    }

    pub fn page_size(&mut self, size: Size) -> &mut Self {
        self.page_size = size;
        self
    }

    pub fn page_margins(&mut self, margins: Margins) -> &mut Self {
        self.page_margins = margins;
        self
    }

    /// The area pages are laid out in
    pub fn printable_area(&self) -> Rect {
        Rect::from(self.page_size).inset(&self.page_margins)
    }
}

/// Where a [Pipeline] is in the document
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    /// Drawing the first physical page of a document page
    RenderingPage { page: usize },
    /// Drawing continuation `index` (1-based) of an overflowing text block
    RenderingSubPage {
        page: usize,
        block: Id<Node>,
        index: usize,
    },
    Done,
}

/// Number of physical pages a render produced
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Document pages rendered
    pub pages: usize,
    /// Continuation pages of overflowing text blocks
    pub sub_pages: usize,
}

impl RenderSummary {
    pub fn physical_pages(&self) -> usize {
        self.pages + self.sub_pages
    }
}

/// Renders a document one physical page per [step](Pipeline::step).
///
/// Page counts and page indices of text blocks are written back to the
/// document while rendering, so they can be inspected afterwards.
pub struct Pipeline<'r, S: PageSink + ?Sized> {
    document: &'r mut Document,
    sink: &'r mut S,
    measurer: &'r dyn TextMeasurer,
    options: &'r RenderOptions,
    state: RenderState,
    /// Continuations still to render for the current page
    pending: VecDeque<(Id<Node>, usize)>,
    summary: RenderSummary,
}

impl<'r, S: PageSink + ?Sized> Pipeline<'r, S> {
    pub fn new(
        document: &'r mut Document,
        sink: &'r mut S,
        measurer: &'r dyn TextMeasurer,
        options: &'r RenderOptions,
    ) -> Pipeline<'r, S> {
        Pipeline {
            document,
            sink,
            measurer,
            options,
            state: RenderState::Idle,
            pending: VecDeque::new(),
            summary: RenderSummary::default(),
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn summary(&self) -> RenderSummary {
        self.summary
    }

    /// Advance to the next state and render its physical page. Any error
    /// aborts the run: the pipeline moves to [RenderState::Done] and text
    /// blocks are reset to their first page.
    pub fn step(&mut self) -> Result<RenderState, ReportError> {
        let next = self.next_state();
        log::debug!("render: {:?} -> {:?}", self.state, next);
        self.state = next;

        let result = match next {
            RenderState::Idle => Ok(()),
            RenderState::RenderingPage { page } => self.render_page(page),
            RenderState::RenderingSubPage { page, block, index } => {
                self.render_sub_page(page, block, index)
            }
            RenderState::Done => {
                self.reset_indices();
                Ok(())
            }
        };

        match result {
            Ok(()) => Ok(next),
            Err(e) => {
                log::error!("render aborted in {next:?}: {e}");
                self.pending.clear();
                self.reset_indices();
                self.state = RenderState::Done;
                Err(e)
            }
        }
    }

    fn next_state(&mut self) -> RenderState {
        let pages = self.document.pages.len();
        match self.state {
            RenderState::Idle if pages == 0 => RenderState::Done,
            RenderState::Idle => RenderState::RenderingPage { page: 0 },
            RenderState::RenderingPage { page } | RenderState::RenderingSubPage { page, .. } => {
                match self.pending.pop_front() {
                    Some((block, index)) => RenderState::RenderingSubPage { page, block, index },
                    None if page + 1 < pages => RenderState::RenderingPage { page: page + 1 },
                    None => RenderState::Done,
                }
            }
            RenderState::Done => RenderState::Done,
        }
    }

    fn reset_indices(&mut self) {
        for node in self.document.nodes.iter_mut().map(|(_, node)| node) {
            if let Some(block) = node.text_block_mut() {
                block.set_page_index(0);
            }
        }
    }

    fn layout(&self, page: usize) -> Result<PageLayout, ReportError> {
        let page = self
            .document
            .pages
            .get(page)
            .ok_or_else(|| ReportError::render(format!("no page {page}")))?;
        let layout = layout_page(
            &*self.document,
            page,
            self.options.printable_area(),
            self.measurer,
        );
        if layout.content.height() <= Pt::ZERO {
            return Err(ReportError::render(format!(
                "page at line {} has no room for content",
                page.line
            )));
        }
        Ok(layout)
    }

    fn pagination(&self, layout: &PageLayout, block: Id<Node>, style: &TextStyle) -> Option<(Rect, TextPagination)> {
        let rect = layout.rect(block)?;
        let runs = &self.document.text_block(block)?.runs;
        let height = self.measurer.wrapped_height(runs, style, rect.width());
        let pagination =
            TextPagination::new(height, layout.content.height(), rect.y1 - layout.content.y1);
        Some((rect, pagination))
    }

    fn render_page(&mut self, index: usize) -> Result<(), ReportError> {
        let layout = self.layout(index)?;
        let page = &self.document.pages[index];
        let style = page.text_style;

        let mut primitives = Vec::new();
        let mut counts = Vec::new();
        for id in self.document.descendants(page.root) {
            let node = &self.document.nodes[id];
            let Some(rect) = layout.rect(id) else {
                continue;
            };
            if let NodeKind::Text(block) = &node.kind {
                let (frame, count) = match self.pagination(&layout, id, &style) {
                    Some((_, pagination)) if pagination.page_count() > 1 => (
                        Rect::from_xywh(rect.x1, rect.y1, rect.width(), pagination.window(0).height),
                        pagination.page_count(),
                    ),
                    _ => (rect, 1),
                };
                primitives.push(Primitive::Text {
                    frame,
                    clip: frame,
                    scroll: Pt::ZERO,
                    runs: block.runs.clone(),
                    style,
                    wrap: true,
                });
                counts.push((id, count));
            } else {
                primitives.extend(leaf_primitives(node, rect, &style));
            }
        }

        for (id, count) in counts.iter() {
            if let Some(block) = self.document.nodes[*id].text_block_mut() {
                block.set_page_count(*count);
                block.set_page_index(0);
            }
            if *count > 1 {
                log::debug!("text block continues on {} more page(s)", count - 1);
            }
            self.pending.extend((1..*count).map(|k| (*id, k)));
        }

        self.sink.begin_page(self.options.page_size)?;
        for primitive in primitives {
            self.sink.draw(primitive)?;
        }
        self.sink.end_page()?;
        self.summary.pages += 1;
        Ok(())
    }

    fn render_sub_page(
        &mut self,
        page: usize,
        block: Id<Node>,
        index: usize,
    ) -> Result<(), ReportError> {
        if let Some(text) = self.document.nodes[block].text_block_mut() {
            text.set_page_index(index);
        }

        let layout = self.layout(page)?;
        let style = self.document.pages[page].text_style;
        let (rect, pagination) = self
            .pagination(&layout, block, &style)
            .ok_or_else(|| ReportError::render("continued text block is no longer laid out"))?;
        let window = pagination.window(index);
        let frame = Rect::from_xywh(rect.x1, layout.content.y1, rect.width(), window.height);
        let runs = self
            .document
            .text_block(block)
            .map(|text| text.runs.clone())
            .unwrap_or_default();

        self.sink.begin_page(self.options.page_size)?;
        self.sink.draw(Primitive::Text {
            frame,
            clip: frame,
            scroll: window.start,
            runs,
            style,
            wrap: true,
        })?;
        self.sink.end_page()?;
        self.summary.sub_pages += 1;
        Ok(())
    }
}

/// Primitives drawing a non-text leaf in `rect`
fn leaf_primitives(node: &Node, rect: Rect, style: &TextStyle) -> Option<Primitive> {
    match &node.kind {
        NodeKind::Container(_) | NodeKind::Text(_) => None,
        NodeKind::Label(label) => Some(Primitive::Text {
            frame: rect,
            clip: rect,
            scroll: Pt::ZERO,
            runs: label.runs.clone(),
            style: *style,
            wrap: label.word_wrap,
        }),
        NodeKind::Line(line) => {
            let (from, to) = match line.orientation {
                Orientation::Horizontal => {
                    let y = (rect.y1 + rect.y2) / 2.0;
                    ((rect.x1, y), (rect.x2, y))
                }
                Orientation::Vertical => {
                    let x = (rect.x1 + rect.x2) / 2.0;
                    ((x, rect.y1), (x, rect.y2))
                }
            };
            Some(Primitive::Line {
                from,
                to,
                thickness: line.thickness,
                colour: line.colour,
            })
        }
        NodeKind::Image(image) => match &image.content {
            ImageContent::Raster { width, height } => {
                match fit_raster(&rect, Size::new(*width, *height)) {
                    Some(target) => Some(Primitive::Image {
                        rect: target,
                        path: image.path.clone(),
                    }),
                    None => {
                        log::warn!("image '{}' has no size, skipping", image.path.display());
                        None
                    }
                }
            }
            ImageContent::Unreadable { label } => Some(Primitive::Text {
                frame: rect,
                clip: rect,
                scroll: Pt::ZERO,
                runs: vec![TextRun::plain(label.clone())],
                style: TextStyle {
                    colour: colours::GREY,
                    ..*style
                },
                wrap: true,
            }),
        },
        NodeKind::Vector(vector) => match &vector.content {
            VectorContent::Svg(tree) => match fit_aspect(&rect, tree.size()) {
                Some(target) => Some(Primitive::Vector {
                    rect: target,
                    tree: tree.clone(),
                }),
                None => {
                    log::warn!("vector graphic '{}' has zero size, skipping", vector.source);
                    None
                }
            },
            VectorContent::Unavailable { reason } => {
                log::warn!("drawing placeholder for '{}': {reason}", vector.source);
                Some(Primitive::Placeholder {
                    rect,
                    message: reason.clone(),
                })
            }
        },
    }
}

/// Renders whole documents with one measurer and page setup
pub struct Renderer<'m> {
    measurer: &'m dyn TextMeasurer,
    options: RenderOptions,
}

impl<'m> Renderer<'m> {
    pub fn new(measurer: &'m dyn TextMeasurer, options: RenderOptions) -> Renderer<'m> {
        Renderer { measurer, options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render every page of `document` into `sink`
    pub fn render<S: PageSink + ?Sized>(
        &self,
        document: &mut Document,
        sink: &mut S,
    ) -> Result<RenderSummary, ReportError> {
        let mut pipeline = Pipeline::new(document, sink, self.measurer, &self.options);
        while pipeline.step()? != RenderState::Done {}
        let summary = pipeline.summary();
        log::info!(
            "rendered {} page(s) onto {} physical page(s)",
            summary.pages,
            summary.physical_pages()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{parse, ParseOptions};
    use crate::layout::ApproximateMeasurer;
    use crate::node::runs_text;

    /// Reports a fixed height for every wrapped text, and a small natural size
    struct TallText(f32);

    impl TextMeasurer for TallText {
        fn natural_size(&self, _: &[TextRun], _: &TextStyle) -> Size {
            Size::new(Pt(50.0), Pt(10.0))
        }

        fn wrapped_height(&self, _: &[TextRun], _: &TextStyle, _: Pt) -> Pt {
            Pt(self.0)
        }
    }

    fn options(width: f32, height: f32) -> RenderOptions {
        let mut options = RenderOptions::new();
        options.page_size(Size::new(Pt(width), Pt(height)));
        options
    }

    #[test]
    fn recording_sink_rejects_misuse() {
        let mut sink = RecordingSink::new();
        assert!(sink.end_page().is_err());
        sink.begin_page(A4).unwrap();
        assert!(sink.begin_page(A4).is_err());
        sink.end_page().unwrap();
        assert!(sink
            .draw(Primitive::Placeholder {
                rect: Rect::default(),
                message: String::new(),
            })
            .is_err());
    }

    #[test]
    fn recorded_pages_replay_into_another_sink() {
        let mut doc = parse(
            r#"<report version="1">
                <page><label>first</label><hline/></page>
                <page><label>second</label></page>
            </report>"#,
            &ParseOptions::default(),
        )
        .unwrap();
        let mut recorded = RecordingSink::new();
        Renderer::new(&ApproximateMeasurer::default(), options(300.0, 300.0))
            .render(&mut doc, &mut recorded)
            .unwrap();

        let mut copy = RecordingSink::new();
        recorded.replay(&mut copy).unwrap();
        assert_eq!(copy.pages.len(), 2);
        for (original, replayed) in recorded.pages.iter().zip(copy.pages.iter()) {
            assert_eq!(original.size, replayed.size);
            assert_eq!(original.primitives.len(), replayed.primitives.len());
        }
    }

    #[test]
    fn tall_text_continues_on_sub_pages() {
        let mut doc = parse(
            r#"<report version="1"><page><text name="body">long</text></page></report>"#,
            &ParseOptions::default(),
        )
        .unwrap();
        let measurer = TallText(2500.0);
        let options = options(500.0, 1000.0);
        let mut sink = RecordingSink::new();

        let mut pipeline = Pipeline::new(&mut doc, &mut sink, &measurer, &options);
        assert_eq!(pipeline.step().unwrap(), RenderState::RenderingPage { page: 0 });
        assert!(matches!(
            pipeline.step().unwrap(),
            RenderState::RenderingSubPage { page: 0, index: 1, .. }
        ));
        let body = doc_find(&pipeline, "body");
        assert_eq!(pipeline.document.text_block(body).unwrap().current_page_index(), 1);
        assert!(matches!(
            pipeline.step().unwrap(),
            RenderState::RenderingSubPage { page: 0, index: 2, .. }
        ));
        assert_eq!(pipeline.step().unwrap(), RenderState::Done);
        assert_eq!(pipeline.summary().physical_pages(), 3);

        let body = doc.find("body").unwrap();
        let block = doc.text_block(body).unwrap();
        assert_eq!(block.page_count(), 3);
        assert_eq!(block.current_page_index(), 0);

        assert_eq!(sink.pages.len(), 3);
        match &sink.pages[2].primitives[..] {
            [Primitive::Text { frame, scroll, .. }] => {
                assert_eq!(*scroll, Pt(2000.0));
                assert_eq!(frame.y1, Pt::ZERO);
                assert_eq!(frame.height(), Pt(1000.0));
            }
            other => panic!("unexpected primitives {other:?}"),
        }
    }

    fn doc_find<S: PageSink + ?Sized>(pipeline: &Pipeline<'_, S>, name: &str) -> Id<Node> {
        pipeline.document.find(name).unwrap()
    }

    #[test]
    fn sub_pages_come_right_after_their_page() {
        let mut doc = parse(
            r#"<report version="1">
                <page><text>first</text></page>
                <page><label>second</label></page>
            </report>"#,
            &ParseOptions::default(),
        )
        .unwrap();
        let measurer = TallText(1500.0);
        let mut sink = RecordingSink::new();
        let summary = Renderer::new(&measurer, options(500.0, 1000.0))
            .render(&mut doc, &mut sink)
            .unwrap();

        assert_eq!(summary, RenderSummary { pages: 2, sub_pages: 1 });
        let texts: Vec<String> = sink
            .pages
            .iter()
            .map(|page| match &page.primitives[0] {
                Primitive::Text { runs, .. } => runs_text(runs),
                other => panic!("unexpected primitive {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["first", "first", "second"]);
    }

    #[test]
    fn lines_and_placeholders() {
        let mut doc = parse(
            r#"<report version="1"><page>
                <hline line_width="2"/>
                <svg src="env://broken"/>
            </page></report>"#,
            ParseOptions::default().environment({
                let mut env = crate::Environment::new();
                env.insert("broken", "<not svg");
                env
            }),
        )
        .unwrap();
        let mut sink = RecordingSink::new();
        Renderer::new(&ApproximateMeasurer::default(), options(400.0, 400.0))
            .render(&mut doc, &mut sink)
            .unwrap();

        let primitives = &sink.pages[0].primitives;
        assert!(matches!(
            primitives[0],
            Primitive::Line { from, to, thickness, .. }
                if from.0 == Pt::ZERO && to.0 == Pt(400.0) && from.1 == to.1 && thickness == Pt(2.0)
        ));
        assert!(matches!(primitives[1], Primitive::Placeholder { .. }));
    }

    struct FailingSink;

    impl PageSink for FailingSink {
        fn begin_page(&mut self, _: Size) -> Result<(), ReportError> {
            Err(ReportError::render("out of paper"))
        }

        fn draw(&mut self, _: Primitive) -> Result<(), ReportError> {
            Ok(())
        }

        fn end_page(&mut self) -> Result<(), ReportError> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_aborts_the_run() {
        let mut doc = parse(
            r#"<report version="1"><page><label>x</label></page></report>"#,
            &ParseOptions::default(),
        )
        .unwrap();
        let measurer = ApproximateMeasurer::default();
        let options = RenderOptions::default();
        let mut sink = FailingSink;
        let mut pipeline = Pipeline::new(&mut doc, &mut sink, &measurer, &options);
        assert!(matches!(pipeline.step(), Err(ReportError::Render(_))));
        assert_eq!(pipeline.state(), RenderState::Done);
    }
}
