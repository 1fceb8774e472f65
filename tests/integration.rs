//! End-to-end tests: markup in, primitives (or PDF bytes) out.

use report_gen::layout::{ApproximateMeasurer, LayoutEngine, TextMeasurer};
use report_gen::*;
use std::io::Write as _;

// ─── Helpers ────────────────────────────────────────────────────

fn parse_ok(markup: &str) -> Document {
    parse(markup, &ParseOptions::default()).expect("markup parses")
}

fn page_layout(document: &Document, width: f32, height: f32) -> layout::PageLayout {
    let measurer = ApproximateMeasurer::default();
    layout::layout_page(
        document,
        &document.pages[0],
        Rect::from_xywh(Pt(0.0), Pt(0.0), Pt(width), Pt(height)),
        &measurer,
    )
}

fn rect_of(document: &Document, layout: &layout::PageLayout, name: &str) -> Rect {
    let id = document.find(name).expect("named node exists");
    layout.rect(id).expect("node is laid out")
}

/// Every text measures as a fixed block, whatever its width
struct FixedHeight(f32);

impl TextMeasurer for FixedHeight {
    fn natural_size(&self, _: &[TextRun], _: &TextStyle) -> Size {
        Size::new(Pt(40.0), Pt(12.0))
    }

    fn wrapped_height(&self, _: &[TextRun], _: &TextStyle, _: Pt) -> Pt {
        Pt(self.0)
    }
}

// ─── Layout ─────────────────────────────────────────────────────

#[test]
fn three_labels_share_a_row_equally() {
    let doc = parse_ok(
        r#"<report version="1"><page child_layout="row">
            <label name="a">one</label>
            <label name="b">two</label>
            <label name="c">three</label>
        </page></report>"#,
    );
    let layout = page_layout(&doc, 300.0, 200.0);
    for (name, x) in [("a", 0.0), ("b", 100.0), ("c", 200.0)] {
        let rect = rect_of(&doc, &layout, name);
        assert_eq!(rect.x1, Pt(x), "{name}");
        assert_eq!(rect.width(), Pt(100.0), "{name}");
    }
}

#[test]
fn fixed_children_keep_their_size() {
    let doc = parse_ok(
        r#"<report version="1"><page>
            <row>
                <label name="fixed" size="80,20" horizontal="fixed" vertical="fixed">id</label>
                <label name="rest">description</label>
            </row>
        </page></report>"#,
    );
    let layout = page_layout(&doc, 400.0, 300.0);
    let fixed = rect_of(&doc, &layout, "fixed");
    let rest = rect_of(&doc, &layout, "rest");
    assert_eq!(fixed.width(), Pt(80.0));
    assert_eq!(fixed.height(), Pt(20.0));
    assert_eq!(rest.x1, Pt(80.0));
    assert_eq!(rest.x2, Pt(400.0));
}

#[test]
fn section_margins_inset_the_content() {
    let doc = parse_ok(
        r#"<report version="1"><page margins="40,10,20,30" spacing="5">
            <hline name="top"/>
            <hline name="bottom"/>
        </page></report>"#,
    );
    let layout = page_layout(&doc, 500.0, 500.0);
    assert_eq!(layout.content.x1, Pt(40.0));
    assert_eq!(layout.content.y1, Pt(10.0));
    assert_eq!(layout.content.x2, Pt(480.0));
    assert_eq!(layout.content.y2, Pt(470.0));

    let top = rect_of(&doc, &layout, "top");
    let bottom = rect_of(&doc, &layout, "bottom");
    assert_eq!(top.x1, Pt(40.0));
    assert!(bottom.y1 >= top.y2 + Pt(5.0));
}

#[test]
fn engine_preferred_sizes_follow_the_measurer() {
    let doc = parse_ok(r#"<report version="1"><page><label name="l">x</label></page></report>"#);
    let measurer = FixedHeight(12.0);
    let engine = LayoutEngine::new(&doc, &measurer, TextStyle::default());
    let label = doc.find("l").unwrap();
    assert_eq!(engine.preferred_width(label), Pt(40.0));
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn long_text_spans_three_physical_pages() {
    let markup = format!(
        r#"<report version="1"><page><text name="body">{}</text></page></report>"#,
        lipsum::lipsum(400)
    );
    let mut doc = parse_ok(&markup);
    let mut options = RenderOptions::new();
    options.page_size(Size::new(Pt(600.0), Pt(1000.0)));
    let measurer = FixedHeight(2500.0);
    let mut sink = RecordingSink::new();

    let summary = Renderer::new(&measurer, options)
        .render(&mut doc, &mut sink)
        .unwrap();

    assert_eq!(summary, RenderSummary { pages: 1, sub_pages: 2 });
    assert_eq!(sink.pages.len(), 3);
    let body = doc.find("body").unwrap();
    assert_eq!(doc.text_block(body).unwrap().page_count(), 3);

    let scrolls: Vec<Pt> = sink
        .pages
        .iter()
        .map(|page| match &page.primitives[..] {
            [Primitive::Text { scroll, .. }] => *scroll,
            other => panic!("unexpected primitives {other:?}"),
        })
        .collect();
    assert_eq!(scrolls, vec![Pt(0.0), Pt(1000.0), Pt(2000.0)]);
}

#[test]
fn text_below_a_header_starts_with_a_shorter_window() {
    let mut doc = parse_ok(
        r#"<report version="1"><page>
            <label vertical="fixed" size="100,300">header</label>
            <text name="body">long</text>
        </page></report>"#,
    );
    let mut options = RenderOptions::new();
    options.page_size(Size::new(Pt(600.0), Pt(1000.0)));
    let mut sink = RecordingSink::new();

    let summary = Renderer::new(&FixedHeight(2500.0), options)
        .render(&mut doc, &mut sink)
        .unwrap();

    assert_eq!(summary, RenderSummary { pages: 1, sub_pages: 2 });
    assert_eq!(sink.pages.len(), 3);
    let body = doc.find("body").unwrap();
    assert_eq!(doc.text_block(body).unwrap().page_count(), 3);

    let body_frame = sink.pages[0]
        .primitives
        .iter()
        .find_map(|p| match p {
            Primitive::Text { frame, runs, .. } if runs_text(runs) == "long" => Some(*frame),
            _ => None,
        })
        .expect("body is drawn on the first page");
    assert_eq!(body_frame.y1, Pt(300.0));
    assert_eq!(body_frame.height(), Pt(700.0));

    let scrolls: Vec<Pt> = sink.pages[1..]
        .iter()
        .map(|page| match &page.primitives[..] {
            [Primitive::Text { scroll, .. }] => *scroll,
            other => panic!("unexpected primitives {other:?}"),
        })
        .collect();
    assert_eq!(scrolls, vec![Pt(700.0), Pt(1700.0)]);
}

#[test]
fn short_text_stays_on_its_page() {
    let mut doc = parse_ok(
        r#"<report version="1"><page><text name="body">short</text></page></report>"#,
    );
    let mut sink = RecordingSink::new();
    let summary = Renderer::new(&ApproximateMeasurer::default(), RenderOptions::default())
        .render(&mut doc, &mut sink)
        .unwrap();
    assert_eq!(summary.physical_pages(), 1);
    let body = doc.find("body").unwrap();
    assert_eq!(doc.text_block(body).unwrap().page_count(), 1);
}

// ─── Graphics ───────────────────────────────────────────────────

const SQUARE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="50" height="50"><rect width="50" height="50" fill="red"/></svg>"#;

#[test]
fn svg_keeps_its_aspect_ratio() {
    let mut env = Environment::new();
    env.insert("logo", SQUARE_SVG);
    let mut options = ParseOptions::default();
    options.environment(env);
    let mut doc = parse(
        r#"<report version="1"><page>
            <svg name="logo" src="env://logo" size="200,100" horizontal="fixed" vertical="fixed"/>
        </page></report>"#,
        &options,
    )
    .unwrap();

    let mut render_options = RenderOptions::new();
    render_options.page_size(Size::new(Pt(200.0), Pt(100.0)));
    let mut sink = RecordingSink::new();
    Renderer::new(&ApproximateMeasurer::default(), render_options)
        .render(&mut doc, &mut sink)
        .unwrap();

    let vector = sink.pages[0]
        .primitives
        .iter()
        .find_map(|p| match p {
            Primitive::Vector { rect, .. } => Some(*rect),
            _ => None,
        })
        .expect("svg is drawn");
    assert_eq!(vector, Rect::from_xywh(Pt(50.0), Pt(0.0), Pt(100.0), Pt(100.0)));
}

#[test]
fn undecodable_svg_becomes_a_placeholder() {
    let mut file = tempfile::Builder::new().suffix(".svg").tempfile().unwrap();
    file.write_all(b"this is not an svg").unwrap();
    let markup = format!(
        r#"<report version="1"><page><svg name="chart" src="{}"/></page></report>"#,
        file.path().display()
    );
    let mut doc = parse_ok(&markup);
    let chart = doc.find("chart").unwrap();
    assert!(matches!(
        doc.nodes[chart].kind,
        NodeKind::Vector(VectorGraphic {
            content: VectorContent::Unavailable { .. },
            ..
        })
    ));

    let mut sink = RecordingSink::new();
    Renderer::new(&ApproximateMeasurer::default(), RenderOptions::default())
        .render(&mut doc, &mut sink)
        .unwrap();
    assert!(sink.pages[0]
        .primitives
        .iter()
        .any(|p| matches!(p, Primitive::Placeholder { .. })));
}

// ─── Errors ─────────────────────────────────────────────────────

#[test]
fn mismatched_closing_tag() {
    let err = parse(
        "<report version=\"1\">\n<page>\n<row></column>\n</page></report>",
        &ParseOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::Parse { line: 3, .. }), "{err}");
}

#[test]
fn unknown_attribute_is_a_parse_error() {
    let err = parse(
        r#"<report version="1"><page><label colour="red">x</label></page></report>"#,
        &ParseOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::Parse { .. }), "{err}");
}

#[test]
fn missing_version_is_a_tag_error() {
    let err = parse("<report><page/></report>", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ReportError::Tag { line: 1, .. }), "{err}");
}

#[test]
fn invalid_child_layout_is_a_tag_error() {
    let err = parse(
        r#"<report version="1"><page child_layout="grid"/></report>"#,
        &ParseOptions::default(),
    )
    .unwrap_err();
    match err {
        ReportError::Tag { message, .. } => assert!(message.contains("column|row"), "{message}"),
        other => panic!("expected a tag error, got {other}"),
    }
}

#[test]
fn environment_sources_need_an_environment() {
    let markup = r#"<report version="1"><page><svg src="env://charts:sales"/></page></report>"#;
    let err = parse(markup, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ReportError::NoEnv { .. }), "{err}");

    let mut options = ParseOptions::default();
    options.environment(Environment::new());
    let err = parse(markup, &options).unwrap_err();
    assert!(matches!(err, ReportError::Parse { .. }), "{err}");
}

#[test]
fn nested_environment_keys_resolve() {
    let mut env = Environment::new();
    env.insert("charts:sales", SQUARE_SVG);
    let mut options = ParseOptions::default();
    options.environment(env);
    let doc = parse(
        r#"<report version="1"><page><svg name="s" src="env://charts:sales"/></page></report>"#,
        &options,
    )
    .unwrap();
    let s = doc.find("s").unwrap();
    assert!(matches!(
        doc.nodes[s].kind,
        NodeKind::Vector(VectorGraphic {
            content: VectorContent::Svg(_),
            ..
        })
    ));
}

struct BrokenSink {
    pages: usize,
}

impl PageSink for BrokenSink {
    fn begin_page(&mut self, _: Size) -> Result<(), ReportError> {
        self.pages += 1;
        Ok(())
    }

    fn draw(&mut self, _: Primitive) -> Result<(), ReportError> {
        Err(ReportError::Io(std::io::Error::other("disk full")))
    }

    fn end_page(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}

#[test]
fn sink_failure_aborts_rendering() {
    let mut doc = parse_ok(
        r#"<report version="1">
            <page><label>first</label></page>
            <page><label>second</label></page>
        </report>"#,
    );
    let mut sink = BrokenSink { pages: 0 };
    let err = Renderer::new(&ApproximateMeasurer::default(), RenderOptions::default())
        .render(&mut doc, &mut sink)
        .unwrap_err();
    assert!(matches!(err, ReportError::Io(_)));
    assert_eq!(sink.pages, 1);
}

// ─── PDF output ─────────────────────────────────────────────────

#[test]
fn pdf_output() {
    let mut doc = parse_ok(
        r#"<report version="1" ><page metadata="title: Sales">
            <label>no font, so this is skipped</label>
            <hline/>
            <vline/>
        </page></report>"#,
    );
    let mut sink = PdfSink::new(None);
    sink.set_info(Info::from_metadata(&doc.pages[0].metadata));
    Renderer::new(&ApproximateMeasurer::default(), RenderOptions::default())
        .render(&mut doc, &mut sink)
        .unwrap();
    assert_eq!(sink.page_count(), 1);

    let mut out = Vec::new();
    sink.write_to(&mut out).unwrap();
    assert!(out.starts_with(b"%PDF"));
}
