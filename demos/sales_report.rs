//! Render a small sales report to `sales-report.pdf`.
//!
//! Pass the path of a TTF/OTF font as the first argument to get text in the
//! output; without one only lines and graphics are drawn.

use report_gen::layout::{ApproximateMeasurer, FontMeasurer, Margins, TextMeasurer};
use report_gen::pagesize::LETTER;
use report_gen::{parse, Environment, Font, Info, ParseOptions, PdfSink, Pt, RenderOptions, Renderer};

const CHART: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="150">
  <rect x="10" y="90" width="40" height="60" fill="#4a90d9"/>
  <rect x="70" y="40" width="40" height="110" fill="#4a90d9"/>
  <rect x="130" y="70" width="40" height="80" fill="#4a90d9"/>
  <rect x="190" y="10" width="40" height="140" fill="#4a90d9"/>
</svg>"##;

fn main() {
    let font = std::env::args()
        .nth(1)
        .map(|path| Font::load_file(path).expect("can load font"));

    let markup = format!(
        r##"<report version="1.0">
            <page margins="(0,0,0,12)" spacing="8" metadata="title: Quarterly Sales; author: Finance"
                  style="font-size: 11pt; color: #202020">
                <row spacing="12">
                    <label>Quarterly sales</label>
                    <label>Q3</label>
                </row>
                <hline line_width="2" color="#4a90d9"/>
                <svg src="env://charts:quarterly" vertical="preferred"/>
                <text>{}</text>
            </page>
        </report>"##,
        lipsum::lipsum(1200)
    );

    let mut env = Environment::new();
    env.insert("charts:quarterly", CHART);
    let mut options = ParseOptions::default();
    options.environment(env);
    let mut document = parse(&markup, &options).expect("report parses");

    let approximate = ApproximateMeasurer::default();
    let measured;
    let measurer: &dyn TextMeasurer = match &font {
        Some(font) => {
            measured = FontMeasurer::new(font);
            &measured
        }
        None => &approximate,
    };

    let mut render_options = RenderOptions::new();
    render_options
        .page_size(LETTER)
        .page_margins(Margins::all(Pt(36.0)));

    let mut sink = PdfSink::new(font.as_ref());
    sink.set_info(Info::from_metadata(&document.pages[0].metadata));
    let summary = Renderer::new(measurer, render_options)
        .render(&mut document, &mut sink)
        .expect("report renders");
    println!("{} physical page(s)", summary.physical_pages());

    let out = std::fs::File::create("sales-report.pdf").expect("can create file");
    sink.write_to(out).expect("can write pdf");
}
