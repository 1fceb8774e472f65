//! Declarative, markup-driven report layout.
//!
//! A report is an XML-like document of sections (`<page>`) holding nested
//! rows and columns of labels, text blocks, lines, images and vector
//! graphics. [parse] builds a [Document] from the markup, the
//! [layout] engine assigns every node a rectangle on its page, and a
//! [Renderer] turns the result into drawing [Primitive]s for a [PageSink],
//! such as the bundled [PdfSink]. Text blocks taller than a page continue on
//! extra physical pages.
//!
//! ```
//! use report_gen::layout::ApproximateMeasurer;
//! use report_gen::{parse, ParseOptions, RecordingSink, RenderOptions, Renderer};
//!
//! let markup = r#"
//!     <report version="1">
//!         <page margins="36,36,36,36">
//!             <row><label>Name</label><label>Total</label></row>
//!             <hline/>
//!             <text>A longer description of the report.</text>
//!         </page>
//!     </report>"#;
//!
//! let mut document = parse(markup, &ParseOptions::default()).unwrap();
//! let measurer = ApproximateMeasurer::default();
//! let mut sink = RecordingSink::new();
//! let summary = Renderer::new(&measurer, RenderOptions::default())
//!     .render(&mut document, &mut sink)
//!     .unwrap();
//! assert_eq!(summary.physical_pages(), 1);
//! ```

mod attributes;
pub use attributes::Source;

mod builder;
pub use builder::*;

mod colour;
pub use colour::*;

mod content;

mod document;
pub use document::*;

mod environment;
pub use environment::*;

mod error;
pub use error::*;

mod font;
pub use font::Font;

mod format;
pub use format::*;

mod image;

mod info;
pub use info::*;

/// Sizing policies and the engine assigning rectangles to nodes
pub mod layout;

mod node;
pub use node::*;

mod page;
pub use page::*;

pub mod pagesize;

pub mod pagination;

mod pdf;
pub use pdf::*;

mod rect;
pub use rect::*;

pub(crate) mod refs;

/// The table of known tags, their attributes and node constructors
pub mod registry;

mod render;
pub use render::*;

mod units;
pub use units::*;

/// Re-export PDF-writer functionality, mostly for custom page sinks
pub use pdf_writer;
