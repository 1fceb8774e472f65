//! The static table of supported tags.
//!
//! Each entry names a tag (and its aliases), the attributes it requires and
//! accepts, and the function building it from its coerced attributes.

use crate::attributes::{font_size, AttrValue, Source};
use crate::colour::Colour;
use crate::environment::Environment;
use crate::error::ReportError;
use crate::layout::{scale_to, Alignment, ElasticSizePolicy, Margins, SizePolicy};
use crate::node::{
    defaults, Container, ContainerKind, ImageContent, ImageNode, Label, Line, Node, NodeKind,
    Orientation, SvgTree, TextBlock, TextStyle, VectorContent, VectorGraphic, DEFAULT_STRETCH,
};
use crate::rect::Size;
use crate::units::Pt;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TagKind {
    Report,
    Section,
    Container,
    Label,
    Text,
    Line,
    Image,
    Vector,
}

impl TagKind {
    /// Whether character data inside the tag is kept
    pub fn accepts_text(self) -> bool {
        matches!(self, TagKind::Label | TagKind::Text)
    }
}

/// Coerced attributes of one tag, with the line the tag was opened on
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    pub line: usize,
    values: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn new(line: usize) -> Attributes {
        Attributes {
            line,
            values: BTreeMap::new(),
        }
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, value: AttrValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            AttrValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn count(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            AttrValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    fn length(&self, name: &str) -> Option<Pt> {
        self.count(name).map(Pt::from)
    }

    pub fn margins(&self) -> Option<Margins> {
        match self.get("margins")? {
            AttrValue::Margins(m) => Some(*m),
            _ => None,
        }
    }

    pub fn size(&self) -> Option<Size> {
        match self.get("size")? {
            AttrValue::Size(s) => Some(*s),
            _ => None,
        }
    }

    pub fn colour(&self) -> Option<Colour> {
        match self.get("color")? {
            AttrValue::Colour(c) => Some(*c),
            _ => None,
        }
    }

    pub fn policy(&self, name: &str) -> Option<SizePolicy> {
        match self.get(name)? {
            AttrValue::Policy(p) => Some(*p),
            _ => None,
        }
    }

    pub fn alignment(&self) -> Option<Alignment> {
        match self.get("alignment")? {
            AttrValue::Alignment(a) => Some(*a),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            AttrValue::Flag(f) => Some(*f),
            _ => None,
        }
    }

    pub fn declarations(&self, name: &str) -> BTreeMap<String, String> {
        match self.get(name) {
            Some(AttrValue::Declarations(d)) => d.clone(),
            _ => BTreeMap::new(),
        }
    }

    pub fn source(&self) -> Option<&Source> {
        match self.get("src")? {
            AttrValue::Source(s) => Some(s),
            _ => None,
        }
    }

    fn name(&self) -> Option<String> {
        self.text("name").map(str::to_string)
    }
}

/// What a constructor hands back to the tree builder
#[derive(Debug)]
pub enum Built {
    Report { version: String },
    Section(SectionSpec),
    Node(Node),
}

/// Everything about a section except its root container, which the builder
/// allocates
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub name: Option<String>,
    pub line: usize,
    pub metadata: BTreeMap<String, String>,
    pub margins: Margins,
    pub spacing: Pt,
    pub child_layout: ContainerKind,
    pub style: BTreeMap<String, String>,
    pub text_style: TextStyle,
}

/// Shared state available to constructors
pub struct ConstructContext<'a> {
    pub environment: Option<&'a Environment>,
}

pub type Constructor = fn(&Attributes, &ConstructContext) -> Result<Built, ReportError>;

pub struct TagSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: TagKind,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub construct: Constructor,
}

impl TagSpec {
    pub fn accepts(&self, attribute: &str) -> bool {
        self.required.contains(&attribute) || self.optional.contains(&attribute)
    }

    /// Every attribute the tag knows about, for error messages
    pub fn schema(&self) -> Vec<&'static str> {
        self.required.iter().chain(self.optional).copied().collect()
    }
}

static REGISTRY: &[TagSpec] = &[
    TagSpec {
        name: "report",
        aliases: &[],
        kind: TagKind::Report,
        required: &["version"],
        optional: &[],
        construct: build_report,
    },
    TagSpec {
        name: "section",
        aliases: &["page"],
        kind: TagKind::Section,
        required: &[],
        optional: &["spacing", "margins", "name", "child_layout", "style", "metadata"],
        construct: build_section,
    },
    TagSpec {
        name: "column",
        aliases: &["col"],
        kind: TagKind::Container,
        required: &[],
        optional: &["spacing", "margins", "name", "alignment", "stretch"],
        construct: build_column,
    },
    TagSpec {
        name: "row",
        aliases: &[],
        kind: TagKind::Container,
        required: &[],
        optional: &["spacing", "margins", "name", "alignment", "stretch"],
        construct: build_row,
    },
    TagSpec {
        name: "label",
        aliases: &[],
        kind: TagKind::Label,
        required: &[],
        optional: &["horizontal", "vertical", "word_wrap", "name", "size"],
        construct: build_label,
    },
    TagSpec {
        name: "text",
        aliases: &[],
        kind: TagKind::Text,
        required: &[],
        optional: &["horizontal", "vertical", "name", "size"],
        construct: build_text,
    },
    TagSpec {
        name: "hline",
        aliases: &[],
        kind: TagKind::Line,
        required: &[],
        optional: &["color", "line_width", "name"],
        construct: build_hline,
    },
    TagSpec {
        name: "vline",
        aliases: &[],
        kind: TagKind::Line,
        required: &[],
        optional: &["color", "line_width", "name"],
        construct: build_vline,
    },
    TagSpec {
        name: "image",
        aliases: &[],
        kind: TagKind::Image,
        required: &["src"],
        optional: &["width", "height", "horizontal", "vertical", "name", "size"],
        construct: build_image,
    },
    TagSpec {
        name: "svg",
        aliases: &["vector"],
        kind: TagKind::Vector,
        required: &["src"],
        optional: &["horizontal", "vertical", "name", "size"],
        construct: build_vector,
    },
];

/// Find a tag by its name or one of its aliases
pub fn lookup(tag: &str) -> Option<&'static TagSpec> {
    REGISTRY
        .iter()
        .find(|spec| spec.name == tag || spec.aliases.contains(&tag))
}

/// Names of all supported tags
pub fn tag_names() -> impl Iterator<Item = &'static str> {
    REGISTRY
        .iter()
        .flat_map(|spec| std::iter::once(spec.name).chain(spec.aliases.iter().copied()))
}

fn node(attrs: &Attributes, policy: ElasticSizePolicy, kind: NodeKind) -> Node {
    Node {
        name: attrs.name(),
        line: attrs.line,
        policy,
        stretch: DEFAULT_STRETCH,
        kind,
    }
}

/// Apply the `horizontal`, `vertical` and `size` attributes over a default
fn leaf_policy(attrs: &Attributes, default: ElasticSizePolicy) -> ElasticSizePolicy {
    ElasticSizePolicy {
        horizontal: attrs.policy("horizontal").unwrap_or(default.horizontal),
        vertical: attrs.policy("vertical").unwrap_or(default.vertical),
        size: attrs.size().or(default.size),
    }
}

fn build_report(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    let version = attrs.text("version").unwrap_or_default().to_string();
    log::debug!("this template uses version {version}");
    Ok(Built::Report { version })
}

fn build_section(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    let child_layout = match attrs.text("child_layout").unwrap_or("column") {
        "column" => ContainerKind::Column,
        "row" => ContainerKind::Row,
        other => {
            return Err(ReportError::tag(
                attrs.line,
                format!("Invalid child_layout {other:?}, valid choices are column|row"),
            ))
        }
    };

    let style = attrs.declarations("style");
    let mut text_style = TextStyle::default();
    if let Some(size) = font_size(&style) {
        text_style.font_size = size;
    }
    if let Some(colour) = style.get("color").and_then(|c| Colour::parse(c)) {
        text_style.colour = colour;
    }

    Ok(Built::Section(SectionSpec {
        name: attrs.name(),
        line: attrs.line,
        metadata: attrs.declarations("metadata"),
        margins: attrs.margins().unwrap_or_default(),
        spacing: attrs.length("spacing").unwrap_or_default(),
        child_layout,
        style,
        text_style,
    }))
}

fn container(attrs: &Attributes, kind: ContainerKind) -> Result<Built, ReportError> {
    let mut c = Container::new(kind);
    c.spacing = attrs.length("spacing").unwrap_or_default();
    c.margins = attrs.margins().unwrap_or_default();
    c.alignment = attrs.alignment().unwrap_or_default();

    // the policy is derived from the children once the container is closed
    let mut node = node(attrs, ElasticSizePolicy::default(), NodeKind::Container(c));
    node.stretch = attrs.count("stretch").unwrap_or(DEFAULT_STRETCH);
    Ok(Built::Node(node))
}

fn build_column(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    container(attrs, ContainerKind::Column)
}

fn build_row(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    container(attrs, ContainerKind::Row)
}

fn build_label(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    let label = Label {
        runs: Vec::new(),
        word_wrap: attrs.flag("word_wrap").unwrap_or(false),
    };
    let policy = leaf_policy(attrs, defaults::label());
    Ok(Built::Node(node(attrs, policy, NodeKind::Label(label))))
}

fn build_text(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    let policy = leaf_policy(attrs, defaults::text());
    Ok(Built::Node(node(
        attrs,
        policy,
        NodeKind::Text(TextBlock::default()),
    )))
}

fn line(attrs: &Attributes, orientation: Orientation) -> Result<Built, ReportError> {
    let line = Line {
        orientation,
        thickness: attrs.length("line_width").unwrap_or(Pt(1.0)),
        colour: attrs.colour().unwrap_or_default(),
    };
    Ok(Built::Node(node(
        attrs,
        defaults::line(orientation),
        NodeKind::Line(line),
    )))
}

fn build_hline(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    line(attrs, Orientation::Horizontal)
}

fn build_vline(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    line(attrs, Orientation::Vertical)
}

/// Raw content of a source. Files are known to exist; environment keys are
/// resolved here.
fn load(source: &Source, line: usize, ctx: &ConstructContext) -> Result<Vec<u8>, ReportError> {
    match source {
        Source::File(path) => Ok(std::fs::read(path)?),
        Source::Env { src, keys } => {
            let environment = ctx.environment.ok_or_else(|| ReportError::NoEnv {
                src: src.clone(),
                line,
            })?;
            environment
                .resolve(keys.as_slice())
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    ReportError::parse(line, format!("Key {:?} not found in environment", src))
                })
        }
    }
}

fn build_image(attrs: &Attributes, _: &ConstructContext) -> Result<Built, ReportError> {
    let path = match attrs.source() {
        Some(Source::File(path)) => path.clone(),
        Some(Source::Env { src, .. }) => {
            return Err(ReportError::parse(
                attrs.line,
                format!("Images are read from files, {src:?} is not one"),
            ))
        }
        None => return Err(ReportError::tag(attrs.line, "Missing required attribute `src`")),
    };

    let content = match image::image_dimensions(&path) {
        Ok((w, h)) => {
            let size = scale_to(Size::new(w, h), attrs.length("width"), attrs.length("height"));
            ImageContent::Raster {
                width: size.width,
                height: size.height,
            }
        }
        Err(e) => {
            log::warn!("cannot read image {}: {e}", path.display());
            ImageContent::Unreadable {
                label: file_label(&path),
            }
        }
    };

    let policy = leaf_policy(attrs, defaults::image());
    Ok(Built::Node(node(
        attrs,
        policy,
        NodeKind::Image(ImageNode { path, content }),
    )))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_vector(attrs: &Attributes, ctx: &ConstructContext) -> Result<Built, ReportError> {
    let source = attrs
        .source()
        .ok_or_else(|| ReportError::tag(attrs.line, "Missing required attribute `src`"))?
        .clone();

    let content = match load(&source, attrs.line, ctx) {
        Ok(data) => decode_svg(&data),
        // the file existed when the attribute was read
        Err(ReportError::Io(e)) => VectorContent::Unavailable {
            reason: e.to_string(),
        },
        Err(e) => return Err(e),
    };
    if let VectorContent::Unavailable { reason } = &content {
        log::warn!("vector source at line {} is unavailable: {reason}", attrs.line);
    }

    let policy = leaf_policy(attrs, defaults::vector());
    Ok(Built::Node(node(
        attrs,
        policy,
        NodeKind::Vector(VectorGraphic { source, content }),
    )))
}

/// Decode SVG data, keeping why it failed when it does
pub fn decode_svg(data: &[u8]) -> VectorContent {
    match usvg::Tree::from_data(data, &usvg::Options::default()) {
        Ok(tree) => VectorContent::Svg(SvgTree::new(tree)),
        Err(e) => VectorContent::Unavailable {
            reason: e.to_string(),
        },
    }
}
