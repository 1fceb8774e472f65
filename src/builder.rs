//! Building a [Document] from a stream of markup events.
//!
//! The [TreeBuilder] never looks ahead: every event is fully handled before
//! the next one is read. Its state lives in a [BuilderContext] with three
//! stacks: the open tags, the open containers (children attach to the top
//! one), and the open leaf scopes (buffering character data).

use crate::attributes::coerce;
use crate::document::Document;
use crate::environment::Environment;
use crate::error::ReportError;
use crate::format::{PlainFormatter, TextFormatter, TextKind};
use crate::layout::container_policy;
use crate::node::{Container, Node, NodeKind, DEFAULT_STRETCH};
use crate::page::Page;
use crate::registry::{self, Attributes, Built, ConstructContext, TagKind, TagSpec};
use id_arena::Id;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};

/// One tokenized piece of markup
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    Open {
        tag: String,
        attributes: Vec<(String, String)>,
        line: usize,
    },
    Close {
        tag: String,
        line: usize,
    },
    Text(String),
}

/// Options controlling how markup is turned into a [Document]
pub struct ParseOptions {
    /// Content for `env://` sources
    pub environment: Option<Environment>,
    /// Directory relative `src` paths are resolved against. Defaults to the
    /// current directory.
    pub base_dir: Option<PathBuf>,
    pub formatter: Box<dyn TextFormatter>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            environment: None,
            base_dir: None,
            formatter: Box::new(PlainFormatter),
        }
    }
}

impl ParseOptions {
    pub fn new() -> ParseOptions {
        ParseOptions::default()
    }

    /// Set the environment `env://` sources are resolved in, modifying `self`
    pub fn environment(&mut self, environment: Environment) -> &mut Self {
        self.environment = Some(environment);
        self
    }

    /// Set the directory relative sources are resolved against, modifying `self`
    pub fn base_dir<P: Into<PathBuf>>(&mut self, base_dir: P) -> &mut Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Replace the formatter applied to `label` and `text` contents, modifying `self`
    pub fn formatter<F: TextFormatter + 'static>(&mut self, formatter: F) -> &mut Self {
        self.formatter = Box::new(formatter);
        self
    }
}

#[derive(Debug)]
struct OpenTag {
    name: String,
    kind: TagKind,
    line: usize,
}

#[derive(Debug)]
struct LeafScope {
    node: Id<Node>,
    kind: TagKind,
    buffer: String,
}

/// The builder's explicit parse state
#[derive(Debug, Default)]
pub struct BuilderContext {
    tags: Vec<OpenTag>,
    containers: Vec<Id<Node>>,
    scopes: Vec<LeafScope>,
}

impl BuilderContext {
    /// Nesting depth of the tag being handled
    pub fn depth(&self) -> usize {
        self.tags.len()
    }

    fn current_kind(&self) -> Option<TagKind> {
        self.tags.last().map(|t| t.kind)
    }
}

pub struct TreeBuilder<'o> {
    document: Document,
    context: BuilderContext,
    options: &'o ParseOptions,
    has_root: bool,
    root_closed: bool,
    last_line: usize,
}

impl<'o> TreeBuilder<'o> {
    pub fn new(options: &'o ParseOptions) -> TreeBuilder<'o> {
        TreeBuilder {
            document: Document::default(),
            context: BuilderContext::default(),
            options,
            has_root: false,
            root_closed: false,
            last_line: 1,
        }
    }

    pub fn context(&self) -> &BuilderContext {
        &self.context
    }

    pub fn handle(&mut self, event: MarkupEvent) -> Result<(), ReportError> {
        match event {
            MarkupEvent::Open {
                tag,
                attributes,
                line,
            } => {
                self.last_line = line;
                self.open(tag, attributes, line)
            }
            MarkupEvent::Close { tag, line } => {
                self.last_line = line;
                self.close(&tag, line)
            }
            MarkupEvent::Text(data) => {
                self.text(&data);
                Ok(())
            }
        }
    }

    /// Check that the markup was complete and hand over the document
    pub fn finish(self) -> Result<Document, ReportError> {
        if let Some(open) = self.context.tags.last() {
            return Err(ReportError::parse(
                open.line,
                format!("Unclosed tag <{}>", open.name),
            ));
        }
        if !self.has_root {
            return Err(ReportError::tag(
                self.last_line,
                "Missing <report> root tag",
            ));
        }
        Ok(self.document)
    }

    fn check_placement(&self, spec: &TagSpec, tag: &str, line: usize) -> Result<(), ReportError> {
        if self.root_closed {
            return Err(ReportError::parse(
                line,
                format!("<{tag}> found after the end of <report>, only one root is allowed"),
            ));
        }

        let parent = self.context.current_kind();
        if let Some(
            TagKind::Label | TagKind::Text | TagKind::Line | TagKind::Image | TagKind::Vector,
        ) = parent
        {
            let parent_name = self.context.tags.last().map(|t| t.name.as_str()).unwrap_or("");
            return Err(ReportError::parse(
                line,
                format!("<{tag}> cannot be placed inside <{parent_name}>, it has no children"),
            ));
        }

        match (spec.kind, parent) {
            (TagKind::Report, None) => Ok(()),
            (TagKind::Report, Some(_)) => Err(ReportError::parse(
                line,
                "<report> must be the root tag",
            )),
            (TagKind::Section, Some(TagKind::Report)) => Ok(()),
            (TagKind::Section, _) => Err(ReportError::parse(
                line,
                format!("<{tag}> must be placed directly inside <report>"),
            )),
            (_, Some(TagKind::Section | TagKind::Container)) => Ok(()),
            _ => Err(ReportError::parse(
                line,
                format!("<{tag}> must be placed inside a section"),
            )),
        }
    }

    fn open(
        &mut self,
        tag: String,
        raw_attributes: Vec<(String, String)>,
        line: usize,
    ) -> Result<(), ReportError> {
        let spec = registry::lookup(&tag).ok_or_else(|| {
            ReportError::parse(
                line,
                format!(
                    "Unknown tag <{tag}>, valid tags are {}",
                    registry::tag_names().collect::<Vec<_>>().join(", ")
                ),
            )
        })?;
        self.check_placement(spec, &tag, line)?;

        if let Some((name, _)) = raw_attributes.iter().find(|(name, _)| !spec.accepts(name)) {
            return Err(ReportError::parse(
                line,
                format!(
                    "Unknown attribute `{name}` in <{tag}>, valid attributes are {}",
                    spec.schema().join(", ")
                ),
            ));
        }
        if let Some(missing) = spec
            .required
            .iter()
            .find(|req| !raw_attributes.iter().any(|(name, _)| name.as_str() == **req))
        {
            return Err(ReportError::tag(
                line,
                format!("Missing required attribute `{missing}` in <{tag}>"),
            ));
        }

        let base_dir = self.options.base_dir.as_deref();
        let mut attributes = Attributes::new(line);
        for (name, raw) in raw_attributes {
            let value = coerce(&name, &raw, line, base_dir)?;
            attributes.insert(name, value);
        }

        let ctx = ConstructContext {
            environment: self.options.environment.as_ref(),
        };
        let built = (spec.construct)(&attributes, &ctx)?;
        match built {
            Built::Report { version } => {
                self.document.version = version;
                self.has_root = true;
            }
            Built::Section(section) => {
                let mut root = Container::new(section.child_layout);
                root.margins = section.margins;
                root.spacing = section.spacing;
                let root = self.document.alloc(Node {
                    name: section.name.as_ref().map(|n| format!("{n}_layout")),
                    line,
                    policy: Default::default(),
                    stretch: DEFAULT_STRETCH,
                    kind: NodeKind::Container(root),
                });
                self.document.add_page(Page {
                    name: section.name,
                    line,
                    root,
                    metadata: section.metadata,
                    margins: section.margins,
                    spacing: section.spacing,
                    child_layout: section.child_layout,
                    style: section.style,
                    text_style: section.text_style,
                });
                self.context.containers.push(root);
            }
            Built::Node(node) => {
                let is_container = node.container().is_some();
                let parent = *self.context.containers.last().ok_or_else(|| {
                    ReportError::parse(line, format!("<{tag}> must be placed inside a section"))
                })?;
                let id = self.document.alloc(node);
                if let Some(parent) = self.document.nodes[parent].container_mut() {
                    parent.children.push(id);
                }
                if is_container {
                    self.context.containers.push(id);
                } else {
                    self.context.scopes.push(LeafScope {
                        node: id,
                        kind: spec.kind,
                        buffer: String::new(),
                    });
                }
            }
        }

        self.context.tags.push(OpenTag {
            name: tag,
            kind: spec.kind,
            line,
        });
        Ok(())
    }

    fn close(&mut self, tag: &str, line: usize) -> Result<(), ReportError> {
        let open = self.context.tags.pop().ok_or_else(|| {
            ReportError::parse(line, format!("Unexpected closing tag </{tag}>"))
        })?;
        if open.name != tag {
            return Err(ReportError::parse(
                line,
                format!(
                    "Mismatched tag </{tag}>, expected </{}> (opened at line {})",
                    open.name, open.line
                ),
            ));
        }

        match open.kind {
            TagKind::Report => self.root_closed = true,
            TagKind::Section | TagKind::Container => {
                if let Some(id) = self.context.containers.pop() {
                    let policy = container_policy(&self.document, self.document.children(id));
                    self.document.nodes[id].policy = policy;
                }
            }
            TagKind::Label | TagKind::Text | TagKind::Line | TagKind::Image | TagKind::Vector => {
                if let Some(scope) = self.context.scopes.pop() {
                    self.finish_leaf(scope);
                }
            }
        }
        Ok(())
    }

    fn finish_leaf(&mut self, scope: LeafScope) {
        let kind = match scope.kind {
            TagKind::Label => TextKind::Label,
            TagKind::Text => TextKind::Text,
            _ => return,
        };
        if scope.buffer.is_empty() {
            return;
        }
        let runs = self.options.formatter.format(kind, &scope.buffer);
        self.document.nodes[scope.node].set_runs(runs);
    }

    fn text(&mut self, data: &str) {
        let Some(scope) = self.context.scopes.last_mut() else {
            return;
        };
        if scope.kind.accepts_text() && self.context.tags.last().map(|t| t.kind) == Some(scope.kind)
        {
            scope.buffer.push_str(data);
        }
    }
}

/// Tracks line numbers as the tokenizer moves through the source
struct LineCounter<'s> {
    source: &'s str,
    offset: usize,
    line: usize,
}

impl<'s> LineCounter<'s> {
    fn new(source: &'s str) -> LineCounter<'s> {
        LineCounter {
            source,
            offset: 0,
            line: 1,
        }
    }

    fn at(&mut self, position: u64) -> usize {
        let position = usize::try_from(position)
            .unwrap_or(usize::MAX)
            .min(self.source.len());
        if position > self.offset {
            self.line += self.source.as_bytes()[self.offset..position]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.offset = position;
        }
        self.line
    }
}

fn xml_error<E: std::fmt::Display>(line: usize, err: E) -> ReportError {
    ReportError::parse(line, format!("Malformed markup: {err}"))
}

fn open_event(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    line: usize,
) -> Result<MarkupEvent, ReportError> {
    let tag = reader
        .decoder()
        .decode(e.name().as_ref())
        .map_err(|err| xml_error(line, err))?
        .into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(line, err))?;
        let name = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|err| xml_error(line, err))?
            .into_owned();
        let raw = reader
            .decoder()
            .decode(&attr.value)
            .map_err(|err| xml_error(line, err))?;
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|err| xml_error(line, err))?
            .into_owned();
        attributes.push((name, value));
    }

    Ok(MarkupEvent::Open {
        tag,
        attributes,
        line,
    })
}

/// Tokenize markup and build the document it describes
pub fn parse(source: &str, options: &ParseOptions) -> Result<Document, ReportError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    // mismatched tags are reported by the builder
    reader.config_mut().check_end_names = false;

    let mut lines = LineCounter::new(source);
    let mut builder = TreeBuilder::new(options);
    loop {
        let line = lines.at(reader.buffer_position());
        let event = reader.read_event().map_err(|err| xml_error(line, err))?;
        match event {
            Event::Start(e) => builder.handle(open_event(&reader, &e, line)?)?,
            Event::Empty(e) => {
                let open = open_event(&reader, &e, line)?;
                let tag = match &open {
                    MarkupEvent::Open { tag, .. } => tag.clone(),
                    _ => String::new(),
                };
                builder.handle(open)?;
                builder.handle(MarkupEvent::Close { tag, line })?;
            }
            Event::End(e) => {
                let tag = reader
                    .decoder()
                    .decode(e.name().as_ref())
                    .map_err(|err| xml_error(line, err))?
                    .into_owned();
                builder.handle(MarkupEvent::Close { tag, line })?;
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|err| xml_error(line, err))?;
                builder.handle(MarkupEvent::Text(text.into_owned()))?;
            }
            Event::CData(e) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| xml_error(line, err))?;
                builder.handle(MarkupEvent::Text(text.into_owned()))?;
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|err| xml_error(line, err))?;
                let text = quick_xml::escape::unescape(&format!("&{name};"))
                    .map_err(|err| xml_error(line, err))?
                    .into_owned();
                builder.handle(MarkupEvent::Text(text))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    builder.finish()
}

/// Read and parse a markup file. Relative sources are resolved against the
/// file's directory unless `options` says otherwise.
pub fn parse_file<P: AsRef<Path>>(path: P, options: &mut ParseOptions) -> Result<Document, ReportError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    if options.base_dir.is_none() {
        if let Some(dir) = path.parent() {
            options.base_dir(dir);
        }
    }
    parse(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(tag: &str, attributes: &[(&str, &str)], line: usize) -> MarkupEvent {
        MarkupEvent::Open {
            tag: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            line,
        }
    }

    fn close(tag: &str, line: usize) -> MarkupEvent {
        MarkupEvent::Close {
            tag: tag.to_string(),
            line,
        }
    }

    #[test]
    fn events_build_a_tree() {
        let options = ParseOptions::default();
        let mut builder = TreeBuilder::new(&options);
        let events = vec![
            open("report", &[("version", "2")], 1),
            open("section", &[("name", "cover"), ("child_layout", "row")], 2),
            open("label", &[("name", "title")], 3),
            MarkupEvent::Text("  Quarterly ".into()),
            MarkupEvent::Text("results\n".into()),
            close("label", 3),
            open("col", &[], 4),
            open("hline", &[], 5),
            close("hline", 5),
            close("col", 6),
            close("section", 7),
            close("report", 8),
        ];
        for event in events {
            builder.handle(event).unwrap();
            assert!(builder.context().depth() <= 4);
        }
        let document = builder.finish().unwrap();

        assert_eq!(document.version, "2");
        assert_eq!(document.pages.len(), 1);
        let page = &document.pages[0];
        assert_eq!(page.child_layout, crate::node::ContainerKind::Row);
        assert_eq!(document.nodes[page.root].name.as_deref(), Some("cover_layout"));
        assert_eq!(document.children(page.root).len(), 2);

        let title = document.find("title").unwrap();
        let NodeKind::Label(label) = &document.nodes[title].kind else {
            panic!("title is a label");
        };
        assert_eq!(crate::node::runs_text(&label.runs), "Quarterly results");
    }

    #[test]
    fn mismatched_close_is_a_parse_error() {
        let options = ParseOptions::default();
        let mut builder = TreeBuilder::new(&options);
        builder.handle(open("report", &[("version", "1")], 1)).unwrap();
        builder.handle(open("section", &[], 2)).unwrap();
        let err = builder.handle(close("report", 3)).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 3, .. }), "{err}");
        assert!(err.to_string().contains("Mismatched"));
    }

    #[test]
    fn placement_rules() {
        let options = ParseOptions::default();

        let mut builder = TreeBuilder::new(&options);
        let err = builder.handle(open("label", &[], 1)).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));

        let mut builder = TreeBuilder::new(&options);
        builder.handle(open("report", &[("version", "1")], 1)).unwrap();
        let err = builder.handle(open("row", &[], 2)).unwrap_err();
        assert!(err.to_string().contains("inside a section"));

        let mut builder = TreeBuilder::new(&options);
        builder.handle(open("report", &[("version", "1")], 1)).unwrap();
        builder.handle(open("section", &[], 2)).unwrap();
        builder.handle(open("label", &[], 3)).unwrap();
        let err = builder.handle(open("hline", &[], 4)).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 4, .. }));

        let mut builder = TreeBuilder::new(&options);
        builder.handle(open("report", &[("version", "1")], 1)).unwrap();
        builder.handle(close("report", 1)).unwrap();
        let err = builder.handle(open("report", &[("version", "1")], 2)).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 2, .. }));
    }

    #[test]
    fn end_of_input_checks() {
        let options = ParseOptions::default();
        let builder = TreeBuilder::new(&options);
        assert!(matches!(builder.finish(), Err(ReportError::Tag { .. })));

        let mut builder = TreeBuilder::new(&options);
        builder.handle(open("report", &[("version", "1")], 1)).unwrap();
        builder.handle(open("section", &[], 4)).unwrap();
        assert!(matches!(builder.finish(), Err(ReportError::Parse { line: 4, .. })));
    }

    #[test]
    fn line_numbers_follow_the_source() {
        let source = "<report version=\"1\">\n  <section>\n    <frob/>\n  </section>\n</report>\n";
        let err = parse(source, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 3, .. }), "{err}");
        assert!(err.to_string().contains("Unknown tag <frob>"));
    }

    #[test]
    fn entities_in_text_and_attributes() {
        let source = r#"<report version="1"><section><label name="a&amp;b">Fish &amp; chips</label></section></report>"#;
        let document = parse(source, &ParseOptions::default()).unwrap();
        let id = document.find("a&b").unwrap();
        let NodeKind::Label(label) = &document.nodes[id].kind else {
            panic!("expected a label");
        };
        assert_eq!(crate::node::runs_text(&label.runs), "Fish & chips");
    }
}
