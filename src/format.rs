use crate::node::TextRun;

/// Which kind of node character data belongs to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextKind {
    /// Short, usually single-line text
    Label,
    /// Long-form text that may span several pages
    Text,
}

/// Turns the character data buffered for a `label` or `text` tag into the runs
/// stored on the node. Runs with markup-derived styling can be produced by
/// custom implementations.
pub trait TextFormatter {
    fn format(&self, kind: TextKind, raw: &str) -> Vec<TextRun>;
}

/// Keeps text as-is apart from surrounding whitespace. Text blocks also lose
/// the indentation common to all of their lines, so they can be indented along
/// with the markup.
#[derive(Debug, Default, Copy, Clone)]
pub struct PlainFormatter;

impl TextFormatter for PlainFormatter {
    fn format(&self, kind: TextKind, raw: &str) -> Vec<TextRun> {
        let text = match kind {
            TextKind::Label => raw.trim().to_string(),
            TextKind::Text => dedent(raw).trim().to_string(),
        };
        vec![TextRun::plain(text)]
    }
}

/// Remove the leading whitespace shared by every non-blank line. Blank lines
/// are emptied.
pub fn dedent(text: &str) -> String {
    let indent = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();
    let common = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..indent(line)])
        .reduce(|a, b| {
            let shared = a
                .char_indices()
                .zip(b.chars())
                .find(|((_, x), y)| x != y)
                .map(|((i, _), _)| i)
                .unwrap_or_else(|| a.len().min(b.len()));
            &a[..shared]
        })
        .unwrap_or("");

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(common).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
