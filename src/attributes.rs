//! Typed conversion of raw markup attributes.
//!
//! Every coercion is a pure function of the raw string and the line it was
//! found on; failures always report both. Attributes are coerced exactly once,
//! by the tree builder, before the node they belong to is constructed.

use crate::colour::Colour;
use crate::environment::env_key_path;
use crate::error::ReportError;
use crate::layout::{Alignment, Margins, SizePolicy};
use crate::rect::Size;
use crate::units::Pt;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where an image or vector graphic gets its content from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A file on disk, known to exist at parse time
    File(PathBuf),
    /// A key path into the [Environment](crate::Environment), resolved when the
    /// node is constructed
    Env { src: String, keys: Vec<String> },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Env { src, .. } => f.write_str(src),
        }
    }
}

/// A coerced attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Count(u32),
    Margins(Margins),
    Size(Size),
    Colour(Colour),
    Policy(SizePolicy),
    Alignment(Alignment),
    Flag(bool),
    Declarations(BTreeMap<String, String>),
    Source(Source),
    Text(String),
}

/// Coerce `raw` according to the attribute `name`. The builder has already
/// checked that `name` belongs to the tag's schema.
pub fn coerce(
    name: &str,
    raw: &str,
    line: usize,
    base_dir: Option<&Path>,
) -> Result<AttrValue, ReportError> {
    Ok(match name {
        "spacing" | "line_width" | "stretch" | "width" | "height" => {
            AttrValue::Count(parse_count(name, raw, line)?)
        }
        "margins" => AttrValue::Margins(parse_margins(raw, line)?),
        "size" => AttrValue::Size(parse_size(raw, line)?),
        "color" => AttrValue::Colour(parse_colour(raw, line)?),
        "horizontal" | "vertical" => AttrValue::Policy(parse_policy(name, raw, line)?),
        "alignment" => AttrValue::Alignment(parse_alignment(raw, line)?),
        "word_wrap" => AttrValue::Flag(parse_flag(name, raw, line)?),
        "style" | "metadata" => AttrValue::Declarations(parse_declarations(name, raw, line)?),
        "src" => AttrValue::Source(parse_src(raw, line, base_dir)?),
        _ => AttrValue::Text(raw.to_string()),
    })
}

pub fn parse_count(name: &str, value: &str, line: usize) -> Result<u32, ReportError> {
    value.trim().parse::<u32>().map_err(|_| {
        ReportError::parse(
            line,
            format!("Invalid value {value:?} for `{name}`, provide a valid non-negative number"),
        )
    })
}

fn parse_tuple(value: &str) -> Option<Vec<u32>> {
    let inner = value.trim();
    let inner = inner.strip_prefix('(').unwrap_or(inner);
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    inner
        .split(',')
        .map(|v| v.trim().parse::<u32>().ok())
        .collect()
}

/// Margins are written `left, top, right, bottom`, optionally in parentheses
pub fn parse_margins(value: &str, line: usize) -> Result<Margins, ReportError> {
    match parse_tuple(value).as_deref() {
        Some(&[left, top, right, bottom]) => Ok(Margins::ltrb(
            left.into(),
            top.into(),
            right.into(),
            bottom.into(),
        )),
        _ => Err(ReportError::parse(
            line,
            format!(
                "Invalid value {value:?} for `margins`, provide 4 comma separated numbers, eg. (3,3,4,4)"
            ),
        )),
    }
}

pub fn parse_size(value: &str, line: usize) -> Result<Size, ReportError> {
    match parse_tuple(value).as_deref() {
        Some(&[width, height]) => Ok(Size::new(width, height)),
        _ => Err(ReportError::parse(
            line,
            format!(
                "Invalid value {value:?} for `size`, provide 2 comma separated numbers, eg. (300,400)"
            ),
        )),
    }
}

pub fn parse_colour(value: &str, line: usize) -> Result<Colour, ReportError> {
    Colour::parse(value).ok_or_else(|| {
        ReportError::parse(
            line,
            format!("Invalid color {value:?}, provide a colour name or #rrggbb"),
        )
    })
}

pub fn parse_policy(name: &str, value: &str, line: usize) -> Result<SizePolicy, ReportError> {
    SizePolicy::from_name(value).ok_or_else(|| {
        ReportError::parse(
            line,
            format!(
                "Invalid value {value:?} for `{name}`, use {}",
                SizePolicy::NAMES.join("|")
            ),
        )
    })
}

pub fn parse_alignment(value: &str, line: usize) -> Result<Alignment, ReportError> {
    Alignment::from_name(value).ok_or_else(|| {
        ReportError::parse(
            line,
            format!(
                "Invalid value {value:?} for `alignment`, use {}",
                Alignment::NAMES.join("|")
            ),
        )
    })
}

pub fn parse_flag(name: &str, value: &str, line: usize) -> Result<bool, ReportError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ReportError::parse(
            line,
            format!("Invalid value {value:?} for `{name}`, use true|false"),
        )),
    }
}

/// `key: value` pairs separated by `;`, as in `font-size: 10pt; color: red`
pub fn parse_declarations(
    name: &str,
    value: &str,
    line: usize,
) -> Result<BTreeMap<String, String>, ReportError> {
    let mut declarations = BTreeMap::new();
    for declaration in value.split(';').filter(|d| !d.trim().is_empty()) {
        let (key, val) = declaration.split_once(':').ok_or_else(|| {
            ReportError::parse(
                line,
                format!("Invalid declaration {declaration:?} in `{name}`, use `key: value`"),
            )
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ReportError::parse(
                line,
                format!("Empty key in `{name}` declaration {declaration:?}"),
            ));
        }
        declarations.insert(key.to_string(), val.trim().to_string());
    }
    Ok(declarations)
}

/// Environment sources are only split into their key path here; they are
/// resolved once the node is built. File sources must exist.
pub fn parse_src(value: &str, line: usize, base_dir: Option<&Path>) -> Result<Source, ReportError> {
    if let Some(keys) = env_key_path(value) {
        if keys.iter().any(|k| k.is_empty()) {
            return Err(ReportError::parse(
                line,
                format!("Invalid key path in src={value:?}"),
            ));
        }
        return Ok(Source::Env {
            src: value.to_string(),
            keys,
        });
    }

    let path = match base_dir {
        Some(dir) if Path::new(value).is_relative() => dir.join(value),
        _ => PathBuf::from(value),
    };
    if !path.exists() {
        return Err(ReportError::parse(
            line,
            format!("src={value:?} does not exist"),
        ));
    }
    Ok(Source::File(path))
}

/// Base font size from a section's `style` declarations (`font-size: 12pt`)
pub fn font_size(style: &BTreeMap<String, String>) -> Option<Pt> {
    let raw = style.get("font-size")?.trim();
    let number = raw
        .strip_suffix("pt")
        .or_else(|| raw.strip_suffix("px"))
        .unwrap_or(raw);
    number.trim().parse::<f32>().ok().filter(|s| *s > 0.0).map(Pt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        assert_eq!(coerce("spacing", " 4 ", 1, None).unwrap(), AttrValue::Count(4));
        let err = coerce("spacing", "four", 3, None).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 3, .. }));
        assert!(err.to_string().contains("\"four\""));
        assert!(parse_count("line_width", "-1", 1).is_err());
    }

    #[test]
    fn margins_are_left_top_right_bottom() {
        let m = parse_margins("(1, 2, 3, 4)", 1).unwrap();
        assert_eq!(m.left, Pt(1.0));
        assert_eq!(m.top, Pt(2.0));
        assert_eq!(m.right, Pt(3.0));
        assert_eq!(m.bottom, Pt(4.0));
        assert!(parse_margins("1,2,3", 9).is_err());
        assert!(parse_margins("1,2,x,4", 9).is_err());
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size("300,400", 1).unwrap(), Size::new(300, 400));
        assert!(parse_size("(300)", 1).is_err());
    }

    #[test]
    fn declarations() {
        let d = parse_declarations("style", "font-size: 12pt; color: red;", 1).unwrap();
        assert_eq!(d.get("font-size").map(String::as_str), Some("12pt"));
        assert_eq!(d.get("color").map(String::as_str), Some("red"));
        assert_eq!(font_size(&d), Some(Pt(12.0)));
        assert!(parse_declarations("metadata", "nonsense", 2).is_err());
    }

    #[test]
    fn env_sources_are_not_checked() {
        let src = parse_src("env://preview:1", 5, None).unwrap();
        assert_eq!(
            src,
            Source::Env {
                src: "env://preview:1".to_string(),
                keys: vec!["preview".to_string(), "1".to_string()],
            }
        );
        assert!(parse_src("env://preview::1", 5, None).is_err());
    }

    #[test]
    fn file_sources_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.svg"), "<svg/>").unwrap();

        let src = parse_src("logo.svg", 2, Some(dir.path())).unwrap();
        assert_eq!(src, Source::File(dir.path().join("logo.svg")));

        let err = parse_src("missing.svg", 2, Some(dir.path())).unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 2, .. }));
    }
}
