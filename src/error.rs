use thiserror::Error;

/// All errors that the crate can generate
#[derive(Error, Debug)]
pub enum ReportError {
    /// Malformed markup or attribute value, unknown tag or attribute, unresolved
    /// environment key, or mismatched tag nesting
    #[error("{message} at line {line}")]
    Parse { message: String, line: usize },

    /// Structurally invalid configuration: a missing required attribute or an
    /// attribute value outside of its allowed choices
    #[error("{message} at line {line}")]
    Tag { message: String, line: usize },

    /// A source references the environment but none was supplied
    #[error("cannot resolve '{src}' at line {line} without an environment")]
    NoEnv { src: String, line: usize },

    /// The page sink or the sizing engine failed while rendering
    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsingError(#[from] owned_ttf_parser::FaceParsingError),

    #[error(transparent)]
    /// [image] failed to decode an image
    Image(#[from] image::ImageError),
}

impl ReportError {
    pub(crate) fn parse<S: Into<String>>(line: usize, message: S) -> ReportError {
        ReportError::Parse {
            message: message.into(),
            line,
        }
    }

    pub(crate) fn tag<S: Into<String>>(line: usize, message: S) -> ReportError {
        ReportError::Tag {
            message: message.into(),
            line,
        }
    }

    pub(crate) fn render<S: Into<String>>(message: S) -> ReportError {
        ReportError::Render(message.into())
    }

    /// The markup line the error refers to, if it happened while parsing
    pub fn line(&self) -> Option<usize> {
        match self {
            ReportError::Parse { line, .. }
            | ReportError::Tag { line, .. }
            | ReportError::NoEnv { line, .. } => Some(*line),
            _ => None,
        }
    }
}
