use crate::refs::{ObjectReferences, RefType};
use pdf_writer::{Date as PDate, Pdf, TextStr};
use std::collections::BTreeMap;

/// General document metadata written to the PDF's info dictionary
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Info {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// No prescribed format, though a comma separated list is conventional
    pub keywords: Option<String>,
}

impl Info {
    pub fn new() -> Info {
        Info::default()
    }

    /// Build an info block from `key: value` metadata, as found on a report
    /// section. Unknown keys are ignored.
    pub fn from_metadata(metadata: &BTreeMap<String, String>) -> Info {
        let get = |key: &str| metadata.get(key).cloned();
        Info {
            title: get("title"),
            author: get("author"),
            subject: get("subject"),
            keywords: get("keywords"),
        }
    }

    pub fn title<S: ToString>(&mut self, title: S) -> &mut Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author<S: ToString>(&mut self, author: S) -> &mut Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn subject<S: ToString>(&mut self, subject: S) -> &mut Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn keywords<S: ToString>(&mut self, keywords: S) -> &mut Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, writer: &mut Pdf) {
        let id = refs.gen(RefType::Info);
        let mut info = writer.document_info(id);

        if let Some(title) = &self.title {
            info.title(TextStr(title));
        }
        if let Some(author) = &self.author {
            info.author(TextStr(author));
        }
        if let Some(subject) = &self.subject {
            info.subject(TextStr(subject));
        }
        if let Some(keywords) = &self.keywords {
            info.keywords(TextStr(keywords));
        }
        info.creator(TextStr(concat!(
            env!("CARGO_PKG_NAME"),
            " v",
            env!("CARGO_PKG_VERSION")
        )));
        info.creation_date(now());
    }
}

/// The current local time as a PDF date
fn now() -> PDate {
    use chrono::prelude::*;
    let now = Local::now();
    let offset = now.offset().fix().local_minus_utc();
    let hours = offset / 3600;
    let minutes = ((offset - hours * 3600) / 60).abs();
    PDate::new(now.year() as u16)
        .month(now.month() as u8)
        .day(now.day() as u8)
        .hour(now.hour() as u8)
        .minute(now.minute() as u8)
        .second(now.second() as u8)
        .utc_offset_hour(hours as i8)
        .utc_offset_minute(minutes as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_fields() {
        let metadata = BTreeMap::from([
            ("title".to_string(), "Quarterly".to_string()),
            ("department".to_string(), "Sales".to_string()),
        ]);
        let info = Info::from_metadata(&metadata);
        assert_eq!(info.title.as_deref(), Some("Quarterly"));
        assert_eq!(info.author, None);
    }
}
