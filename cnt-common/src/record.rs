//! Record model shared by every pipeline stage
//!
//! A [`Record`] is created by the fetcher, has its text fields rewritten by the
//! translator and is otherwise only reordered or dropped. Identity and
//! observation time are private so no later stage can change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable record identity, derived from the source's per-item locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Translatable text field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Title,
    Description,
}

impl TextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Description => "description",
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(TextField::Title),
            "description" => Ok(TextField::Description),
            other => Err(format!("unknown text field '{}'", other)),
        }
    }
}

/// One news item
///
/// Serialized as a flat object. Optional fields are omitted when absent;
/// `score` defaults to 0 and `is_hot` to false when missing from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identity (serialized as the item URL)
    #[serde(rename = "url")]
    id: RecordId,
    /// Headline text (translated in place)
    pub title: String,
    /// Summary text; absent is distinct from empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image reference, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Community vote score
    #[serde(default)]
    pub score: i64,
    /// Classification flag, recomputed on every fetch
    #[serde(default)]
    pub is_hot: bool,
    /// Local fetch instant, used only for retention
    observed_at: DateTime<Utc>,
}

impl Record {
    pub fn new(id: RecordId, title: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            image: None,
            score: 0,
            is_hot: false,
            observed_at,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn with_hot(mut self, is_hot: bool) -> Self {
        self.is_hot = is_hot;
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Current text of a field; `None` when the field is absent
    pub fn text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::Title => Some(self.title.as_str()),
            TextField::Description => self.description.as_deref(),
        }
    }

    /// Replace the text of a field
    pub fn set_text(&mut self, field: TextField, text: String) {
        match field {
            TextField::Title => self.title = text,
            TextField::Description => self.description = Some(text),
        }
    }

    /// Take classification flags from a fresher copy of the same item
    pub fn refresh_classification(&mut self, fresh: &Record) {
        self.score = fresh.score;
        self.is_hot = fresh.is_hot;
    }
}

/// Ordered record sequence plus the instant it was last saved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub records: Vec<Record>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl RecordSet {
    /// Unsaved set
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            saved_at: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records flagged hot, in set order
    pub fn hot_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_hot)
    }
}
