use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::patch::{
    id_field, non_empty, parse_timestamp, text_field, timestamp_field, FieldError, FieldMap, Patch,
};
use super::{Author, EntityId};

/// A persisted book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: EntityId,
    pub title: String,
    pub published_date: DateTime<Utc>,
    pub author_id: EntityId,
}

/// A book with its author embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookWithAuthor {
    #[serde(flatten)]
    pub book: Book,
    pub author: Author,
}

/// Input for creating a book
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewBook {
    pub title: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub published_date: DateTime<Utc>,
    pub author_id: EntityId,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("'{}' is not a date", raw)))
}

impl NewBook {
    pub fn new(title: impl Into<String>, published_date: DateTime<Utc>, author_id: EntityId) -> Self {
        Self {
            title: title.into(),
            published_date,
            author_id,
        }
    }

    /// Trim and check the input, returning the normalized form
    pub fn validated(self) -> Result<Self, FieldError> {
        if self.author_id <= 0 {
            return Err(FieldError::invalid(
                "authorId",
                "must be a positive identifier",
            ));
        }
        Ok(Self {
            title: non_empty("title", &self.title)?,
            ..self
        })
    }
}

/// Partial update of a book
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub author_id: Option<EntityId>,
}

impl Patch for BookPatch {
    const MUTABLE: &'static [&'static str] = &["title", "publishedDate", "authorId"];
    const IMMUTABLE: &'static [&'static str] = &["id", "author"];

    fn from_fields(fields: &FieldMap) -> Result<Self, FieldError> {
        Self::check_keys(fields)?;
        Ok(Self {
            title: fields
                .get("title")
                .map(|v| text_field("title", v))
                .transpose()?,
            published_date: fields
                .get("publishedDate")
                .map(|v| timestamp_field("publishedDate", v))
                .transpose()?,
            author_id: fields
                .get("authorId")
                .map(|v| id_field("authorId", v))
                .transpose()?,
        })
    }
}
