use serde::{Deserialize, Serialize};

use super::patch::{non_empty, text_field, FieldError, FieldMap, Patch};
use super::{Book, EntityId};

/// A persisted author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: EntityId,
    pub name: String,
}

/// An author with every book it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<Book>,
}

/// Input for creating an author
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAuthor {
    pub name: String,
}

impl NewAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Trim and check the input, returning the normalized form
    pub fn validated(self) -> Result<Self, FieldError> {
        Ok(Self {
            name: non_empty("name", &self.name)?,
        })
    }
}

/// Partial update of an author
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorPatch {
    pub name: Option<String>,
}

impl Patch for AuthorPatch {
    const MUTABLE: &'static [&'static str] = &["name"];
    const IMMUTABLE: &'static [&'static str] = &["id", "books"];

    fn from_fields(fields: &FieldMap) -> Result<Self, FieldError> {
        Self::check_keys(fields)?;
        let name = fields
            .get("name")
            .map(|value| text_field("name", value))
            .transpose()?;
        Ok(Self { name })
    }
}
