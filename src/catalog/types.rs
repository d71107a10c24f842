//! Catalog Data Types
//!
//! `CatalogRecord` is one write-once version of a document. The chain of records
//! sharing a `document_id` is the document's full history.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Genre of a published document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    Action,
    Comedy,
    Drama,
    Fantasy,
    Horror,
    Mystery,
    Romance,
    ScienceFiction,
    Thriller,
    NonFiction,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Mystery,
        Genre::Romance,
        Genre::ScienceFiction,
        Genre::Thriller,
        Genre::NonFiction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "ACTION",
            Genre::Comedy => "COMEDY",
            Genre::Drama => "DRAMA",
            Genre::Fantasy => "FANTASY",
            Genre::Horror => "HORROR",
            Genre::Mystery => "MYSTERY",
            Genre::Romance => "ROMANCE",
            Genre::ScienceFiction => "SCIENCE_FICTION",
            Genre::Thriller => "THRILLER",
            Genre::NonFiction => "NON_FICTION",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `FANTASY`, `fantasy`, `science-fiction`, `Science Fiction`, ...
impl FromStr for Genre {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Genre::ALL
            .iter()
            .copied()
            .find(|genre| genre.as_str() == normalized)
            .ok_or_else(|| Error::Validation(format!("unknown genre: '{}'", s.trim())))
    }
}

/// One version of a catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogRecord {
    pub document_id: String,
    /// Starts at 1 and grows by one per update.
    pub version: u32,
    /// Only the latest version of a document can be active.
    pub active: bool,
    pub author: String,
    pub title: String,
    pub body: String,
    pub genre: Genre,
}

/// Field values for a create (`document_id == None`) or an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogInput {
    pub document_id: Option<String>,
    pub author: String,
    pub title: String,
    pub body: String,
    pub genre: Genre,
}

impl CatalogInput {
    pub(crate) fn into_record(self, document_id: String, version: u32) -> CatalogRecord {
        CatalogRecord {
            document_id,
            version,
            active: true,
            author: self.author,
            title: self.title,
            body: self.body,
            genre: self.genre,
        }
    }
}

/// Version ordering for backend range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}
