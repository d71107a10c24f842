//! Turns a queued job into catalog-ready field values.
//!
//! Formatting is pure: no I/O, no shared state. Any error it returns is a
//! `Validation` error and ends the job as FAILED.

use super::types::PublishJob;
use crate::catalog::{CatalogInput, Genre};
use crate::error::{Error, Result};

pub trait Formatter: Send + Sync {
    fn format(&self, job: &PublishJob) -> Result<CatalogInput>;
}

/// Default formatter.
///
/// Trims title and author (both required), parses the genre and normalizes
/// body line endings.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogFormatter;

impl Formatter for CatalogFormatter {
    fn format(&self, job: &PublishJob) -> Result<CatalogInput> {
        let title = required("title", &job.title)?;
        let author = required("author", &job.author)?;
        let genre: Genre = job.genre.parse()?;

        let body = job.body.replace("\r\n", "\n").trim_end().to_string();

        Ok(CatalogInput {
            document_id: job.document_id.clone(),
            author,
            title,
            body,
            genre,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
