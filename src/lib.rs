//! Document Publishing Pipeline Library
//!
//! Accepts requests to publish or update documents, processes them asynchronously,
//! and keeps a queryable status history per request alongside a versioned,
//! soft-deletable catalog of published documents.
//!
//! ## Architecture Modules
//! - **`catalog`**: append-only version chains per document with "latest active
//!   version" resolution and soft deletion.
//! - **`status`**: ordered status history per publishing record.
//! - **`publishing`**: intake, the submission queue, the publish worker and the
//!   scheduler that drives it.
//! - **`app`**: the composition root wiring one of each together.
//! - **`config`** / **`error`**: configuration loading and the error taxonomy.

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod publishing;
pub mod status;

pub use app::Publisher;
pub use error::{Error, Result};
