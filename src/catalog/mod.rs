//! Versioned Catalog Module
//!
//! Stores published documents as append-only version chains with soft deletion.
//!
//! ## Submodules
//! - **`types`**: `CatalogRecord`, `CatalogInput` and `Genre`.
//! - **`backend`**: the `RecordBackend` collaborator, its in-memory implementation and
//!   document id generation.
//! - **`store`**: `VersionedCatalogStore`, which enforces the "latest active version" rules.

pub mod backend;
pub mod store;
pub mod types;

pub use backend::{DocumentIdGenerator, MemoryBackend, RecordBackend, UuidDocumentIds};
pub use store::VersionedCatalogStore;
pub use types::{CatalogInput, CatalogRecord, Genre, ScanOrder};
