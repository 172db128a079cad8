//! Entity store layer for vidtube.
//!
//! The store is a collection-per-entity document database without native
//! joins. Reads that need related data are expressed as a [`pipeline`] and run
//! in one [`DocumentStore::aggregate`] call.

pub mod document;
pub mod entities;
pub mod error;
pub mod filter;
pub mod indexes;
pub mod memory;
pub mod pipeline;
pub mod repositories;
pub mod store;
pub mod update;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::MemoryStore;
pub use pipeline::{Expr, Lookup, SortDirection, SortKey, Stage};
pub use repositories::Repository;
pub use store::DocumentStore;
pub use update::Update;

use std::sync::Arc;

use vidtube_common::AppError;

/// Initialize the entity store.
///
/// The unique indexes are always created: toggles rely on them to keep one
/// edge per (actor, target) pair.
pub async fn init() -> Result<Arc<dyn DocumentStore>, AppError> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    indexes::ensure_indexes(store.as_ref()).await?;
    Ok(store)
}
