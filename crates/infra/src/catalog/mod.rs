//! Catalog of every tinker ever accepted.
//!
//! Keyed by the tinker's exact name. Stores only ever insert; a name that is
//! already present is reported as [`CatalogError::Conflict`] so concurrent
//! writers cannot both accept the same tinker.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

use std::sync::Arc;

use tinkerscout_core::Tinker;

/// Catalog store abstraction.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a tinker by exact (case-sensitive) name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Tinker>, CatalogError>;

    /// Insert a new tinker. Fails with `Conflict` if the name is taken.
    async fn insert(&self, tinker: &Tinker) -> Result<(), CatalogError>;
}

/// Catalog store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("tinker already recorded: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn find_by_name(&self, name: &str) -> Result<Option<Tinker>, CatalogError> {
        (**self).find_by_name(name).await
    }

    async fn insert(&self, tinker: &Tinker) -> Result<(), CatalogError> {
        (**self).insert(tinker).await
    }
}
