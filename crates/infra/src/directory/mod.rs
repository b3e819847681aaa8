//! Recipient directory: the set of chats that receive broadcasts.
//!
//! Append-only, deduplicated by identifier. The scan cycle only reads it;
//! registration is the `/start` handler's job.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRecipientDirectory;
pub use postgres::PostgresRecipientDirectory;

use std::sync::Arc;

use tinkerscout_core::{Recipient, RecipientId};

/// Outcome of an idempotent registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Registration {
    pub already_exists: bool,
}

#[async_trait::async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Add a recipient if it is not known yet.
    async fn register(&self, identifier: &RecipientId) -> Result<Registration, DirectoryError>;

    /// All recipients, oldest registration first.
    async fn list(&self) -> Result<Vec<Recipient>, DirectoryError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait::async_trait]
impl<D> RecipientDirectory for Arc<D>
where
    D: RecipientDirectory + ?Sized,
{
    async fn register(&self, identifier: &RecipientId) -> Result<Registration, DirectoryError> {
        (**self).register(identifier).await
    }

    async fn list(&self) -> Result<Vec<Recipient>, DirectoryError> {
        (**self).list().await
    }
}
