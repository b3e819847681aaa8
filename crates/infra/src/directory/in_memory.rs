use std::sync::RwLock;

use chrono::Utc;

use tinkerscout_core::{Recipient, RecipientId};

use super::{DirectoryError, RecipientDirectory, Registration};

/// In-memory directory for tests/dev. Keeps registration order.
#[derive(Debug, Default)]
pub struct InMemoryRecipientDirectory {
    inner: RwLock<Vec<Recipient>>,
}

impl InMemoryRecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with the given identifiers, in order.
    pub fn with_recipients<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = Utc::now();
        let recipients = ids
            .into_iter()
            .filter_map(|id| RecipientId::new(id.as_ref()).ok())
            .map(|id| Recipient::new(id, now))
            .collect();
        Self {
            inner: RwLock::new(recipients),
        }
    }
}

#[async_trait::async_trait]
impl RecipientDirectory for InMemoryRecipientDirectory {
    async fn register(&self, identifier: &RecipientId) -> Result<Registration, DirectoryError> {
        let mut recipients = self
            .inner
            .write()
            .map_err(|_| DirectoryError::Storage("lock poisoned".to_string()))?;

        if recipients.iter().any(|r| &r.identifier == identifier) {
            return Ok(Registration {
                already_exists: true,
            });
        }

        recipients.push(Recipient::new(identifier.clone(), Utc::now()));
        Ok(Registration {
            already_exists: false,
        })
    }

    async fn list(&self) -> Result<Vec<Recipient>, DirectoryError> {
        let recipients = self
            .inner
            .read()
            .map_err(|_| DirectoryError::Storage("lock poisoned".to_string()))?;
        Ok(recipients.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecipientId {
        RecipientId::new(s).unwrap()
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let dir = InMemoryRecipientDirectory::new();

        let first = dir.register(&id("42")).await.unwrap();
        let second = dir.register(&id("42")).await.unwrap();

        assert!(!first.already_exists);
        assert!(second.already_exists);
        assert_eq!(dir.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_keeps_registration_order() {
        let dir = InMemoryRecipientDirectory::with_recipients(["a", "b"]);
        dir.register(&id("c")).await.unwrap();

        let ids: Vec<_> = dir
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.identifier.to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}
