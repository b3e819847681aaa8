use std::collections::HashMap;
use std::sync::RwLock;

use tinkerscout_core::Tinker;

use super::{CatalogError, CatalogStore};

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<HashMap<String, Tinker>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog, bypassing conflict checks.
    pub fn with_tinkers(tinkers: impl IntoIterator<Item = Tinker>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.inner.write() {
            for t in tinkers {
                map.insert(t.name.clone(), t);
            }
        }
        store
    }

    pub fn all(&self) -> Vec<Tinker> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut all: Vec<_> = map.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        all
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tinker>, CatalogError> {
        let map = self
            .inner
            .read()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        Ok(map.get(name).cloned())
    }

    async fn insert(&self, tinker: &Tinker) -> Result<(), CatalogError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| CatalogError::Storage("lock poisoned".to_string()))?;
        if map.contains_key(&tinker.name) {
            return Err(CatalogError::Conflict(tinker.name.clone()));
        }
        map.insert(tinker.name.clone(), tinker.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tinkerscout_core::TinkerRecord;

    fn tinker(name: &str) -> Tinker {
        TinkerRecord::new(json!({ "name": name }))
            .normalize(Utc::now())
            .unwrap()
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = InMemoryCatalogStore::new();
        store.insert(&tinker("FOO")).await.unwrap();

        let found = store.find_by_name("FOO").await.unwrap().unwrap();
        assert_eq!(found.name, "FOO");
        assert!(store.find_by_name("BAR").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = InMemoryCatalogStore::with_tinkers([tinker("Foo")]);
        assert!(store.find_by_name("FOO").await.unwrap().is_none());
        store.insert(&tinker("FOO")).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts_and_keeps_original() {
        let store = InMemoryCatalogStore::new();
        let original = tinker("FOO");
        store.insert(&original).await.unwrap();

        let mut changed = tinker("FOO");
        changed.reason = "different".to_string();
        let err = store.insert(&changed).await.unwrap_err();

        assert!(matches!(err, CatalogError::Conflict(name) if name == "FOO"));
        assert_eq!(store.find_by_name("FOO").await.unwrap().unwrap(), original);
    }
}
