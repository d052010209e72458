use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LocationStore, StoreError};
use crate::models::location::LocationRecord;

/// Process-lived store; cleared on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<LocationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn append(&self, record: LocationRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::{IncomingLocation, ValidationPolicy};
    use chrono::Utc;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    fn record(lat: f64) -> LocationRecord {
        IncomingLocation {
            latitude: Some(lat),
            longitude: Some(-lat),
            ..Default::default()
        }
        .into_record(
            ValidationPolicy::default(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = MemoryStore::new();
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn preserves_insertion_order() {
        let store = MemoryStore::new();
        let records: Vec<_> = (0..5).map(|i| record(i as f64)).collect();
        for r in &records {
            store.append(r.clone()).await.unwrap();
        }
        assert_eq!(store.list_all().await.unwrap(), records);
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(MemoryStore::new());
        let tasks = (0..50).map(|i| {
            let store = store.clone();
            async move { store.append(record(i as f64)).await }
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        let stored = store.list_all().await.unwrap();
        assert_eq!(stored.len(), 50);
        let mut ids: Vec<_> = stored.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
