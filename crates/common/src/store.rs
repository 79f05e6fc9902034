use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{IngestError, IngestResult};

/// Opaque keyed document store: existence check by id, full-document
/// write. No partial updates; the persister never merges.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> IngestResult<Option<Value>>;
    async fn set(&self, collection: &str, id: &str, doc: Value) -> IngestResult<()>;
}

/// REST-backed document store. Documents live at
/// `{base}/{collection}/{id}`; 404 on GET means absent.
#[derive(Clone)]
pub struct RestDocStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestDocStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }
}

#[async_trait]
impl DocumentStore for RestDocStore {
    async fn get(&self, collection: &str, id: &str) -> IngestResult<Option<Value>> {
        let url = self.document_url(collection, id);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        match resp.status().as_u16() {
            404 => Ok(None),
            s if (200..300).contains(&s) => Ok(Some(resp.json().await?)),
            _ => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err(IngestError::Store(format!(
                    "get {} returned {}: {}",
                    url, status, body
                )))
            }
        }
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> IngestResult<()> {
        let url = self.document_url(collection, id);
        let resp = self
            .client
            .put(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&doc)
            .send()
            .await?;

        if resp.status().is_success() {
            info!("stored document {}", url);
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(IngestError::Store(format!(
                "set {} returned {}: {}",
                url, status, body
            )))
        }
    }
}

/// In-memory store used by tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> IngestResult<Option<Value>> {
        let documents = self.documents.lock().await;
        Ok(documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> IngestResult<()> {
        let mut documents = self.documents.lock().await;
        documents.insert((collection.to_string(), id.to_string()), doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_round_trips_documents() {
        let store = MemoryStore::new();
        assert!(store.get("activities", "abc").await.unwrap().is_none());

        store
            .set("activities", "abc", json!({ "title": "t" }))
            .await
            .unwrap();
        let doc = store.get("activities", "abc").await.unwrap().unwrap();
        assert_eq!(doc["title"], "t");
        assert_eq!(store.len().await, 1);

        // Same id in a different collection is a different document.
        assert!(store.get("groups", "abc").await.unwrap().is_none());
    }
}
