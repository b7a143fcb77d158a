//! Test doubles for the injected collaborators.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::llm_client::{CompletionClient, CompletionError};
use crate::storage::blobs::{BlobError, BlobStore};

enum Reply {
    Text(String),
    Unavailable(String),
    Empty,
}

/// Completion client with a fixed reply that records every prompt it receives.
pub struct FakeCompletionClient {
    reply: Reply,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl FakeCompletionClient {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn unavailable(reason: &str) -> Self {
        Self::with_reply(Reply::Unavailable(reason.to_string()))
    }

    pub fn empty() -> Self {
        Self::with_reply(Reply::Empty)
    }

    /// Answers only after `delay` has elapsed.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletionClient {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Unavailable(reason) => Err(CompletionError::UpstreamUnavailable(reason.clone())),
            Reply::Empty => Err(CompletionError::EmptyCompletion),
        }
    }
}

/// In-memory blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryBlobStore {
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(body, _)| body.clone())
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://blobs.test/{key}")
    }
}

#[tokio::test]
async fn test_memory_blob_store_round_trip() {
    let store = MemoryBlobStore::default();
    store
        .put("uploads/resumes/a.txt", Bytes::from_static(b"cv"), "text/plain")
        .await
        .unwrap();
    assert_eq!(store.get("uploads/resumes/a.txt").await.unwrap(), "cv");
    assert_eq!(store.content_type("uploads/resumes/a.txt").as_deref(), Some("text/plain"));
    assert!(matches!(store.get("missing").await, Err(BlobError::NotFound(_))));
}
