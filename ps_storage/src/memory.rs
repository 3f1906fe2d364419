// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::error::StorageError;

const SCHEME: &str = "memory://";

/// Volatile storage, e.g., for tests and for one-shot command line use.
#[derive(Default)]
pub struct MemoryStorage {
    entries: tokio::sync::Mutex<std::collections::HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Media type given when `url` was stored.
    pub async fn mime_type(&self, url: &str) -> Option<String> {
        self.entries.lock().await.get(url).map(|(mime_type, _)| mime_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ps_api::storage::Storage for MemoryStorage {
    async fn store(&self, bytes: Vec<u8>, mime_type: &str) -> Result<String, StorageError> {
        let url = format!("{}{}.{}", SCHEME, uuid::Uuid::new_v4(), crate::extension(mime_type));
        self.entries.lock().await.insert(url.clone(), (mime_type.to_string(), bytes));
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        if !url.starts_with(SCHEME) {
            return Err(StorageError::UnsupportedLocation(url.to_string()));
        }
        match self.entries.lock().await.get(url) {
            Some((_, bytes)) => Ok(bytes.clone()),
            None => Err(StorageError::NotFound(url.to_string())),
        }
    }
}
