// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::error::StorageError;

/// Stores payloads as files in a directory that is published under
/// `base_url` by some web server.
///
/// Payloads published elsewhere are fetched over HTTP(S) unless remote
/// fetching is disabled. `file://` URLs are only served from inside the
/// storage directory.
pub struct FlatFileStorage {
    base_path: std::path::PathBuf,
    base_url: String,
    http: Option<reqwest::Client>,
}

enum Location<'a> {
    Published(std::path::PathBuf),
    File(&'a str),
    Remote(&'a reqwest::Client),
}

impl FlatFileStorage {
    pub fn new(base_path: impl Into<std::path::PathBuf>, base_url: &str) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Some(reqwest::Client::new()),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Only serve payloads stored under `base_path`.
    pub fn without_remote_fetch(mut self) -> Self {
        self.http = None;
        self
    }

    fn locate<'a>(&'a self, url: &'a str) -> Result<Location<'a>, StorageError> {
        if let Some(name) = url.strip_prefix(&self.base_url).and_then(|rest| rest.strip_prefix('/')) {
            if name.is_empty() || name.contains('/') || name.contains("..") {
                return Err(StorageError::UnsupportedLocation(url.to_string()));
            }
            return Ok(Location::Published(self.base_path.join(name)));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(Location::File(path));
        }
        match &self.http {
            Some(client) if url.starts_with("http://") || url.starts_with("https://") => Ok(Location::Remote(client)),
            _ => Err(StorageError::UnsupportedLocation(url.to_string())),
        }
    }

    /// Resolve a local path, refusing anything outside of `base_path`.
    async fn contained_path(&self, url: &str, path: &str) -> Result<std::path::PathBuf, StorageError> {
        let unsupported = || StorageError::UnsupportedLocation(url.to_string());
        let base = tokio::fs::canonicalize(&self.base_path).await.map_err(|_| unsupported())?;

        match tokio::fs::canonicalize(path).await {
            Ok(path) if path.starts_with(&base) => Ok(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let parent = std::path::Path::new(path).parent().unwrap_or(std::path::Path::new("/"));
                match tokio::fs::canonicalize(parent).await {
                    Ok(parent) if parent.starts_with(&base) => Err(StorageError::NotFound(url.to_string())),
                    _ => Err(unsupported()),
                }
            }
            _ => Err(unsupported()),
        }
    }
}

async fn fetch_remote(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, StorageError> {
    log::debug!("fetching {}", url);
    let response = client.get(url).send().await.map_err(|e| StorageError::Unavailable(e.to_string()))?;
    match response.status() {
        reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::GONE => Err(StorageError::NotFound(url.to_string())),
        status if status.is_success() => {
            let bytes = response.bytes().await.map_err(|e| StorageError::Unavailable(e.to_string()))?;
            Ok(bytes.to_vec())
        }
        status => Err(StorageError::Unavailable(format!("{} answered {}", url, status))),
    }
}

#[async_trait::async_trait]
impl ps_api::storage::Storage for FlatFileStorage {
    async fn store(&self, bytes: Vec<u8>, mime_type: &str) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        let name = format!("{}.{}", uuid::Uuid::new_v4(), crate::extension(mime_type));
        let path = self.base_path.join(&name);
        tokio::fs::write(&path, &bytes).await?;
        log::debug!("stored {} bytes of {} at {}", bytes.len(), mime_type, path.display());
        Ok(format!("{}/{}", self.base_url, name))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = match self.locate(url)? {
            Location::Published(path) => path,
            Location::File(path) => self.contained_path(url, path).await?,
            Location::Remote(client) => return fetch_remote(client, url).await,
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(url.to_string())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
