// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use crate::error::StorageError;

/// Durable store of referenced payloads.
///
/// Timeouts and unavailability are reported as errors: callers propagate
/// them and never retry.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Persist the payload and return the URL it can be fetched from.
    async fn store(&self, bytes: Vec<u8>, mime_type: &str) -> Result<String, StorageError>;

    /// Retrieve the payload located at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;
}
