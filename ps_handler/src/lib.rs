// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

pub mod json_response;
pub mod materializer;
pub mod request;
pub mod response;
pub mod xml_response;

#[cfg(test)]
pub mod test_utils;

pub use json_response::JsonResponseGenerator;
pub use materializer::ReferenceMaterializer;
pub use request::RequestDeserializer;
pub use xml_response::XmlResponseGenerator;

/// Shared, read-only collaborators of request handling. Built once at
/// start-up and then cloned into every request handler.
#[derive(Clone)]
pub struct HandlerContext {
    pub catalog: std::sync::Arc<dyn ps_api::process::ProcessCatalog>,
    pub encodings: std::sync::Arc<ps_encoding::EncodingRegistry>,
    pub storage: std::sync::Arc<dyn ps_api::storage::Storage>,
}

impl HandlerContext {
    pub fn new(
        catalog: std::sync::Arc<dyn ps_api::process::ProcessCatalog>,
        encodings: std::sync::Arc<ps_encoding::EncodingRegistry>,
        storage: std::sync::Arc<dyn ps_api::storage::Storage>,
    ) -> Self {
        Self {
            catalog,
            encodings,
            storage,
        }
    }

    pub fn materializer(&self) -> ReferenceMaterializer<'_> {
        ReferenceMaterializer::new(&self.encodings, self.storage.as_ref())
    }
}
