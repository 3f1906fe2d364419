// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::{DataReference, DataType, DataValue};
use ps_api::error::{EncodeError, ResponseGenerateError};
use ps_api::process::ProcessDefinition;
use ps_api::request::RequestedOutput;
use ps_api::response::Response;
use ps_encoding::{CodecFamily, EncodingRegistry};

use crate::request::DATA_REFERENCE;
use crate::response::{generate_with, ResponseWriter, RESPONSE_SUFFIX};
use crate::HandlerContext;

/// Builds `{"<process>Response": {"<output>": value | [values]}}` documents.
pub struct JsonResponseWriter {
    root_name: String,
    outputs: serde_json::Map<String, serde_json::Value>,
}

impl JsonResponseWriter {
    pub fn new(process_identifier: &str) -> Self {
        Self {
            root_name: format!("{}{}", process_identifier, RESPONSE_SUFFIX),
            outputs: serde_json::Map::new(),
        }
    }
}

impl ResponseWriter for JsonResponseWriter {
    type Fragment = serde_json::Value;
    type Document = serde_json::Value;

    fn family(&self) -> CodecFamily {
        CodecFamily::Json
    }

    fn encode_inline(
        &mut self,
        encodings: &EncodingRegistry,
        data_type: &DataType,
        value: &DataValue,
    ) -> Result<serde_json::Value, EncodeError> {
        let codec = encodings
            .json_codec(data_type)
            .ok_or_else(|| EncodeError::NoEncoding(data_type.clone()))?;
        codec.encode(value)
    }

    fn encode_reference(&mut self, reference: &DataReference) -> serde_json::Value {
        let mut inner = serde_json::Map::new();
        inner.insert("href".to_string(), serde_json::Value::from(reference.href()));
        if let Some(mime_type) = reference.mime_type() {
            inner.insert("mimeType".to_string(), serde_json::Value::from(mime_type));
        }
        let mut outer = serde_json::Map::new();
        outer.insert(DATA_REFERENCE.to_string(), serde_json::Value::Object(inner));
        serde_json::Value::Object(outer)
    }

    fn attach(&mut self, output: &str, multiple: bool, fragments: Vec<serde_json::Value>) {
        if multiple {
            self.outputs.insert(output.to_string(), serde_json::Value::Array(fragments));
        } else if let Some(fragment) = fragments.into_iter().next() {
            self.outputs.insert(output.to_string(), fragment);
        }
    }

    fn finish(self) -> Result<serde_json::Value, ResponseGenerateError> {
        let mut root = serde_json::Map::new();
        root.insert(self.root_name, serde_json::Value::Object(self.outputs));
        Ok(serde_json::Value::Object(root))
    }
}

pub struct JsonResponseGenerator<'a> {
    ctx: &'a HandlerContext,
}

impl<'a> JsonResponseGenerator<'a> {
    pub fn new(ctx: &'a HandlerContext) -> Self {
        Self { ctx }
    }

    pub async fn generate(
        &self,
        response: &Response,
        process: &ProcessDefinition,
        requested_outputs: Option<&[RequestedOutput]>,
    ) -> Result<serde_json::Value, ResponseGenerateError> {
        let writer = JsonResponseWriter::new(&response.process_identifier);
        generate_with(writer, self.ctx, response, process, requested_outputs).await
    }

    pub fn to_bytes(document: &serde_json::Value) -> Result<Vec<u8>, ResponseGenerateError> {
        serde_json::to_vec(document).map_err(|e| ResponseGenerateError::Write(e.to_string()))
    }
}
