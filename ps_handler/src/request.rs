// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::{Data, DataDescription, DataReference, DataValue};
use ps_api::error::{ParseError, RequestError};
use ps_api::process::ProcessDefinition;
use ps_api::request::{Input, Request, RequestedOutput};

use crate::HandlerContext;

pub const REQUEST_SUFFIX: &str = "Request";
pub const REQUESTED_OUTPUTS: &str = "RequestedOutputs";
pub const DATA_REFERENCE: &str = "DataReference";

/// Turns JSON request documents of the form
/// `{"<process>Request": {"<input>": ..., "RequestedOutputs": {...}}}`
/// into requests.
///
/// Inputs are parsed in the order declared by the process. A value may be
/// inline, an array of values, or an object holding a `DataReference`, in
/// which case the referenced payload is fetched and decoded.
pub struct RequestDeserializer<'a> {
    ctx: &'a HandlerContext,
}

impl<'a> RequestDeserializer<'a> {
    pub fn new(ctx: &'a HandlerContext) -> Self {
        Self { ctx }
    }

    pub async fn deserialize(&self, bytes: &[u8]) -> Result<Request, RequestError> {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| RequestError::Malformed(e.to_string()))?;
        self.deserialize_value(value).await
    }

    pub async fn deserialize_value(&self, value: serde_json::Value) -> Result<Request, RequestError> {
        let root = match value {
            serde_json::Value::Object(root) if root.len() == 1 => root,
            serde_json::Value::Object(root) => {
                return Err(RequestError::Malformed(format!(
                    "expected a single root member, found {}",
                    root.len()
                )))
            }
            _ => return Err(RequestError::Malformed("expected a JSON object".to_string())),
        };
        let (key, body) = root
            .into_iter()
            .next()
            .ok_or_else(|| RequestError::Malformed("empty request".to_string()))?;

        let process_identifier = key
            .strip_suffix(REQUEST_SUFFIX)
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| RequestError::Malformed(format!("root member '{}' is not a process request", key)))?;
        let process = self
            .ctx
            .catalog
            .get_process(process_identifier)
            .ok_or_else(|| RequestError::UnknownProcess(process_identifier.to_string()))?;

        let body = match body {
            serde_json::Value::Object(body) => body,
            _ => return Err(RequestError::Malformed(format!("body of {} is not an object", key))),
        };

        let mut request = Request::new(process_identifier);
        for (identifier, description) in process.inputs() {
            let Some(value) = body.get(identifier) else {
                continue;
            };
            let data = self.parse_input(value, description).await.map_err(|source| {
                log::error!("couldn't parse input {} of {}: {}", identifier, process_identifier, source);
                RequestError::Input {
                    input: identifier.clone(),
                    source,
                }
            })?;
            if data.values().is_empty() {
                log::debug!("no values given for {} of {}", identifier, process_identifier);
                continue;
            }
            request.add_input(Input {
                identifier: identifier.clone(),
                data,
            });
        }

        for key in body.keys() {
            if key != REQUESTED_OUTPUTS && process.input_description(key).is_none() {
                log::debug!("ignoring '{}', not an input of {}", key, process_identifier);
            }
        }

        request.requested_outputs = match body.get(REQUESTED_OUTPUTS) {
            Some(value) => Some(parse_requested_outputs(value, &process)?),
            None => None,
        };
        Ok(request)
    }

    async fn parse_input(&self, value: &serde_json::Value, description: &DataDescription) -> Result<Data, ParseError> {
        let array_shaped = self
            .ctx
            .encodings
            .declaration(&description.data_type)
            .map(|d| d.is_array_shaped())
            .unwrap_or(false);

        let values = match value.as_array() {
            Some(elements) if !array_shaped => {
                if description.is_multiple() {
                    match self.parse_each(elements, description).await {
                        Ok(values) => values,
                        Err(e) => {
                            log::debug!("elements are not {} values ({}), parsing the array as one value", description.data_type, e);
                            vec![self.parse_instance(value, description).await?]
                        }
                    }
                } else {
                    match self.parse_instance(value, description).await {
                        Ok(v) => vec![v],
                        Err(_) if elements.len() == 1 => vec![self.parse_instance(&elements[0], description).await?],
                        Err(e) => return Err(e),
                    }
                }
            }
            _ => vec![self.parse_instance(value, description).await?],
        };

        Data::from_values(description, values)
    }

    async fn parse_each(&self, elements: &[serde_json::Value], description: &DataDescription) -> Result<Vec<DataValue>, ParseError> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(self.parse_instance(element, description).await?);
        }
        Ok(values)
    }

    async fn parse_instance(&self, value: &serde_json::Value, description: &DataDescription) -> Result<DataValue, ParseError> {
        let data_type = &description.data_type;
        if let Some(reference) = value.as_object().and_then(|o| o.get(DATA_REFERENCE)) {
            let reference = parse_reference(reference)?;
            return self.ctx.materializer().resolve(&reference, data_type).await;
        }

        let encodings = &self.ctx.encodings;
        match (encodings.json_codec(data_type), encodings.declaration(data_type)) {
            (Some(codec), Some(declaration)) => codec.decode(value, declaration),
            _ => encodings.structural_decode(value, data_type),
        }
    }
}

fn parse_reference(value: &serde_json::Value) -> Result<DataReference, ParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::Malformed("DataReference must be an object".to_string()))?;
    let href = object
        .get("href")
        .and_then(|h| h.as_str())
        .ok_or_else(|| ParseError::Malformed("DataReference without href".to_string()))?;
    let mime_type = match object.get("mimeType") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(mime_type)) => Some(mime_type.clone()),
        Some(_) => return Err(ParseError::Malformed("DataReference mimeType must be a string".to_string())),
    };
    let compressed = match object.get("compressed") {
        None => false,
        Some(serde_json::Value::Bool(compressed)) => *compressed,
        Some(_) => return Err(ParseError::Malformed("DataReference compressed must be a boolean".to_string())),
    };
    DataReference::new(href, mime_type, compressed)
}

fn parse_requested_outputs(value: &serde_json::Value, process: &ProcessDefinition) -> Result<Vec<RequestedOutput>, RequestError> {
    let entries = value
        .as_object()
        .ok_or_else(|| RequestError::Malformed(format!("{} must be an object", REQUESTED_OUTPUTS)))?;

    entries
        .iter()
        .map(|(name, options)| {
            if process.output_description(name).is_none() {
                return Err(RequestError::UnknownRequestedOutput(name.clone()));
            }
            let options = options
                .as_object()
                .ok_or_else(|| RequestError::Malformed(format!("options of requested output {} must be an object", name)))?;
            let as_reference = match options.get("asReference") {
                None => false,
                Some(serde_json::Value::Bool(as_reference)) => *as_reference,
                Some(_) => return Err(RequestError::Malformed(format!("asReference of {} must be a boolean", name))),
            };
            Ok(RequestedOutput::new(name, as_reference))
        })
        .collect()
}
