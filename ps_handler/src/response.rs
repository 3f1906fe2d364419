// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::{DataReference, DataType, DataValue};
use ps_api::error::{EncodeError, ResponseGenerateError};
use ps_api::process::ProcessDefinition;
use ps_api::request::RequestedOutput;
use ps_api::response::Response;
use ps_encoding::{CodecFamily, EncodingRegistry};

use crate::materializer::GenerateReferenceError;
use crate::HandlerContext;

pub const RESPONSE_SUFFIX: &str = "Response";

/// Wire-format specific part of response generation.
pub trait ResponseWriter: Send {
    /// Embedded representation of one output value.
    type Fragment: Send;
    type Document;

    /// Family of the codecs used for inline values.
    fn family(&self) -> CodecFamily;

    fn encode_inline(&mut self, encodings: &EncodingRegistry, data_type: &DataType, value: &DataValue) -> Result<Self::Fragment, EncodeError>;

    fn encode_reference(&mut self, reference: &DataReference) -> Self::Fragment;

    /// Add the values of one output to the response, in order.
    fn attach(&mut self, output: &str, multiple: bool, fragments: Vec<Self::Fragment>);

    fn finish(self) -> Result<Self::Document, ResponseGenerateError>;
}

/// Generate the response document of `response` with `writer`.
///
/// Outputs are written in the order declared by `process`. Without
/// `requested_outputs` every output is included and inlined when possible;
/// otherwise only the requested outputs are included, as references if so
/// requested. Values of types without an inline codec of the writer's family
/// are always returned as references.
pub async fn generate_with<W: ResponseWriter>(
    mut writer: W,
    ctx: &HandlerContext,
    response: &Response,
    process: &ProcessDefinition,
    requested_outputs: Option<&[RequestedOutput]>,
) -> Result<W::Document, ResponseGenerateError> {
    if response.process_identifier != process.identifier() {
        return Err(ResponseGenerateError::ProcessMismatch {
            response: response.process_identifier.clone(),
            process: process.identifier().to_string(),
        });
    }
    if let Some(undeclared) = response.outputs.identifiers().find(|id| process.output_description(id).is_none()) {
        return Err(ResponseGenerateError::UndeclaredOutput(undeclared.to_string()));
    }

    let materializer = ctx.materializer();
    for (identifier, description) in process.outputs() {
        let as_reference = match requested_outputs {
            None => false,
            Some(requested) => match requested.iter().find(|r| r.name == *identifier) {
                Some(r) => r.as_reference,
                None => continue,
            },
        };

        let output = response
            .outputs
            .get(identifier)
            .ok_or_else(|| ResponseGenerateError::MissingOutput(identifier.clone()))?;
        if !output.data.conforms_to(description) {
            return Err(ResponseGenerateError::Cardinality {
                output: identifier.clone(),
                max_occurs: description.max_occurs,
            });
        }

        let data_type = &description.data_type;
        let inline = ctx.encodings.supports(writer.family(), data_type);
        if !inline && !ctx.encodings.supports(CodecFamily::Binary, data_type) {
            log::error!("no encoding found for type {} of {}", data_type, identifier);
            return Err(ResponseGenerateError::NoEncoding {
                output: identifier.clone(),
                data_type: data_type.clone(),
            });
        }

        let mut fragments = Vec::with_capacity(output.data.values().len());
        for value in output.data.values() {
            ctx.encodings.check_value(data_type, value).map_err(|source| {
                log::error!("couldn't encode data for {}: {}", identifier, source);
                ResponseGenerateError::Encode {
                    output: identifier.clone(),
                    source,
                }
            })?;
            let fragment = if as_reference || !inline || matches!(value, DataValue::Reference(_)) {
                let reference = materializer
                    .generate(value, data_type, writer.family())
                    .await
                    .map_err(|e| {
                        log::error!("couldn't generate reference for {}: {}", identifier, e);
                        match e {
                            GenerateReferenceError::Encode(source) => ResponseGenerateError::Encode {
                                output: identifier.clone(),
                                source,
                            },
                            GenerateReferenceError::Storage(source) => ResponseGenerateError::Storage {
                                output: identifier.clone(),
                                source,
                            },
                        }
                    })?;
                writer.encode_reference(&reference)
            } else {
                writer.encode_inline(&ctx.encodings, data_type, value).map_err(|source| {
                    log::error!("couldn't encode data for {}: {}", identifier, source);
                    ResponseGenerateError::Encode {
                        output: identifier.clone(),
                        source,
                    }
                })?
            };
            fragments.push(fragment);
        }
        writer.attach(identifier, output.data.is_multiple(), fragments);
    }

    writer.finish()
}
