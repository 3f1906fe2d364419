// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::{DataReference, DataType, DataValue};
use ps_api::error::{EncodeError, ResponseGenerateError};
use ps_api::process::ProcessDefinition;
use ps_api::request::RequestedOutput;
use ps_api::response::Response;
use ps_api::xml::{XmlElement, XmlNode};
use ps_api::{PS_NAMESPACE, SOAP_NAMESPACE, XSI_NAMESPACE};
use ps_encoding::{CodecFamily, EncodingRegistry};

use crate::response::{generate_with, ResponseWriter, RESPONSE_SUFFIX};
use crate::HandlerContext;

/// Builds `<ProcessResponse>` elements in the PS namespace, with one child
/// element per output value.
pub struct XmlResponseWriter {
    root: XmlElement,
    schema_locations: std::collections::BTreeMap<String, String>,
}

impl XmlResponseWriter {
    pub fn new(process_identifier: &str) -> Self {
        Self {
            root: XmlElement::new(&format!("{}{}", process_identifier, RESPONSE_SUFFIX), Some(PS_NAMESPACE)),
            schema_locations: std::collections::BTreeMap::new(),
        }
    }
}

impl ResponseWriter for XmlResponseWriter {
    type Fragment = XmlNode;
    type Document = XmlElement;

    fn family(&self) -> CodecFamily {
        CodecFamily::Xml
    }

    fn encode_inline(&mut self, encodings: &EncodingRegistry, data_type: &DataType, value: &DataValue) -> Result<XmlNode, EncodeError> {
        let codec = encodings
            .xml_codec(data_type)
            .ok_or_else(|| EncodeError::NoEncoding(data_type.clone()))?;
        let node = codec.encode(value)?;
        if let (Some(namespace), Some(location)) = (codec.namespace(), codec.schema_location()) {
            self.schema_locations.insert(namespace.to_string(), location.to_string());
        }
        Ok(node)
    }

    fn encode_reference(&mut self, reference: &DataReference) -> XmlNode {
        let mut element = XmlElement::new("DataReference", Some(PS_NAMESPACE)).with_attribute("href", reference.href());
        if let Some(mime_type) = reference.mime_type() {
            element.set_attribute("mimeType", mime_type);
        }
        XmlNode::Element(element)
    }

    fn attach(&mut self, output: &str, _multiple: bool, fragments: Vec<XmlNode>) {
        for fragment in fragments {
            let mut element = XmlElement::new(output, Some(PS_NAMESPACE));
            element.add_child(fragment);
            self.root.add_child(XmlNode::Element(element));
        }
    }

    fn finish(mut self) -> Result<XmlElement, ResponseGenerateError> {
        if !self.schema_locations.is_empty() {
            let locations: Vec<String> = self
                .schema_locations
                .iter()
                .map(|(namespace, location)| format!("{} {}", namespace, location))
                .collect();
            self.root.set_attribute("xmlns:xsi", XSI_NAMESPACE);
            self.root.set_attribute("xsi:schemaLocation", &locations.join(" "));
        }
        Ok(self.root)
    }
}

pub struct XmlResponseGenerator<'a> {
    ctx: &'a HandlerContext,
}

impl<'a> XmlResponseGenerator<'a> {
    pub fn new(ctx: &'a HandlerContext) -> Self {
        Self { ctx }
    }

    pub async fn generate(
        &self,
        response: &Response,
        process: &ProcessDefinition,
        requested_outputs: Option<&[RequestedOutput]>,
    ) -> Result<XmlElement, ResponseGenerateError> {
        let writer = XmlResponseWriter::new(&response.process_identifier);
        generate_with(writer, self.ctx, response, process, requested_outputs).await
    }

    pub fn to_bytes(element: &XmlElement) -> Result<Vec<u8>, ResponseGenerateError> {
        element.to_document().map_err(|e| ResponseGenerateError::Write(e.to_string()))
    }
}

/// Wrap a response element in a SOAP 1.2 envelope.
pub fn wrap_soap_envelope(body: XmlElement) -> XmlElement {
    let mut soap_body = XmlElement::new("Body", Some(SOAP_NAMESPACE));
    soap_body.add_child(XmlNode::Element(body));
    let mut envelope = XmlElement::new("Envelope", Some(SOAP_NAMESPACE));
    envelope.add_child(XmlNode::Element(soap_body));
    envelope
}
