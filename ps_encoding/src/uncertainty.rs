// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! UncertML 2.0 types and their XML and JSON codecs.

use std::sync::Arc;

use ps_api::data::{DataType, DataValue};
use ps_api::error::{EncodeError, ParseError};
use ps_api::xml::{XmlElement, XmlNode};

use crate::codec::{unsupported, AnyCodec, Codec, JsonCodec, XmlCodec};
use crate::declaration::{Capability, TypeDeclaration, ValueShape};
use crate::registry::{EncodingRegistry, RegistryError};

pub const DISTRIBUTION: DataType = DataType::from_static("un:Distribution");
pub const STATISTIC: DataType = DataType::from_static("un:Statistic");

/// Type name of an UncertML kind, e.g., `un:NormalDistribution`.
pub fn data_type(kind: &str) -> DataType {
    DataType::new(format!("un:{}", kind))
}

pub fn declarations() -> Vec<TypeDeclaration> {
    let mut declarations = vec![
        TypeDeclaration::abstract_type(DISTRIBUTION, ValueShape::Uncertainty),
        TypeDeclaration::abstract_type(STATISTIC, ValueShape::Uncertainty),
    ];
    declarations.extend(
        ::uncertml::KINDS
            .iter()
            .map(|kind| TypeDeclaration::concrete(data_type(kind), ValueShape::Uncertainty, &[Capability::Uncertainty])),
    );
    declarations
}

/// Declare the UncertML types and register their codecs.
pub fn register(registry: &mut EncodingRegistry) -> Result<(), RegistryError> {
    for declaration in declarations() {
        registry.declare_type(declaration)?;
    }
    registry.register(AnyCodec::Xml(Arc::new(UncertMLXmlCodec)))?;
    registry.register(AnyCodec::Json(Arc::new(UncertMLJsonCodec)))
}

fn check_kind(value: ::uncertml::Uncertainty, declaration: &TypeDeclaration) -> Result<DataValue, ParseError> {
    let found = data_type(value.kind());
    if found != declaration.data_type {
        return Err(ParseError::TypeMismatch {
            expected: declaration.data_type.to_string(),
            found: found.to_string(),
        });
    }
    Ok(DataValue::Uncertainty(value))
}

pub struct UncertMLXmlCodec;

impl Codec for UncertMLXmlCodec {
    fn name(&self) -> &str {
        "UncertML XML"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Uncertainty]
    }
}

impl XmlCodec for UncertMLXmlCodec {
    fn namespace(&self) -> Option<&str> {
        Some(::uncertml::NAMESPACE)
    }

    fn schema_location(&self) -> Option<&str> {
        Some(::uncertml::SCHEMA_LOCATION)
    }

    fn decode(&self, content: &[XmlNode], declaration: &TypeDeclaration) -> Result<DataValue, ParseError> {
        let mut elements = content.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        });
        let element = elements
            .next()
            .ok_or_else(|| ParseError::Malformed(format!("no UncertML element for {}", declaration.data_type)))?;
        if elements.next().is_some() {
            return Err(ParseError::Malformed("more than one UncertML element".to_string()));
        }

        let xml = element.to_xml_string().map_err(|e| ParseError::Malformed(e.to_string()))?;
        check_kind(::uncertml::xml::parse(&xml)?, declaration)
    }

    fn encode(&self, value: &DataValue) -> Result<XmlNode, EncodeError> {
        match value {
            DataValue::Uncertainty(u) => {
                let xml = ::uncertml::xml::encode(u)?;
                let element = XmlElement::parse(&xml).map_err(|e| EncodeError::Xml(e.to_string()))?;
                Ok(XmlNode::Element(element))
            }
            _ => Err(unsupported(self.name(), value)),
        }
    }
}

pub struct UncertMLJsonCodec;

impl Codec for UncertMLJsonCodec {
    fn name(&self) -> &str {
        "UncertML JSON"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Uncertainty]
    }
}

impl JsonCodec for UncertMLJsonCodec {
    fn decode(&self, value: &serde_json::Value, declaration: &TypeDeclaration) -> Result<DataValue, ParseError> {
        check_kind(::uncertml::from_json(value.clone())?, declaration)
    }

    fn encode(&self, value: &DataValue) -> Result<serde_json::Value, EncodeError> {
        match value {
            DataValue::Uncertainty(u) => Ok(::uncertml::to_json(u)?),
            _ => Err(unsupported(self.name(), value)),
        }
    }
}
