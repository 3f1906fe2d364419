// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use ps_api::data::{DataType, DataValue};
use ps_api::error::{EncodeError, ParseError};

use crate::binary::RawBinaryCodec;
use crate::codec::{AnyCodec, BinaryCodec, Codec, CodecFamily, JsonCodec, XmlCodec};
use crate::declaration::{Capability, TypeDeclaration, ValueShape};
use crate::json::StructuralJsonCodec;
use crate::primitive::PrimitiveXmlCodec;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("type {0} is already declared")]
    DuplicateType(DataType),
    #[error("both '{first}' and '{second}' are {family} codecs for type {data_type}")]
    AmbiguousCodec {
        family: CodecFamily,
        data_type: DataType,
        first: String,
        second: String,
    },
}

/// Per-family lookup from value type to the single eligible codec.
///
/// Resolution is precomputed: every registration and declaration checks that
/// at most one codec per family supports each declared type, so lookups never
/// have to break ties.
#[derive(Default)]
pub struct EncodingRegistry {
    types: std::collections::HashMap<DataType, TypeDeclaration>,
    xml_codecs: Vec<Arc<dyn XmlCodec>>,
    json_codecs: Vec<Arc<dyn JsonCodec>>,
    binary_codecs: Vec<Arc<dyn BinaryCodec>>,
    xml_by_type: std::collections::HashMap<DataType, Arc<dyn XmlCodec>>,
    json_by_type: std::collections::HashMap<DataType, Arc<dyn JsonCodec>>,
    binary_by_type: std::collections::HashMap<DataType, Arc<dyn BinaryCodec>>,
}

pub fn builtin_declarations() -> Vec<TypeDeclaration> {
    vec![
        TypeDeclaration::concrete(DataType::BOOLEAN, ValueShape::Boolean, &[Capability::Primitive]),
        TypeDeclaration::concrete(DataType::INTEGER, ValueShape::Integer, &[Capability::Primitive]),
        TypeDeclaration::concrete(DataType::DOUBLE, ValueShape::Double, &[Capability::Primitive]),
        TypeDeclaration::concrete(DataType::STRING, ValueShape::Text, &[Capability::Primitive]),
    ]
}

impl EncodingRegistry {
    /// Empty registry without types nor codecs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the XML Schema scalar types, the UncertML types, and the
    /// built-in codecs.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for declaration in builtin_declarations() {
            registry.declare_type(declaration)?;
        }
        registry.register(AnyCodec::Xml(Arc::new(PrimitiveXmlCodec)))?;
        registry.register(AnyCodec::Json(Arc::new(StructuralJsonCodec)))?;
        registry.register(AnyCodec::Binary(Arc::new(RawBinaryCodec)))?;
        crate::uncertainty::register(&mut registry)?;
        Ok(registry)
    }

    /// Declare a new value type and bind it to the eligible codecs that are
    /// already registered. Nothing changes if the declaration fails.
    pub fn declare_type(&mut self, declaration: TypeDeclaration) -> Result<(), RegistryError> {
        if self.types.contains_key(&declaration.data_type) {
            return Err(RegistryError::DuplicateType(declaration.data_type));
        }

        let xml = unique_codec(CodecFamily::Xml, &declaration, &self.xml_codecs)?;
        let json = unique_codec(CodecFamily::Json, &declaration, &self.json_codecs)?;
        let binary = unique_codec(CodecFamily::Binary, &declaration, &self.binary_codecs)?;

        let data_type = declaration.data_type.clone();
        if let Some(codec) = xml {
            self.xml_by_type.insert(data_type.clone(), codec);
        }
        if let Some(codec) = json {
            self.json_by_type.insert(data_type.clone(), codec);
        }
        if let Some(codec) = binary {
            self.binary_by_type.insert(data_type.clone(), codec);
        }
        log::debug!("declared type {}", data_type);
        self.types.insert(data_type, declaration);
        Ok(())
    }

    /// Register a codec, binding it to every declared type it supports.
    /// Nothing changes if the codec conflicts with a registered one.
    pub fn register(&mut self, codec: AnyCodec) -> Result<(), RegistryError> {
        log::debug!("registering {:?}", codec);
        match codec {
            AnyCodec::Xml(codec) => {
                bind(CodecFamily::Xml, &self.types, &mut self.xml_by_type, codec.clone())?;
                self.xml_codecs.push(codec);
            }
            AnyCodec::Json(codec) => {
                bind(CodecFamily::Json, &self.types, &mut self.json_by_type, codec.clone())?;
                self.json_codecs.push(codec);
            }
            AnyCodec::Binary(codec) => {
                bind(CodecFamily::Binary, &self.types, &mut self.binary_by_type, codec.clone())?;
                self.binary_codecs.push(codec);
            }
        }
        Ok(())
    }

    pub fn register_xml(&mut self, codec: Arc<dyn XmlCodec>) -> Result<(), RegistryError> {
        self.register(AnyCodec::Xml(codec))
    }

    pub fn register_json(&mut self, codec: Arc<dyn JsonCodec>) -> Result<(), RegistryError> {
        self.register(AnyCodec::Json(codec))
    }

    pub fn register_binary(&mut self, codec: Arc<dyn BinaryCodec>) -> Result<(), RegistryError> {
        self.register(AnyCodec::Binary(codec))
    }

    pub fn declaration(&self, data_type: &DataType) -> Option<&TypeDeclaration> {
        self.types.get(data_type)
    }

    pub fn xml_codec(&self, data_type: &DataType) -> Option<&dyn XmlCodec> {
        self.xml_by_type.get(data_type).map(|c| c.as_ref())
    }

    pub fn json_codec(&self, data_type: &DataType) -> Option<&dyn JsonCodec> {
        self.json_by_type.get(data_type).map(|c| c.as_ref())
    }

    pub fn binary_codec(&self, data_type: &DataType) -> Option<&dyn BinaryCodec> {
        self.binary_by_type.get(data_type).map(|c| c.as_ref())
    }

    /// The codec of `family` for `data_type`, if any.
    pub fn resolve(&self, family: CodecFamily, data_type: &DataType) -> Option<AnyCodec> {
        match family {
            CodecFamily::Xml => self.xml_by_type.get(data_type).cloned().map(AnyCodec::Xml),
            CodecFamily::Json => self.json_by_type.get(data_type).cloned().map(AnyCodec::Json),
            CodecFamily::Binary => self.binary_by_type.get(data_type).cloned().map(AnyCodec::Binary),
        }
    }

    pub fn supports(&self, family: CodecFamily, data_type: &DataType) -> bool {
        match family {
            CodecFamily::Xml => self.xml_by_type.contains_key(data_type),
            CodecFamily::Json => self.json_by_type.contains_key(data_type),
            CodecFamily::Binary => self.binary_by_type.contains_key(data_type),
        }
    }

    /// Namespaces and schema locations of the XML codecs, sorted by namespace.
    pub fn xml_schema_locations(&self) -> Vec<(String, String)> {
        let mut locations: Vec<(String, String)> = self
            .xml_codecs
            .iter()
            .filter_map(|c| match (c.namespace(), c.schema_location()) {
                (Some(ns), Some(location)) => Some((ns.to_string(), location.to_string())),
                _ => None,
            })
            .collect();
        locations.sort();
        locations.dedup();
        locations
    }

    /// Generic JSON decoding for types without a JSON codec.
    pub fn structural_decode(&self, value: &serde_json::Value, data_type: &DataType) -> Result<DataValue, ParseError> {
        match self.types.get(data_type) {
            Some(declaration) if !declaration.is_abstract => crate::structural::decode(value, declaration.shape, data_type),
            _ => Err(ParseError::Unsupported(data_type.clone())),
        }
    }

    /// Check that `value` can be written as a value of `data_type`.
    pub fn check_value(&self, data_type: &DataType, value: &DataValue) -> Result<(), EncodeError> {
        let declaration = self
            .declaration(data_type)
            .ok_or_else(|| EncodeError::NoEncoding(data_type.clone()))?;
        let same_kind = match value {
            DataValue::Uncertainty(u) if declaration.has_capability(Capability::Uncertainty) => {
                *data_type == crate::uncertainty::data_type(u.kind())
            }
            _ => true,
        };
        if declaration.shape.accepts(value) && same_kind {
            Ok(())
        } else {
            Err(EncodeError::TypeMismatch {
                expected: data_type.clone(),
                found: value.variant_name().to_string(),
            })
        }
    }

    /// Generic JSON encoding of any inline value.
    pub fn structural_encode(&self, value: &DataValue) -> Result<serde_json::Value, EncodeError> {
        crate::structural::encode(value)
    }
}

fn unique_codec<C: ?Sized + Codec>(
    family: CodecFamily,
    declaration: &TypeDeclaration,
    codecs: &[Arc<C>],
) -> Result<Option<Arc<C>>, RegistryError> {
    let mut eligible = codecs.iter().filter(|c| c.supports(declaration));
    let first = eligible.next();
    if let (Some(first), Some(second)) = (first, eligible.next()) {
        return Err(RegistryError::AmbiguousCodec {
            family,
            data_type: declaration.data_type.clone(),
            first: first.name().to_string(),
            second: second.name().to_string(),
        });
    }
    Ok(first.cloned())
}

fn bind<C: ?Sized + Codec>(
    family: CodecFamily,
    types: &std::collections::HashMap<DataType, TypeDeclaration>,
    by_type: &mut std::collections::HashMap<DataType, Arc<C>>,
    codec: Arc<C>,
) -> Result<(), RegistryError> {
    let supported: Vec<DataType> = types.values().filter(|d| codec.supports(d)).map(|d| d.data_type.clone()).collect();
    for data_type in &supported {
        if let Some(existing) = by_type.get(data_type) {
            return Err(RegistryError::AmbiguousCodec {
                family,
                data_type: data_type.clone(),
                first: existing.name().to_string(),
                second: codec.name().to_string(),
            });
        }
    }
    for data_type in supported {
        by_type.insert(data_type, codec.clone());
    }
    Ok(())
}
