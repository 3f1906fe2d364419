// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use ps_api::data::DataValue;
use ps_api::error::{EncodeError, ParseError};
use ps_api::xml::XmlNode;

use crate::declaration::{Capability, TypeDeclaration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecFamily {
    Xml,
    Json,
    Binary,
}

impl std::fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecFamily::Xml => write!(f, "XML"),
            CodecFamily::Json => write!(f, "JSON"),
            CodecFamily::Binary => write!(f, "binary"),
        }
    }
}

/// Part shared by all codec families.
pub trait Codec: Send + Sync {
    fn name(&self) -> &str;

    /// Capability markers handled by this codec.
    fn capabilities(&self) -> &[Capability];

    /// Abstract types are never supported.
    fn supports(&self, declaration: &TypeDeclaration) -> bool {
        !declaration.is_abstract && self.capabilities().iter().any(|c| declaration.has_capability(*c))
    }
}

/// Codec from/to a fragment of an XML document. The fragment is the content
/// of the element carrying the value.
pub trait XmlCodec: Codec {
    /// Namespace of the elements produced, if any.
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Schema location of `namespace`, advertised on XML responses.
    fn schema_location(&self) -> Option<&str> {
        None
    }

    fn decode(&self, content: &[XmlNode], declaration: &TypeDeclaration) -> Result<DataValue, ParseError>;

    fn encode(&self, value: &DataValue) -> Result<XmlNode, EncodeError>;
}

pub trait JsonCodec: Codec {
    fn decode(&self, value: &serde_json::Value, declaration: &TypeDeclaration) -> Result<DataValue, ParseError>;

    fn encode(&self, value: &DataValue) -> Result<serde_json::Value, EncodeError>;
}

/// Codec from/to an opaque payload. Values of types handled by a binary codec
/// are always stored and returned as references.
pub trait BinaryCodec: Codec {
    fn mime_type(&self, declaration: &TypeDeclaration) -> String;

    fn decode(&self, bytes: &[u8], declaration: &TypeDeclaration) -> Result<DataValue, ParseError>;

    fn encode(&self, value: &DataValue) -> Result<Vec<u8>, EncodeError>;
}

/// A codec of any family, as registered in or resolved from the registry.
#[derive(Clone)]
pub enum AnyCodec {
    Xml(Arc<dyn XmlCodec>),
    Json(Arc<dyn JsonCodec>),
    Binary(Arc<dyn BinaryCodec>),
}

impl AnyCodec {
    pub fn family(&self) -> CodecFamily {
        match self {
            AnyCodec::Xml(_) => CodecFamily::Xml,
            AnyCodec::Json(_) => CodecFamily::Json,
            AnyCodec::Binary(_) => CodecFamily::Binary,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnyCodec::Xml(c) => c.name(),
            AnyCodec::Json(c) => c.name(),
            AnyCodec::Binary(c) => c.name(),
        }
    }
}

impl std::fmt::Debug for AnyCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} codec '{}'", self.family(), self.name())
    }
}

/// Error for a value variant a codec does not handle.
pub(crate) fn unsupported(codec: &str, value: &DataValue) -> EncodeError {
    EncodeError::Unsupported {
        codec: codec.to_string(),
        found: value.variant_name().to_string(),
    }
}
