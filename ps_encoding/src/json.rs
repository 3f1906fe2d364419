// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::DataValue;
use ps_api::error::{EncodeError, ParseError};

use crate::codec::{Codec, JsonCodec};
use crate::declaration::{Capability, TypeDeclaration};

/// JSON codec of scalar and structured values, following the shape of the
/// declared type.
pub struct StructuralJsonCodec;

impl Codec for StructuralJsonCodec {
    fn name(&self) -> &str {
        "structural JSON"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Primitive, Capability::Structured]
    }
}

impl JsonCodec for StructuralJsonCodec {
    fn decode(&self, value: &serde_json::Value, declaration: &TypeDeclaration) -> Result<DataValue, ParseError> {
        crate::structural::decode(value, declaration.shape, &declaration.data_type)
    }

    fn encode(&self, value: &DataValue) -> Result<serde_json::Value, EncodeError> {
        match value {
            DataValue::Uncertainty(_) | DataValue::Binary(_) => Err(crate::codec::unsupported(self.name(), value)),
            _ => crate::structural::encode(value),
        }
    }
}
