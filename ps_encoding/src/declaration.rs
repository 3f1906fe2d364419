// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::{DataType, DataValue};

/// Encoding capability marker. A codec is eligible for every concrete type
/// that declares one of the markers the codec handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Capability {
    Primitive,
    Structured,
    Uncertainty,
    Binary,
}

/// JSON shape of the values of a type, used by the structural decoder and to
/// tell array-valued types apart from lists of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ValueShape {
    Boolean,
    Integer,
    Double,
    Text,
    Array,
    Object,
    Uncertainty,
    Binary,
}

impl ValueShape {
    /// True if `value` is an in-memory value of this shape. References
    /// match any shape.
    pub fn accepts(&self, value: &DataValue) -> bool {
        match (self, value) {
            (_, DataValue::Reference(_)) => true,
            (ValueShape::Boolean, DataValue::Boolean(_))
            | (ValueShape::Integer, DataValue::Integer(_))
            | (ValueShape::Double, DataValue::Double(_) | DataValue::Integer(_))
            | (ValueShape::Text, DataValue::Text(_))
            | (ValueShape::Uncertainty, DataValue::Uncertainty(_))
            | (ValueShape::Binary, DataValue::Binary(_)) => true,
            (ValueShape::Array, DataValue::Structured(v)) => v.is_array(),
            (ValueShape::Object, DataValue::Structured(v)) => v.is_object(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeDeclaration {
    #[serde(rename = "name")]
    pub data_type: DataType,
    pub shape: ValueShape,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl TypeDeclaration {
    pub fn concrete(data_type: DataType, shape: ValueShape, capabilities: &[Capability]) -> Self {
        Self {
            data_type,
            shape,
            is_abstract: false,
            capabilities: capabilities.to_vec(),
        }
    }

    /// Abstract types can be named by process definitions but no codec is
    /// ever eligible for them.
    pub fn abstract_type(data_type: DataType, shape: ValueShape) -> Self {
        Self {
            data_type,
            shape,
            is_abstract: true,
            capabilities: vec![],
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_array_shaped(&self) -> bool {
        self.shape == ValueShape::Array
    }
}
