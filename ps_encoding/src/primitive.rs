// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::DataValue;
use ps_api::error::{EncodeError, ParseError};
use ps_api::xml::XmlNode;

use crate::codec::{unsupported, Codec, XmlCodec};
use crate::declaration::{Capability, TypeDeclaration, ValueShape};

/// XML codec of scalar values, written as the text content of the element.
pub struct PrimitiveXmlCodec;

impl Codec for PrimitiveXmlCodec {
    fn name(&self) -> &str {
        "primitive XML"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Primitive]
    }
}

impl XmlCodec for PrimitiveXmlCodec {
    fn decode(&self, content: &[XmlNode], declaration: &TypeDeclaration) -> Result<DataValue, ParseError> {
        let mut text = String::new();
        for node in content {
            match node {
                XmlNode::Text(t) => text.push_str(t),
                XmlNode::Element(e) => {
                    return Err(ParseError::TypeMismatch {
                        expected: declaration.data_type.to_string(),
                        found: format!("element {}", e.name),
                    })
                }
            }
        }
        if declaration.shape == ValueShape::Text {
            return Ok(DataValue::Text(text));
        }

        let text = text.trim();
        let invalid = || ParseError::TypeMismatch {
            expected: declaration.data_type.to_string(),
            found: format!("'{}'", text),
        };

        match declaration.shape {
            ValueShape::Boolean => match text {
                "true" | "1" => Ok(DataValue::Boolean(true)),
                "false" | "0" => Ok(DataValue::Boolean(false)),
                _ => Err(invalid()),
            },
            ValueShape::Integer => text.parse::<i64>().map(DataValue::Integer).map_err(|_| invalid()),
            ValueShape::Double => text.parse::<f64>().map(DataValue::Double).map_err(|_| invalid()),
            _ => Err(ParseError::Unsupported(declaration.data_type.clone())),
        }
    }

    fn encode(&self, value: &DataValue) -> Result<XmlNode, EncodeError> {
        match value {
            DataValue::Boolean(b) => Ok(XmlNode::Text(b.to_string())),
            DataValue::Integer(i) => Ok(XmlNode::Text(i.to_string())),
            DataValue::Double(d) => Ok(XmlNode::Text(d.to_string())),
            DataValue::Text(s) => Ok(XmlNode::Text(s.clone())),
            _ => Err(unsupported(self.name(), value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_api::data::DataType;

    fn text(t: &str) -> Vec<XmlNode> {
        vec![XmlNode::Text(t.to_string())]
    }

    #[test]
    fn test_decode() {
        let codec = PrimitiveXmlCodec;
        let double = TypeDeclaration::concrete(DataType::DOUBLE, ValueShape::Double, &[Capability::Primitive]);
        let boolean = TypeDeclaration::concrete(DataType::BOOLEAN, ValueShape::Boolean, &[Capability::Primitive]);
        let string = TypeDeclaration::concrete(DataType::STRING, ValueShape::Text, &[Capability::Primitive]);

        assert_eq!(DataValue::Double(101.05), codec.decode(&text(" 101.05 "), &double).unwrap());
        assert_eq!(DataValue::Boolean(false), codec.decode(&text("0"), &boolean).unwrap());
        assert_eq!(DataValue::Text("abc".to_string()), codec.decode(&text("abc"), &string).unwrap());
        assert_eq!(DataValue::Text(String::new()), codec.decode(&[], &string).unwrap());
        assert_eq!(DataValue::Text(" padded ".to_string()), codec.decode(&text(" padded "), &string).unwrap());
        assert_eq!(DataValue::Text("a\n".to_string()), codec.decode(&text("a\n"), &string).unwrap());

        assert!(matches!(codec.decode(&text("abc"), &double), Err(ParseError::TypeMismatch { .. })));
        assert!(codec.decode(&text("yes"), &boolean).is_err());
        let nested = vec![XmlNode::Element(ps_api::xml::XmlElement::new("x", None))];
        assert!(codec.decode(&nested, &double).is_err());
    }

    #[test]
    fn test_encode() {
        let codec = PrimitiveXmlCodec;
        assert_eq!(XmlNode::Text("101.05".to_string()), codec.encode(&DataValue::Double(101.05)).unwrap());
        assert_eq!(XmlNode::Text("3".to_string()), codec.encode(&DataValue::Double(3.0)).unwrap());
        assert_eq!(XmlNode::Text("true".to_string()), codec.encode(&DataValue::Boolean(true)).unwrap());
        assert!(codec.encode(&DataValue::Binary(vec![1])).is_err());
    }
}
