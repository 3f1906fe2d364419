// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use std::borrow::Cow;

use crate::error::ParseError;

/// Name of a value type, e.g., `xs:double` or `un:NormalDistribution`.
///
/// Process definitions refer to value types only by name: which codecs
/// handle a type is decided by the encoding registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DataType(Cow<'static, str>);

impl DataType {
    pub const BOOLEAN: DataType = DataType::from_static("xs:boolean");
    pub const INTEGER: DataType = DataType::from_static("xs:integer");
    pub const DOUBLE: DataType = DataType::from_static("xs:double");
    pub const STRING: DataType = DataType::from_static("xs:string");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_occurs() -> u32 {
    1
}

/// Static metadata of a process input or output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DataDescription {
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "default_occurs")]
    pub min_occurs: u32,
    /// Upper cardinality bound: values greater than 1 make the input or
    /// output multi-valued.
    #[serde(default = "default_occurs")]
    pub max_occurs: u32,
}

impl DataDescription {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            min_occurs: 1,
            max_occurs: 1,
        }
    }

    pub fn with_occurs(mut self, min_occurs: u32, max_occurs: u32) -> Self {
        self.min_occurs = min_occurs;
        self.max_occurs = max_occurs;
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.max_occurs > 1
    }
}

/// Locator of a payload stored outside of the request/response document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataReference {
    href: String,
    mime_type: Option<String>,
    compressed: bool,
}

impl DataReference {
    /// Create a reference, failing if `href` is not an absolute URL.
    pub fn new(href: impl Into<String>, mime_type: Option<String>, compressed: bool) -> Result<Self, ParseError> {
        static ABSOLUTE_URL: std::sync::OnceLock<Result<regex::Regex, regex::Error>> = std::sync::OnceLock::new();
        let re = ABSOLUTE_URL
            .get_or_init(|| regex::Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$"))
            .as_ref()
            .map_err(|e| ParseError::Malformed(e.to_string()))?;

        let href = href.into();
        if !re.is_match(&href) {
            return Err(ParseError::InvalidReference(href));
        }
        Ok(Self {
            href,
            mime_type,
            compressed,
        })
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn scheme(&self) -> &str {
        self.href.split("://").next().unwrap_or_default()
    }
}

impl std::fmt::Display for DataReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.href, self.mime_type.as_deref().unwrap_or("unknown media type"))?;
        if self.compressed {
            write!(f, " [compressed]")?;
        }
        Ok(())
    }
}

/// An in-memory value of a process input or output.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    /// Any JSON-shaped value without a dedicated representation.
    Structured(serde_json::Value),
    Uncertainty(uncertml::Uncertainty),
    Binary(Vec<u8>),
    /// A value that already lives in external storage.
    Reference(DataReference),
}

impl DataValue {
    pub fn variant_name(&self) -> &'static str {
        match self {
            DataValue::Boolean(_) => "boolean",
            DataValue::Integer(_) => "integer",
            DataValue::Double(_) => "double",
            DataValue::Text(_) => "text",
            DataValue::Structured(_) => "structured",
            DataValue::Uncertainty(_) => "uncertainty",
            DataValue::Binary(_) => "binary",
            DataValue::Reference(_) => "reference",
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Double(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<uncertml::Uncertainty> for DataValue {
    fn from(value: uncertml::Uncertainty) -> Self {
        DataValue::Uncertainty(value)
    }
}

impl From<DataReference> for DataValue {
    fn from(value: DataReference) -> Self {
        DataValue::Reference(value)
    }
}

/// The values bound to one input or output.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Single(DataValue),
    Multiple(Vec<DataValue>),
}

impl Data {
    /// Wrap the parsed values in the variant required by `description`.
    pub fn from_values(description: &DataDescription, mut values: Vec<DataValue>) -> Result<Self, ParseError> {
        if description.is_multiple() {
            if values.len() > description.max_occurs as usize {
                return Err(ParseError::Cardinality {
                    max_occurs: description.max_occurs,
                    found: values.len(),
                });
            }
            Ok(Data::Multiple(values))
        } else if values.len() == 1 {
            Ok(Data::Single(values.remove(0)))
        } else {
            Err(ParseError::Cardinality {
                max_occurs: description.max_occurs,
                found: values.len(),
            })
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Data::Multiple(_))
    }

    pub fn values(&self) -> &[DataValue] {
        match self {
            Data::Single(value) => std::slice::from_ref(value),
            Data::Multiple(values) => values,
        }
    }

    pub fn into_values(self) -> Vec<DataValue> {
        match self {
            Data::Single(value) => vec![value],
            Data::Multiple(values) => values,
        }
    }

    /// True if the variant and the number of values agree with `description`.
    pub fn conforms_to(&self, description: &DataDescription) -> bool {
        self.is_multiple() == description.is_multiple() && self.values().len() <= description.max_occurs.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type() {
        assert_eq!(DataType::DOUBLE, DataType::new("xs:double"));
        assert_ne!(DataType::DOUBLE, DataType::INTEGER);
        assert_eq!("un:Mean", DataType::new("un:Mean").to_string());

        let set = std::collections::HashSet::from([DataType::STRING, DataType::new(String::from("xs:string"))]);
        assert_eq!(1, set.len());
    }

    #[test]
    fn test_data_description_from_toml() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            description: DataDescription,
        }

        let w: Wrapper = toml::from_str(
            r#"description = { type = "un:NormalDistribution", max_occurs = 10 }
"#,
        )
        .unwrap();
        assert_eq!(DataType::new("un:NormalDistribution"), w.description.data_type);
        assert_eq!(1, w.description.min_occurs);
        assert_eq!(10, w.description.max_occurs);
        assert!(w.description.is_multiple());
        assert!(!DataDescription::new(DataType::DOUBLE).is_multiple());
    }

    #[test]
    fn test_data_reference() {
        let reference = DataReference::new("http://localhost/data/1.xml", Some("text/xml".to_string()), false).unwrap();
        assert_eq!("http", reference.scheme());
        assert_eq!(Some("text/xml"), reference.mime_type());
        assert!(!reference.is_compressed());
        assert_eq!(
            reference,
            DataReference::new("http://localhost/data/1.xml", Some("text/xml".to_string()), false).unwrap()
        );
        assert_ne!(reference, DataReference::new("http://localhost/data/1.xml", None, false).unwrap());

        assert!(matches!(DataReference::new("not a url", None, false), Err(ParseError::InvalidReference(_))));
        assert!(DataReference::new("data/1.xml", None, false).is_err());
        assert!(DataReference::new("file:///tmp/x.bin", None, true).unwrap().is_compressed());
    }

    #[test]
    fn test_data_reference_concurrent() {
        std::thread::scope(|s| {
            for i in 0..4 {
                s.spawn(move || {
                    for j in 0..100 {
                        assert!(DataReference::new(format!("http://host/{}/{}", i, j), None, false).is_ok());
                        assert!(DataReference::new(format!("host/{}/{}", i, j), None, false).is_err());
                    }
                });
            }
        });
    }

    #[test]
    fn test_data_cardinality() {
        let single = DataDescription::new(DataType::DOUBLE);
        let multiple = DataDescription::new(DataType::DOUBLE).with_occurs(1, 3);

        assert_eq!(Data::Single(DataValue::Double(1.0)), Data::from_values(&single, vec![DataValue::Double(1.0)]).unwrap());
        assert!(matches!(
            Data::from_values(&single, vec![DataValue::Double(1.0), DataValue::Double(2.0)]),
            Err(ParseError::Cardinality { max_occurs: 1, found: 2 })
        ));
        assert!(Data::from_values(&single, vec![]).is_err());

        let data = Data::from_values(&multiple, vec![DataValue::Double(1.0), DataValue::Double(2.0)]).unwrap();
        assert!(data.is_multiple());
        assert_eq!(2, data.values().len());
        assert!(data.conforms_to(&multiple));
        assert!(!data.conforms_to(&single));
        assert!(Data::from_values(&multiple, vec![DataValue::Double(1.0); 4]).is_err());

        let data = Data::Single(DataValue::Text("x".to_string()));
        assert!(data.conforms_to(&single));
        assert!(!data.conforms_to(&multiple));
        assert_eq!(vec![DataValue::Text("x".to_string())], data.into_values());
    }
}
