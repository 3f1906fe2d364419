// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use std::io::Read;

use ps_api::data::{DataReference, DataType, DataValue};
use ps_api::error::{EncodeError, ParseError, StorageError};
use ps_api::storage::Storage;
use ps_api::xml::{XmlElement, XmlNode};
use ps_encoding::{CodecFamily, EncodingRegistry};

pub const XML_MIME_TYPE: &str = "text/xml";
pub const JSON_MIME_TYPE: &str = "application/json";

/// Name of the PS element wrapping stored XML content that is not a single element.
const DATA_ELEMENT: &str = "Data";

#[derive(Debug, thiserror::Error)]
pub enum GenerateReferenceError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Xml,
    Json,
    Other,
}

fn media_kind(mime_type: &str) -> MediaKind {
    let essence = mime_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    if essence == "text/xml" || essence == "application/xml" || essence.ends_with("+xml") {
        MediaKind::Xml
    } else if essence == "application/json" || essence.ends_with("+json") {
        MediaKind::Json
    } else {
        MediaKind::Other
    }
}

/// Moves values between memory and the storage collaborator.
pub struct ReferenceMaterializer<'a> {
    encodings: &'a EncodingRegistry,
    storage: &'a dyn Storage,
}

impl<'a> ReferenceMaterializer<'a> {
    pub fn new(encodings: &'a EncodingRegistry, storage: &'a dyn Storage) -> Self {
        Self { encodings, storage }
    }

    /// Store `value` and return a reference to it. References are returned
    /// as they are.
    pub async fn generate(
        &self,
        value: &DataValue,
        data_type: &DataType,
        preferred: CodecFamily,
    ) -> Result<DataReference, GenerateReferenceError> {
        if let DataValue::Reference(reference) = value {
            return Ok(reference.clone());
        }

        let (bytes, mime_type) = self.encode(value, data_type, preferred)?;
        let size = bytes.len();
        let href = self.storage.store(bytes, &mime_type).await?;
        log::debug!("stored {} bytes of {} at {}", size, data_type, href);

        DataReference::new(href, Some(mime_type), false)
            .map_err(|e| GenerateReferenceError::Storage(StorageError::Unavailable(e.to_string())))
    }

    fn encode(&self, value: &DataValue, data_type: &DataType, preferred: CodecFamily) -> Result<(Vec<u8>, String), EncodeError> {
        if let (Some(codec), Some(declaration)) = (self.encodings.binary_codec(data_type), self.encodings.declaration(data_type)) {
            return Ok((codec.encode(value)?, codec.mime_type(declaration)));
        }

        let families = match preferred {
            CodecFamily::Json => [CodecFamily::Json, CodecFamily::Xml],
            _ => [CodecFamily::Xml, CodecFamily::Json],
        };
        for family in families {
            match family {
                CodecFamily::Xml => {
                    if let Some(codec) = self.encodings.xml_codec(data_type) {
                        return Ok((xml_document(codec.encode(value)?)?, XML_MIME_TYPE.to_string()));
                    }
                }
                CodecFamily::Json => {
                    if let Some(codec) = self.encodings.json_codec(data_type) {
                        return Ok((serde_json::to_vec(&codec.encode(value)?)?, JSON_MIME_TYPE.to_string()));
                    }
                }
                CodecFamily::Binary => {}
            }
        }

        let json = self.encodings.structural_encode(value)?;
        Ok((serde_json::to_vec(&json)?, JSON_MIME_TYPE.to_string()))
    }

    /// Fetch the referenced payload and decode it as a value of `data_type`.
    pub async fn resolve(&self, reference: &DataReference, data_type: &DataType) -> Result<DataValue, ParseError> {
        let mut bytes = self.storage.fetch(reference.href()).await?;
        if reference.is_compressed() {
            bytes = gunzip(&bytes)?;
        }
        log::debug!("resolving {} as {}", reference, data_type);

        let declaration = self
            .encodings
            .declaration(data_type)
            .ok_or_else(|| ParseError::Unsupported(data_type.clone()))?;
        let kind = match reference.mime_type() {
            Some(mime_type) => media_kind(mime_type),
            None => self.only_family(data_type).unwrap_or_else(|| sniff(&bytes)),
        };

        match kind {
            MediaKind::Xml => {
                let codec = self
                    .encodings
                    .xml_codec(data_type)
                    .ok_or_else(|| ParseError::Unsupported(data_type.clone()))?;
                let text = String::from_utf8(bytes).map_err(|e| ParseError::Malformed(e.to_string()))?;
                let root = XmlElement::parse(&text)?;
                let content = if root.name == DATA_ELEMENT && root.namespace.as_deref() == Some(ps_api::PS_NAMESPACE) {
                    root.children
                } else {
                    vec![XmlNode::Element(root)]
                };
                codec.decode(&content, declaration)
            }
            MediaKind::Json => {
                let json: serde_json::Value = serde_json::from_slice(&bytes)?;
                match self.encodings.json_codec(data_type) {
                    Some(codec) => codec.decode(&json, declaration),
                    None => self.encodings.structural_decode(&json, data_type),
                }
            }
            MediaKind::Other => match self.encodings.binary_codec(data_type) {
                Some(codec) => codec.decode(&bytes, declaration),
                None => Err(ParseError::Unsupported(data_type.clone())),
            },
        }
    }

    /// Media kind of the only codec family able to decode `data_type`, if
    /// there is exactly one.
    fn only_family(&self, data_type: &DataType) -> Option<MediaKind> {
        let families = [
            (self.encodings.xml_codec(data_type).is_some(), MediaKind::Xml),
            (self.encodings.json_codec(data_type).is_some(), MediaKind::Json),
            (self.encodings.binary_codec(data_type).is_some(), MediaKind::Other),
        ];
        let mut available = families.iter().filter(|(supported, _)| *supported).map(|(_, kind)| *kind);
        match (available.next(), available.next()) {
            (Some(kind), None) => Some(kind),
            _ => None,
        }
    }
}

fn xml_document(node: XmlNode) -> Result<Vec<u8>, EncodeError> {
    let root = match node {
        XmlNode::Element(element) => element,
        text => {
            let mut data = XmlElement::new(DATA_ELEMENT, Some(ps_api::PS_NAMESPACE));
            data.add_child(text);
            data
        }
    };
    root.to_document()
}

/// Media kind of an untyped payload: XML if it starts with a tag, JSON if it
/// parses as JSON.
fn sniff(bytes: &[u8]) -> MediaKind {
    if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<') {
        MediaKind::Xml
    } else if serde_json::from_slice::<serde_json::Value>(bytes).is_ok() {
        MediaKind::Json
    } else {
        MediaKind::Other
    }
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = flate2::read::GzDecoder::new(bytes);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use std::io::Write;

    #[test]
    fn test_media_kind() {
        assert_eq!(MediaKind::Xml, media_kind("text/xml"));
        assert_eq!(MediaKind::Xml, media_kind("application/om+xml; charset=UTF-8"));
        assert_eq!(MediaKind::Json, media_kind("Application/JSON"));
        assert_eq!(MediaKind::Other, media_kind("application/x-netcdf"));
        assert_eq!(MediaKind::Xml, sniff(b"  <a/>"));
        assert_eq!(MediaKind::Json, sniff(b"[1]"));
        assert_eq!(MediaKind::Json, sniff(b"4.5"));
        assert_eq!(MediaKind::Json, sniff(b" true\n"));
        assert_eq!(MediaKind::Other, sniff(b"{not json"));
        assert_eq!(MediaKind::Other, sniff(&[0, 1, 2]));
    }

    #[tokio::test]
    async fn test_reference_round_trip() {
        let (ctx, storage) = test_utils::context();
        let materializer = ctx.materializer();

        let values = vec![
            (DataType::DOUBLE, DataValue::Double(101.05)),
            (DataType::STRING, DataValue::Text("a <b> & c".to_string())),
            (DataType::STRING, DataValue::Text(" padded ".to_string())),
            (DataType::STRING, DataValue::Text(" ".to_string())),
            (DataType::STRING, DataValue::Text("a\n".to_string())),
            (test_utils::normal_distribution(), test_utils::normal(1.5, 0.25)),
            (test_utils::coordinates(), DataValue::Structured(serde_json::json!([[0.0, 1.0], [2.5, 3.0]]))),
            (test_utils::raster(), DataValue::Binary(vec![0, 159, 146, 150])),
        ];
        for family in [CodecFamily::Xml, CodecFamily::Json] {
            for (data_type, value) in &values {
                let reference = materializer.generate(value, data_type, family).await.unwrap();
                assert!(!reference.is_compressed());
                assert_eq!(*value, materializer.resolve(&reference, data_type).await.unwrap());
            }
        }
        assert_eq!(values.len() * 2, storage.len().await);
    }

    #[tokio::test]
    async fn test_generate_media_types() {
        let (ctx, storage) = test_utils::context();
        let materializer = ctx.materializer();

        let reference = materializer
            .generate(&test_utils::normal(0.0, 1.0), &test_utils::normal_distribution(), CodecFamily::Xml)
            .await
            .unwrap();
        assert_eq!(Some(XML_MIME_TYPE), reference.mime_type());
        let stored = String::from_utf8(ctx.storage.fetch(reference.href()).await.unwrap()).unwrap();
        assert!(stored.contains("NormalDistribution"));

        let reference = materializer
            .generate(&test_utils::normal(0.0, 1.0), &test_utils::normal_distribution(), CodecFamily::Json)
            .await
            .unwrap();
        assert_eq!(Some(JSON_MIME_TYPE), reference.mime_type());

        // text content is wrapped in a PS element
        let reference = materializer
            .generate(&DataValue::Double(2.0), &DataType::DOUBLE, CodecFamily::Xml)
            .await
            .unwrap();
        let stored = String::from_utf8(ctx.storage.fetch(reference.href()).await.unwrap()).unwrap();
        assert!(stored.ends_with(r#"<Data xmlns="http://www.uncertweb.org/ProcessingService">2</Data>"#));

        let reference = materializer
            .generate(&DataValue::Binary(vec![1, 2]), &test_utils::raster(), CodecFamily::Xml)
            .await
            .unwrap();
        assert_eq!(Some("application/octet-stream"), reference.mime_type());
        assert_eq!(Some("application/octet-stream".to_string()), storage.mime_type(reference.href()).await);
    }

    #[tokio::test]
    async fn test_existing_reference_unchanged() {
        let (ctx, storage) = test_utils::context();
        let reference = DataReference::new("http://elsewhere/data.xml", Some("text/xml".to_string()), false).unwrap();

        let generated = ctx
            .materializer()
            .generate(&DataValue::Reference(reference.clone()), &test_utils::normal_distribution(), CodecFamily::Xml)
            .await
            .unwrap();
        assert_eq!(reference, generated);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_compressed() {
        let (ctx, _storage) = test_utils::context();

        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(br#"{"Mean": {"values": [4.5]}}"#).unwrap();
        let href = ctx.storage.store(encoder.finish().unwrap(), "application/json").await.unwrap();

        let reference = DataReference::new(href, Some("application/json".to_string()), true).unwrap();
        assert_eq!(
            DataValue::Uncertainty(uncertml::Uncertainty::Mean { values: vec![4.5] }),
            ctx.materializer().resolve(&reference, &test_utils::mean()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_resolve_without_media_type() {
        let (ctx, _storage) = test_utils::context();
        let materializer = ctx.materializer();

        // binary-only types take any bytes
        for bytes in [b"{\"a\": 1}".to_vec(), b"<a/>".to_vec(), b"[".to_vec()] {
            let href = ctx.storage.store(bytes.clone(), "application/octet-stream").await.unwrap();
            let reference = DataReference::new(href, None, false).unwrap();
            assert_eq!(
                DataValue::Binary(bytes),
                materializer.resolve(&reference, &test_utils::raster()).await.unwrap()
            );
        }

        let href = ctx.storage.store(b"4.5".to_vec(), "text/plain").await.unwrap();
        let reference = DataReference::new(href, None, false).unwrap();
        assert_eq!(
            DataValue::Double(4.5),
            materializer.resolve(&reference, &DataType::DOUBLE).await.unwrap()
        );

        let href = ctx.storage.store(b"<Data xmlns=\"http://www.uncertweb.org/ProcessingService\">7</Data>".to_vec(), "text/xml").await.unwrap();
        let reference = DataReference::new(href, None, false).unwrap();
        assert_eq!(
            DataValue::Integer(7),
            materializer.resolve(&reference, &DataType::INTEGER).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_resolve_errors() {
        let (ctx, _storage) = test_utils::context();
        let materializer = ctx.materializer();

        let missing = DataReference::new("memory://missing", Some("text/xml".to_string()), false).unwrap();
        assert!(matches!(
            materializer.resolve(&missing, &DataType::DOUBLE).await,
            Err(ParseError::Storage(StorageError::NotFound(_)))
        ));

        let href = ctx.storage.store(b"not gzip".to_vec(), "text/xml").await.unwrap();
        let corrupt = DataReference::new(href, Some("text/xml".to_string()), true).unwrap();
        assert!(matches!(materializer.resolve(&corrupt, &DataType::DOUBLE).await, Err(ParseError::Io(_))));

        // no XML codec for structured types
        let href = ctx.storage.store(b"<a/>".to_vec(), "text/xml").await.unwrap();
        let xml = DataReference::new(href, Some("text/xml".to_string()), false).unwrap();
        assert!(matches!(
            materializer.resolve(&xml, &test_utils::coordinates()).await,
            Err(ParseError::Unsupported(_))
        ));

        let href = ctx.storage.store(vec![0, 1], "application/octet-stream").await.unwrap();
        let binary = DataReference::new(href, None, false).unwrap();
        assert!(matches!(
            materializer.resolve(&binary, &DataType::DOUBLE).await,
            Err(ParseError::Unsupported(_))
        ));
    }
}
