// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::{Error, Uncertainty, NAMESPACE};

const PREFIX: &str = "un";

/// Encode a value as a standalone UncertML 2.0 document (no XML declaration).
pub fn encode(value: &Uncertainty) -> Result<String, Error> {
    let mut writer = quick_xml::Writer::new(Vec::new());
    let root = format!("{}:{}", PREFIX, value.kind());

    let mut start = BytesStart::new(root.as_str());
    start.push_attribute(("xmlns:un", NAMESPACE));
    write(&mut writer, Event::Start(start))?;
    for (name, values) in value.parameters() {
        let tag = format!("{}:{}", PREFIX, name);
        write(&mut writer, Event::Start(BytesStart::new(tag.as_str())))?;
        write(&mut writer, Event::Text(BytesText::new(&format_values(values))))?;
        write(&mut writer, Event::End(BytesEnd::new(tag.as_str())))?;
    }
    write(&mut writer, Event::End(BytesEnd::new(root.as_str())))?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
}

/// Parse a standalone UncertML 2.0 document. Namespace prefixes are
/// irrelevant, but every element must be in the UncertML namespace.
pub fn parse(xml: &str) -> Result<Uncertainty, Error> {
    let mut reader = quick_xml::NsReader::from_str(xml);
    reader.trim_text(true);

    let mut kind: Option<String> = None;
    let mut current: Option<String> = None;
    let mut parameters = std::collections::HashMap::new();

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(|e| Error::Xml(e.to_string()))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if !in_uncertml_namespace(&ns) {
                    return Err(Error::Namespace(name));
                }
                let empty = matches!(event, Event::Empty(_));
                if kind.is_none() {
                    kind = Some(name);
                    if empty {
                        break;
                    }
                } else if current.is_none() {
                    if empty {
                        parameters.insert(name, vec![]);
                    } else {
                        current = Some(name);
                    }
                } else {
                    return Err(Error::UnexpectedElement(name));
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                match &current {
                    Some(parameter) => {
                        parameters.insert(parameter.clone(), parse_values(&text)?);
                    }
                    None => return Err(Error::Xml(format!("unexpected text '{}'", text))),
                }
            }
            Event::End(_) => match current.take() {
                Some(parameter) => {
                    parameters.entry(parameter).or_insert_with(Vec::new);
                }
                None => break,
            },
            Event::Eof => return Err(Error::Xml("unexpected end of document".to_string())),
            _ => {}
        }
    }

    match kind {
        Some(kind) => Uncertainty::from_parameters(&kind, parameters),
        None => Err(Error::Xml("empty document".to_string())),
    }
}

fn write(writer: &mut quick_xml::Writer<Vec<u8>>, event: Event) -> Result<(), Error> {
    writer.write_event(event).map_err(|e| Error::Xml(e.to_string()))
}

fn in_uncertml_namespace(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == NAMESPACE.as_bytes())
}

fn format_values(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<String>>().join(" ")
}

fn parse_values(text: &str) -> Result<Vec<f64>, Error> {
    text.split_whitespace()
        .map(|token| token.parse::<f64>().map_err(|_| Error::InvalidNumber(token.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_normal_distribution() {
        let xml = encode(&Uncertainty::NormalDistribution {
            mean: vec![1.5, 2.0],
            variance: vec![0.25, 1.0],
        })
        .unwrap();
        assert_eq!(
            r#"<un:NormalDistribution xmlns:un="http://www.uncertml.org/2.0"><un:mean>1.5 2</un:mean><un:variance>0.25 1</un:variance></un:NormalDistribution>"#,
            xml
        );
    }

    #[test]
    fn test_parse_any_prefix() {
        let xml = r#"<?xml version="1.0"?>
            <Mean xmlns="http://www.uncertml.org/2.0">
                <values>3.5 -1e2</values>
            </Mean>"#;
        assert_eq!(Uncertainty::Mean { values: vec![3.5, -100.0] }, parse(xml).unwrap());

        let xml = r#"<x:ExponentialDistribution xmlns:x="http://www.uncertml.org/2.0"><x:rate>0.5</x:rate></x:ExponentialDistribution>"#;
        assert_eq!(Uncertainty::ExponentialDistribution { rate: vec![0.5] }, parse(xml).unwrap());
    }

    #[test]
    fn test_parse_empty_parameter() {
        let xml = r#"<un:Variance xmlns:un="http://www.uncertml.org/2.0"><un:values/></un:Variance>"#;
        assert_eq!(Uncertainty::Variance { values: vec![] }, parse(xml).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse(r#"<NormalDistribution><mean>1</mean><variance>1</variance></NormalDistribution>"#),
            Err(Error::Namespace(_))
        ));
        assert!(matches!(
            parse(r#"<un:Mean xmlns:un="http://www.uncertml.org/2.0"><un:values>1 two</un:values></un:Mean>"#),
            Err(Error::InvalidNumber(_))
        ));
        assert!(matches!(
            parse(r#"<un:NormalDistribution xmlns:un="http://www.uncertml.org/2.0"><un:mean>1</un:mean></un:NormalDistribution>"#),
            Err(Error::MissingParameter { .. })
        ));
        assert!(matches!(
            parse(r#"<un:Mean xmlns:un="http://www.uncertml.org/2.0"><un:values><un:x/></un:values></un:Mean>"#),
            Err(Error::UnexpectedElement(_))
        ));
        assert!(parse("").is_err());
    }

    #[test]
    fn test_encode_parse_all_kinds() {
        let values = vec![
            Uncertainty::NormalDistribution {
                mean: vec![0.1],
                variance: vec![2.5],
            },
            Uncertainty::LogNormalDistribution {
                log_scale: vec![0.0, 1.0],
                shape: vec![1.0, 0.5],
            },
            Uncertainty::UniformDistribution {
                minimum: vec![-1.0],
                maximum: vec![1.0],
            },
            Uncertainty::ExponentialDistribution { rate: vec![3.0] },
            Uncertainty::Mean { values: vec![1.25] },
            Uncertainty::Variance { values: vec![0.0] },
            Uncertainty::StandardDeviation { values: vec![7.0, 8.0] },
        ];
        for value in values {
            assert_eq!(value, parse(&encode(&value).unwrap()).unwrap());
        }
    }
}
