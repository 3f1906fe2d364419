// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use ps_api::data::{DataDescription, DataType, DataValue};
use ps_api::process::{InMemoryProcessCatalog, ProcessDefinition};
use ps_api::request::Request;
use ps_encoding::{EncodingRegistry, TypeDeclaration};
use ps_handler::HandlerContext;

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PsStorageSettings {
    /// Directory where referenced payloads are written.
    pub base_path: String,
    /// URL under which `base_path` is published.
    pub base_url: String,
    /// Resolve inbound references published by other servers.
    #[serde(default = "default_remote_fetch")]
    pub remote_fetch: bool,
}

fn default_remote_fetch() -> bool {
    true
}

fn default_occurs() -> u32 {
    1
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PsPortSettings {
    pub identifier: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "default_occurs")]
    pub min_occurs: u32,
    #[serde(default = "default_occurs")]
    pub max_occurs: u32,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PsProcessSettings {
    pub identifier: String,
    #[serde(default)]
    pub inputs: Vec<PsPortSettings>,
    #[serde(default)]
    pub outputs: Vec<PsPortSettings>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PsSettings {
    pub storage: PsStorageSettings,
    /// Value types in addition to the built-in ones.
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
    #[serde(default)]
    pub processes: Vec<PsProcessSettings>,
}

impl PsPortSettings {
    fn description(&self) -> DataDescription {
        DataDescription::new(self.data_type.clone()).with_occurs(self.min_occurs, self.max_occurs)
    }
}

impl PsProcessSettings {
    pub fn definition(&self) -> ProcessDefinition {
        let mut definition = ProcessDefinition::new(&self.identifier);
        for input in &self.inputs {
            definition = definition.with_input(&input.identifier, input.description());
        }
        for output in &self.outputs {
            definition = definition.with_output(&output.identifier, output.description());
        }
        definition
    }
}

impl PsSettings {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        if std::fs::metadata(path).is_err() {
            anyhow::bail!("configuration file does not exist or cannot be accessed: {}", path);
        }
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn catalog(&self) -> anyhow::Result<InMemoryProcessCatalog> {
        InMemoryProcessCatalog::from_definitions(self.processes.iter().map(|p| p.definition()))
    }

    /// Built-in registry extended with the configured types.
    pub fn registry(&self) -> anyhow::Result<EncodingRegistry> {
        let mut registry = EncodingRegistry::with_defaults()?;
        for declaration in &self.types {
            registry.declare_type(declaration.clone())?;
        }
        for process in &self.processes {
            for port in process.inputs.iter().chain(process.outputs.iter()) {
                if registry.declaration(&port.data_type).is_none() {
                    log::warn!("type {} of {}/{} is not declared", port.data_type, process.identifier, port.identifier);
                }
            }
        }
        Ok(registry)
    }

    pub fn context(&self) -> anyhow::Result<HandlerContext> {
        let mut storage = ps_storage::FlatFileStorage::new(&self.storage.base_path, &self.storage.base_url);
        if !self.storage.remote_fetch {
            storage = storage.without_remote_fetch();
        }
        Ok(HandlerContext::new(
            Arc::new(self.catalog()?),
            Arc::new(self.registry()?),
            Arc::new(storage),
        ))
    }
}

pub fn ps_cli_default_conf() -> String {
    String::from(
        r##"[storage]
base_path = "./data"
base_url = "http://127.0.0.1:8080/data"
remote_fetch = true

[[types]]
name = "ex:Coordinates"
shape = "Array"
capabilities = ["Structured"]

[[types]]
name = "ex:NetCDF"
shape = "Binary"
capabilities = ["Binary"]

[[processes]]
identifier = "SumProcess"
inputs = [
    { identifier = "A", type = "xs:double" },
    { identifier = "B", type = "xs:double" },
]
outputs = [
    { identifier = "Result", type = "xs:double" },
]

[[processes]]
identifier = "Sample"
inputs = [
    { identifier = "Distributions", type = "un:NormalDistribution", max_occurs = 10 },
    { identifier = "Samples", type = "xs:integer", min_occurs = 0 },
]
outputs = [
    { identifier = "Realisations", type = "un:Mean", max_occurs = 10 },
    { identifier = "Dataset", type = "ex:NetCDF" },
]
"##,
    )
}

pub fn create_template(path: &str, content: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!path.is_empty(), "empty configuration file path");
    match std::path::Path::new(&path).exists() {
        true => anyhow::bail!("cannot overwrite configuration file: {}", path),
        false => {
            std::fs::write(path, content)?;
            Ok(())
        }
    }
}

pub fn summarize(value: &DataValue) -> String {
    match value {
        DataValue::Boolean(b) => b.to_string(),
        DataValue::Integer(i) => i.to_string(),
        DataValue::Double(d) => d.to_string(),
        DataValue::Text(s) => format!("\"{}\"", s),
        DataValue::Structured(json) => json.to_string(),
        DataValue::Uncertainty(u) => format!("un:{}", u.kind()),
        DataValue::Binary(bytes) => format!("<{} bytes>", bytes.len()),
        DataValue::Reference(reference) => reference.to_string(),
    }
}

/// Human-readable listing of a request, inputs in declared order.
pub fn describe_request(request: &Request, process: &ProcessDefinition) -> String {
    let mut lines = vec![format!("process {}", request.process_identifier)];
    for identifier in process.input_identifiers() {
        if let Some(input) = request.input(identifier) {
            let values: Vec<String> = input.data.values().iter().map(summarize).collect();
            match input.data.is_multiple() {
                true => lines.push(format!("  {} = [{}]", identifier, values.join(", "))),
                false => lines.push(format!("  {} = {}", identifier, values.join(""))),
            }
        }
    }
    match &request.requested_outputs {
        None => lines.push("all outputs, inline".to_string()),
        Some(requested) => {
            for output in requested {
                let mode = if output.as_reference { "reference" } else { "inline" };
                lines.push(format!("output {} as {}", output.name, mode));
            }
        }
    }
    lines.join("\n")
}

pub fn describe_process(process: &ProcessDefinition) -> String {
    let ports = |ports: &[(String, DataDescription)]| {
        ports
            .iter()
            .map(|(identifier, d)| format!("{}: {} [{}..{}]", identifier, d.data_type, d.min_occurs, d.max_occurs))
            .collect::<Vec<String>>()
            .join(", ")
    };
    format!("{}({}) -> ({})", process.identifier(), ports(process.inputs()), ports(process.outputs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_api::process::ProcessCatalog;
    use ps_encoding::CodecFamily;

    #[test]
    fn test_default_conf() {
        let settings = PsSettings::from_toml(&ps_cli_default_conf()).unwrap();
        assert_eq!("./data", settings.storage.base_path);
        assert!(settings.storage.remote_fetch);
        let local_only = PsSettings::from_toml("[storage]\nbase_path = \"x\"\nbase_url = \"http://h/x\"\nremote_fetch = false\n").unwrap();
        assert!(!local_only.storage.remote_fetch);
        assert!(PsSettings::from_toml("[storage]\nbase_path = \"x\"\nbase_url = \"http://h/x\"\n").unwrap().storage.remote_fetch);
        assert_eq!(2, settings.types.len());

        let catalog = settings.catalog().unwrap();
        assert_eq!(vec!["Sample".to_string(), "SumProcess".to_string()], catalog.process_identifiers());
        let sample = catalog.get_process("Sample").unwrap();
        assert_eq!(vec!["Distributions", "Samples"], sample.input_identifiers().collect::<Vec<&str>>());
        assert_eq!(10, sample.input_description("Distributions").unwrap().max_occurs);
        assert_eq!(0, sample.input_description("Samples").unwrap().min_occurs);
        assert_eq!(
            "Sample(Distributions: un:NormalDistribution [1..10], Samples: xs:integer [0..1]) -> (Realisations: un:Mean [1..10], Dataset: ex:NetCDF [1..1])",
            describe_process(&sample)
        );

        let registry = settings.registry().unwrap();
        assert!(registry.supports(CodecFamily::Binary, &DataType::new("ex:NetCDF")));
        assert!(registry.supports(CodecFamily::Json, &DataType::new("ex:Coordinates")));
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = PsSettings::from_toml(&ps_cli_default_conf()).unwrap();
        settings.processes.push(settings.processes[0].clone());
        assert!(settings.catalog().is_err());

        let mut settings = PsSettings::from_toml(&ps_cli_default_conf()).unwrap();
        settings.types.push(settings.types[0].clone());
        assert!(settings.registry().is_err());

        assert!(PsSettings::from_toml("[storage]\nbase_path = \"x\"\n").is_err());
        assert!(PsSettings::from_file("/nonexistent/ps.toml").is_err());
    }

    #[test]
    fn test_create_template() {
        let path = std::env::temp_dir().join(format!("ps_cli-{}.toml", uuid::Uuid::new_v4()));
        let path = path.to_str().unwrap();

        create_template(path, &ps_cli_default_conf()).unwrap();
        assert!(create_template(path, "").is_err());
        assert_eq!(ps_cli_default_conf(), std::fs::read_to_string(path).unwrap());
        assert!(PsSettings::from_file(path).is_ok());

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_describe_request() {
        let settings = PsSettings::from_toml(&ps_cli_default_conf()).unwrap();
        let ctx = settings.context().unwrap();
        let request = ps_handler::RequestDeserializer::new(&ctx)
            .deserialize(br#"{"SampleRequest": {
                "Distributions": [{"NormalDistribution": {"mean": [0.0], "variance": [1.0]}}],
                "Samples": 20,
                "RequestedOutputs": {"Dataset": {"asReference": true}}
            }}"#)
            .await
            .unwrap();
        let process = ctx.catalog.get_process("Sample").unwrap();

        assert_eq!(
            "process Sample\n  Distributions = [un:NormalDistribution]\n  Samples = 20\noutput Dataset as reference",
            describe_request(&request, &process)
        );
    }
}
