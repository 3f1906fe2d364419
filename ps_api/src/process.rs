// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use crate::data::DataDescription;

/// Declared interface of a process: its identifier and its inputs and
/// outputs in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDefinition {
    identifier: String,
    inputs: Vec<(String, DataDescription)>,
    outputs: Vec<(String, DataDescription)>,
}

impl ProcessDefinition {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            inputs: vec![],
            outputs: vec![],
        }
    }

    pub fn with_input(mut self, identifier: &str, description: DataDescription) -> Self {
        add_port(&self.identifier, &mut self.inputs, identifier, description);
        self
    }

    pub fn with_output(mut self, identifier: &str, description: DataDescription) -> Self {
        add_port(&self.identifier, &mut self.outputs, identifier, description);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn input_identifiers(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(id, _)| id.as_str())
    }

    pub fn output_identifiers(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(id, _)| id.as_str())
    }

    pub fn input_description(&self, identifier: &str) -> Option<&DataDescription> {
        self.inputs.iter().find(|(id, _)| id == identifier).map(|(_, d)| d)
    }

    pub fn output_description(&self, identifier: &str) -> Option<&DataDescription> {
        self.outputs.iter().find(|(id, _)| id == identifier).map(|(_, d)| d)
    }

    /// Inputs with their descriptions, in declaration order.
    pub fn inputs(&self) -> &[(String, DataDescription)] {
        &self.inputs
    }

    /// Outputs with their descriptions, in declaration order.
    pub fn outputs(&self) -> &[(String, DataDescription)] {
        &self.outputs
    }
}

fn add_port(process: &str, ports: &mut Vec<(String, DataDescription)>, identifier: &str, description: DataDescription) {
    match ports.iter_mut().find(|(id, _)| id == identifier) {
        Some((_, existing)) => {
            log::warn!("process {} declares '{}' twice, keeping the last declaration", process, identifier);
            *existing = description;
        }
        None => ports.push((identifier.to_string(), description)),
    }
}

/// Source of process definitions.
pub trait ProcessCatalog: Send + Sync {
    fn get_process(&self, identifier: &str) -> Option<std::sync::Arc<ProcessDefinition>>;

    fn process_identifiers(&self) -> Vec<String>;
}

/// Catalog filled once at start-up and only read afterwards.
#[derive(Default)]
pub struct InMemoryProcessCatalog {
    processes: std::collections::HashMap<String, std::sync::Arc<ProcessDefinition>>,
}

impl InMemoryProcessCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = ProcessDefinition>) -> anyhow::Result<Self> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.add(definition)?;
        }
        Ok(catalog)
    }

    pub fn add(&mut self, definition: ProcessDefinition) -> anyhow::Result<()> {
        if self.processes.contains_key(definition.identifier()) {
            anyhow::bail!("process {} already defined", definition.identifier());
        }
        log::debug!(
            "adding process {} with {} input(s) and {} output(s)",
            definition.identifier(),
            definition.inputs.len(),
            definition.outputs.len()
        );
        self.processes.insert(definition.identifier().to_string(), std::sync::Arc::new(definition));
        Ok(())
    }
}

impl ProcessCatalog for InMemoryProcessCatalog {
    fn get_process(&self, identifier: &str) -> Option<std::sync::Arc<ProcessDefinition>> {
        self.processes.get(identifier).cloned()
    }

    fn process_identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.processes.keys().cloned().collect();
        identifiers.sort();
        identifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataType;

    fn sum_process() -> ProcessDefinition {
        ProcessDefinition::new("SumProcess")
            .with_input("A", DataDescription::new(DataType::DOUBLE))
            .with_input("B", DataDescription::new(DataType::DOUBLE))
            .with_output("Result", DataDescription::new(DataType::DOUBLE))
    }

    #[test]
    fn test_declared_order() {
        let process = ProcessDefinition::new("P")
            .with_output("Z", DataDescription::new(DataType::DOUBLE))
            .with_output("A", DataDescription::new(DataType::STRING))
            .with_output("M", DataDescription::new(DataType::INTEGER));
        assert_eq!(vec!["Z", "A", "M"], process.output_identifiers().collect::<Vec<&str>>());
        assert_eq!(DataType::STRING, process.output_description("A").unwrap().data_type);
        assert!(process.output_description("B").is_none());
        assert_eq!(0, process.input_identifiers().count());
    }

    #[test]
    fn test_redeclared_port() {
        let process = sum_process().with_input("A", DataDescription::new(DataType::INTEGER).with_occurs(0, 5));
        assert_eq!(vec!["A", "B"], process.input_identifiers().collect::<Vec<&str>>());
        assert_eq!(5, process.input_description("A").unwrap().max_occurs);
    }

    #[test]
    fn test_catalog() {
        let catalog = InMemoryProcessCatalog::from_definitions(vec![sum_process(), ProcessDefinition::new("Other")]).unwrap();
        assert_eq!(vec!["Other".to_string(), "SumProcess".to_string()], catalog.process_identifiers());
        assert_eq!("SumProcess", catalog.get_process("SumProcess").unwrap().identifier());
        assert!(catalog.get_process("Foo").is_none());

        assert!(InMemoryProcessCatalog::from_definitions(vec![sum_process(), sum_process()]).is_err());
    }
}
