// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use crate::data::{Data, DataValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub identifier: String,
    pub data: Data,
}

impl Output {
    pub fn single(identifier: &str, value: DataValue) -> Self {
        Self {
            identifier: identifier.to_string(),
            data: Data::Single(value),
        }
    }

    pub fn multiple(identifier: &str, values: Vec<DataValue>) -> Self {
        Self {
            identifier: identifier.to_string(),
            data: Data::Multiple(values),
        }
    }
}

/// Outputs of one process execution, keyed by identifier. Iteration order
/// is unspecified: generators follow the process definition instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutputs {
    outputs: std::collections::HashMap<String, Output>,
}

impl ProcessOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output, returning the one it replaces, if any.
    pub fn add(&mut self, output: Output) -> Option<Output> {
        self.outputs.insert(output.identifier.clone(), output)
    }

    pub fn get(&self, identifier: &str) -> Option<&Output> {
        self.outputs.get(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl FromIterator<Output> for ProcessOutputs {
    fn from_iter<T: IntoIterator<Item = Output>>(iter: T) -> Self {
        let mut outputs = Self::new();
        for output in iter {
            outputs.add(output);
        }
        outputs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub process_identifier: String,
    pub outputs: ProcessOutputs,
}

impl Response {
    pub fn new(process_identifier: &str, outputs: ProcessOutputs) -> Self {
        Self {
            process_identifier: process_identifier.to_string(),
            outputs,
        }
    }
}
