// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use crate::data::{Data, DataValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub identifier: String,
    pub data: Data,
}

impl Input {
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

/// Client directive on an output: include it, and whether to return it
/// as a data reference instead of inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedOutput {
    pub name: String,
    pub as_reference: bool,
}

impl RequestedOutput {
    pub fn new(name: &str, as_reference: bool) -> Self {
        Self {
            name: name.to_string(),
            as_reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub process_identifier: String,
    pub inputs: std::collections::HashMap<String, Input>,
    /// `None` means that all the outputs are returned, inline by default.
    pub requested_outputs: Option<Vec<RequestedOutput>>,
}

impl Request {
    pub fn new(process_identifier: &str) -> Self {
        Self {
            process_identifier: process_identifier.to_string(),
            inputs: std::collections::HashMap::new(),
            requested_outputs: None,
        }
    }

    /// Add an input, returning the one it replaces, if any.
    pub fn add_input(&mut self, input: Input) -> Option<Input> {
        self.inputs.insert(input.identifier.clone(), input)
    }

    pub fn input(&self, identifier: &str) -> Option<&Input> {
        self.inputs.get(identifier)
    }
}
