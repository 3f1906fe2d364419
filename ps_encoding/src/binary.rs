// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use ps_api::data::DataValue;
use ps_api::error::{EncodeError, ParseError};

use crate::codec::{BinaryCodec, Codec};
use crate::declaration::{Capability, TypeDeclaration};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Pass-through codec of opaque payloads.
pub struct RawBinaryCodec;

impl Codec for RawBinaryCodec {
    fn name(&self) -> &str {
        "raw binary"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Binary]
    }
}

impl BinaryCodec for RawBinaryCodec {
    fn mime_type(&self, _declaration: &TypeDeclaration) -> String {
        OCTET_STREAM.to_string()
    }

    fn decode(&self, bytes: &[u8], _declaration: &TypeDeclaration) -> Result<DataValue, ParseError> {
        Ok(DataValue::Binary(bytes.to_vec()))
    }

    fn encode(&self, value: &DataValue) -> Result<Vec<u8>, EncodeError> {
        match value {
            DataValue::Binary(bytes) => Ok(bytes.clone()),
            _ => Err(crate::codec::unsupported(self.name(), value)),
        }
    }
}
