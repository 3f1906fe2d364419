// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use crate::data::DataType;

/// Inbound data is malformed or does not match the declared type.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed data: {0}")]
    Malformed(String),
    #[error("expected {expected} but found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("couldn't automatically parse {0} type")]
    Unsupported(DataType),
    #[error("invalid data reference '{0}'")]
    InvalidReference(String),
    #[error("expected at most {max_occurs} value(s) but found {found}")]
    Cardinality { max_occurs: u32, found: usize },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    UncertML(#[from] uncertml::Error),
    #[error("couldn't retrieve referenced data: {0}")]
    Storage(#[from] StorageError),
    #[error("couldn't read referenced data: {0}")]
    Io(#[from] std::io::Error),
}

/// A value cannot be rendered by a codec.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{codec} cannot encode {found} values")]
    Unsupported { codec: String, found: String },
    #[error("no encoding found for type {0}")]
    NoEncoding(DataType),
    #[error("expected a {expected} value but found {found}")]
    TypeMismatch { expected: DataType, found: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    UncertML(#[from] uncertml::Error),
    #[error("couldn't write XML: {0}")]
    Xml(String),
}

/// Failure of the storage collaborator. Never retried here.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no data stored at {0}")]
    NotFound(String),
    #[error("location {0} is not served by this storage")]
    UnsupportedLocation(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A request payload cannot be turned into a request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("unknown process '{0}'")]
    UnknownProcess(String),
    #[error("couldn't parse input '{input}': {source}")]
    Input {
        input: String,
        #[source]
        source: ParseError,
    },
    #[error("requested output '{0}' is not an output of the process")]
    UnknownRequestedOutput(String),
}

/// A response payload cannot be generated.
#[derive(Debug, thiserror::Error)]
pub enum ResponseGenerateError {
    #[error("no encoding found for type {data_type} of output '{output}'")]
    NoEncoding { output: String, data_type: DataType },
    #[error("couldn't encode data for {output}: {source}")]
    Encode {
        output: String,
        #[source]
        source: EncodeError,
    },
    #[error("couldn't store data for reference of {output}: {source}")]
    Storage {
        output: String,
        #[source]
        source: StorageError,
    },
    #[error("output '{0}' is missing from the response")]
    MissingOutput(String),
    #[error("output '{0}' is not declared by the process")]
    UndeclaredOutput(String),
    #[error("output '{output}' does not match its declared cardinality (maxOccurs {max_occurs})")]
    Cardinality { output: String, max_occurs: u32 },
    #[error("response of process '{response}' cannot be generated with the definition of '{process}'")]
    ProcessMismatch { response: String, process: String },
    #[error("couldn't write response: {0}")]
    Write(String),
}

impl RequestError {
    /// True if the client, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            RequestError::Input { source, .. } => !matches!(source, ParseError::Storage(StorageError::Unavailable(_))),
            _ => true,
        }
    }
}
