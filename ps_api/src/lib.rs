// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

pub mod data;
pub mod error;
pub mod process;
pub mod request;
pub mod response;
pub mod storage;
pub mod xml;

/// Namespace of the processing service request/response documents.
pub const PS_NAMESPACE: &str = "http://www.uncertweb.org/ProcessingService";

/// Namespace of XML schema instance attributes.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace of SOAP 1.2 envelopes.
pub const SOAP_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";
