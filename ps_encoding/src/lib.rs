// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

pub mod binary;
pub mod codec;
pub mod declaration;
pub mod json;
pub mod primitive;
pub mod registry;
pub mod structural;
pub mod uncertainty;

pub use codec::{AnyCodec, BinaryCodec, Codec, CodecFamily, JsonCodec, XmlCodec};
pub use declaration::{Capability, TypeDeclaration, ValueShape};
pub use registry::{EncodingRegistry, RegistryError};
