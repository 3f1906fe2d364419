// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

pub mod flat_file;
pub mod memory;

pub use flat_file::FlatFileStorage;
pub use memory::MemoryStorage;

/// File name extension used for stored payloads of the given media type.
pub fn extension(mime_type: &str) -> &'static str {
    match mime_type {
        "text/xml" | "application/xml" => "xml",
        "application/json" => "json",
        "text/plain" => "txt",
        "application/x-netcdf" | "application/netcdf" => "nc",
        _ => "bin",
    }
}
