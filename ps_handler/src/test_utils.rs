// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use ps_api::data::{DataDescription, DataType, DataValue};
use ps_api::process::{InMemoryProcessCatalog, ProcessDefinition};
use ps_encoding::{Capability, EncodingRegistry, TypeDeclaration, ValueShape};
use ps_storage::MemoryStorage;

use crate::HandlerContext;

pub fn normal_distribution() -> DataType {
    ps_encoding::uncertainty::data_type("NormalDistribution")
}

pub fn mean() -> DataType {
    ps_encoding::uncertainty::data_type("Mean")
}

pub fn coordinates() -> DataType {
    DataType::new("ex:Coordinates")
}

pub fn raster() -> DataType {
    DataType::new("ex:Raster")
}

/// Declared, but without any capability.
pub fn opaque() -> DataType {
    DataType::new("ex:Opaque")
}

pub fn normal(mean: f64, variance: f64) -> DataValue {
    DataValue::Uncertainty(uncertml::Uncertainty::NormalDistribution {
        mean: vec![mean],
        variance: vec![variance],
    })
}

pub fn sum_process() -> ProcessDefinition {
    ProcessDefinition::new("SumProcess")
        .with_input("A", DataDescription::new(DataType::DOUBLE))
        .with_input("B", DataDescription::new(DataType::DOUBLE))
        .with_output("Result", DataDescription::new(DataType::DOUBLE))
        .with_output("Log", DataDescription::new(DataType::STRING))
}

pub fn uncertainty_process() -> ProcessDefinition {
    ProcessDefinition::new("UncertaintyProcess")
        .with_input("Distributions", DataDescription::new(normal_distribution()).with_occurs(1, 10))
        .with_input("Samples", DataDescription::new(DataType::INTEGER).with_occurs(0, 1))
        .with_output("Mean", DataDescription::new(mean()))
        .with_output("Realisations", DataDescription::new(normal_distribution()).with_occurs(1, 10))
}

pub fn buffer_process() -> ProcessDefinition {
    ProcessDefinition::new("BufferProcess")
        .with_input("Coordinates", DataDescription::new(coordinates()))
        .with_input("Distances", DataDescription::new(DataType::DOUBLE).with_occurs(1, 5))
        .with_input("Shape", DataDescription::new(DataType::new("ex:Shape")))
        .with_output("Polygon", DataDescription::new(coordinates()))
        .with_output("Raster", DataDescription::new(raster()))
        .with_output("Opaque", DataDescription::new(opaque()))
}

pub fn registry() -> EncodingRegistry {
    let mut registry = EncodingRegistry::with_defaults().unwrap();
    registry
        .declare_type(TypeDeclaration::concrete(coordinates(), ValueShape::Array, &[Capability::Structured]))
        .unwrap();
    registry
        .declare_type(TypeDeclaration::concrete(raster(), ValueShape::Binary, &[Capability::Binary]))
        .unwrap();
    registry
        .declare_type(TypeDeclaration::concrete(opaque(), ValueShape::Object, &[]))
        .unwrap();
    registry
}

/// Context with the test processes, the test registry and a fresh memory storage.
pub fn context() -> (HandlerContext, Arc<MemoryStorage>) {
    let catalog = InMemoryProcessCatalog::from_definitions(vec![sum_process(), uncertainty_process(), buffer_process()]).unwrap();
    let storage = Arc::new(MemoryStorage::new());
    let ctx = HandlerContext::new(Arc::new(catalog), Arc::new(registry()), storage.clone());
    (ctx, storage)
}
