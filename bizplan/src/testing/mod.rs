//! Test doubles and fixtures for the pipeline.
//!
//! - Stub generation capabilities that never touch the network
//! - A provider factory that hands out a stub for every supplied key
//! - The EcoFashion intake used across tests

mod fixtures;
mod mocks;

pub use fixtures::{eco_fashion_body, eco_fashion_intake, eco_fashion_record};
pub use mocks::{
    DeterministicGenerator, FailingGenerator, RecordingGenerator, ScriptedGenerator, StaticProviderFactory,
};
