//! Utility modules: configuration, the error taxonomy and JSON extraction
//! from free-form model output.

pub mod config;
pub mod converter;
pub mod errors;
