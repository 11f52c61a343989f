// src/config/mod.rs
// Configuration and shared constants

pub mod env;

pub use env::{ConfigValidation, EnvConfig, is_placeholder_key};
