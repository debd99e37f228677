//! Core types and utilities shared by the mutest mutation-testing engine.

pub mod config;
pub mod error;

pub use config::EngineConfig;
pub use error::{Error, Result};
