//! Podplay Console
//!
//! Headless episode player driven by line commands, backed by a simulated
//! media engine.
//!
//! This library exposes the core components for testing purposes.

pub mod app;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;

// Re-export commonly used types for convenience
pub use app::{ConsoleApp, Flow};
pub use command::ConsoleCommand;
pub use config::{ConsoleConfig, EngineSettings};
pub use engine::SimulatedEngine;
pub use error::{ConsoleError, Result};
