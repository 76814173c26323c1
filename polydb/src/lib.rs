//! Top-level polystore engine facade: wires the catalog, router, DDL
//! orchestrator, migrator, lock manager and transaction coordinator together
//! behind a single [`Engine`], plus the `polydb` CLI built on top of it.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod wire;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
