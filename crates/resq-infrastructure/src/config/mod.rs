//! Configuration
//!
//! One typed table per component, aggregated in [`AppConfig`], loaded by
//! [`ConfigLoader`] from defaults, a TOML file, and `RESQ_` environment
//! variables.

pub mod loader;
pub mod types;

pub use loader::{ConfigBuilder, ConfigLoader};
pub use types::*;
