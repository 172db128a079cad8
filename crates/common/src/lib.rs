//! Common utilities and shared types for vidtube.
//!
//! This crate provides foundational components used across all vidtube crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Telemetry**: Tracing subscriber installation via [`telemetry::init`]
//!
//! # Example
//!
//! ```no_run
//! use vidtube_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     vidtube_common::telemetry::init(&config.logging)?;
//!     let id = IdGenerator::new().generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod telemetry;

pub use config::{Config, LoggingConfig, PaginationConfig};
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, validate_id};
