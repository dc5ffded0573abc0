//! # Core Module
//!
//! Configuration, error types, and the clock shared by every feature.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add injectable clock for deterministic reminder math
//! - 1.1.0: Split store errors into persistence and scheduling families
//! - 1.0.0: Initial creation with config module

pub mod clock;
pub mod config;
pub mod error;

// Re-export commonly used items
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use error::{StoreError, StoreResult};
