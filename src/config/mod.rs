//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (quotas, timeouts, store sizes)
//! - CLI option types and parsing
//! - The resolver settings struct used by library callers

mod constants;
mod types;

pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, ResolverSettings};
