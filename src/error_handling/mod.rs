//! Error taxonomy and outcome statistics.

mod stats;
mod types;

pub use stats::ResolverStats;
pub use types::{FlushError, InitializationError, PersistenceError};
