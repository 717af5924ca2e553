//! Application-level helpers: intake validation and shutdown.

mod bssid;
mod shutdown;

pub use bssid::validate_and_normalize_bssid;
pub use shutdown::shutdown_gracefully;
