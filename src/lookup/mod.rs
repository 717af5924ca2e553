//! Single-identifier location lookup.
//!
//! One HTTP request per BSSID against the keyed WiGLE REST endpoint, with the
//! result classified into a closed [`Outcome`] taxonomy. The client holds no
//! state beyond the credential; everything stateful (quota, cooldown, retry
//! bookkeeping) belongs to the resolver.

mod client;
mod outcome;

pub use client::WigleClient;
pub use outcome::{classify_response, LocationLookup, Outcome};
