//! Shared test fixtures: a scripted lookup fake and resolver builders.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wigle_locator::{LocationLookup, Outcome, Resolver, ResolverSettings, StateStore};

/// Lookup fake that replays a fixed script of outcomes and counts calls.
///
/// Once the script runs dry it answers with a transient error, which keeps
/// accidental extra calls visible in assertions instead of panicking inside
/// the resolver.
#[allow(dead_code)] // Used by other test files
pub struct ScriptedLookup {
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedLookup {
    #[allow(dead_code)] // Used by other test files
    pub fn new(outcomes: Vec<Outcome>) -> Arc<Self> {
        Self::with_delay(outcomes, Duration::ZERO)
    }

    /// A fake whose calls take `delay` to complete, for in-flight tests.
    #[allow(dead_code)] // Used by other test files
    pub fn with_delay(outcomes: Vec<Outcome>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    #[allow(dead_code)] // Used by other test files
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationLookup for ScriptedLookup {
    async fn fetch(&self, _bssid: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcomes
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Outcome::transient_network("script exhausted"))
    }
}

/// Default settings with the drain pacing delay removed.
#[allow(dead_code)] // Used by other test files
pub fn fast_settings() -> ResolverSettings {
    ResolverSettings {
        inter_request_delay: Duration::ZERO,
        ..ResolverSettings::default()
    }
}

/// Opens a resolver over the given data directory.
#[allow(dead_code)] // Used by other test files
pub fn open_resolver(
    dir: &Path,
    settings: ResolverSettings,
    lookup: Arc<ScriptedLookup>,
) -> Arc<Resolver> {
    let store = StateStore::open(dir).expect("open store");
    Arc::new(Resolver::open(settings, lookup, store))
}
