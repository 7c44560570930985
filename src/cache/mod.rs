//! In-memory caching of pipeline results.
//!
//! - [`Fingerprint`]: order-independent content key of a score map
//! - [`ResultCache`]: bounded, sweepable store of computed results
//! - [`BackgroundSweeper`]: periodic stale sweep of any [`Sweep`] store on its own thread
//! - [`pruning`]: pure eviction decisions shared with the rule-set cache

pub mod fingerprint;
pub mod pruning;
pub mod result_cache;
pub mod sweeper;

pub use fingerprint::Fingerprint;
pub use result_cache::{
    CacheSettings, CacheStats, CachedComputation, ComputedScores, ResultCache,
};
pub use sweeper::{BackgroundSweeper, Sweep};
