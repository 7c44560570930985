//! Eviction decision logic for the in-memory caches

pub mod decision;

pub use decision::{
    is_expired, is_idle_and_cold, needs_capacity_eviction, select_least_used, AccessRecord,
};
