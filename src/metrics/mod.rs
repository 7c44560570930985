//! Category metrics collection
//!
//! Computes per-category totals against attainable maxima and keeps the
//! latest result per score fingerprint.

pub mod collector;

pub use collector::{compute_category_metrics, CategoryMetric, CategoryMetrics, MetricsCollector};
