//! Observability: metric names recorded by the cache layer.

pub mod metrics;
