//! Telemetry adapter: bounded in-memory metrics and threshold-based health.

pub mod evaluator;
pub mod memory;
pub mod registry;

pub use evaluator::HealthEvaluator;
pub use memory::{FixedMemorySampler, MemorySampler, ProcStatusSampler};
pub use registry::MetricsRegistry;
