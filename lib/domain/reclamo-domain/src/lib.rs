//! Domain models and invariants.

pub mod config;
pub mod health;
pub mod metrics;
pub mod version;

pub use config::{ReclamoConfig, TelemetryConfig};
pub use health::{
    Alert, AlertKind, AlertLevel, AlertThresholds, AlertsReport, CheckOutcome, HealthReport,
    HealthState, ProbeChecks, ProbeReport, ThresholdUpdate,
};
pub use metrics::{
    AiReport, AiServiceKind, CacheReport, LatencyReport, MemoryUsage, MetricsReport,
    RequestReport, now_millis,
};
pub use version::{
    ManifestExport, MigrationPlan, RollbackSummary, VersionHistoryEntry, VersionSet,
    is_cache_compatible, parse_major_minor,
};
