//! Port traits consumed by the web layer and operator tooling.
//!
//! Every operation is synchronous, in-memory, and non-blocking; callers on an
//! async runtime can invoke these directly from handlers.

use anyhow::Result;
use std::sync::Arc;

use reclamo_domain::{
    AlertThresholds, AlertsReport, ManifestExport, MetricsReport, MigrationPlan, ProbeReport,
    RollbackSummary, ThresholdUpdate, VersionHistoryEntry, VersionSet,
};

/// Ingestion and query surface of the telemetry subsystem.
///
/// Ingestion never fails: unknown AI service names are dropped on the floor so
/// metrics can never fault the caller's request path.
pub trait TelemetryPort: Send + Sync {
    fn record_request(&self, latency_ms: f64, is_error: bool);
    fn record_cache_op(&self, hit: bool);
    fn record_cache_eviction(&self);
    fn record_ai_op(&self, service: &str, is_error: bool);

    fn metrics(&self) -> MetricsReport;
    fn health(&self) -> ProbeReport;
    fn alerts(&self) -> AlertsReport;
    fn update_thresholds(&self, update: ThresholdUpdate) -> AlertThresholds;
}

/// Version lookup, cache compatibility, and migration planning surface.
pub trait VersioningPort: Send + Sync {
    fn versions(&self) -> VersionSet;
    fn version_history(&self) -> Vec<VersionHistoryEntry>;
    fn is_cache_compatible(&self, cached: Option<&str>, required: &str) -> bool;
    fn versioned_cache_key(&self, base: &str, service: &str) -> String;

    fn migration_plan(&self, from: &str, to: &str) -> MigrationPlan;
    /// Fails when the target is absent from history or not strictly older
    /// than the current deployment version.
    fn plan_rollback(&self, target: &str) -> Result<RollbackSummary>;
    fn export_manifest(&self) -> ManifestExport;
}

#[derive(Clone)]
pub struct PortSet {
    pub telemetry: Arc<dyn TelemetryPort>,
    pub versioning: Arc<dyn VersioningPort>,
}
