use std::sync::Arc;

use reclamo_adapter_telemetry::{HealthEvaluator, MetricsRegistry};
use reclamo_adapter_versioning::{
    MigrationRegistry, MigrationScript, StepScript, VersionManifest,
};
use reclamo_domain::ReclamoConfig;
use reclamo_ports::PortSet;

/// The one long-lived handle over the observability and versioning control
/// plane. Constructed once at startup and passed by reference to every
/// collaborator; tests build a fresh instance instead of resetting shared
/// state.
pub struct ControlPlane {
    evaluator: Arc<HealthEvaluator>,
    manifest: Arc<VersionManifest>,
    migrations: Arc<MigrationRegistry>,
}

impl ControlPlane {
    pub fn from_config(config: &ReclamoConfig) -> Self {
        let registry = Arc::new(MetricsRegistry::new());
        let evaluator = Arc::new(HealthEvaluator::new(
            registry,
            config.telemetry.thresholds,
        ));
        let manifest = Arc::new(VersionManifest::default());
        let migrations = Arc::new(MigrationRegistry::new(manifest.clone()));
        register_shipped_migrations(&migrations);
        Self {
            evaluator,
            manifest,
            migrations,
        }
    }

    /// The dyn surface handed to the web layer and operator tooling.
    pub fn ports(&self) -> PortSet {
        PortSet {
            telemetry: self.evaluator.clone(),
            versioning: self.migrations.clone(),
        }
    }

    pub fn evaluator(&self) -> &Arc<HealthEvaluator> {
        &self.evaluator
    }

    pub fn manifest(&self) -> &Arc<VersionManifest> {
        &self.manifest
    }

    pub fn migrations(&self) -> &Arc<MigrationRegistry> {
        &self.migrations
    }
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self::from_config(&ReclamoConfig::default())
    }
}

/// Migration scripts for each adjacent pair in the shipped version history.
/// Registered once here at startup; the scripts reference runbook steps and
/// are only ever run by the operator tooling.
fn register_shipped_migrations(migrations: &MigrationRegistry) {
    let step = |label: &str| -> Arc<dyn MigrationScript> { StepScript::new(label, || Ok(())) };
    migrations.register_migration(
        "1.0.0",
        "1.1.0",
        Some(step("build duplicate-detection cache namespaces")),
        Some(step("repoint caches to the pre-duplicate-detection namespaces")),
    );
    migrations.register_migration(
        "1.1.0",
        "1.2.0",
        Some(step("warm classifier 1.2 and priority-scoring caches")),
        Some(step("repoint classifier and priority caches to 1.1")),
    );
}
