//! Migration records and rollback planning.
//!
//! This registry only stores and sequences migration scripts; it never runs
//! one. Rolling back live infrastructure is an operator decision, so the
//! output of `plan_rollback` is a plan to hand to a human, not an action.

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use reclamo_domain::{
    ManifestExport, MigrationPlan, RollbackSummary, VersionHistoryEntry, VersionSet, now_millis,
};
use reclamo_ports::VersioningPort;

use crate::manifest::VersionManifest;

/// A deferred migration action. `run` exists for the operator tooling that
/// ultimately executes a plan; nothing in this crate calls it.
pub trait MigrationScript: Send + Sync {
    fn describe(&self) -> &str;
    fn run(&self) -> Result<()>;
}

/// A labelled closure, the usual way scripts are registered at startup.
pub struct StepScript {
    label: String,
    action: Box<dyn Fn() -> Result<()> + Send + Sync>,
}

impl StepScript {
    pub fn new(
        label: impl Into<String>,
        action: impl Fn() -> Result<()> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            action: Box::new(action),
        })
    }
}

impl MigrationScript for StepScript {
    fn describe(&self) -> &str {
        &self.label
    }

    fn run(&self) -> Result<()> {
        (self.action)()
    }
}

struct MigrationRecord {
    forward: Option<Arc<dyn MigrationScript>>,
    backward: Option<Arc<dyn MigrationScript>>,
    registered_at_ms: i64,
}

/// One planned rollback hop, most recent first in `RollbackPlan::steps`.
#[derive(Clone)]
pub struct RollbackStep {
    pub from: String,
    pub to: String,
    pub script: Arc<dyn MigrationScript>,
}

impl std::fmt::Debug for RollbackStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackStep")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("script", &self.script.describe())
            .finish()
    }
}

/// Ordered rollback sequence from the current version down to the target.
/// Pairs with no registered rollback script are silently absent: gaps
/// truncate the plan, they do not fail it.
#[derive(Debug)]
pub struct RollbackPlan {
    pub from: String,
    pub to: String,
    pub steps: Vec<RollbackStep>,
}

impl RollbackPlan {
    pub fn summary(&self) -> RollbackSummary {
        RollbackSummary {
            from: self.from.clone(),
            to: self.to.clone(),
            rollback_steps: self.steps.len(),
            note: "execution is manual; apply steps via the operations runbook".to_string(),
        }
    }
}

/// Directional migration procedures keyed by `"<from>-><to>"`. Registered
/// once at process startup and never removed at runtime; re-registering a
/// pair overwrites it.
pub struct MigrationRegistry {
    manifest: Arc<VersionManifest>,
    records: RwLock<BTreeMap<String, MigrationRecord>>,
}

fn pair_key(from: &str, to: &str) -> String {
    format!("{from}->{to}")
}

impl MigrationRegistry {
    pub fn new(manifest: Arc<VersionManifest>) -> Self {
        Self {
            manifest,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn manifest(&self) -> &Arc<VersionManifest> {
        &self.manifest
    }

    pub fn register_migration(
        &self,
        from: &str,
        to: &str,
        forward: Option<Arc<dyn MigrationScript>>,
        backward: Option<Arc<dyn MigrationScript>>,
    ) {
        let mut records = self.records.write().expect("migration records lock poisoned");
        records.insert(
            pair_key(from, to),
            MigrationRecord {
                forward,
                backward,
                registered_at_ms: now_millis(),
            },
        );
    }

    /// Single-hop availability query. Only the exact directed pair is
    /// checked; there is no path search here, unlike the multi-hop walk in
    /// `plan_rollback`.
    pub fn migration_plan(&self, from: &str, to: &str) -> MigrationPlan {
        let records = self.records.read().expect("migration records lock poisoned");
        match records.get(&pair_key(from, to)) {
            Some(record) => MigrationPlan {
                available: true,
                from: from.to_string(),
                to: to.to_string(),
                has_forward: record.forward.is_some(),
                has_backward: record.backward.is_some(),
            },
            None => MigrationPlan {
                available: false,
                from: from.to_string(),
                to: to.to_string(),
                has_forward: false,
                has_backward: false,
            },
        }
    }

    /// Builds the rollback sequence from the current system version down to
    /// `target`, walking the version history backward pairwise.
    ///
    /// Fails when the target is missing from history or not strictly older
    /// than the current version. Pairs without a registered rollback script
    /// are skipped silently.
    pub fn plan_rollback(&self, target: &str) -> Result<RollbackPlan> {
        let history = self.manifest.history();
        let current = self.manifest.system_version();
        let current_idx = self.manifest.history_index(current).ok_or_else(|| {
            anyhow!("current version {current} is missing from the version history")
        })?;
        let target_idx = self
            .manifest
            .history_index(target)
            .ok_or_else(|| anyhow!("unknown rollback target {target}"))?;
        if target_idx >= current_idx {
            bail!("rollback target {target} is not older than current version {current}");
        }

        let records = self.records.read().expect("migration records lock poisoned");
        let mut steps = Vec::new();
        for i in (target_idx + 1..=current_idx).rev() {
            let from = &history[i - 1].version;
            let to = &history[i].version;
            if let Some(record) = records.get(&pair_key(from, to)) {
                if let Some(script) = record.backward.clone() {
                    steps.push(RollbackStep {
                        from: from.clone(),
                        to: to.clone(),
                        script,
                    });
                }
            }
        }

        tracing::info!(
            "planned rollback {current} -> {target} with {} step(s)",
            steps.len()
        );
        Ok(RollbackPlan {
            from: current.to_string(),
            to: target.to_string(),
            steps,
        })
    }

    /// Read-only snapshot of versions, history, and registered pairs for
    /// audit export.
    pub fn export_manifest(&self) -> ManifestExport {
        let records = self.records.read().expect("migration records lock poisoned");
        ManifestExport {
            versions: self.manifest.versions(),
            history: self.manifest.history().to_vec(),
            migrations: records.keys().cloned().collect(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    #[cfg(test)]
    fn registered_at_ms(&self, from: &str, to: &str) -> Option<i64> {
        let records = self.records.read().expect("migration records lock poisoned");
        records.get(&pair_key(from, to)).map(|r| r.registered_at_ms)
    }
}

impl VersioningPort for MigrationRegistry {
    fn versions(&self) -> VersionSet {
        self.manifest.versions()
    }

    fn version_history(&self) -> Vec<VersionHistoryEntry> {
        self.manifest.history().to_vec()
    }

    fn is_cache_compatible(&self, cached: Option<&str>, required: &str) -> bool {
        self.manifest.is_cache_compatible(cached, required)
    }

    fn versioned_cache_key(&self, base: &str, service: &str) -> String {
        self.manifest.versioned_cache_key(base, service)
    }

    fn migration_plan(&self, from: &str, to: &str) -> MigrationPlan {
        MigrationRegistry::migration_plan(self, from, to)
    }

    fn plan_rollback(&self, target: &str) -> Result<RollbackSummary> {
        MigrationRegistry::plan_rollback(self, target).map(|plan| plan.summary())
    }

    fn export_manifest(&self) -> ManifestExport {
        MigrationRegistry::export_manifest(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_version_manifest() -> Arc<VersionManifest> {
        let entry = |version: &str, phase: u32| VersionHistoryEntry {
            version: version.to_string(),
            date: format!("2025-0{phase}-01"),
            phase,
            description: format!("phase {phase}"),
        };
        let versions = VersionSet {
            system: "3.0.0".to_string(),
            ..VersionSet::default()
        };
        Arc::new(VersionManifest::new(
            versions,
            vec![entry("1.0.0", 1), entry("2.0.0", 2), entry("3.0.0", 3)],
        ))
    }

    fn noop(label: &str) -> Arc<dyn MigrationScript> {
        StepScript::new(label, || Ok(()))
    }

    #[test]
    fn missing_registrations_truncate_the_plan_silently() {
        let registry = MigrationRegistry::new(three_version_manifest());
        registry.register_migration(
            "2.0.0",
            "3.0.0",
            Some(noop("forward 2->3")),
            Some(noop("rollback 3->2")),
        );

        let plan = registry.plan_rollback("1.0.0").expect("plan");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].from, "2.0.0");
        assert_eq!(plan.steps[0].to, "3.0.0");

        let summary = plan.summary();
        assert_eq!(summary.from, "3.0.0");
        assert_eq!(summary.to, "1.0.0");
        assert_eq!(summary.rollback_steps, 1);
    }

    #[test]
    fn full_plan_walks_reverse_chronologically() {
        let registry = MigrationRegistry::new(three_version_manifest());
        registry.register_migration("1.0.0", "2.0.0", None, Some(noop("rollback 2->1")));
        registry.register_migration("2.0.0", "3.0.0", None, Some(noop("rollback 3->2")));

        let plan = registry.plan_rollback("1.0.0").expect("plan");
        let hops: Vec<(&str, &str)> = plan
            .steps
            .iter()
            .map(|s| (s.from.as_str(), s.to.as_str()))
            .collect();
        assert_eq!(hops, vec![("2.0.0", "3.0.0"), ("1.0.0", "2.0.0")]);
        assert!(plan.steps.iter().all(|s| s.script.run().is_ok()));
    }

    #[test]
    fn pair_with_forward_only_contributes_no_rollback_step() {
        let registry = MigrationRegistry::new(three_version_manifest());
        registry.register_migration("2.0.0", "3.0.0", Some(noop("forward 2->3")), None);

        let plan = registry.plan_rollback("2.0.0").expect("plan");
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn same_version_rollback_is_rejected() {
        let registry = MigrationRegistry::new(three_version_manifest());
        let err = registry.plan_rollback("3.0.0").expect_err("same version");
        assert!(err.to_string().contains("not older"));
    }

    #[test]
    fn forward_rollback_is_rejected() {
        let entry = |version: &str, phase: u32| VersionHistoryEntry {
            version: version.to_string(),
            date: format!("2025-0{phase}-01"),
            phase,
            description: format!("phase {phase}"),
        };
        let versions = VersionSet {
            system: "1.0.0".to_string(),
            ..VersionSet::default()
        };
        let registry = MigrationRegistry::new(Arc::new(VersionManifest::new(
            versions,
            vec![entry("1.0.0", 1), entry("2.0.0", 2)],
        )));

        let err = registry.plan_rollback("2.0.0").expect_err("forward target");
        assert!(err.to_string().contains("not older"));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let registry = MigrationRegistry::new(three_version_manifest());
        let err = registry.plan_rollback("9.9.9").expect_err("unknown target");
        assert!(err.to_string().contains("unknown rollback target"));
    }

    #[test]
    fn migration_plan_is_a_single_hop_query() {
        let registry = MigrationRegistry::new(three_version_manifest());
        registry.register_migration("1.0.0", "2.0.0", Some(noop("forward 1->2")), None);

        let plan = registry.migration_plan("1.0.0", "2.0.0");
        assert!(plan.available);
        assert!(plan.has_forward);
        assert!(!plan.has_backward);

        // The transitive route exists, but only the exact pair is consulted.
        let indirect = registry.migration_plan("1.0.0", "3.0.0");
        assert!(!indirect.available);
    }

    #[test]
    fn reregistering_a_pair_overwrites_it() {
        let registry = MigrationRegistry::new(three_version_manifest());
        registry.register_migration("1.0.0", "2.0.0", None, None);
        let first = registry.registered_at_ms("1.0.0", "2.0.0").expect("record");
        registry.register_migration("1.0.0", "2.0.0", None, Some(noop("rollback 2->1")));
        assert!(registry.registered_at_ms("1.0.0", "2.0.0").expect("record") >= first);
        assert!(registry.migration_plan("1.0.0", "2.0.0").has_backward);
    }

    #[test]
    fn export_lists_registered_pairs_in_key_order() {
        let registry = MigrationRegistry::new(three_version_manifest());
        registry.register_migration("2.0.0", "3.0.0", None, None);
        registry.register_migration("1.0.0", "2.0.0", None, None);

        let export = registry.export_manifest();
        assert_eq!(
            export.migrations,
            vec!["1.0.0->2.0.0".to_string(), "2.0.0->3.0.0".to_string()]
        );
        assert_eq!(export.history.len(), 3);
        assert_eq!(export.versions.system, "3.0.0");
        assert!(export.generated_at.contains('T'));

        let wire = serde_json::to_string(&export).expect("export json");
        assert!(wire.contains("\"migrations\":[\"1.0.0->2.0.0\",\"2.0.0->3.0.0\"]"));
    }
}
