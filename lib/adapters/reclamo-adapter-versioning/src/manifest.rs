//! Component versions and the versioned cache-key transform.

use std::collections::BTreeMap;

use reclamo_domain::{VersionHistoryEntry, VersionSet, is_cache_compatible};

/// Versions of the AI models, cache schemas, and pipeline stages of the
/// complaint-processing deployment, plus the chronological history of
/// deployment versions. Mutated only by redeploys, so the manifest is
/// immutable once constructed.
pub struct VersionManifest {
    versions: VersionSet,
    history: Vec<VersionHistoryEntry>,
}

impl Default for VersionManifest {
    fn default() -> Self {
        Self::new(shipped_versions(), shipped_history())
    }
}

impl VersionManifest {
    pub fn new(versions: VersionSet, history: Vec<VersionHistoryEntry>) -> Self {
        Self { versions, history }
    }

    pub fn versions(&self) -> VersionSet {
        self.versions.clone()
    }

    pub fn history(&self) -> &[VersionHistoryEntry] {
        &self.history
    }

    pub fn system_version(&self) -> &str {
        &self.versions.system
    }

    /// Index of a version in the chronological history, by exact string
    /// match. Versions are opaque here; no numeric comparison.
    pub fn history_index(&self, version: &str) -> Option<usize> {
        self.history.iter().position(|entry| entry.version == version)
    }

    pub fn is_cache_compatible(&self, cached: Option<&str>, required: &str) -> bool {
        is_cache_compatible(cached, required)
    }

    /// `v<version>:<base>`, where the version comes from the cache category
    /// (falling back to the system version for unregistered services). Every
    /// versioned cache read and write goes through this transform, so bumping
    /// a version strands the old namespace instead of deleting it.
    pub fn versioned_cache_key(&self, base: &str, service: &str) -> String {
        let version = self
            .versions
            .cache
            .get(service)
            .unwrap_or(&self.versions.system);
        format!("v{version}:{base}")
    }
}

fn shipped_versions() -> VersionSet {
    let entries = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect()
    };
    VersionSet {
        ai: entries(&[
            ("classification", "1.2.0"),
            ("priority_scoring", "1.2.0"),
            ("duplicate_detection", "1.1.0"),
            ("search", "1.0.0"),
        ]),
        cache: entries(&[
            ("classification", "1.2.0"),
            ("priority", "1.2.0"),
            ("duplicate", "1.1.0"),
            ("search_index", "1.0.0"),
        ]),
        pipeline: entries(&[("intake", "1.1.0"), ("triage", "1.2.0")]),
        system: "1.2.0".to_string(),
    }
}

fn shipped_history() -> Vec<VersionHistoryEntry> {
    let entry = |version: &str, date: &str, phase: u32, description: &str| VersionHistoryEntry {
        version: version.to_string(),
        date: date.to_string(),
        phase,
        description: description.to_string(),
    };
    vec![
        entry("1.0.0", "2025-02-10", 1, "Initial AI-assisted intake rollout"),
        entry(
            "1.1.0",
            "2025-05-04",
            2,
            "Duplicate detection and versioned cache namespaces",
        ),
        entry(
            "1.2.0",
            "2025-07-22",
            3,
            "Classifier retrain and priority scoring model",
        ),
    ]
}
