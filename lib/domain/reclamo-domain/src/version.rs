//! Version records and the cache compatibility rule.

use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the chronological version history. Versions are opaque strings
/// here: history lookups match by string equality, never by numeric order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionHistoryEntry {
    pub version: String,
    pub date: String,
    pub phase: u32,
    pub description: String,
}

/// Current semantic versions per tracked component, grouped by category, plus
/// the scalar deployment version rollback reasons about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionSet {
    pub ai: BTreeMap<String, String>,
    pub cache: BTreeMap<String, String>,
    pub pipeline: BTreeMap<String, String>,
    pub system: String,
}

/// Availability of a single directly-registered migration pair. "Not
/// registered" is a normal query outcome, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlan {
    pub available: bool,
    pub from: String,
    pub to: String,
    pub has_forward: bool,
    pub has_backward: bool,
}

/// Serializable summary of a planned rollback. The plan is advisory: nothing
/// in this subsystem executes migration scripts.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackSummary {
    pub from: String,
    pub to: String,
    pub rollback_steps: usize,
    pub note: String,
}

/// Read-only export of versions, history, and registered migration pairs.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestExport {
    pub versions: VersionSet,
    pub history: Vec<VersionHistoryEntry>,
    pub migrations: Vec<String>,
    pub generated_at: String,
}

/// Reads `MAJOR.MINOR` out of a `MAJOR.MINOR[.PATCH]` string; the patch
/// component is ignored everywhere compatibility is decided.
pub fn parse_major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Whether a cache entry written under `cached` may serve a reader requiring
/// `required`.
///
/// The relation is asymmetric: majors must match exactly (a major bump is a
/// breaking change), and the cached minor must be at least the required minor
/// (minor bumps are additive, so a newer writer satisfies an older reader but
/// not the reverse). A missing or unparsable cached version is incompatible,
/// never an error.
pub fn is_cache_compatible(cached: Option<&str>, required: &str) -> bool {
    let Some(cached) = cached.filter(|v| !v.is_empty()) else {
        return false;
    };
    let (Some((cached_major, cached_minor)), Some((required_major, required_minor))) =
        (parse_major_minor(cached), parse_major_minor(required))
    else {
        return false;
    };
    cached_major == required_major && cached_minor >= required_minor
}
