//! Report types for the telemetry surface.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// The AI services whose calls are counted individually.
///
/// `from_name` is the only way in: callers pass free-form service names and
/// anything outside this set is dropped by the registry without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiServiceKind {
    Classification,
    PriorityScoring,
    DuplicateDetection,
    Search,
}

impl AiServiceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classification" => Some(Self::Classification),
            "priority" => Some(Self::PriorityScoring),
            "duplicate" => Some(Self::DuplicateDetection),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

/// Process memory readings in megabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub heap_used_mb: f64,
    pub heap_total_mb: f64,
    pub rss_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyReport {
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestReport {
    pub total: u64,
    pub errors: u64,
    /// Percentage with two decimals, e.g. `"6.00%"`.
    pub error_rate: String,
    pub latency: LatencyReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiReport {
    pub classifications: u64,
    pub priority_scores: u64,
    pub duplicate_checks: u64,
    pub searches: u64,
    pub errors: u64,
}

/// Point-in-time snapshot handed to `/metrics`-style consumers.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub uptime_secs: u64,
    pub requests: RequestReport,
    pub cache: CacheReport,
    pub ai: AiReport,
    pub memory: MemoryUsage,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_names_map_to_known_kinds() {
        assert_eq!(
            AiServiceKind::from_name("classification"),
            Some(AiServiceKind::Classification)
        );
        assert_eq!(
            AiServiceKind::from_name("priority"),
            Some(AiServiceKind::PriorityScoring)
        );
        assert_eq!(
            AiServiceKind::from_name("duplicate"),
            Some(AiServiceKind::DuplicateDetection)
        );
        assert_eq!(AiServiceKind::from_name("search"), Some(AiServiceKind::Search));
        assert_eq!(AiServiceKind::from_name("sentiment"), None);
    }
}
