//! Alerts, thresholds, and health report types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ErrorRate,
    Latency,
    Memory,
    CacheHitRate,
}

/// One threshold breach from a single health evaluation. Alerts are
/// regenerated wholesale on every check and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub kind: AlertKind,
    pub message: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Critical,
}

/// Alerting thresholds. No validation is applied: zero or negative values are
/// accepted and will produce an always- or never-alerting evaluator, so any
/// sanity checks belong at the integration edge that accepts updates.
///
/// `queue_depth` is configured but not read by any alert rule today.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub error_rate_percent: f64,
    pub p95_latency_ms: f64,
    pub memory_mb: f64,
    pub cache_hit_rate_percent: f64,
    pub queue_depth: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_rate_percent: 5.0,
            p95_latency_ms: 2000.0,
            memory_mb: 512.0,
            cache_hit_rate_percent: 70.0,
            queue_depth: 100,
        }
    }
}

impl AlertThresholds {
    /// Shallow merge: fields absent from the update are left untouched.
    pub fn apply(&mut self, update: ThresholdUpdate) {
        if let Some(v) = update.error_rate_percent {
            self.error_rate_percent = v;
        }
        if let Some(v) = update.p95_latency_ms {
            self.p95_latency_ms = v;
        }
        if let Some(v) = update.memory_mb {
            self.memory_mb = v;
        }
        if let Some(v) = update.cache_hit_rate_percent {
            self.cache_hit_rate_percent = v;
        }
        if let Some(v) = update.queue_depth {
            self.queue_depth = v;
        }
    }
}

/// Partial threshold update accepted from operator tooling.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ThresholdUpdate {
    pub error_rate_percent: Option<f64>,
    pub p95_latency_ms: Option<f64>,
    pub memory_mb: Option<f64>,
    pub cache_hit_rate_percent: Option<f64>,
    pub queue_depth: Option<u64>,
}

/// Tri-state outcome for the uptime-probe checklist. The cache check reports
/// `N/A` until the cache has seen any traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckOutcome {
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "fail")]
    Fail,
    #[serde(rename = "N/A")]
    NotApplicable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeChecks {
    pub memory: CheckOutcome,
    pub latency: CheckOutcome,
    pub error_rate: CheckOutcome,
    pub cache_hit_rate: CheckOutcome,
}

/// Simple pass/fail view for uptime probes.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub status: HealthState,
    pub healthy: bool,
    pub uptime: String,
    pub checks: ProbeChecks,
    pub timestamp: String,
}

/// Result of one full health evaluation.
///
/// `healthy` means "no critical alerts": a warning-only system reports
/// `status == Degraded` with `healthy == true`, on purpose: the boolean feeds
/// liveness probes, the status feeds dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub healthy: bool,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsReport {
    pub count: usize,
    pub alerts: Vec<Alert>,
    pub last_check: Option<String>,
    pub thresholds: AlertThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_update_merges_only_provided_fields() {
        let mut thresholds = AlertThresholds::default();
        thresholds.apply(ThresholdUpdate {
            error_rate_percent: Some(10.0),
            queue_depth: Some(250),
            ..ThresholdUpdate::default()
        });
        assert_eq!(thresholds.error_rate_percent, 10.0);
        assert_eq!(thresholds.queue_depth, 250);
        assert_eq!(thresholds.p95_latency_ms, 2000.0);
        assert_eq!(thresholds.memory_mb, 512.0);
        assert_eq!(thresholds.cache_hit_rate_percent, 70.0);
    }

    #[test]
    fn check_outcome_serializes_as_probe_strings() {
        assert_eq!(
            serde_json::to_string(&CheckOutcome::Pass).unwrap(),
            "\"pass\""
        );
        assert_eq!(
            serde_json::to_string(&CheckOutcome::NotApplicable).unwrap(),
            "\"N/A\""
        );
    }

    #[test]
    fn alert_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AlertKind::ErrorRate).unwrap(),
            "\"error_rate\""
        );
        assert_eq!(
            serde_json::to_string(&AlertKind::CacheHitRate).unwrap(),
            "\"cache_hit_rate\""
        );
    }
}
