//! Threshold-based health evaluation over the metrics registry.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::interval;

use reclamo_domain::{
    AiReport, Alert, AlertKind, AlertLevel, AlertThresholds, AlertsReport, CacheReport,
    CheckOutcome, HealthReport, HealthState, LatencyReport, MemoryUsage, MetricsReport,
    ProbeChecks, ProbeReport, RequestReport, ThresholdUpdate,
};
use reclamo_ports::TelemetryPort;

use crate::memory::{MemorySampler, ProcStatusSampler};
use crate::registry::{Counters, MetricsRegistry};

/// Samples needed before a low cache hit rate may alert; keeps a cold cache
/// from paging anyone.
const CACHE_ALERT_MIN_SAMPLES: u64 = 100;

/// Nearest-rank percentile over an ascending-sorted window:
/// `index = ceil(p/100 * n) - 1`, clamped to the window. Returns 0 for an
/// empty window. The rank formula is part of the external contract: consumers
/// compare these numbers across deployments, so no interpolating estimator
/// may be substituted.
pub fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (percentile / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

/// `Xd Yh`, `Xh Ym`, `Xm Ys`, or `Xs`, largest applicable pair wins.
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    if days >= 1 {
        format!("{days}d {hours}h")
    } else if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

struct Derived {
    error_rate: f64,
    p50: f64,
    p95: f64,
    p99: f64,
    cache_hit_rate: f64,
    cache_samples: u64,
}

fn derive(snapshot: &Counters) -> Derived {
    let requests = &snapshot.requests;
    let error_rate = if requests.total == 0 {
        0.0
    } else {
        requests.errors as f64 / requests.total as f64 * 100.0
    };

    let mut sorted: Vec<f64> = requests.latencies.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let cache_samples = snapshot.cache.hits + snapshot.cache.misses;
    // No samples reads as healthy, not unknown.
    let cache_hit_rate = if cache_samples == 0 {
        100.0
    } else {
        snapshot.cache.hits as f64 / cache_samples as f64 * 100.0
    };

    Derived {
        error_rate,
        p50: nearest_rank(&sorted, 50.0),
        p95: nearest_rank(&sorted, 95.0),
        p99: nearest_rank(&sorted, 99.0),
        cache_hit_rate,
        cache_samples,
    }
}

/// Derives health from the registry and the live thresholds. Owns the
/// active-alert set, which is fully replaced on every evaluation.
pub struct HealthEvaluator {
    registry: Arc<MetricsRegistry>,
    thresholds: RwLock<AlertThresholds>,
    alerts: RwLock<Vec<Alert>>,
    sampler: Box<dyn MemorySampler>,
}

impl HealthEvaluator {
    pub fn new(registry: Arc<MetricsRegistry>, thresholds: AlertThresholds) -> Self {
        Self::with_sampler(registry, thresholds, Box::new(ProcStatusSampler))
    }

    pub fn with_sampler(
        registry: Arc<MetricsRegistry>,
        thresholds: AlertThresholds,
        sampler: Box<dyn MemorySampler>,
    ) -> Self {
        Self {
            registry,
            thresholds: RwLock::new(thresholds),
            alerts: RwLock::new(Vec::new()),
            sampler,
        }
    }

    /// Evaluates every signal against the thresholds and replaces the active
    /// alerts. All comparisons are strict; a value sitting exactly on a
    /// threshold does not alert.
    pub fn check_health(&self) -> HealthReport {
        let (report, _, _) = self.evaluate();
        report
    }

    fn evaluate(&self) -> (HealthReport, Derived, MemoryUsage) {
        let snapshot = self.registry.snapshot();
        let derived = derive(&snapshot);
        let memory = self.sampler.sample();
        let thresholds = *self.thresholds.read().expect("thresholds lock poisoned");

        let mut alerts = Vec::new();
        if derived.error_rate > thresholds.error_rate_percent {
            alerts.push(Alert {
                level: AlertLevel::Warning,
                kind: AlertKind::ErrorRate,
                message: format!(
                    "error rate {:.2}% exceeds {}%",
                    derived.error_rate, thresholds.error_rate_percent
                ),
                value: derived.error_rate,
            });
        }
        if derived.p95 > thresholds.p95_latency_ms {
            alerts.push(Alert {
                level: AlertLevel::Warning,
                kind: AlertKind::Latency,
                message: format!(
                    "p95 latency {:.0}ms exceeds {}ms",
                    derived.p95, thresholds.p95_latency_ms
                ),
                value: derived.p95,
            });
        }
        if memory.heap_used_mb > thresholds.memory_mb {
            alerts.push(Alert {
                level: AlertLevel::Critical,
                kind: AlertKind::Memory,
                message: format!(
                    "heap {:.0}MB exceeds {}MB",
                    memory.heap_used_mb, thresholds.memory_mb
                ),
                value: memory.heap_used_mb,
            });
        }
        if derived.cache_samples > CACHE_ALERT_MIN_SAMPLES
            && derived.cache_hit_rate < thresholds.cache_hit_rate_percent
        {
            alerts.push(Alert {
                level: AlertLevel::Warning,
                kind: AlertKind::CacheHitRate,
                message: format!(
                    "cache hit rate {:.2}% below {}%",
                    derived.cache_hit_rate, thresholds.cache_hit_rate_percent
                ),
                value: derived.cache_hit_rate,
            });
        }

        for alert in &alerts {
            tracing::warn!("health alert: {}", alert.message);
        }

        *self.alerts.write().expect("alerts lock poisoned") = alerts.clone();
        self.registry.mark_checked();

        let has_critical = alerts.iter().any(|a| a.level == AlertLevel::Critical);
        let status = if has_critical {
            HealthState::Critical
        } else if !alerts.is_empty() {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        };

        let report = HealthReport {
            status,
            healthy: !has_critical,
            alerts,
        };
        (report, derived, memory)
    }

    /// Structured snapshot for `/metrics`-style consumers. Read-only: does not
    /// touch the alert set or `last_check`.
    pub fn metrics_report(&self) -> MetricsReport {
        let snapshot = self.registry.snapshot();
        let derived = derive(&snapshot);
        MetricsReport {
            uptime_secs: self.registry.uptime().as_secs(),
            requests: RequestReport {
                total: snapshot.requests.total,
                errors: snapshot.requests.errors,
                error_rate: format!("{:.2}%", derived.error_rate),
                latency: LatencyReport {
                    p50_ms: derived.p50.round() as u64,
                    p95_ms: derived.p95.round() as u64,
                    p99_ms: derived.p99.round() as u64,
                },
            },
            cache: CacheReport {
                hits: snapshot.cache.hits,
                misses: snapshot.cache.misses,
                evictions: snapshot.cache.evictions,
                hit_rate: format!("{:.2}%", derived.cache_hit_rate),
            },
            ai: AiReport {
                classifications: snapshot.ai.classifications,
                priority_scores: snapshot.ai.priority_scores,
                duplicate_checks: snapshot.ai.duplicate_checks,
                searches: snapshot.ai.searches,
                errors: snapshot.ai.errors,
            },
            memory: self.sampler.sample(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Pass/fail checklist for uptime probes, refreshed by a full evaluation.
    pub fn probe_report(&self) -> ProbeReport {
        let (report, derived, memory) = self.evaluate();
        let thresholds = *self.thresholds.read().expect("thresholds lock poisoned");

        let pass_fail = |ok: bool| if ok { CheckOutcome::Pass } else { CheckOutcome::Fail };
        let checks = ProbeChecks {
            memory: pass_fail(memory.heap_used_mb < thresholds.memory_mb),
            latency: pass_fail(derived.p95 < thresholds.p95_latency_ms),
            error_rate: pass_fail(derived.error_rate < thresholds.error_rate_percent),
            cache_hit_rate: if derived.cache_samples == 0 {
                CheckOutcome::NotApplicable
            } else {
                pass_fail(derived.cache_hit_rate > thresholds.cache_hit_rate_percent)
            },
        };

        ProbeReport {
            status: report.status,
            healthy: report.healthy,
            uptime: format_uptime(self.registry.uptime().as_secs()),
            checks,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Alerts from the most recent evaluation, plus the thresholds they were
    /// judged against.
    pub fn alerts_report(&self) -> AlertsReport {
        let alerts = self.alerts.read().expect("alerts lock poisoned").clone();
        AlertsReport {
            count: alerts.len(),
            alerts,
            last_check: self
                .registry
                .last_check_ms()
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt: DateTime<Utc>| dt.to_rfc3339()),
            thresholds: *self.thresholds.read().expect("thresholds lock poisoned"),
        }
    }

    pub fn update_thresholds(&self, update: ThresholdUpdate) -> AlertThresholds {
        let mut thresholds = self.thresholds.write().expect("thresholds lock poisoned");
        thresholds.apply(update);
        *thresholds
    }

    /// Test hook: resets the registry and clears the active alerts.
    pub fn reset_metrics(&self) {
        self.registry.reset();
        self.alerts.write().expect("alerts lock poisoned").clear();
    }

    /// Periodic evaluation driver. Alerts surface through `tracing` as they
    /// are found; the loop itself never fails.
    pub async fn run_health_loop(self: Arc<Self>, period: Duration) {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            let report = self.check_health();
            tracing::debug!(
                "health evaluated: {:?}, {} alert(s)",
                report.status,
                report.alerts.len()
            );
        }
    }
}

impl TelemetryPort for HealthEvaluator {
    fn record_request(&self, latency_ms: f64, is_error: bool) {
        self.registry.record_request(latency_ms, is_error);
    }

    fn record_cache_op(&self, hit: bool) {
        self.registry.record_cache_op(hit);
    }

    fn record_cache_eviction(&self) {
        self.registry.record_cache_eviction();
    }

    fn record_ai_op(&self, service: &str, is_error: bool) {
        self.registry.record_ai_op(service, is_error);
    }

    fn metrics(&self) -> MetricsReport {
        self.metrics_report()
    }

    fn health(&self) -> ProbeReport {
        self.probe_report()
    }

    fn alerts(&self) -> AlertsReport {
        self.alerts_report()
    }

    fn update_thresholds(&self, update: ThresholdUpdate) -> AlertThresholds {
        HealthEvaluator::update_thresholds(self, update)
    }
}
