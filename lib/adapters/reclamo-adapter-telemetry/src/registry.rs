//! Bounded counters and the rolling latency window.

use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use reclamo_domain::{AiServiceKind, now_millis};

/// Capacity of the rolling latency window. Strict FIFO: once full, each new
/// sample evicts the oldest. Recent-bias is intentional: this feeds sampling
/// percentiles, not exact analytics.
pub const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default, Clone)]
pub(crate) struct RequestCounters {
    pub total: u64,
    pub errors: u64,
    pub latencies: VecDeque<f64>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct AiCounters {
    pub classifications: u64,
    pub priority_scores: u64,
    pub duplicate_checks: u64,
    pub searches: u64,
    pub errors: u64,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Counters {
    pub requests: RequestCounters,
    pub cache: CacheCounters,
    pub ai: AiCounters,
    pub last_check_ms: Option<i64>,
}

/// Process-wide metrics sink. One instance is created at startup and shared by
/// reference; every collaborator mutates it only through the methods below.
pub struct MetricsRegistry {
    counters: RwLock<Counters>,
    started: Instant,
    started_ms: i64,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
            started: Instant::now(),
            started_ms: now_millis(),
        }
    }

    pub fn record_request(&self, latency_ms: f64, is_error: bool) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        let requests = &mut counters.requests;
        requests.total += 1;
        if is_error {
            requests.errors += 1;
        }
        if requests.latencies.len() == LATENCY_WINDOW {
            requests.latencies.pop_front();
        }
        requests.latencies.push_back(latency_ms);
    }

    pub fn record_cache_op(&self, hit: bool) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        if hit {
            counters.cache.hits += 1;
        } else {
            counters.cache.misses += 1;
        }
    }

    pub fn record_cache_eviction(&self) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        counters.cache.evictions += 1;
    }

    /// On the error path only the shared error counter moves; on success the
    /// per-service counter moves. Names outside the known service set are a
    /// documented no-op; ingestion must never fault the caller.
    pub fn record_ai_op(&self, service: &str, is_error: bool) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        if is_error {
            counters.ai.errors += 1;
            return;
        }
        match AiServiceKind::from_name(service) {
            Some(AiServiceKind::Classification) => counters.ai.classifications += 1,
            Some(AiServiceKind::PriorityScoring) => counters.ai.priority_scores += 1,
            Some(AiServiceKind::DuplicateDetection) => counters.ai.duplicate_checks += 1,
            Some(AiServiceKind::Search) => counters.ai.searches += 1,
            None => tracing::debug!("dropping AI op for unknown service {service:?}"),
        }
    }

    /// Test hook: zeroes every counter and clears the latency window.
    pub fn reset(&self) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        *counters = Counters::default();
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn started_ms(&self) -> i64 {
        self.started_ms
    }

    pub fn last_check_ms(&self) -> Option<i64> {
        self.counters.read().expect("metrics lock poisoned").last_check_ms
    }

    pub(crate) fn mark_checked(&self) {
        let mut counters = self.counters.write().expect("metrics lock poisoned");
        counters.last_check_ms = Some(now_millis());
    }

    /// Stable copy of the counters; the percentile sort works on this copy so
    /// concurrent ingestion cannot shift samples mid-computation.
    pub(crate) fn snapshot(&self) -> Counters {
        self.counters.read().expect("metrics lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_window_keeps_most_recent_hundred_in_order() {
        let registry = MetricsRegistry::new();
        for i in 0..250 {
            registry.record_request(i as f64, false);
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.requests.latencies.len(), LATENCY_WINDOW);
        assert_eq!(snapshot.requests.total, 250);
        let window: Vec<f64> = snapshot.requests.latencies.iter().copied().collect();
        let expected: Vec<f64> = (150..250).map(|i| i as f64).collect();
        assert_eq!(window, expected);
    }

    #[test]
    fn ai_errors_skip_per_service_counters() {
        let registry = MetricsRegistry::new();
        registry.record_ai_op("classification", true);
        registry.record_ai_op("classification", false);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.ai.errors, 1);
        assert_eq!(snapshot.ai.classifications, 1);
    }

    #[test]
    fn unknown_ai_service_is_a_silent_no_op() {
        let registry = MetricsRegistry::new();
        registry.record_ai_op("sentiment", false);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.ai.classifications, 0);
        assert_eq!(snapshot.ai.priority_scores, 0);
        assert_eq!(snapshot.ai.duplicate_checks, 0);
        assert_eq!(snapshot.ai.searches, 0);
        assert_eq!(snapshot.ai.errors, 0);
    }

    #[test]
    fn eviction_counter_moves_independently_of_hits_and_misses() {
        let registry = MetricsRegistry::new();
        registry.record_cache_op(true);
        registry.record_cache_op(false);
        registry.record_cache_eviction();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.cache.hits, 1);
        assert_eq!(snapshot.cache.misses, 1);
        assert_eq!(snapshot.cache.evictions, 1);
    }

    #[test]
    fn reset_clears_counters_and_window() {
        let registry = MetricsRegistry::new();
        registry.record_request(12.0, true);
        registry.record_cache_op(true);
        registry.record_ai_op("search", false);
        registry.reset();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.requests.total, 0);
        assert!(snapshot.requests.latencies.is_empty());
        assert_eq!(snapshot.cache.hits, 0);
        assert_eq!(snapshot.ai.searches, 0);
        assert_eq!(snapshot.last_check_ms, None);
    }
}
