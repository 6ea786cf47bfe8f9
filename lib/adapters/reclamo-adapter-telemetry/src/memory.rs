//! Process memory sampling.

use anyhow::{Result, anyhow};
use std::fs;

use reclamo_domain::MemoryUsage;

/// Source of process memory readings. The evaluator takes this as a seam so
/// tests can pin readings and exercise the memory alert deterministically.
pub trait MemorySampler: Send + Sync {
    fn sample(&self) -> MemoryUsage;
}

/// Reads `/proc/self/status`. On platforms or failures where that read does
/// not work, readings degrade to zero, which can never trip the strict
/// greater-than memory alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusSampler;

impl MemorySampler for ProcStatusSampler {
    fn sample(&self) -> MemoryUsage {
        read_proc_status().unwrap_or_default()
    }
}

/// Fixed readings, for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMemorySampler(pub MemoryUsage);

impl MemorySampler for FixedMemorySampler {
    fn sample(&self) -> MemoryUsage {
        self.0
    }
}

fn read_proc_status() -> Result<MemoryUsage> {
    let contents = fs::read_to_string("/proc/self/status")?;
    parse_status_usage(&contents)
}

fn parse_status_usage(contents: &str) -> Result<MemoryUsage> {
    let rss_mb = parse_status_field_mb(contents, "VmRSS:")?;
    let size_mb = parse_status_field_mb(contents, "VmSize:")?;
    Ok(MemoryUsage {
        heap_used_mb: rss_mb,
        heap_total_mb: size_mb,
        rss_mb,
    })
}

fn parse_status_field_mb(contents: &str, field: &str) -> Result<f64> {
    for line in contents.lines() {
        if !line.starts_with(field) {
            continue;
        }
        let mut fields = line.split_whitespace();
        let _ = fields.next();
        let value = fields
            .next()
            .ok_or_else(|| anyhow!("{field} value missing from /proc/self/status"))?;
        let kb: u64 = value
            .parse()
            .map_err(|err| anyhow!("invalid {field} value {value:?}: {err}"))?;
        return Ok(kb as f64 / 1024.0);
    }
    Err(anyhow!("{field} field missing in /proc/self/status"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\treclamo\nVmSize:\t10240 kB\nVmRSS:\t2048 kB\n";

    #[test]
    fn parse_converts_kb_fields_to_mb() {
        let usage = parse_status_usage(STATUS).expect("status parse");
        assert_eq!(usage.rss_mb, 2.0);
        assert_eq!(usage.heap_used_mb, 2.0);
        assert_eq!(usage.heap_total_mb, 10.0);
    }

    #[test]
    fn missing_field_is_an_error() {
        let err = parse_status_usage("Name:\treclamo\n").expect_err("missing fields");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn malformed_value_is_an_error() {
        let err =
            parse_status_usage("VmRSS:\tlots kB\nVmSize:\t1 kB\n").expect_err("bad value");
        assert!(err.to_string().contains("invalid"));
    }
}
