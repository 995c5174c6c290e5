use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Snapshot returned by a storage-health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StorageHealth {
    pub usage_bytes: u64,
    pub quota_bytes: u64,
    /// Round-trip latency of a trivial read.
    pub latency_ms: f64,
    pub record_count: usize,
}

impl StorageHealth {
    /// Fraction of the quota in use, 0.0 when no quota is known.
    pub fn usage_ratio(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        self.usage_bytes as f64 / self.quota_bytes as f64
    }

    /// 0–100: penalized by quota pressure and slow reads.
    pub fn score(&self) -> f64 {
        let mut score: f64 = 100.0;
        let ratio = self.usage_ratio();
        if ratio >= 0.95 {
            score -= 50.0;
        } else if ratio >= 0.80 {
            score -= 25.0;
        }
        if self.latency_ms > 1000.0 {
            score -= 30.0;
        } else if self.latency_ms > 200.0 {
            score -= 10.0;
        }
        score.clamp(0.0, 100.0)
    }

    /// Human-readable issues behind a reduced score.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let ratio = self.usage_ratio();
        if ratio >= 0.80 {
            issues.push(format!(
                "storage at {:.0}% of quota ({} / {} bytes)",
                ratio * 100.0,
                self.usage_bytes,
                self.quota_bytes
            ));
        }
        if self.latency_ms > 200.0 {
            issues.push(format!("slow store reads: {:.0}ms", self.latency_ms));
        }
        issues
    }
}
