//! Metrics configuration.

use super::defaults::default_metrics_enabled;
use serde::{Deserialize, Serialize};

/// Metrics configuration. Reduced per SPEC_FULL §10.6 — this crate has no
/// multi-tenant dashboard surface, so only the enable switch survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Expose `/metrics/prom` (Prometheus text format).
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}
