//! Pipeline-wide configuration surface (§6 table), grounded on
//! `drift-core::config::scan_config::ScanConfig`'s `Option<T>` + `effective_*()`
//! pattern: every field is optional in the TOML/env surface so partial
//! overrides don't require repeating every default.

use serde::{Deserialize, Serialize};

/// All §6 configuration options. Loads from TOML, overridable by `CTP_*`
/// environment variables (applied in `PipelineConfig::from_env_and_file`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hard cap on in-flight LLM calls. Default: 100.
    pub global_llm_concurrency: Option<usize>,
    /// Graph builder batch size. Default: 10_000.
    pub batch_size: Option<usize>,
    /// Outbox events drained per tick. Default: 100.
    pub outbox_batch: Option<usize>,
    /// Sub-agents per triangulation session. Default: 6.
    pub triangulation_parallelism: Option<usize>,
    /// Confidence below which triangulation triggers. Default: 0.4.
    pub low_confidence_threshold: Option<f64>,
    /// Conflict severity that sends to human review. Default: 0.7.
    pub escalation_threshold: Option<f64>,
    /// Max retries per job. Default: 3.
    pub worker_retries: Option<u32>,
    /// Consecutive failures before a breaker opens. Default: 5 (10 for reconciliation).
    pub breaker_fail_limit: Option<u32>,
    /// Reconciliation worker's breaker fail limit. Default: 10.
    pub reconciliation_breaker_fail_limit: Option<u32>,
    /// Cool-down before a breaker probes again. Default: 60s.
    pub breaker_cooldown_secs: Option<u64>,
    /// Slot-reclaim deadline per job. Default: 120s.
    pub max_job_time_secs: Option<u64>,
    /// Final drain timeout on shutdown. Default: 30s.
    pub shutdown_grace_secs: Option<u64>,
    /// Monitoring tick interval for the scaling algorithm. Default: 10s.
    pub scaling_tick_secs: Option<u64>,
    /// Sweep interval for reclaiming leaked reservations. Default: 60s.
    pub sweeper_interval_secs: Option<u64>,
    /// Path to the relational store file.
    pub store_path: Option<String>,
    /// Emit logs as JSON instead of human-readable text.
    pub json_logs: Option<bool>,
}

impl PipelineConfig {
    pub fn effective_global_llm_concurrency(&self) -> usize {
        self.global_llm_concurrency.unwrap_or(100)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(10_000)
    }

    pub fn effective_outbox_batch(&self) -> usize {
        self.outbox_batch.unwrap_or(100)
    }

    pub fn effective_triangulation_parallelism(&self) -> usize {
        self.triangulation_parallelism.unwrap_or(6)
    }

    pub fn effective_low_confidence_threshold(&self) -> f64 {
        self.low_confidence_threshold.unwrap_or(0.4)
    }

    pub fn effective_escalation_threshold(&self) -> f64 {
        self.escalation_threshold.unwrap_or(0.7)
    }

    pub fn effective_worker_retries(&self) -> u32 {
        self.worker_retries.unwrap_or(3)
    }

    pub fn effective_breaker_fail_limit(&self) -> u32 {
        self.breaker_fail_limit.unwrap_or(5)
    }

    pub fn effective_reconciliation_breaker_fail_limit(&self) -> u32 {
        self.reconciliation_breaker_fail_limit.unwrap_or(10)
    }

    pub fn effective_breaker_cooldown_secs(&self) -> u64 {
        self.breaker_cooldown_secs.unwrap_or(60)
    }

    pub fn effective_max_job_time_secs(&self) -> u64 {
        self.max_job_time_secs.unwrap_or(120)
    }

    pub fn effective_shutdown_grace_secs(&self) -> u64 {
        self.shutdown_grace_secs.unwrap_or(30)
    }

    pub fn effective_scaling_tick_secs(&self) -> u64 {
        self.scaling_tick_secs.unwrap_or(10)
    }

    pub fn effective_sweeper_interval_secs(&self) -> u64 {
        self.sweeper_interval_secs.unwrap_or(60)
    }

    pub fn effective_store_path(&self) -> String {
        self.store_path.clone().unwrap_or_else(|| "ctp.db".to_string())
    }

    pub fn effective_json_logs(&self) -> bool {
        self.json_logs.unwrap_or(false)
    }

    /// Validate the configuration. A `CONFIG` error here is fatal and must
    /// abort before any worker is spawned (§7).
    pub fn validate(&self) -> Result<(), String> {
        if self.effective_global_llm_concurrency() == 0 {
            return Err("global_llm_concurrency must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.effective_low_confidence_threshold()) {
            return Err("low_confidence_threshold must be within [0,1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.effective_escalation_threshold()) {
            return Err("escalation_threshold must be within [0,1]".to_string());
        }
        if self.effective_batch_size() == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        if self.effective_triangulation_parallelism() == 0 {
            return Err("triangulation_parallelism must be > 0".to_string());
        }
        Ok(())
    }

    /// Load from an optional TOML file, then apply `CTP_*` environment
    /// overrides (env wins — matches the teacher's layered-config convention).
    pub fn from_file_and_env(path: Option<&str>) -> Result<Self, String> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| format!("reading config file {p}: {e}"))?;
                toml::from_str(&text).map_err(|e| format!("parsing config file {p}: {e}"))?
            }
            None => Self::default(),
        };
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        macro_rules! env_usize {
            ($var:literal, $field:ident) => {
                if let Ok(v) = std::env::var($var) {
                    if let Ok(parsed) = v.parse() {
                        self.$field = Some(parsed);
                    }
                }
            };
        }
        macro_rules! env_f64 {
            ($var:literal, $field:ident) => {
                if let Ok(v) = std::env::var($var) {
                    if let Ok(parsed) = v.parse() {
                        self.$field = Some(parsed);
                    }
                }
            };
        }
        env_usize!("CTP_GLOBAL_LLM_CONCURRENCY", global_llm_concurrency);
        env_usize!("CTP_BATCH_SIZE", batch_size);
        env_usize!("CTP_OUTBOX_BATCH", outbox_batch);
        env_usize!("CTP_TRIANGULATION_PARALLELISM", triangulation_parallelism);
        env_f64!("CTP_LOW_CONFIDENCE_THRESHOLD", low_confidence_threshold);
        env_f64!("CTP_ESCALATION_THRESHOLD", escalation_threshold);
        if let Ok(v) = std::env::var("CTP_STORE_PATH") {
            self.store_path = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.effective_global_llm_concurrency(), 100);
        assert_eq!(cfg.effective_batch_size(), 10_000);
        assert_eq!(cfg.effective_outbox_batch(), 100);
        assert_eq!(cfg.effective_triangulation_parallelism(), 6);
        assert_eq!(cfg.effective_low_confidence_threshold(), 0.4);
        assert_eq!(cfg.effective_escalation_threshold(), 0.7);
        assert_eq!(cfg.effective_worker_retries(), 3);
        assert_eq!(cfg.effective_breaker_fail_limit(), 5);
        assert_eq!(cfg.effective_reconciliation_breaker_fail_limit(), 10);
        assert_eq!(cfg.effective_breaker_cooldown_secs(), 60);
        assert_eq!(cfg.effective_max_job_time_secs(), 120);
        assert_eq!(cfg.effective_shutdown_grace_secs(), 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let cfg = PipelineConfig {
            global_llm_concurrency: Some(0),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = PipelineConfig {
            low_confidence_threshold: Some(1.5),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
