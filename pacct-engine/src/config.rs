//! Run settings for the scoring and queue commands
//!
//! Resolution order for each value: CLI flag → `[scoring]` / `[gate]` in the
//! TOML config → built-in default.

use crate::validators::IndirectFilter;
use pacct_common::config::TomlConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Default number of persons returned in `top_person_scores`
pub const DEFAULT_TOP_N: usize = 50;

/// Default size of `indirect_identity_unresolved_sample`
pub const DEFAULT_UNRESOLVED_SAMPLE: usize = 20;

/// Coverage metrics the scoring report computes
pub const COVERAGE_METRICS: [&str; 7] = [
    "fragment_personal_coverage_pct",
    "primary_evidence_pct",
    "indirect_identity_resolved_pct",
    "official_alias_resolution_pct",
    "manual_alias_resolution_pct",
    "official_alias_evidence_pct",
    "official_alias_source_record_pct",
];

/// Built-in gate thresholds; `manual_alias_resolution_pct` is reported only
pub fn default_thresholds() -> BTreeMap<String, f64> {
    [
        ("fragment_personal_coverage_pct", 0.5),
        ("primary_evidence_pct", 0.5),
        ("indirect_identity_resolved_pct", 0.5),
        ("official_alias_resolution_pct", 0.0),
        ("official_alias_evidence_pct", 0.0),
        ("official_alias_source_record_pct", 0.0),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

/// Effective settings of one scoring run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringSettings {
    pub filter: IndirectFilter,
    pub top_n: usize,
    pub unresolved_sample_size: usize,
    pub thresholds: BTreeMap<String, f64>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            filter: IndirectFilter::default(),
            top_n: DEFAULT_TOP_N,
            unresolved_sample_size: DEFAULT_UNRESOLVED_SAMPLE,
            thresholds: default_thresholds(),
        }
    }
}

impl ScoringSettings {
    /// Built-in defaults overlaid with the TOML `[scoring]` and `[gate]` tables
    pub fn from_toml(toml: &TomlConfig) -> Self {
        let mut settings = Self::default();
        let scoring = &toml.scoring;

        if let Some(value) = scoring.confidence_min {
            settings.filter.confidence_min = value;
        }
        if let Some(value) = scoring.max_causal_distance {
            settings.filter.max_causal_distance = value;
        }
        if let Some(value) = scoring.top_n {
            settings.top_n = value;
        }
        if let Some(value) = scoring.unresolved_sample_size {
            settings.unresolved_sample_size = value;
        }
        for (name, value) in &toml.gate {
            settings.set_threshold(name, *value);
        }
        settings
    }

    /// Set one gate threshold; unknown metric names are kept but logged
    pub fn set_threshold(&mut self, name: &str, value: f64) {
        if !COVERAGE_METRICS.contains(&name) {
            warn!(metric = name, "Threshold for unknown coverage metric");
        }
        self.thresholds.insert(name.to_string(), value);
    }
}

/// Parse a `name=value` threshold override
pub fn parse_threshold(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing metric name in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid threshold value in '{}'", raw))?;
    if !value.is_finite() {
        return Err(format!("invalid threshold value in '{}'", raw));
    }
    Ok((name.to_string(), value))
}
