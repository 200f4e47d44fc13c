//! Gate/Status Engine
//!
//! ratio → threshold → check → AND-gate → three-state status. Every report
//! (scoring, import, review application) is evaluated through `GateBuilder`.

use serde::Serialize;
use std::collections::BTreeMap;

/// Three-state run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Cohort non-empty and every check passed
    Ok,
    /// Cohort non-empty, at least one check failed
    Degraded,
    /// Nothing to evaluate
    Failed,
}

impl RunStatus {
    /// Status state machine
    pub fn from_gate(cohort_empty: bool, gate_passed: bool) -> Self {
        match (cohort_empty, gate_passed) {
            (true, _) => Self::Failed,
            (false, true) => Self::Ok,
            (false, false) => Self::Degraded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        }
    }
}

/// Named coverage ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ratio {
    pub numerator: usize,
    pub denominator: usize,
    pub value: f64,
}

impl Ratio {
    /// `numerator / denominator`, 0.0 for an empty denominator
    pub fn of(numerator: usize, denominator: usize) -> Self {
        let value = if denominator == 0 {
            0.0
        } else {
            numerator as f64 / denominator as f64
        };
        Self {
            numerator,
            denominator,
            value,
        }
    }
}

/// One threshold comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub value: f64,
    pub threshold: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gate {
    pub passed: bool,
    pub thresholds: BTreeMap<String, f64>,
}

/// Evaluated coverage, checks, gate and status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateEvaluation {
    pub status: RunStatus,
    pub coverage: BTreeMap<String, Ratio>,
    pub checks: BTreeMap<String, Check>,
    pub gate: Gate,
}

/// Collects ratios and boolean requirements, then evaluates them
#[derive(Debug, Default)]
pub struct GateBuilder {
    thresholds: BTreeMap<String, f64>,
    coverage: BTreeMap<String, Ratio>,
    requirements: BTreeMap<String, bool>,
}

impl GateBuilder {
    pub fn new(thresholds: BTreeMap<String, f64>) -> Self {
        Self {
            thresholds,
            ..Default::default()
        }
    }

    /// Record a coverage ratio; gated only if a threshold exists for `name`
    pub fn ratio(&mut self, name: &str, numerator: usize, denominator: usize) -> &mut Self {
        self.coverage
            .insert(name.to_string(), Ratio::of(numerator, denominator));
        self
    }

    /// Record a boolean requirement (threshold 1.0 on a 0/1 value)
    pub fn require(&mut self, name: &str, holds: bool) -> &mut Self {
        self.requirements.insert(name.to_string(), holds);
        self
    }

    pub fn evaluate(&self, cohort_empty: bool) -> GateEvaluation {
        let mut checks = BTreeMap::new();

        for (name, ratio) in &self.coverage {
            if let Some(threshold) = self.thresholds.get(name) {
                checks.insert(
                    name.clone(),
                    Check {
                        value: ratio.value,
                        threshold: *threshold,
                        passed: ratio.value >= *threshold,
                    },
                );
            }
        }

        let mut thresholds = self.thresholds.clone();
        for (name, holds) in &self.requirements {
            let value = if *holds { 1.0 } else { 0.0 };
            thresholds.insert(name.clone(), 1.0);
            checks.insert(
                name.clone(),
                Check {
                    value,
                    threshold: 1.0,
                    passed: *holds,
                },
            );
        }

        let passed = checks.values().all(|c| c.passed);

        GateEvaluation {
            status: RunStatus::from_gate(cohort_empty, passed),
            coverage: self.coverage.clone(),
            checks,
            gate: Gate { passed, thresholds },
        }
    }
}
