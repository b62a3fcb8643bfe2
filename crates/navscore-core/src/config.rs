// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Scoring policy. Every threshold the engine uses lives here so the policy can
//! change without touching the matching or timing code.

use crate::{Result, ScoringError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Acceptance radius around each route checkpoint.
    pub checkpoint_radius_nm: f64,
    /// Points lost per second of leg time deviation.
    pub leg_penalty_rate: f64,
    /// Cap for a single leg, also charged for legs that cannot be timed.
    pub max_leg_penalty: f64,
    /// Fuel error band, in percent, that costs nothing.
    pub fuel_tolerance_pct: f64,
    /// Longer tracks are rejected before any processing.
    pub max_trajectory_points: usize,
    /// How far a timestamp may step backwards before the track is rejected.
    pub timestamp_jitter_secs: f64,
    /// Points per second between the filed total time and the flown total. 0 disables.
    pub total_time_penalty_rate: f64,
    pub start_gate: StartGateConfig,
    pub off_course: OffCourseConfig,
    pub fuel: FuelConfig,
    pub secrets: SecretsConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            checkpoint_radius_nm: 0.25,
            leg_penalty_rate: 0.1,
            max_leg_penalty: 10.0,
            fuel_tolerance_pct: 10.0,
            max_trajectory_points: 100_000,
            timestamp_jitter_secs: 1.0,
            total_time_penalty_rate: 0.0,
            start_gate: StartGateConfig::default(),
            off_course: OffCourseConfig::default(),
            fuel: FuelConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

/// Upper bound on radius steps in the start gate search.
pub const MAX_GATE_STEPS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartGateConfig {
    pub initial_radius_nm: f64,
    pub max_radius_nm: f64,
    pub radius_step_nm: f64,
    /// Candidates at or above this ground speed are preferred.
    pub takeoff_speed_kts: f64,
    /// Share of the track's time span searched for the departure.
    pub search_fraction: f64,
}

impl Default for StartGateConfig {
    fn default() -> Self {
        Self {
            initial_radius_nm: 0.02,
            max_radius_nm: 0.10,
            radius_step_nm: 0.01,
            takeoff_speed_kts: 10.0,
            search_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffCourseConfig {
    /// How a leg's per-point cross-track distances are reduced to one number.
    pub aggregation: Aggregation,
    pub tolerance_nm: f64,
    pub min_penalty: f64,
    pub max_penalty: f64,
    pub max_distance_nm: f64,
}

impl Default for OffCourseConfig {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::Mean,
            tolerance_nm: 0.25,
            min_penalty: 1.0,
            max_penalty: 6.0,
            max_distance_nm: 5.0,
        }
    }
}

impl OffCourseConfig {
    /// Piecewise-linear penalty for an accumulated off-course distance.
    pub fn penalty(&self, total_nm: f64) -> f64 {
        if total_nm <= self.tolerance_nm {
            0.0
        } else if total_nm >= self.max_distance_nm {
            self.max_penalty
        } else {
            let fraction =
                (total_nm - self.tolerance_nm) / (self.max_distance_nm - self.tolerance_nm);
            self.min_penalty + fraction * (self.max_penalty - self.min_penalty)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    /// Points per percent beyond tolerance when more fuel was burned than planned.
    pub over_burn_rate: f64,
    /// Points per percent beyond tolerance when less fuel was burned than planned.
    pub under_burn_rate: f64,
    pub max_penalty: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            over_burn_rate: 0.5,
            under_burn_rate: 0.25,
            max_penalty: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub checkpoint_penalty: f64,
    pub enroute_penalty: f64,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            checkpoint_penalty: 2.0,
            enroute_penalty: 1.0,
        }
    }
}

fn require(ok: bool, message: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(ScoringError::Validation(message()))
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl ScoringConfig {
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(content).context("Failed to parse scoring config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid scoring config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        require(positive(self.checkpoint_radius_nm), || {
            format!(
                "checkpoint_radius_nm must be positive, got {}",
                self.checkpoint_radius_nm
            )
        })?;
        for (name, value) in [
            ("leg_penalty_rate", self.leg_penalty_rate),
            ("max_leg_penalty", self.max_leg_penalty),
            ("fuel_tolerance_pct", self.fuel_tolerance_pct),
            ("timestamp_jitter_secs", self.timestamp_jitter_secs),
            ("total_time_penalty_rate", self.total_time_penalty_rate),
            ("off_course.tolerance_nm", self.off_course.tolerance_nm),
            ("off_course.min_penalty", self.off_course.min_penalty),
            ("fuel.over_burn_rate", self.fuel.over_burn_rate),
            ("fuel.under_burn_rate", self.fuel.under_burn_rate),
            ("fuel.max_penalty", self.fuel.max_penalty),
            ("secrets.checkpoint_penalty", self.secrets.checkpoint_penalty),
            ("secrets.enroute_penalty", self.secrets.enroute_penalty),
        ] {
            require(non_negative(value), || {
                format!("{} must be a non-negative number, got {}", name, value)
            })?;
        }
        require(self.max_trajectory_points >= 2, || {
            format!(
                "max_trajectory_points must be at least 2, got {}",
                self.max_trajectory_points
            )
        })?;

        let gate = &self.start_gate;
        require(
            positive(gate.initial_radius_nm) && positive(gate.radius_step_nm),
            || "start_gate radii and step must be positive".to_string(),
        )?;
        require(
            gate.max_radius_nm.is_finite() && gate.max_radius_nm >= gate.initial_radius_nm,
            || {
                format!(
                    "start_gate.max_radius_nm ({}) is below initial_radius_nm ({})",
                    gate.max_radius_nm, gate.initial_radius_nm
                )
            },
        )?;
        let steps = (gate.max_radius_nm - gate.initial_radius_nm) / gate.radius_step_nm;
        require(steps <= MAX_GATE_STEPS as f64, || {
            format!(
                "start_gate radius search would take {:.0} steps, at most {} allowed",
                steps, MAX_GATE_STEPS
            )
        })?;
        require(non_negative(gate.takeoff_speed_kts), || {
            "start_gate.takeoff_speed_kts must be non-negative".to_string()
        })?;
        require(
            gate.search_fraction > 0.0 && gate.search_fraction <= 1.0,
            || {
                format!(
                    "start_gate.search_fraction must be in (0, 1], got {}",
                    gate.search_fraction
                )
            },
        )?;

        let oc = &self.off_course;
        require(
            oc.max_distance_nm.is_finite() && oc.max_distance_nm > oc.tolerance_nm,
            || {
                format!(
                    "off_course.max_distance_nm ({}) must exceed tolerance_nm ({})",
                    oc.max_distance_nm, oc.tolerance_nm
                )
            },
        )?;
        require(
            oc.max_penalty.is_finite() && oc.max_penalty >= oc.min_penalty,
            || {
                format!(
                    "off_course.max_penalty ({}) is below min_penalty ({})",
                    oc.max_penalty, oc.min_penalty
                )
            },
        )?;

        Ok(())
    }
}
