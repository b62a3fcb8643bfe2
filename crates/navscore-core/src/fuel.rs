// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::ScoringConfig;
use crate::{Result, ScoringError};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelOutcome {
    /// Positive when more fuel was burned than planned.
    pub error_pct: f64,
    pub penalty: f64,
}

/// Signed error of the actual burn against the estimate, in percent.
pub fn fuel_error_pct(estimated: f64, actual: f64) -> Result<f64> {
    if !(estimated.is_finite() && estimated > 0.0) {
        return Err(ScoringError::Validation(format!(
            "fuel estimate must be positive, got {}",
            estimated
        )));
    }
    if !(actual.is_finite() && actual >= 0.0) {
        return Err(ScoringError::Validation(format!(
            "actual fuel must be non-negative, got {}",
            actual
        )));
    }
    Ok((actual - estimated) * 100.0 / estimated)
}

/// Penalty for the part of the error outside the tolerance band.
pub fn fuel_penalty(error_pct: f64, config: &ScoringConfig) -> f64 {
    let excess = error_pct.abs() - config.fuel_tolerance_pct;
    if excess <= 0.0 {
        return 0.0;
    }
    let rate = if error_pct > 0.0 {
        config.fuel.over_burn_rate
    } else {
        config.fuel.under_burn_rate
    };
    (excess * rate).min(config.fuel.max_penalty)
}

pub fn evaluate_fuel(estimated: f64, actual: f64, config: &ScoringConfig) -> Result<FuelOutcome> {
    let error_pct = fuel_error_pct(estimated, actual)?;
    let penalty = fuel_penalty(error_pct, config);
    debug!(
        "[Fuel] Fuel evaluated: estimated={} actual={} error_pct={:.2} penalty={:.2}",
        estimated, actual, error_pct, penalty
    );
    Ok(FuelOutcome { error_pct, penalty })
}
