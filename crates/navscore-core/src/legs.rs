// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::ScoringConfig;
use crate::matcher::CheckpointResult;
use crate::route::FlightPlan;
use crate::track::seconds_between;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegTiming {
    Timed { actual_secs: f64, deviation_secs: f64 },
    /// One of the leg's endpoints was never crossed.
    Missed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegTime {
    pub leg: usize,
    pub from: String,
    pub to: String,
    pub planned_secs: f64,
    pub timing: LegTiming,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegTimes {
    pub legs: Vec<LegTime>,
    pub total_time_penalty: f64,
    pub total_time_deviation: f64,
    pub estimated_total_time: f64,
    pub actual_total_time: Option<f64>,
    pub total_time_error_penalty: f64,
}

/// Penalty for one leg: deviation times rate, capped.
pub fn leg_penalty(deviation_secs: f64, config: &ScoringConfig) -> f64 {
    (deviation_secs.abs() * config.leg_penalty_rate).min(config.max_leg_penalty)
}

/// Times every leg against the plan.
///
/// `departure` is the start-gate crossing, `None` if it was not detected.
/// `gate_name` labels the start of leg 0.
pub fn time_legs(
    departure: Option<DateTime<Utc>>,
    gate_name: &str,
    checkpoints: &[CheckpointResult],
    plan: &FlightPlan,
    config: &ScoringConfig,
) -> LegTimes {
    let boundaries: Vec<Option<DateTime<Utc>>> = std::iter::once(departure)
        .chain(checkpoints.iter().map(|c| c.crossing.time()))
        .collect();

    let legs: Vec<LegTime> = plan
        .leg_time_estimates
        .iter()
        .enumerate()
        .zip(boundaries.windows(2))
        .map(|((leg, &planned_secs), ends)| {
            let from = if leg == 0 {
                gate_name.to_string()
            } else {
                checkpoints[leg - 1].name.clone()
            };
            let to = checkpoints[leg].name.clone();

            let (timing, penalty) = match (ends[0], ends[1]) {
                (Some(start), Some(end)) => {
                    let actual_secs = seconds_between(start, end);
                    let deviation_secs = (actual_secs - planned_secs).abs();
                    (
                        LegTiming::Timed {
                            actual_secs,
                            deviation_secs,
                        },
                        leg_penalty(deviation_secs, config),
                    )
                }
                _ => (LegTiming::Missed, config.max_leg_penalty),
            };
            debug!(
                "[Legs] Leg timed: leg={} from='{}' to='{}' planned={:.1}s timing={:?} penalty={:.2}",
                leg, from, to, planned_secs, timing, penalty
            );

            LegTime {
                leg,
                from,
                to,
                planned_secs,
                timing,
                penalty,
            }
        })
        .collect();

    let total_time_penalty = legs.iter().map(|l| l.penalty).sum();
    let total_time_deviation = legs
        .iter()
        .filter_map(|l| match l.timing {
            LegTiming::Timed { deviation_secs, .. } => Some(deviation_secs),
            LegTiming::Missed => None,
        })
        .sum();

    let actual_total_time = match (departure, boundaries.last().copied().flatten()) {
        (Some(start), Some(end)) if !checkpoints.is_empty() => Some(seconds_between(start, end)),
        _ => None,
    };

    let total_time_error_penalty = if config.total_time_penalty_rate == 0.0 {
        0.0
    } else {
        match actual_total_time {
            Some(actual) => {
                (actual - plan.total_time_estimate).abs() * config.total_time_penalty_rate
            }
            None => config.max_leg_penalty,
        }
    };

    LegTimes {
        legs,
        total_time_penalty,
        total_time_deviation,
        estimated_total_time: plan.estimated_total_time(),
        actual_total_time,
        total_time_error_penalty,
    }
}
