// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Runs one scoring request end to end and assembles the breakdown.

use crate::config::ScoringConfig;
use crate::fuel::evaluate_fuel;
use crate::gate::{detect_departure, GateDeparture};
use crate::legs::{time_legs, LegTime};
use crate::matcher::{match_route, Anchor, CheckpointResult};
use crate::off_course::{self, OffCourseLeg};
use crate::route::{FlightPlan, Route, Secret, StartGate};
use crate::secrets::{detect_secrets, SecretFind};
use crate::track::{Position, Trajectory};
use crate::{Result, MAX_SCORE};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything needed to score one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub route: Route,
    #[serde(default)]
    pub secrets: Vec<Secret>,
    pub start_gate: StartGate,
    pub plan: FlightPlan,
    pub trajectory: Vec<Position>,
    pub actual_fuel: f64,
    #[serde(default)]
    pub config: ScoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub departure: GateDeparture,
    pub checkpoint_results: Vec<CheckpointResult>,
    pub legs: Vec<LegTime>,
    /// Sum of the per-leg penalties.
    pub total_time_penalty: f64,
    /// Sum of absolute deviations of the legs that could be timed, in seconds.
    pub total_time_deviation: f64,
    pub estimated_total_time: f64,
    pub actual_total_time: Option<f64>,
    pub total_time_error_penalty: f64,
    pub off_course_legs: Vec<OffCourseLeg>,
    pub total_off_course: f64,
    pub off_course_penalty: f64,
    pub fuel_error_pct: f64,
    pub fuel_penalty: f64,
    pub secrets_found: Vec<SecretFind>,
    pub secrets_missed_checkpoint: usize,
    pub secrets_missed_enroute: usize,
    pub secrets_penalty: f64,
    pub overall_score: f64,
}

impl ScoreBreakdown {
    pub fn total_penalty(&self) -> f64 {
        self.total_time_penalty
            + self.total_time_error_penalty
            + self.off_course_penalty
            + self.fuel_penalty
            + self.secrets_penalty
    }
}

fn validate(request: &ScoreRequest) -> Result<()> {
    request.config.validate()?;
    request.route.validate()?;
    request.plan.validate(&request.route)?;
    for secret in &request.secrets {
        secret.validate()?;
    }
    Ok(())
}

/// Scores one flight. Pure: the same request always yields the same breakdown.
///
/// Structural problems with the inputs are errors; anything the crew did
/// wrong in the air (missed checkpoints or secrets, poor timing, fuel) is
/// scored instead.
pub fn score_flight(request: &ScoreRequest) -> Result<ScoreBreakdown> {
    validate(request)?;
    let config = &request.config;
    // Fuel inputs are checked before the track is touched.
    let fuel = evaluate_fuel(request.plan.fuel_estimate, request.actual_fuel, config)?;
    let track = Trajectory::load(&request.trajectory, config)?;

    let departure = detect_departure(&track, &request.start_gate, &config.start_gate);
    let anchor = departure.index().map_or(Anchor::TrackStart, Anchor::After);
    let checkpoint_results =
        match_route(&track, &request.route, anchor, config.checkpoint_radius_nm);

    let times = time_legs(
        departure.time(),
        &request.start_gate.name,
        &checkpoint_results,
        &request.plan,
        config,
    );
    let off_course = off_course::analyze(
        &track,
        &request.route,
        &request.start_gate,
        departure.index(),
        &checkpoint_results,
        config.checkpoint_radius_nm,
        &config.off_course,
    );
    let secrets = detect_secrets(&track, &request.secrets, &config.secrets);

    let mut breakdown = ScoreBreakdown {
        departure,
        checkpoint_results,
        legs: times.legs,
        total_time_penalty: times.total_time_penalty,
        total_time_deviation: times.total_time_deviation,
        estimated_total_time: times.estimated_total_time,
        actual_total_time: times.actual_total_time,
        total_time_error_penalty: times.total_time_error_penalty,
        off_course_legs: off_course.legs,
        total_off_course: off_course.total_off_course,
        off_course_penalty: off_course.penalty,
        fuel_error_pct: fuel.error_pct,
        fuel_penalty: fuel.penalty,
        secrets_found: secrets.found,
        secrets_missed_checkpoint: secrets.missed_checkpoint,
        secrets_missed_enroute: secrets.missed_enroute,
        secrets_penalty: secrets.penalty,
        overall_score: MAX_SCORE,
    };
    breakdown.overall_score = (MAX_SCORE - breakdown.total_penalty()).clamp(0.0, MAX_SCORE);

    let matched = breakdown
        .checkpoint_results
        .iter()
        .filter(|c| c.crossing.is_matched())
        .count();
    info!(
        "[Score] Flight scored: checkpoints={}/{} total_deviation={:.1}s off_course_nm={:.3} fuel_error_pct={:.2} score={:.2}",
        matched,
        breakdown.checkpoint_results.len(),
        breakdown.total_time_deviation,
        breakdown.total_off_course,
        breakdown.fuel_error_pct,
        breakdown.overall_score
    );

    Ok(breakdown)
}

/// Scores independent requests in parallel. Results keep the input order.
pub fn score_batch(requests: &[ScoreRequest]) -> Vec<Result<ScoreBreakdown>> {
    requests.par_iter().map(score_flight).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Checkpoint;
    use crate::ScoringError;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 14, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn request() -> ScoreRequest {
        ScoreRequest {
            route: Route::new(vec![Checkpoint {
                sequence: 1,
                name: "A".to_string(),
                lat: 45.1,
                lon: 7.0,
            }]),
            secrets: Vec::new(),
            start_gate: StartGate {
                name: "Gate".to_string(),
                lat: 45.0,
                lon: 7.0,
            },
            plan: FlightPlan {
                leg_time_estimates: vec![360.0],
                total_time_estimate: 360.0,
                fuel_estimate: 10.0,
            },
            trajectory: (0..=12)
                .map(|i| Position::new(t(i * 30), 45.0 + i as f64 * 0.01, 7.0))
                .collect(),
            actual_fuel: 10.0,
            config: ScoringConfig::default(),
        }
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let breakdown = score_flight(&request()).unwrap();
        assert!(breakdown.departure.index().is_some());
        assert!(breakdown.checkpoint_results[0].crossing.is_matched());
        assert!(
            (breakdown.overall_score - (MAX_SCORE - breakdown.total_penalty())).abs() < 1e-9
        );
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let mut req = request();
        req.config.leg_penalty_rate = 1000.0;
        req.config.max_leg_penalty = 1000.0;
        req.plan.leg_time_estimates = vec![10.0];
        let breakdown = score_flight(&req).unwrap();
        assert!(breakdown.total_penalty() > MAX_SCORE);
        assert_eq!(breakdown.overall_score, 0.0);
    }

    #[test]
    fn test_fuel_validation_aborts() {
        let mut req = request();
        req.plan.fuel_estimate = 0.0;
        assert!(matches!(
            score_flight(&req),
            Err(ScoringError::Validation(_))
        ));
    }

    #[test]
    fn test_batch_keeps_order() {
        let good = request();
        let mut bad = request();
        bad.trajectory.truncate(1);
        let results = score_batch(&[good.clone(), bad, good]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(ScoringError::InsufficientData { points: 1 })
        );
        assert_eq!(results[0], results[2]);
    }

    #[test]
    fn test_request_json_uses_default_config() {
        let json = serde_json::to_value(request()).unwrap();
        let mut object = json.as_object().unwrap().clone();
        object.remove("config");
        object.remove("secrets");
        let parsed: ScoreRequest = serde_json::from_value(object.into()).unwrap();
        assert_eq!(parsed.config, ScoringConfig::default());
        assert!(parsed.secrets.is_empty());
    }

    #[test]
    fn test_undetected_departure_scans_from_first_sample() {
        let mut req = request();
        req.start_gate.lat = 46.0;
        req.route.checkpoints[0].lat = 45.0;
        let breakdown = score_flight(&req).unwrap();
        assert_eq!(breakdown.departure, GateDeparture::NotDetected);
        let crossing = &breakdown.checkpoint_results[0].crossing;
        assert_eq!(crossing.index(), Some(0));
        assert_eq!(crossing.time(), Some(t(0)));
    }
}
