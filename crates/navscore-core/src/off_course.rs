// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::{Aggregation, OffCourseConfig};
use crate::geo::{cross_track_nm, LatLon};
use crate::matcher::{passage_index, CheckpointResult};
use crate::route::{Route, StartGate};
use crate::track::Trajectory;
use crate::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OffCourseLeg {
    Measured { deviation_nm: f64, samples: usize },
    /// An endpoint of the leg was never crossed.
    Unavailable,
    /// The planned segment has no direction (zero length or antipodal).
    Degenerate { reason: String },
}

impl OffCourseLeg {
    pub fn deviation_nm(&self) -> f64 {
        match self {
            OffCourseLeg::Measured { deviation_nm, .. } => *deviation_nm,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffCourse {
    pub legs: Vec<OffCourseLeg>,
    pub total_off_course: f64,
    pub penalty: f64,
}

/// Cross-track deviation of samples `from..=to` against `start → end`.
pub fn measure_leg(
    track: &Trajectory,
    from: usize,
    to: usize,
    start: LatLon,
    end: LatLon,
    aggregation: Aggregation,
) -> Result<OffCourseLeg> {
    let slice = &track.points()[from..=to];
    let distances = slice
        .iter()
        .map(|p| cross_track_nm(p.coords(), start, end))
        .collect::<Result<Vec<f64>>>()?;

    let sum: f64 = distances.iter().sum();
    let deviation_nm = match aggregation {
        Aggregation::Sum => sum,
        Aggregation::Mean => sum / distances.len() as f64,
    };
    Ok(OffCourseLeg::Measured {
        deviation_nm,
        samples: distances.len(),
    })
}

/// Measures every leg whose endpoints were both crossed and prices the total.
///
/// A leg runs from the departure, or the passage of the previous checkpoint,
/// to the passage of its own checkpoint. The approach through a checkpoint's
/// radius is flown toward that checkpoint, so it is not charged to the
/// next leg.
pub fn analyze(
    track: &Trajectory,
    route: &Route,
    gate: &StartGate,
    departure_index: Option<usize>,
    checkpoints: &[CheckpointResult],
    radius_nm: f64,
    config: &OffCourseConfig,
) -> OffCourse {
    let passages: Vec<Option<usize>> = route
        .checkpoints
        .iter()
        .zip(checkpoints)
        .map(|(checkpoint, result)| {
            result
                .crossing
                .index()
                .map(|entry| passage_index(track, checkpoint.coords(), entry, radius_nm))
        })
        .collect();
    let leg_starts: Vec<Option<usize>> = std::iter::once(departure_index)
        .chain(passages.iter().copied())
        .collect();
    let starts: Vec<LatLon> = std::iter::once(gate.coords())
        .chain(route.checkpoints.iter().map(|c| c.coords()))
        .collect();

    let legs: Vec<OffCourseLeg> = route
        .checkpoints
        .iter()
        .enumerate()
        .map(|(leg, checkpoint)| match (leg_starts[leg], passages[leg]) {
            (Some(from), Some(to)) => {
                // Overlapping radii can put the previous passage after this one.
                match measure_leg(
                    track,
                    from.min(to),
                    to,
                    starts[leg],
                    checkpoint.coords(),
                    config.aggregation,
                ) {
                    Ok(measured) => {
                        debug!(
                            "[OffCourse] Off-course measured: leg={} to='{}' deviation_nm={:.4}",
                            leg,
                            checkpoint.name,
                            measured.deviation_nm()
                        );
                        measured
                    }
                    Err(e) => {
                        warn!(
                            "[OffCourse] Off-course skipped for degenerate leg: leg={} to='{}' reason={}",
                            leg, checkpoint.name, e
                        );
                        OffCourseLeg::Degenerate {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            _ => OffCourseLeg::Unavailable,
        })
        .collect();

    let total_off_course = legs.iter().map(OffCourseLeg::deviation_nm).sum();
    OffCourse {
        penalty: config.penalty(total_off_course),
        total_off_course,
        legs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::geo::intermediate_point;
    use crate::matcher::CrossingStatus;
    use crate::route::Checkpoint;
    use crate::track::Position;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 14, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn gate() -> StartGate {
        StartGate {
            name: "Gate".to_string(),
            lat: 45.0,
            lon: 7.0,
        }
    }

    fn route() -> Route {
        Route::new(vec![Checkpoint {
            sequence: 1,
            name: "A".to_string(),
            lat: 45.2,
            lon: 7.0,
        }])
    }

    fn matched_at(index: usize) -> Vec<CheckpointResult> {
        vec![CheckpointResult {
            sequence: 1,
            name: "A".to_string(),
            crossing: CrossingStatus::Matched {
                time: t(0),
                index,
                position: LatLon::new(45.2, 7.0),
                distance_nm: 0.0,
            },
        }]
    }

    /// Samples along the gate→A line, shifted east by `east_deg`.
    fn track(east_deg: f64) -> Trajectory {
        let points: Vec<Position> = (0..=10)
            .map(|i| {
                let on = intermediate_point(gate().coords(), LatLon::new(45.2, 7.0), i as f64 / 10.0)
                    .unwrap();
                Position::new(t(i * 30), on.lat, on.lon + east_deg)
            })
            .collect();
        Trajectory::load(&points, &ScoringConfig::default()).unwrap()
    }

    #[test]
    fn test_on_course_is_zero() {
        let result = analyze(
            &track(0.0),
            &route(),
            &gate(),
            Some(0),
            &matched_at(10),
            0.25,
            &OffCourseConfig::default(),
        );
        assert!(result.total_off_course < 1e-6);
        assert_eq!(result.penalty, 0.0);
    }

    #[test]
    fn test_mean_vs_sum() {
        // 0.01 degrees of longitude at 45N is ~0.42 nm
        let tr = track(0.01);
        let mean = measure_leg(
            &tr,
            1,
            9,
            gate().coords(),
            LatLon::new(45.2, 7.0),
            Aggregation::Mean,
        )
        .unwrap();
        let sum = measure_leg(
            &tr,
            1,
            9,
            gate().coords(),
            LatLon::new(45.2, 7.0),
            Aggregation::Sum,
        )
        .unwrap();
        assert!((mean.deviation_nm() - 0.424).abs() < 0.01, "{:?}", mean);
        assert!((sum.deviation_nm() - 9.0 * mean.deviation_nm()).abs() < 1e-9);
    }

    #[test]
    fn test_missed_endpoint_is_unavailable() {
        let missed = vec![CheckpointResult {
            sequence: 1,
            name: "A".to_string(),
            crossing: CrossingStatus::Missed,
        }];
        let result = analyze(
            &track(0.0),
            &route(),
            &gate(),
            Some(0),
            &missed,
            0.25,
            &OffCourseConfig::default(),
        );
        assert_eq!(result.legs, vec![OffCourseLeg::Unavailable]);
        assert_eq!(result.total_off_course, 0.0);
    }

    #[test]
    fn test_degenerate_leg_does_not_fail_run() {
        let on_gate = Route::new(vec![Checkpoint {
            sequence: 1,
            name: "Same".to_string(),
            lat: 45.0,
            lon: 7.0,
        }]);
        let result = analyze(
            &track(0.0),
            &on_gate,
            &gate(),
            Some(0),
            &matched_at(3),
            0.25,
            &OffCourseConfig::default(),
        );
        assert!(matches!(result.legs[0], OffCourseLeg::Degenerate { .. }));
        assert_eq!(result.penalty, 0.0);
    }

    #[test]
    fn test_approach_to_previous_checkpoint_is_not_charged() {
        let a = LatLon::new(45.2, 7.0);
        let b = LatLon::new(45.2, 7.2);
        let two_legs = Route::new(vec![
            Checkpoint {
                sequence: 1,
                name: "A".to_string(),
                lat: a.lat,
                lon: a.lon,
            },
            Checkpoint {
                sequence: 2,
                name: "B".to_string(),
                lat: b.lat,
                lon: b.lon,
            },
        ]);
        // North to A, sample 10 exactly on A, then east to B at sample 20.
        let mut points = track(0.0).points().to_vec();
        points.extend((1..=10).map(|i| {
            let on = intermediate_point(a, b, i as f64 / 10.0).unwrap();
            Position::new(t(300 + i * 30), on.lat, on.lon)
        }));
        let tr = Trajectory::load(&points, &ScoringConfig::default()).unwrap();

        // 1.5 nm radius: sample 9 (1.2 nm south of A) and sample 19 are the entries.
        let crossed = |sequence: u32, name: &str, index: usize, at: LatLon| CheckpointResult {
            sequence,
            name: name.to_string(),
            crossing: CrossingStatus::Matched {
                time: t(index as i64 * 30),
                index,
                position: at,
                distance_nm: 0.0,
            },
        };
        let results = vec![crossed(1, "A", 9, a), crossed(2, "B", 19, b)];

        let config = OffCourseConfig {
            aggregation: Aggregation::Sum,
            ..OffCourseConfig::default()
        };
        let result = analyze(&tr, &two_legs, &gate(), Some(0), &results, 1.5, &config);
        assert!(result.total_off_course < 1e-6, "{:?}", result.legs);

        // Starting the second leg at A's entry would charge the approach.
        let from_entry = measure_leg(&tr, 9, 20, a, b, Aggregation::Sum).unwrap();
        assert!(from_entry.deviation_nm() > 1.0, "{:?}", from_entry);
    }
}
