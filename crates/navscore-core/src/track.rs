// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::ScoringConfig;
use crate::geo::{distance_nm, LatLon};
use crate::{Result, ScoringError};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// One recorded GPS sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub time: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub alt: Option<f64>,
}

impl Position {
    pub fn new(time: DateTime<Utc>, lat: f64, lon: f64) -> Self {
        Self {
            time,
            lat,
            lon,
            alt: None,
        }
    }

    pub fn coords(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    fn same_sample(&self, other: &Position) -> bool {
        self.time == other.time
            && self.lat == other.lat
            && self.lon == other.lon
            && self.alt == other.alt
    }
}

/// Seconds from `from` to `to` with sub-second precision. Negative if `to` is earlier.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// A validated flight track: at least two points, non-decreasing timestamps,
/// no consecutive duplicates. Only [`Trajectory::load`] constructs one.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: Vec<Position>,
}

impl Trajectory {
    /// Validates raw samples into a trajectory.
    ///
    /// The size limit is checked before anything else is looked at. Samples that
    /// step backwards by no more than `timestamp_jitter_secs` are put back in
    /// order; anything larger is a [`ScoringError::MalformedTrack`].
    pub fn load(samples: &[Position], config: &ScoringConfig) -> Result<Self> {
        if samples.len() > config.max_trajectory_points {
            return Err(ScoringError::ResourceLimit {
                points: samples.len(),
                max: config.max_trajectory_points,
            });
        }
        if samples.len() < 2 {
            return Err(ScoringError::InsufficientData {
                points: samples.len(),
            });
        }

        for (index, p) in samples.iter().enumerate() {
            if !p.coords().is_valid() {
                return Err(ScoringError::MalformedTrack {
                    index,
                    reason: format!("invalid coordinates ({}, {})", p.lat, p.lon),
                });
            }
            if matches!(p.alt, Some(alt) if !alt.is_finite()) {
                return Err(ScoringError::MalformedTrack {
                    index,
                    reason: "non-finite altitude".to_string(),
                });
            }
        }

        let mut latest = samples[0].time;
        let mut jittered = 0usize;
        for (index, p) in samples.iter().enumerate().skip(1) {
            if p.time < latest {
                let back = seconds_between(p.time, latest);
                if back > config.timestamp_jitter_secs {
                    return Err(ScoringError::MalformedTrack {
                        index,
                        reason: format!(
                            "timestamp {} is {:.3}s earlier than {}",
                            p.time.to_rfc3339(),
                            back,
                            latest.to_rfc3339()
                        ),
                    });
                }
                jittered += 1;
            } else {
                latest = p.time;
            }
        }

        let mut points = samples.to_vec();
        if jittered > 0 {
            // Stable, so samples sharing a timestamp keep their recorded order.
            points.sort_by_key(|p| p.time);
        }

        let before = points.len();
        points.dedup_by(|later, earlier| later.same_sample(earlier));
        let dropped = before - points.len();

        if points.len() < 2 {
            return Err(ScoringError::InsufficientData {
                points: points.len(),
            });
        }

        if jittered > 0 || dropped > 0 {
            debug!(
                "[Track] Track cleaned: reordered_samples={} duplicates_dropped={}",
                jittered, dropped
            );
        }
        info!(
            "[Track] Track loaded: points={} start={} end={}",
            points.len(),
            points[0].time.to_rfc3339(),
            points[points.len() - 1].time.to_rfc3339()
        );

        Ok(Self { points })
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A loaded trajectory holds at least two points, so this is false.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.points[0].time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].time
    }

    pub fn duration_secs(&self) -> f64 {
        seconds_between(self.start_time(), self.end_time())
    }

    /// Ground speed in knots from point `index` to the next one, falling back to
    /// the previous segment for the last point. `None` when no time elapsed.
    pub fn ground_speed_kts(&self, index: usize) -> Option<f64> {
        let (a, b) = if index + 1 < self.points.len() {
            (&self.points[index], &self.points[index + 1])
        } else if index > 0 && index < self.points.len() {
            (&self.points[index - 1], &self.points[index])
        } else {
            return None;
        };
        let secs = seconds_between(a.time, b.time);
        if secs <= 0.0 {
            return None;
        }
        Some(distance_nm(a.coords(), b.coords()) / (secs / 3600.0))
    }
}
