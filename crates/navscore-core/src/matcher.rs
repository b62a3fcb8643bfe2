// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! One-pass checkpoint matching.
//!
//! Checkpoints are visited in route order. Each search starts just after the
//! anchor left by the previous step (the departure, or the previous match), so
//! a checkpoint can never be matched with samples that precede an earlier one.
//! Without a departure the scan starts at the first sample.

use crate::geo::{distance_nm, intermediate_point, LatLon};
use crate::route::{Checkpoint, Route};
use crate::track::{seconds_between, Trajectory};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrossingStatus {
    Matched {
        /// Estimated instant the track entered the acceptance radius.
        time: DateTime<Utc>,
        /// First trajectory index inside the radius.
        index: usize,
        /// Interpolated entry position.
        position: LatLon,
        /// Distance of the sample at `index` from the checkpoint.
        distance_nm: f64,
    },
    Missed,
}

impl CrossingStatus {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            CrossingStatus::Matched { time, .. } => Some(*time),
            CrossingStatus::Missed => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            CrossingStatus::Matched { index, .. } => Some(*index),
            CrossingStatus::Missed => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, CrossingStatus::Matched { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub sequence: u32,
    pub name: String,
    pub crossing: CrossingStatus,
}

/// Where the scan stands between checkpoints. Misses leave it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Nothing consumed yet; the first sample is eligible.
    TrackStart,
    /// Samples up to and including this index are consumed.
    After(usize),
}

impl Anchor {
    fn first_scanned(self) -> usize {
        match self {
            Anchor::TrackStart => 0,
            Anchor::After(index) => index + 1,
        }
    }

    fn previous(self) -> Option<usize> {
        match self {
            Anchor::TrackStart => None,
            Anchor::After(index) => Some(index),
        }
    }

    fn after(self, crossing: &CrossingStatus) -> Anchor {
        crossing.index().map_or(self, Anchor::After)
    }
}

/// Matches every checkpoint of `route` in order, starting from `start`.
pub fn match_route(
    track: &Trajectory,
    route: &Route,
    start: Anchor,
    radius_nm: f64,
) -> Vec<CheckpointResult> {
    route
        .checkpoints
        .iter()
        .scan(start, |anchor, checkpoint| {
            let crossing = match_checkpoint(track, checkpoint, *anchor, radius_nm);
            *anchor = anchor.after(&crossing);
            Some(CheckpointResult {
                sequence: checkpoint.sequence,
                name: checkpoint.name.clone(),
                crossing,
            })
        })
        .collect()
}

/// Scans forward past `anchor` for the first sample within `radius_nm`.
pub fn match_checkpoint(
    track: &Trajectory,
    checkpoint: &Checkpoint,
    anchor: Anchor,
    radius_nm: f64,
) -> CrossingStatus {
    let points = track.points();
    let target = checkpoint.coords();
    let mut previous = anchor
        .previous()
        .and_then(|i| points.get(i))
        .map(|p| distance_nm(p.coords(), target));

    for index in anchor.first_scanned()..points.len() {
        let here = distance_nm(points[index].coords(), target);
        if here <= radius_nm {
            let (time, position) = match previous {
                Some(before) if before > radius_nm => {
                    entry_estimate(track, index, before, here, radius_nm, target)
                }
                _ => (points[index].time, points[index].coords()),
            };
            debug!(
                "[Matcher] Checkpoint matched: name='{}' index={} distance_nm={:.4} time={}",
                checkpoint.name,
                index,
                here,
                time.to_rfc3339()
            );
            return CrossingStatus::Matched {
                time,
                index,
                position,
                distance_nm: here,
            };
        }
        previous = Some(here);
    }

    warn!(
        "[Matcher] Checkpoint missed: name='{}' radius_nm={} scanned_from={}",
        checkpoint.name,
        radius_nm,
        anchor.first_scanned()
    );
    CrossingStatus::Missed
}

/// Closest sample to `target` during the stay inside `radius_nm` that starts
/// at `entry`. Ties go to the earliest sample.
pub fn passage_index(track: &Trajectory, target: LatLon, entry: usize, radius_nm: f64) -> usize {
    let points = track.points();
    let mut best = (entry, f64::INFINITY);
    for (index, point) in points.iter().enumerate().skip(entry) {
        let here = distance_nm(point.coords(), target);
        if index > entry && here > radius_nm {
            break;
        }
        if here < best.1 {
            best = (index, here);
        }
    }
    best.0
}

/// Linear interpolation of the radius entry between sample `index - 1`
/// (outside, at `before` nm) and sample `index` (inside, at `here` nm).
fn entry_estimate(
    track: &Trajectory,
    index: usize,
    before: f64,
    here: f64,
    radius_nm: f64,
    target: LatLon,
) -> (DateTime<Utc>, LatLon) {
    let points = track.points();
    let (outside, inside) = (&points[index - 1], &points[index]);
    let fraction = ((before - radius_nm) / (before - here)).clamp(0.0, 1.0);

    let span = seconds_between(outside.time, inside.time);
    let time = outside.time + Duration::nanoseconds((span * fraction * 1e9).round() as i64);

    let position = match intermediate_point(outside.coords(), inside.coords(), fraction) {
        Ok(p) => p,
        Err(e) => {
            debug!(
                "[Matcher] Entry position fell back to sample: index={} target=({}, {}) reason={}",
                index, target.lat, target.lon, e
            );
            inside.coords()
        }
    };
    (time, position)
}
