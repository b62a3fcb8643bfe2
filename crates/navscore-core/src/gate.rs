// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Locates the departure through the start gate, which anchors leg 0.

use crate::config::{StartGateConfig, MAX_GATE_STEPS};
use crate::geo::distance_nm;
use crate::route::StartGate;
use crate::track::Trajectory;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateDeparture {
    Detected {
        index: usize,
        time: DateTime<Utc>,
        distance_nm: f64,
    },
    NotDetected,
}

impl GateDeparture {
    pub fn index(&self) -> Option<usize> {
        match self {
            GateDeparture::Detected { index, .. } => Some(*index),
            GateDeparture::NotDetected => None,
        }
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            GateDeparture::Detected { time, .. } => Some(*time),
            GateDeparture::NotDetected => None,
        }
    }
}

/// Finds the departure point near `gate`.
///
/// The search radius widens step by step; at the first radius with any
/// candidate, the closest one wins. Candidates moving at takeoff speed are
/// preferred over stationary ones so that taxi and run-up samples near the
/// gate do not count as the departure.
pub fn detect_departure(
    track: &Trajectory,
    gate: &StartGate,
    config: &StartGateConfig,
) -> GateDeparture {
    let span_ns = (track.end_time() - track.start_time())
        .num_nanoseconds()
        .unwrap_or(i64::MAX);
    let limit = track.start_time()
        + Duration::nanoseconds((span_ns as f64 * config.search_fraction) as i64);

    let candidates: Vec<(usize, f64, bool)> = track
        .points()
        .iter()
        .enumerate()
        .take_while(|(_, p)| p.time <= limit)
        .map(|(i, p)| {
            let moving = track
                .ground_speed_kts(i)
                .is_some_and(|kts| kts >= config.takeoff_speed_kts);
            (i, distance_nm(p.coords(), gate.coords()), moving)
        })
        .collect();

    let steps = ((config.max_radius_nm - config.initial_radius_nm) / config.radius_step_nm
        + 1e-9)
        .floor()
        .min(MAX_GATE_STEPS as f64) as usize;

    for step in 0..=steps {
        let radius = config.initial_radius_nm + step as f64 * config.radius_step_nm;
        let within = || candidates.iter().filter(move |(_, d, _)| *d <= radius);

        let best = closest(within().filter(|(_, _, moving)| *moving))
            .or_else(|| closest(within()));

        if let Some((index, distance)) = best {
            debug!(
                "[Gate] Start gate departure found: gate='{}' index={} distance_nm={:.4} radius_nm={:.2}",
                gate.name, index, distance, radius
            );
            return GateDeparture::Detected {
                index,
                time: track.points()[index].time,
                distance_nm: distance,
            };
        }
    }

    warn!(
        "[Gate] No start gate departure found: gate='{}' max_radius_nm={:.2}",
        gate.name, config.max_radius_nm
    );
    GateDeparture::NotDetected
}

/// Closest candidate; the earliest wins a tie.
fn closest<'a>(candidates: impl Iterator<Item = &'a (usize, f64, bool)>) -> Option<(usize, f64)> {
    candidates.fold(None, |best: Option<(usize, f64)>, &(i, d, _)| match best {
        Some((_, best_d)) if best_d <= d => best,
        _ => Some((i, d)),
    })
}
