// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Spherical-earth geodesy in nautical miles.
//!
//! Accuracy is that of a sphere of radius [`EARTH_RADIUS_NM`], which is well
//! inside the tolerances used for checkpoint and secret acceptance.

use crate::{Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Mean earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Angular separations below this are treated as the same point (~0.6 mm).
const COINCIDENT_RAD: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Central angle between two coordinates, in radians (haversine).
fn central_angle(a: LatLon, b: LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for near-antipodal pairs.
    let h = h.clamp(0.0, 1.0);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in nautical miles.
pub fn distance_nm(a: LatLon, b: LatLon) -> f64 {
    central_angle(a, b) * EARTH_RADIUS_NM
}

/// Initial true bearing from `a` to `b`, radians in `(-π, π]`.
pub fn initial_bearing(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lon = (b.lon - a.lon).to_radians();
    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    y.atan2(x)
}

/// Initial true bearing in degrees, `[0, 360)`.
pub fn bearing_deg(a: LatLon, b: LatLon) -> f64 {
    (initial_bearing(a, b).to_degrees() + 360.0) % 360.0
}

/// Point at `fraction` of the way along the great circle from `a` to `b`.
///
/// `fraction` is clamped to `[0, 1]`. Coincident endpoints return `a`.
pub fn intermediate_point(a: LatLon, b: LatLon, fraction: f64) -> Result<LatLon> {
    let f = fraction.clamp(0.0, 1.0);
    let delta = central_angle(a, b);
    if delta < COINCIDENT_RAD {
        return Ok(a);
    }
    let sin_delta = delta.sin();
    if sin_delta.abs() < COINCIDENT_RAD {
        return Err(ScoringError::DegenerateGeometry(format!(
            "no unique great circle between antipodal points ({}, {}) and ({}, {})",
            a.lat, a.lon, b.lat, b.lon
        )));
    }

    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let wa = ((1.0 - f) * delta).sin() / sin_delta;
    let wb = (f * delta).sin() / sin_delta;

    let x = wa * lat1.cos() * lon1.cos() + wb * lat2.cos() * lon2.cos();
    let y = wa * lat1.cos() * lon1.sin() + wb * lat2.cos() * lon2.sin();
    let z = wa * lat1.sin() + wb * lat2.sin();

    Ok(LatLon {
        lat: z.atan2((x * x + y * y).sqrt()).to_degrees(),
        lon: y.atan2(x).to_degrees(),
    })
}

/// Shortest distance in nautical miles from `point` to the great-circle arc
/// `start → end`.
///
/// Points abeam the arc get the perpendicular (cross-track) distance; points
/// before `start` or past `end` get the distance to that endpoint. Zero-length
/// and antipodal arcs have no defined direction and fail with
/// [`ScoringError::DegenerateGeometry`].
pub fn cross_track_nm(point: LatLon, start: LatLon, end: LatLon) -> Result<f64> {
    let d12 = central_angle(start, end);
    if d12 < COINCIDENT_RAD {
        return Err(ScoringError::DegenerateGeometry(format!(
            "zero-length segment at ({}, {})",
            start.lat, start.lon
        )));
    }
    if std::f64::consts::PI - d12 < COINCIDENT_RAD * 1e3 {
        return Err(ScoringError::DegenerateGeometry(format!(
            "antipodal segment ({}, {}) -> ({}, {})",
            start.lat, start.lon, end.lat, end.lon
        )));
    }

    let d13 = central_angle(start, point);
    if d13 < COINCIDENT_RAD {
        return Ok(0.0);
    }

    let theta = initial_bearing(start, point) - initial_bearing(start, end);
    let xt = (d13.sin() * theta.sin()).clamp(-1.0, 1.0).asin();

    // Behind the start of the arc.
    if theta.cos() < 0.0 {
        return Ok(d13 * EARTH_RADIUS_NM);
    }

    let cos_xt = xt.cos();
    let along = if cos_xt.abs() < COINCIDENT_RAD {
        0.0
    } else {
        (d13.cos() / cos_xt).clamp(-1.0, 1.0).acos()
    };
    if along > d12 {
        return Ok(distance_nm(point, end));
    }

    Ok(xt.abs() * EARTH_RADIUS_NM)
}
