// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::LatLon;
use crate::{Result, ScoringError};
use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    sequence::separated_pair,
    IResult,
};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub sequence: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Checkpoint {
    pub fn coords(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Ordered checkpoints of a navigation route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    pub checkpoints: Vec<Checkpoint>,
}

impl Route {
    pub fn new(checkpoints: Vec<Checkpoint>) -> Self {
        Self { checkpoints }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.checkpoints.is_empty() {
            return Err(ScoringError::Validation(
                "route has no checkpoints".to_string(),
            ));
        }
        for cp in &self.checkpoints {
            if !cp.coords().is_valid() {
                return Err(ScoringError::Validation(format!(
                    "checkpoint '{}' has invalid coordinates ({}, {})",
                    cp.name, cp.lat, cp.lon
                )));
            }
        }
        for pair in self.checkpoints.windows(2) {
            if pair[1].sequence <= pair[0].sequence {
                return Err(ScoringError::Validation(format!(
                    "checkpoint sequence must increase: '{}' ({}) follows '{}' ({})",
                    pair[1].name, pair[1].sequence, pair[0].name, pair[0].sequence
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    Checkpoint,
    Enroute,
}

/// A hidden waypoint the crew may find in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: SecretKind,
    pub radius_nm: f64,
}

impl Secret {
    pub fn coords(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.coords().is_valid() {
            return Err(ScoringError::Validation(format!(
                "secret '{}' has invalid coordinates ({}, {})",
                self.name, self.lat, self.lon
            )));
        }
        if !(self.radius_nm.is_finite() && self.radius_nm > 0.0) {
            return Err(ScoringError::Validation(format!(
                "secret '{}' radius must be positive, got {}",
                self.name, self.radius_nm
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGate {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl StartGate {
    pub fn coords(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// The crew's pre-filed estimates. Times are seconds; fuel is gallons.
///
/// Leg `i` runs from the start gate (for `i == 0`) or checkpoint `i` to
/// checkpoint `i + 1`, so there is one estimate per checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    #[serde(deserialize_with = "deserialize_leg_times")]
    pub leg_time_estimates: Vec<f64>,
    #[serde(deserialize_with = "deserialize_leg_time")]
    pub total_time_estimate: f64,
    pub fuel_estimate: f64,
}

impl FlightPlan {
    pub fn estimated_total_time(&self) -> f64 {
        self.leg_time_estimates.iter().sum()
    }

    pub fn validate(&self, route: &Route) -> Result<()> {
        if self.leg_time_estimates.len() != route.len() {
            return Err(ScoringError::Validation(format!(
                "plan has {} leg estimates for {} checkpoints",
                self.leg_time_estimates.len(),
                route.len()
            )));
        }
        for (i, secs) in self.leg_time_estimates.iter().enumerate() {
            if !(secs.is_finite() && *secs >= 0.0) {
                return Err(ScoringError::Validation(format!(
                    "leg {} estimate must be a non-negative number of seconds, got {}",
                    i, secs
                )));
            }
        }
        if !(self.total_time_estimate.is_finite() && self.total_time_estimate >= 0.0) {
            return Err(ScoringError::Validation(format!(
                "total time estimate must be non-negative, got {}",
                self.total_time_estimate
            )));
        }
        Ok(())
    }
}

fn number(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>)(input)
}

fn minutes_seconds(input: &str) -> IResult<&str, (u64, u64)> {
    all_consuming(separated_pair(number, char(':'), number))(input)
}

/// Parses `"MM:SS"` (or `"M:SS"`) into seconds.
pub fn parse_mmss(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let (_, (minutes, seconds)) = minutes_seconds(trimmed).map_err(|_| {
        ScoringError::Validation(format!("invalid time '{}', expected MM:SS", trimmed))
    })?;
    if seconds >= 60 {
        return Err(ScoringError::Validation(format!(
            "invalid time '{}', seconds must be below 60",
            trimmed
        )));
    }
    Ok(minutes.saturating_mul(60).saturating_add(seconds) as f64)
}

/// Renders seconds as `M:SS`, with a leading `-` for negative values.
pub fn format_mmss(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let whole = seconds.abs().round() as u64;
    format!("{}{}:{:02}", sign, whole / 60, whole % 60)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegTime {
    Seconds(f64),
    Clock(String),
}

impl LegTime {
    fn into_seconds(self) -> Result<f64> {
        match self {
            LegTime::Seconds(s) => Ok(s),
            LegTime::Clock(text) => parse_mmss(&text),
        }
    }
}

fn deserialize_leg_time<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    LegTime::deserialize(deserializer)?
        .into_seconds()
        .map_err(serde::de::Error::custom)
}

fn deserialize_leg_times<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<LegTime>::deserialize(deserializer)?
        .into_iter()
        .map(|t| t.into_seconds().map_err(serde::de::Error::custom))
        .collect()
}
