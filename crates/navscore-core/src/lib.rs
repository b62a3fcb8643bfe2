// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Flight scoring engine for navigation rallies.
//!
//! Given a pre-filed [`FlightPlan`], the [`Route`] it was filed against and a
//! recorded GPS track, [`score_flight`] produces a [`ScoreBreakdown`] that
//! explains every point lost. The engine holds no state between calls.

pub mod config;
pub mod fuel;
pub mod gate;
pub mod geo;
pub mod import;
pub mod legs;
pub mod matcher;
pub mod off_course;
pub mod route;
pub mod score;
pub mod secrets;
pub mod track;

use thiserror::Error;

pub use config::ScoringConfig;
pub use route::{Checkpoint, FlightPlan, Route, Secret, SecretKind, StartGate};
pub use score::{score_batch, score_flight, ScoreBreakdown, ScoreRequest};
pub use track::{Position, Trajectory};

/// Upper bound of [`ScoreBreakdown::overall_score`]. A perfect flight scores this.
pub const MAX_SCORE: f64 = 100.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Insufficient track data: {points} point(s), at least 2 required")]
    InsufficientData { points: usize },
    #[error("Malformed track at point {index}: {reason}")]
    MalformedTrack { index: usize, reason: String },
    #[error("Track has {points} points, limit is {max}")]
    ResourceLimit { points: usize, max: usize },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
