// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Secret waypoints. Each one is searched over the whole track, in no
//! particular order, since crews may find them in any sequence.

use crate::config::SecretsConfig;
use crate::geo::distance_nm;
use crate::route::{Secret, SecretKind};
use crate::track::Trajectory;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretFind {
    pub name: String,
    pub kind: SecretKind,
    /// Position of the first sample inside the secret's radius.
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretsOutcome {
    pub found: Vec<SecretFind>,
    pub missed_checkpoint: usize,
    pub missed_enroute: usize,
    pub penalty: f64,
}

/// First sample within `secret.radius_nm`, if any.
pub fn find_secret(track: &Trajectory, secret: &Secret) -> Option<SecretFind> {
    let target = secret.coords();
    track
        .points()
        .iter()
        .find(|p| distance_nm(p.coords(), target) <= secret.radius_nm)
        .map(|p| SecretFind {
            name: secret.name.clone(),
            kind: secret.kind,
            lat: p.lat,
            lon: p.lon,
            timestamp: p.time,
        })
}

pub fn detect_secrets(
    track: &Trajectory,
    secrets: &[Secret],
    config: &SecretsConfig,
) -> SecretsOutcome {
    let mut found = Vec::new();
    let (mut missed_checkpoint, mut missed_enroute) = (0usize, 0usize);

    for secret in secrets {
        match find_secret(track, secret) {
            Some(find) => {
                debug!(
                    "[Secrets] Secret found: name='{}' kind={:?} time={}",
                    find.name,
                    find.kind,
                    find.timestamp.to_rfc3339()
                );
                found.push(find);
            }
            None => {
                debug!("[Secrets] Secret missed: name='{}' kind={:?}", secret.name, secret.kind);
                match secret.kind {
                    SecretKind::Checkpoint => missed_checkpoint += 1,
                    SecretKind::Enroute => missed_enroute += 1,
                }
            }
        }
    }

    let penalty = missed_checkpoint as f64 * config.checkpoint_penalty
        + missed_enroute as f64 * config.enroute_penalty;
    info!(
        "[Secrets] Secrets checked: found={} missed_checkpoint={} missed_enroute={} penalty={:.2}",
        found.len(),
        missed_checkpoint,
        missed_enroute,
        penalty
    );

    SecretsOutcome {
        found,
        missed_checkpoint,
        missed_enroute,
        penalty,
    }
}
