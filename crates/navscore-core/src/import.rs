// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! GPS track import from CSV logs with a `time,lat,lon[,alt]` header.
//! Timestamps are RFC 3339.

use crate::track::Position;
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

pub struct TrackCsvParser;

impl TrackCsvParser {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Position>, ImportError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: Read>(reader: R) -> Result<Vec<Position>, ImportError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for required in ["time", "lat", "lon"] {
            if !headers.iter().any(|h| h == required) {
                return Err(ImportError::Parse(format!(
                    "missing '{}' column in header {:?}",
                    required,
                    headers.iter().collect::<Vec<_>>()
                )));
            }
        }

        let mut points = Vec::new();
        for (row, result) in rdr.deserialize::<Position>().enumerate() {
            let point = result.map_err(|e| {
                if matches!(e.kind(), csv::ErrorKind::Deserialize { .. }) {
                    // +2: one for the header, one for 1-based rows
                    ImportError::Parse(format!("line {}: {}", row + 2, e))
                } else {
                    ImportError::Csv(e)
                }
            })?;
            points.push(point);
        }

        debug!("[Import] Track CSV parsed: points={}", points.len());
        Ok(points)
    }
}
