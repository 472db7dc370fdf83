// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Interface to the external music-analysis pipeline.
//!
//! The analysis runner is a separate process owned by the surrounding
//! application; all this module knows is its beats output: a line-oriented
//! text file with one `"<start> <beatNum>"` pair per line. Parsing feeds the
//! beat grid, and `BeatsWatcher` reports when a re-analysis rewrites the
//! file so the grid can be rebuilt wholesale.

pub mod watcher;

pub use watcher::{AnalysisEvent, BeatsWatcher};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::music::Beat;

/// Errors reading analysis output
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read beats file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed beat on line {line}: {text:?}")]
    Malformed { line: usize, text: String },
}

/// Parse beats from the analysis runner's text output.
///
/// Whitespace is normalized per line, blank lines are skipped, and any line
/// that does not yield a float start and an integer beat number is a typed
/// error naming the line.
pub fn parse_beats(text: &str) -> Result<Vec<Beat>, AnalysisError> {
    let mut beats = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let (Some(start), Some(beat_num)) = (fields.next(), fields.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(AnalysisError::Malformed {
                line: i + 1,
                text: line.to_string(),
            });
        };
        let malformed = || AnalysisError::Malformed {
            line: i + 1,
            text: line.to_string(),
        };
        let start: f64 = start.parse().map_err(|_| malformed())?;
        let beat_num: u32 = beat_num.parse().map_err(|_| malformed())?;
        beats.push(Beat::new(start, beat_num));
    }
    Ok(beats)
}

/// Read and parse a beats file
pub fn read_beats_file<P: AsRef<Path>>(path: P) -> Result<Vec<Beat>, AnalysisError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_beats(&text)
}
