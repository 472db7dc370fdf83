// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Shared music-domain types for the tab editor.
//!
//! Provides the beat type produced by song analysis, note classification,
//! the instrument set with its tunings, and the float-time comparison used
//! throughout the editing core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tolerance for comparing note/beat times.
///
/// Note times are always copied from the parsed beat list, so equal times are
/// bit-identical in practice; the epsilon only guards against text-format
/// round trips of the analysis output.
pub const TIME_EPSILON: f64 = 1e-6;

/// Compare two times for grid equality
pub fn same_time(a: f64, b: f64) -> bool {
    (a - b).abs() < TIME_EPSILON
}

/// A single beat from the song's analysis output.
///
/// The beat sequence is immutable once analysis completes; when the song is
/// re-analyzed the whole grid is rebuilt from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Absolute position in the song, in seconds
    pub start: f64,
    /// Beat number within the measure; 1 marks a downbeat
    pub beat_num: u32,
}

impl Beat {
    /// Sentinel returned when no beat grid is loaded
    pub const SENTINEL: Beat = Beat {
        start: 0.0,
        beat_num: 0,
    };

    /// Create a new beat
    pub fn new(start: f64, beat_num: u32) -> Self {
        Self { start, beat_num }
    }

    /// Whether this beat starts a measure
    pub fn is_downbeat(&self) -> bool {
        self.beat_num == 1
    }
}

/// Classification of a placed note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// A single fretted note
    #[default]
    Note,
    /// A chord shape anchored at this cell
    Chord,
}

/// Instruments a project can carry charts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Instrument {
    LeadGuitar,
    RhythmGuitar,
    BassGuitar,
    Ukulele,
}

impl Instrument {
    /// All instruments in display order
    pub const ALL: [Instrument; 4] = [
        Instrument::LeadGuitar,
        Instrument::RhythmGuitar,
        Instrument::BassGuitar,
        Instrument::Ukulele,
    ];

    /// Default number of strings for this instrument
    pub fn string_count(self) -> usize {
        match self {
            Instrument::LeadGuitar | Instrument::RhythmGuitar => 6,
            Instrument::BassGuitar | Instrument::Ukulele => 4,
        }
    }

    /// Human-readable title
    pub fn title(self) -> &'static str {
        match self {
            Instrument::LeadGuitar => "Lead Guitar",
            Instrument::RhythmGuitar => "Rhythm Guitar",
            Instrument::BassGuitar => "Bass Guitar",
            Instrument::Ukulele => "Ukulele",
        }
    }

    /// Stable key used in file names and serialized documents
    pub fn key(self) -> &'static str {
        match self {
            Instrument::LeadGuitar => "leadGuitar",
            Instrument::RhythmGuitar => "rhythmGuitar",
            Instrument::BassGuitar => "bassGuitar",
            Instrument::Ukulele => "ukulele",
        }
    }

    /// Parse from the serialized key
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "leadGuitar" => Some(Instrument::LeadGuitar),
            "rhythmGuitar" => Some(Instrument::RhythmGuitar),
            "bassGuitar" => Some(Instrument::BassGuitar),
            "ukulele" => Some(Instrument::Ukulele),
            _ => None,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Standard six-string tuning, low to high
pub const BASE_TUNING: [&str; 6] = ["E", "A", "D", "G", "B", "E"];

/// Semitone offsets from standard tuning, per string
pub type TuningOffsets = [i8; 6];

/// Look up a named tuning as semitone offsets from E standard
pub fn tuning_offsets(name: &str) -> Option<TuningOffsets> {
    match name {
        "E_Standard" => Some([0, 0, 0, 0, 0, 0]),
        "Eb_Standard" => Some([-1, -1, -1, -1, -1, -1]),
        "Drop_D" => Some([-2, 0, 0, 0, 0, 0]),
        "D_Standard" => Some([-2, -2, -2, -2, -2, -2]),
        "D_Drop_C" => Some([-4, -2, -2, -2, -2, -2]),
        "C_Standard" => Some([-4, -4, -4, -4, -4, -4]),
        "B_Standard" => Some([-5, -5, -5, -5, -5, -5]),
        "Open_A" => Some([0, 0, 2, 2, 2, 0]),
        "Open_D" => Some([-2, 0, 0, -1, -2, -2]),
        "Open_G" => Some([-2, -2, 0, 0, 0, -2]),
        "Open_E" => Some([0, 2, 2, 1, 0, 0]),
        "DADGAD" => Some([-2, 0, 0, 0, -2, -2]),
        _ => None,
    }
}
