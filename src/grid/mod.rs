// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat grid: mapping between pixels, song time, and beats.
//!
//! The grid owns the immutable beat sequence for the loaded song and
//! converts among the three coordinate spaces the editor works in:
//! - horizontal pixel offset on the editing surface
//! - absolute song time in seconds
//! - index into the beat sequence
//!
//! Nearest-beat lookups are memoized per input time so that repeated
//! pointer-move events during a single drag do not re-scan the sequence.
//! The cache is dropped wholesale whenever the grid is rebuilt.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::music::{same_time, Beat};

/// Result of snapping a time to the grid.
///
/// When the grid is empty, `beat_index` is `None`, `beat` is the sentinel,
/// and `time` echoes the unsnapped input (editing is effectively disabled
/// until a beat grid exists).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    /// Index of the snapped beat in the grid
    pub beat_index: Option<usize>,
    /// The snapped beat, or `Beat::SENTINEL`
    pub beat: Beat,
    /// The snapped time (`beat.start`), or the raw input time
    pub time: f64,
}

/// Bidirectional pixel / time / beat mapping with memoized snapping.
#[derive(Debug, Default)]
pub struct BeatGrid {
    beats: Vec<Beat>,
    // Keyed by the input time's bit pattern; pointer-move events repeat
    // exact f64 values, which is what makes this worth caching.
    snap_cache: RefCell<HashMap<u64, Snap>>,
}

impl BeatGrid {
    /// Create a grid from an ordered beat sequence
    pub fn new(beats: Vec<Beat>) -> Self {
        Self {
            beats,
            snap_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Create an empty grid (no analysis loaded yet)
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The beat sequence
    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    /// Number of beats in the grid
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    /// Whether the grid has no beats
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Beat at the given index
    pub fn beat(&self, index: usize) -> Option<&Beat> {
        self.beats.get(index)
    }

    /// Replace the beat sequence after re-analysis.
    ///
    /// Invalidates the entire snap cache; stale entries would otherwise
    /// point at beats that no longer exist.
    pub fn rebuild(&mut self, beats: Vec<Beat>) {
        debug!(beats = beats.len(), "rebuilding beat grid");
        self.beats = beats;
        self.snap_cache.borrow_mut().clear();
    }

    /// Convert a pixel offset to song time by linear proportion
    pub fn time_at(pixel_x: f64, track_width_px: f64, duration_sec: f64) -> f64 {
        if track_width_px <= 0.0 {
            return 0.0;
        }
        pixel_x / track_width_px * duration_sec
    }

    /// Convert a song time to a pixel offset by linear proportion
    pub fn pixel_at(time: f64, track_width_px: f64, duration_sec: f64) -> f64 {
        if duration_sec <= 0.0 {
            return 0.0;
        }
        time / duration_sec * track_width_px
    }

    /// Snap a time to the nearest beat.
    ///
    /// Linear scan over the beat sequence; song beat counts are small enough
    /// that no tree structure is required. Results are memoized per input
    /// time value.
    pub fn snap_time(&self, time: f64) -> Snap {
        if self.beats.is_empty() {
            return Snap {
                beat_index: None,
                beat: Beat::SENTINEL,
                time,
            };
        }

        let key = time.to_bits();
        if let Some(hit) = self.snap_cache.borrow().get(&key) {
            return *hit;
        }

        let mut best = 0usize;
        for (i, beat) in self.beats.iter().enumerate() {
            if (beat.start - time).abs() < (self.beats[best].start - time).abs() {
                best = i;
            }
        }

        let snap = Snap {
            beat_index: Some(best),
            beat: self.beats[best],
            time: self.beats[best].start,
        };
        self.snap_cache.borrow_mut().insert(key, snap);
        snap
    }

    /// Snap a pixel offset to the nearest beat, returning the snapped pixel
    /// position alongside the beat.
    ///
    /// With an empty grid the raw pixel position comes back unchanged with
    /// the sentinel beat.
    pub fn snap_pixel(&self, pixel_x: f64, track_width_px: f64, duration_sec: f64) -> (f64, Beat) {
        let time = Self::time_at(pixel_x, track_width_px, duration_sec);
        let snap = self.snap_time(time);
        match snap.beat_index {
            Some(_) => (
                Self::pixel_at(snap.time, track_width_px, duration_sec),
                snap.beat,
            ),
            None => (pixel_x, Beat::SENTINEL),
        }
    }

    /// Find the index of the beat whose start equals the given time.
    ///
    /// Used by the clipboard to recover beat indices from note times, which
    /// are beat-quantized by construction.
    pub fn beat_index_of(&self, time: f64) -> Option<usize> {
        self.beats.iter().position(|b| same_time(b.start, time))
    }

    #[cfg(test)]
    pub(crate) fn cache_len(&self) -> usize {
        self.snap_cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_beat_grid() -> BeatGrid {
        BeatGrid::new(vec![
            Beat::new(0.0, 1),
            Beat::new(0.5, 2),
            Beat::new(1.0, 3),
            Beat::new(1.5, 4),
        ])
    }

    #[test]
    fn test_time_pixel_mapping() {
        // 1000 px track over a 10 second song
        assert_eq!(BeatGrid::time_at(500.0, 1000.0, 10.0), 5.0);
        assert_eq!(BeatGrid::pixel_at(5.0, 1000.0, 10.0), 500.0);
        // Degenerate geometry maps to zero rather than NaN
        assert_eq!(BeatGrid::time_at(500.0, 0.0, 10.0), 0.0);
        assert_eq!(BeatGrid::pixel_at(5.0, 1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_snap_time_nearest() {
        let grid = four_beat_grid();

        let snap = grid.snap_time(0.6);
        assert_eq!(snap.beat_index, Some(1));
        assert_eq!(snap.time, 0.5);

        let snap = grid.snap_time(1.4);
        assert_eq!(snap.beat_index, Some(3));
        assert_eq!(snap.time, 1.5);

        // Beyond the last beat clamps to it
        let snap = grid.snap_time(9.0);
        assert_eq!(snap.beat_index, Some(3));
    }

    #[test]
    fn test_snap_tie_prefers_earlier_beat() {
        let grid = four_beat_grid();
        // 0.25 is equidistant from 0.0 and 0.5
        let snap = grid.snap_time(0.25);
        assert_eq!(snap.beat_index, Some(0));
    }

    #[test]
    fn test_snap_empty_grid_sentinel() {
        let grid = BeatGrid::empty();
        let snap = grid.snap_time(1.23);
        assert_eq!(snap.beat_index, None);
        assert_eq!(snap.beat, Beat::SENTINEL);
        assert_eq!(snap.time, 1.23);

        let (px, beat) = grid.snap_pixel(42.0, 1000.0, 10.0);
        assert_eq!(px, 42.0);
        assert_eq!(beat, Beat::SENTINEL);
    }

    #[test]
    fn test_snap_pixel_round_trip() {
        let grid = four_beat_grid();
        // 10 second song on 1000 px; 0.6s is at px 60, should snap to 0.5s / px 50
        let (px, beat) = grid.snap_pixel(60.0, 1000.0, 10.0);
        assert!((px - 50.0).abs() < 1e-9);
        assert_eq!(beat.start, 0.5);
    }

    #[test]
    fn test_snap_cache_memoizes_and_invalidates() {
        let mut grid = four_beat_grid();
        assert_eq!(grid.cache_len(), 0);

        grid.snap_time(0.6);
        grid.snap_time(0.6);
        grid.snap_time(0.6);
        assert_eq!(grid.cache_len(), 1);

        grid.snap_time(1.4);
        assert_eq!(grid.cache_len(), 2);

        grid.rebuild(vec![Beat::new(0.0, 1), Beat::new(1.0, 2)]);
        assert_eq!(grid.cache_len(), 0);
        let snap = grid.snap_time(0.6);
        assert_eq!(snap.beat_index, Some(1));
    }

    #[test]
    fn test_beat_index_of() {
        let grid = four_beat_grid();
        assert_eq!(grid.beat_index_of(1.0), Some(2));
        assert_eq!(grid.beat_index_of(1.0 + 1e-9), Some(2));
        assert_eq!(grid.beat_index_of(0.75), None);
    }
}
