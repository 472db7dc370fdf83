// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Copy/paste in beat-relative coordinates.
//!
//! Copy stores deep clones of the selection. Paste re-anchors the block: the
//! earliest copied note lands on the target beat and every other note keeps
//! its beat-index offset from that anchor. Offsets are counted in grid
//! positions, not seconds, so a block copied from a rubato section pastes
//! cleanly into a steady one.
//!
//! Paste overwrites occupied destination cells, while direct insertion
//! rejects collisions. The asymmetry is intentional and load-bearing for
//! repeated paste-over-paste workflows.

use tracing::debug;

use crate::grid::BeatGrid;
use crate::store::{Note, NoteStore};

/// Holds copied notes and re-anchors them on paste.
#[derive(Debug, Default)]
pub struct ClipboardEngine {
    buffer: Vec<Note>,
}

impl ClipboardEngine {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the clipboard holds no notes
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of buffered notes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// The buffered notes
    pub fn contents(&self) -> &[Note] {
        &self.buffer
    }

    /// Replace the buffer with deep copies of the selection.
    ///
    /// Copying nothing is a no-op; the previous buffer survives.
    pub fn copy(&mut self, selection: &[Note]) {
        if selection.is_empty() {
            return;
        }
        self.buffer = selection.to_vec();
        self.buffer
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time).then(a.string.cmp(&b.string)));
        debug!(notes = self.buffer.len(), "copied selection to clipboard");
    }

    /// Paste the buffer with its earliest note anchored at `target_beat_index`.
    ///
    /// Notes whose shifted index falls past the end of the grid are skipped
    /// individually; the rest of the block still lands. Returns the placed
    /// notes (with fresh ids) so the caller can select them.
    pub fn paste(
        &self,
        target_beat_index: usize,
        grid: &BeatGrid,
        store: &mut NoteStore,
    ) -> Vec<Note> {
        if self.buffer.is_empty() || grid.is_empty() {
            return Vec::new();
        }

        let min_start = self
            .buffer
            .iter()
            .map(|n| n.start_time)
            .fold(f64::INFINITY, f64::min);
        let Some(anchor_index) = grid.beat_index_of(min_start) else {
            // The grid was rebuilt since the copy; the buffer's times no
            // longer name beats, so there is no offset to preserve.
            debug!("clipboard anchor not on current grid, paste skipped");
            return Vec::new();
        };

        let mut candidates = Vec::with_capacity(self.buffer.len());
        for note in &self.buffer {
            let Some(source_index) = grid.beat_index_of(note.start_time) else {
                debug!(time = note.start_time, "copied note not on current grid, skipped");
                continue;
            };
            let dest_index = target_beat_index + (source_index - anchor_index);
            let Some(dest_beat) = grid.beat(dest_index) else {
                debug!(dest_index, "paste destination past end of grid, note skipped");
                continue;
            };
            let mut placed = note.clone();
            placed.start_time = dest_beat.start;
            placed.end_time = dest_beat.start;
            placed.id = 0;
            candidates.push(placed);
        }

        store.place_all(candidates)
    }
}
