// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cursor position on the editing surface.
//!
//! The cursor addresses one `(string, beat)` cell. Vertical movement wraps
//! around the string count; horizontal movement clamps at the grid bounds.

/// Cursor movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// A `(string, beat)` cell address, always valid for the current surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    /// String index, 0-based from the lowest string
    pub string: usize,
    /// Index into the beat grid
    pub beat_index: usize,
}

impl CursorPosition {
    /// Create a cursor at a cell
    pub fn new(string: usize, beat_index: usize) -> Self {
        Self { string, beat_index }
    }

    /// The cell one step in the given direction.
    ///
    /// Up/down wrap around `string_count`; left/right clamp to
    /// `[0, beat_count)`. With an empty grid the beat index stays 0.
    pub fn stepped(self, direction: Direction, string_count: usize, beat_count: usize) -> Self {
        if string_count == 0 {
            return self;
        }
        match direction {
            Direction::Up => Self {
                string: (self.string as i64 - 1).rem_euclid(string_count as i64) as usize,
                ..self
            },
            Direction::Down => Self {
                string: (self.string + 1) % string_count,
                ..self
            },
            Direction::Left => Self {
                beat_index: self.beat_index.saturating_sub(1),
                ..self
            },
            Direction::Right => Self {
                beat_index: if beat_count == 0 {
                    0
                } else {
                    (self.beat_index + 1).min(beat_count - 1)
                },
                ..self
            },
        }
    }

    /// The cursor with its beat index clamped to the grid
    pub fn clamped(self, string_count: usize, beat_count: usize) -> Self {
        Self {
            string: if string_count == 0 {
                0
            } else {
                self.string.min(string_count - 1)
            },
            beat_index: if beat_count == 0 {
                0
            } else {
                self.beat_index.min(beat_count - 1)
            },
        }
    }
}
