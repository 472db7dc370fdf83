// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! rstab - Beat-synchronized tablature editing engine
//!
//! The editing core for a guitar tab editor whose horizontal axis is song
//! time: every note sits on a beat detected by audio analysis, not on a
//! fixed subdivision grid.
//!
//! Features:
//! - Beat grid mapping pixels, song time, and beat indices, with memoized
//!   nearest-beat snapping
//! - Note store enforcing cell uniqueness and time ordering, flushing full
//!   snapshots to persistence on every structural change
//! - Selection state machine for pointer and keyboard interaction
//! - Beat-relative clipboard that re-anchors pasted blocks
//! - Versioned JSON note files with background coalesced writes
//! - Beats-file watching for re-analysis, with debouncing
//! - Configurable keyboard bindings and TOML editor configuration

pub mod analysis;
pub mod config;
pub mod control;
pub mod editor;
pub mod grid;
pub mod music;
pub mod persist;
pub mod store;

pub use analysis::{parse_beats, read_beats_file, AnalysisEvent, BeatsWatcher};
pub use config::EditorConfig;
pub use control::{EditAction, KeyboardController};
pub use editor::{
    ChangeEvent, ClipboardEngine, CursorPosition, Direction, EditorState, NeckLayout,
    SelectionController, TabEditor,
};
pub use grid::{BeatGrid, Snap};
pub use music::{Beat, Instrument, NoteKind};
pub use persist::{FileAdapter, NoteFile, PersistenceAdapter};
pub use store::{Note, NoteId, NoteStore, Take};
