// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The tab editor facade.
//!
//! `TabEditor` wires the beat grid, note store, selection controller, and
//! clipboard into one command surface. Pointer input arrives in surface
//! pixels and is resolved through `NeckLayout` and the grid before any
//! component sees it; keyboard input arrives as `EditAction` values from the
//! control layer. Registered listeners are notified after each command that
//! changed observable state.

pub mod clipboard;
pub mod cursor;
pub mod selection;

pub use clipboard::ClipboardEngine;
pub use cursor::{CursorPosition, Direction};
pub use selection::{EditorState, SelectionController};

use std::sync::Arc;

use crossterm::event::{KeyModifiers, MouseButton};
use tracing::info;

use crate::config::EditorConfig;
use crate::control::EditAction;
use crate::grid::BeatGrid;
use crate::music::{Beat, Instrument};
use crate::persist::PersistenceAdapter;
use crate::store::{Note, NoteId, NoteStore};

/// Geometry of the editing surface.
///
/// A pure model of the neck: horizontal position is song time, vertical
/// position is a string lane. No drawing happens here; the surrounding
/// application owns rendering and feeds the same numbers back in.
#[derive(Debug, Clone, Copy)]
pub struct NeckLayout {
    /// Number of string lanes
    pub string_count: usize,
    /// Height of one string lane in pixels
    pub lane_height_px: f64,
    /// Width of the track area in pixels
    pub track_width_px: f64,
    /// Length of the loaded song in seconds
    pub duration_sec: f64,
}

impl NeckLayout {
    /// Build a layout for an instrument from the editor configuration
    pub fn for_instrument(
        instrument: Instrument,
        config: &EditorConfig,
        track_width_px: f64,
        duration_sec: f64,
    ) -> Self {
        Self {
            string_count: config.instrument(instrument).strings,
            lane_height_px: config.lane_height_px,
            track_width_px,
            duration_sec,
        }
    }

    /// The string lane containing a vertical pixel offset, if any
    pub fn string_at_y(&self, y: f64) -> Option<usize> {
        if y < 0.0 || self.lane_height_px <= 0.0 {
            return None;
        }
        let lane = (y / self.lane_height_px) as usize;
        (lane < self.string_count).then_some(lane)
    }

    /// Top edge of a string lane in pixels
    pub fn y_for_string(&self, string: usize) -> f64 {
        string as f64 * self.lane_height_px
    }
}

/// Observable state changes, reported to registered listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Notes were added, removed, or edited
    NotesChanged,
    /// The selection changed
    SelectionChanged,
    /// The cursor moved
    CursorMoved,
    /// The beat grid was rebuilt from new analysis output
    GridRebuilt,
    /// A different take or instrument was opened
    TakeSwitched,
}

type ChangeListener = Box<dyn FnMut(ChangeEvent)>;

/// Coordinates grid, store, selection, and clipboard behind one command API.
pub struct TabEditor {
    grid: BeatGrid,
    store: NoteStore,
    controller: SelectionController,
    clipboard: ClipboardEngine,
    layout: NeckLayout,
    adapter: Option<Arc<dyn PersistenceAdapter>>,
    listeners: Vec<ChangeListener>,
}

impl TabEditor {
    /// Create an editor for an instrument with no persistence attached
    pub fn new(instrument: Instrument, take_index: usize, layout: NeckLayout) -> Self {
        Self {
            grid: BeatGrid::empty(),
            store: NoteStore::new(instrument, take_index),
            controller: SelectionController::new(layout.string_count),
            clipboard: ClipboardEngine::new(),
            layout,
            adapter: None,
            listeners: Vec::new(),
        }
    }

    /// Attach a persistence adapter; future mutations flush through it
    pub fn set_adapter(&mut self, adapter: Arc<dyn PersistenceAdapter>) {
        self.store.set_adapter(adapter.clone());
        self.adapter = Some(adapter);
    }

    /// Register a listener for observable state changes
    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    // -- Read views ---------------------------------------------------------

    /// Notes of the active take, sorted by start time
    pub fn notes(&self) -> &[Note] {
        self.store.notes()
    }

    /// Currently selected notes
    pub fn selection(&self) -> &[Note] {
        self.controller.selection()
    }

    /// Current cursor cell
    pub fn cursor(&self) -> CursorPosition {
        self.controller.cursor()
    }

    /// Current interaction state
    pub fn state(&self) -> EditorState {
        self.controller.state()
    }

    /// The beat grid
    pub fn grid(&self) -> &BeatGrid {
        &self.grid
    }

    /// The note store
    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// The clipboard
    pub fn clipboard(&self) -> &ClipboardEngine {
        &self.clipboard
    }

    /// Surface geometry
    pub fn layout(&self) -> NeckLayout {
        self.layout
    }

    // -- Grid and geometry --------------------------------------------------

    /// Replace the beat grid after re-analysis.
    ///
    /// Existing notes keep their times even if those no longer fall on
    /// beats; the cursor is clamped to the new grid bounds.
    pub fn rebuild_grid(&mut self, beats: Vec<Beat>) {
        self.grid.rebuild(beats);
        let clamped = self
            .controller
            .cursor()
            .clamped(self.controller.string_count(), self.grid.len());
        if clamped != self.controller.cursor() {
            self.controller.reset_cursor(clamped);
        }
        self.emit(ChangeEvent::GridRebuilt);
    }

    /// Update the surface geometry (resize, new song duration).
    ///
    /// Shrinking the string count clamps the cursor the same way a grid
    /// rebuild clamps the beat axis.
    pub fn set_geometry(&mut self, layout: NeckLayout) {
        self.layout = layout;
        self.controller.set_string_count(layout.string_count);
        let clamped = self
            .controller
            .cursor()
            .clamped(layout.string_count, self.grid.len());
        if clamped != self.controller.cursor() {
            self.controller.reset_cursor(clamped);
            self.emit(ChangeEvent::CursorMoved);
        }
    }

    // -- Take lifecycle -----------------------------------------------------

    /// Open a take: load it through the adapter and reset transient state.
    ///
    /// The clipboard deliberately survives a switch so copy in one take can
    /// paste into another. Requires an adapter.
    pub fn open_take(
        &mut self,
        instrument: Instrument,
        take_index: usize,
    ) -> crate::persist::Result<()> {
        // The surface geometry must track the new instrument even when no
        // persistence is attached, or stale lanes keep accepting clicks.
        self.layout.string_count = instrument.string_count();
        let Some(adapter) = self.adapter.clone() else {
            // No persistence: still switch, just with an empty take
            self.store = NoteStore::new(instrument, take_index);
            self.controller.reset(instrument.string_count());
            self.emit(ChangeEvent::TakeSwitched);
            return Ok(());
        };
        let take = adapter.load(instrument, take_index)?;
        info!(
            instrument = instrument.key(),
            take_index,
            notes = take.notes.len(),
            "opened take"
        );
        self.store = NoteStore::from_take(instrument, take_index, take);
        self.store.set_adapter(adapter);
        self.controller.reset(instrument.string_count());
        self.emit(ChangeEvent::TakeSwitched);
        Ok(())
    }

    // -- Pointer commands ---------------------------------------------------

    /// Click on the surface at pixel coordinates
    pub fn click_at(&mut self, x_px: f64, y_px: f64, modifiers: KeyModifiers) {
        let Some(string) = self.layout.string_at_y(y_px) else {
            return;
        };
        let time = BeatGrid::time_at(x_px, self.layout.track_width_px, self.layout.duration_sec);
        let snap = self.grid.snap_time(time);
        let notes_before = self.store.len();
        self.controller
            .click_cell(string as u32, snap, modifiers, &mut self.store);
        if self.store.len() != notes_before {
            self.emit(ChangeEvent::NotesChanged);
        }
        self.emit(ChangeEvent::SelectionChanged);
        self.emit(ChangeEvent::CursorMoved);
    }

    /// Click directly on a note glyph
    pub fn click_note(&mut self, id: NoteId, button: MouseButton, modifiers: KeyModifiers) {
        let notes_before = self.store.len();
        self.controller
            .click_note(id, button, modifiers, &mut self.store);
        if self.store.len() != notes_before {
            self.emit(ChangeEvent::NotesChanged);
        }
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Drag a note to a new surface position, snapping to the grid
    pub fn drag_note_to(&mut self, id: NoteId, x_px: f64, y_px: f64) {
        let Some(string) = self.layout.string_at_y(y_px) else {
            return;
        };
        let time = BeatGrid::time_at(x_px, self.layout.track_width_px, self.layout.duration_sec);
        let snap = self.grid.snap_time(time);
        if snap.beat_index.is_none() {
            return;
        }
        if self.store.move_note(id, string as u32, &snap.beat) {
            self.emit(ChangeEvent::NotesChanged);
        }
    }

    /// Rubber-band selection started
    pub fn drag_start(&mut self) {
        self.controller.drag_start();
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Rubber-band selection delta
    pub fn drag_update(&mut self, added: &[NoteId], removed: &[NoteId]) {
        self.controller.drag_update(added, removed, &self.store);
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Rubber-band selection released
    pub fn drag_stop(&mut self) {
        self.controller.drag_stop();
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Surface gained keyboard focus
    pub fn focus_gained(&mut self) {
        self.controller.focus_gained();
    }

    /// Surface lost keyboard focus
    pub fn focus_lost(&mut self) {
        self.controller.focus_lost();
        self.emit(ChangeEvent::SelectionChanged);
    }

    // -- Keyboard commands --------------------------------------------------

    /// Dispatch a keyboard edit action
    pub fn apply(&mut self, action: EditAction) {
        match action {
            EditAction::MoveCursor(direction) => self.move_cursor(direction),
            EditAction::InsertAtCursor => self.insert_at_cursor(),
            EditAction::DeleteSelection => self.delete_selection(),
            EditAction::SelectAll => self.select_all(),
            EditAction::Copy => self.copy(),
            EditAction::Cut => self.cut(),
            EditAction::Paste => self.paste_at_cursor(),
            EditAction::SetFret(fret) => self.set_fret(fret),
        }
    }

    /// Move the cursor one cell
    pub fn move_cursor(&mut self, direction: Direction) {
        self.controller.move_cursor(direction, &self.store, &self.grid);
        self.emit(ChangeEvent::CursorMoved);
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Insert an open-string note at the cursor cell
    pub fn insert_at_cursor(&mut self) {
        let before = self.store.len();
        self.controller.insert_at_cursor(&mut self.store, &self.grid);
        if self.store.len() != before {
            self.emit(ChangeEvent::NotesChanged);
        }
    }

    /// Delete every selected note
    pub fn delete_selection(&mut self) {
        if self.controller.selection().is_empty() {
            return;
        }
        self.controller.delete_selection(&mut self.store);
        self.emit(ChangeEvent::NotesChanged);
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Select every note in the take
    pub fn select_all(&mut self) {
        self.controller.select_all(&self.store);
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Copy the selection to the clipboard
    pub fn copy(&mut self) {
        self.clipboard.copy(self.controller.selection());
    }

    /// Copy the selection, then delete it
    pub fn cut(&mut self) {
        self.copy();
        self.delete_selection();
    }

    /// Paste the clipboard anchored at the cursor's beat.
    ///
    /// Placed notes become the new selection.
    pub fn paste_at_cursor(&mut self) {
        let placed =
            self.clipboard
                .paste(self.cursor().beat_index, &self.grid, &mut self.store);
        if placed.is_empty() {
            return;
        }
        self.controller.commit_selection(placed);
        self.emit(ChangeEvent::NotesChanged);
        self.emit(ChangeEvent::SelectionChanged);
    }

    /// Set the fret of every selected note
    pub fn set_fret(&mut self, fret: u32) {
        if self.controller.selection().is_empty() {
            return;
        }
        self.controller.set_fret(fret, &mut self.store);
        self.emit(ChangeEvent::NotesChanged);
        self.emit(ChangeEvent::SelectionChanged);
    }

    fn emit(&mut self, event: ChangeEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}
