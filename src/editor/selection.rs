// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Selection controller: the editing-surface interaction state machine.
//!
//! Pointer and keyboard input resolve to selection state and a cursor
//! position. Every transition is a total function over (state, input);
//! colliding or out-of-range input answers with a no-op (and at most a log
//! line), never an error.
//!
//! The selection holds cloned note snapshots. Snapshots can go stale when
//! the store mutates underneath them, which is why bulk deletion re-matches
//! by `(string, start_time)` cell instead of by id.

use std::time::Instant;

use crossterm::event::{KeyModifiers, MouseButton};
use tracing::{debug, warn};

use super::cursor::{CursorPosition, Direction};
use crate::grid::{BeatGrid, Snap};
use crate::store::{Note, NoteId, NoteStore};

/// Interaction states of the editing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Surface does not have focus
    Idle,
    /// Focused, nothing selected
    FocusedEmpty,
    /// Focused, at least one note selected
    FocusedSelected,
    /// Rubber-band drag in progress
    Dragging,
}

/// Interprets pointer and keyboard input into selection and cursor state.
pub struct SelectionController {
    state: EditorState,
    selection: Vec<Note>,
    cursor: CursorPosition,
    string_count: usize,
    blink_restarted: Instant,
}

impl SelectionController {
    /// Create a controller for a surface with the given string count
    pub fn new(string_count: usize) -> Self {
        Self {
            state: EditorState::Idle,
            selection: Vec::new(),
            cursor: CursorPosition::default(),
            string_count,
            blink_restarted: Instant::now(),
        }
    }

    /// Current interaction state
    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Currently selected notes (snapshots)
    pub fn selection(&self) -> &[Note] {
        &self.selection
    }

    /// Whether a note id is in the selection
    pub fn is_selected(&self, id: NoteId) -> bool {
        self.selection.iter().any(|n| n.id == id)
    }

    /// Current cursor cell
    pub fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    /// Number of strings on the surface
    pub fn string_count(&self) -> usize {
        self.string_count
    }

    /// When the cursor blink timer last restarted (cosmetic)
    pub fn blink_restarted(&self) -> Instant {
        self.blink_restarted
    }

    /// Change the string count without disturbing selection or cursor
    pub fn set_string_count(&mut self, string_count: usize) {
        self.string_count = string_count;
    }

    /// Place the cursor without selecting anything (grid-rebuild clamping)
    pub fn reset_cursor(&mut self, cursor: CursorPosition) {
        self.set_cursor(cursor);
    }

    /// Reset for a new take or instrument: selection and cursor are
    /// transient, the new surface may have a different string count.
    pub fn reset(&mut self, string_count: usize) {
        self.string_count = string_count;
        self.selection.clear();
        self.cursor = CursorPosition::default();
        self.state = EditorState::Idle;
    }

    /// Surface gained focus
    pub fn focus_gained(&mut self) {
        if self.state == EditorState::Idle {
            self.state = EditorState::FocusedEmpty;
            debug!("editing surface focused");
        }
    }

    /// Surface lost focus; selection is cleared unconditionally
    pub fn focus_lost(&mut self) {
        self.selection.clear();
        self.state = EditorState::Idle;
        debug!("editing surface blurred, selection cleared");
    }

    /// Handle a click on an (empty) grid cell.
    ///
    /// `snap` is the click position already resolved through the beat grid.
    /// With Ctrl held the click is pure navigation. Otherwise, with a
    /// selection active the click deselects; with no selection it selects
    /// the note at the resolved cell or places a new one there.
    pub fn click_cell(
        &mut self,
        string: u32,
        snap: Snap,
        modifiers: KeyModifiers,
        store: &mut NoteStore,
    ) {
        self.focus_gained();

        let Some(beat_index) = snap.beat_index else {
            // No grid loaded; editing is disabled
            return;
        };

        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER) {
            self.set_cursor(CursorPosition::new(string as usize, beat_index));
            return;
        }

        match self.state {
            EditorState::FocusedSelected => {
                // Pure deselect; the same gesture never also places a note
                self.selection.clear();
                self.state = EditorState::FocusedEmpty;
            }
            EditorState::FocusedEmpty => {
                self.set_cursor(CursorPosition::new(string as usize, beat_index));
                if let Some(existing) = store.find_at(string, snap.time) {
                    self.selection = vec![existing.clone()];
                    self.state = EditorState::FocusedSelected;
                } else {
                    store.insert(Note::at_beat(string, &snap.beat));
                }
            }
            EditorState::Idle | EditorState::Dragging => {}
        }
    }

    /// Handle a click directly on a note glyph.
    ///
    /// Right button deletes the note and clears the selection; left button
    /// toggles membership (additive with Shift, otherwise the note becomes
    /// the sole selection).
    pub fn click_note(
        &mut self,
        id: NoteId,
        button: MouseButton,
        modifiers: KeyModifiers,
        store: &mut NoteStore,
    ) {
        self.focus_gained();

        match button {
            MouseButton::Right => {
                store.remove(id);
                self.selection.clear();
                if self.state != EditorState::Idle {
                    self.state = EditorState::FocusedEmpty;
                }
            }
            MouseButton::Left => {
                if self.is_selected(id) {
                    self.selection.retain(|n| n.id != id);
                } else if let Some(note) = store.find_by_id(id).cloned() {
                    if modifiers.contains(KeyModifiers::SHIFT) {
                        self.selection.push(note);
                    } else {
                        self.selection = vec![note];
                    }
                }
                self.sync_focused_state();
            }
            MouseButton::Middle => {}
        }
    }

    /// Rubber-band drag started.
    ///
    /// Anything the drag library pre-marked as selected is dropped; the
    /// selection is rebuilt purely from move deltas.
    pub fn drag_start(&mut self) {
        self.selection.clear();
        self.state = EditorState::Dragging;
    }

    /// Rubber-band moved: apply the delta of notes entering/leaving the band
    pub fn drag_update(&mut self, added: &[NoteId], removed: &[NoteId], store: &NoteStore) {
        if self.state != EditorState::Dragging {
            return;
        }
        for &id in added {
            if !self.is_selected(id) {
                if let Some(note) = store.find_by_id(id).cloned() {
                    self.selection.push(note);
                }
            }
        }
        if !removed.is_empty() {
            self.selection.retain(|n| !removed.contains(&n.id));
        }
    }

    /// Rubber-band released: commit whatever the drag accumulated
    pub fn drag_stop(&mut self) {
        if self.state != EditorState::Dragging {
            return;
        }
        self.sync_focused_state();
        debug!(selected = self.selection.len(), "rubber-band committed");
    }

    /// Move the cursor one step.
    ///
    /// Strings wrap, beats clamp. If a note sits under the new cursor cell
    /// it becomes the sole selection; otherwise the selection clears. The
    /// blink timer restarts on every move.
    pub fn move_cursor(&mut self, direction: Direction, store: &NoteStore, grid: &BeatGrid) {
        self.set_cursor(self.cursor.stepped(direction, self.string_count, grid.len()));
        self.select_under_cursor(store, grid);
    }

    /// Insert a note at the cursor cell; occupied cells warn and no-op
    pub fn insert_at_cursor(&mut self, store: &mut NoteStore, grid: &BeatGrid) {
        let Some(beat) = grid.beat(self.cursor.beat_index).copied() else {
            return;
        };
        let string = self.cursor.string as u32;
        if store.find_at(string, beat.start).is_some() {
            warn!(
                string,
                beat_index = self.cursor.beat_index,
                "cursor cell already holds a note"
            );
            return;
        }
        store.insert(Note::at_beat(string, &beat));
    }

    /// Replace the selection with every note in the take
    pub fn select_all(&mut self, store: &NoteStore) {
        self.selection = store.notes().to_vec();
        self.sync_focused_state();
    }

    /// Delete every selected note from the store.
    ///
    /// Matches by `(string, start_time)` cell, so selection entries whose
    /// notes were already removed or moved are harmless.
    pub fn delete_selection(&mut self, store: &mut NoteStore) {
        if self.selection.is_empty() {
            return;
        }
        let cells: Vec<(u32, f64)> = self.selection.iter().map(Note::cell).collect();
        store.remove_matching(&cells);
        self.selection.clear();
        if self.state != EditorState::Idle {
            self.state = EditorState::FocusedEmpty;
        }
    }

    /// Set the fret of every selected note
    pub fn set_fret(&mut self, fret: u32, store: &mut NoteStore) {
        if self.selection.is_empty() {
            return;
        }
        let cells: Vec<(u32, f64)> = self.selection.iter().map(Note::cell).collect();
        store.set_fret(&cells, fret);
        for note in &mut self.selection {
            note.fret = fret;
        }
    }

    /// Adopt a set of freshly placed notes (paste) as the selection
    pub fn commit_selection(&mut self, notes: Vec<Note>) {
        self.selection = notes;
        self.sync_focused_state();
    }

    fn set_cursor(&mut self, cursor: CursorPosition) {
        self.cursor = cursor;
        self.blink_restarted = Instant::now();
    }

    fn select_under_cursor(&mut self, store: &NoteStore, grid: &BeatGrid) {
        let under = grid
            .beat(self.cursor.beat_index)
            .and_then(|beat| store.find_at(self.cursor.string as u32, beat.start))
            .cloned();
        match under {
            Some(note) => {
                self.selection = vec![note];
                self.state = EditorState::FocusedSelected;
            }
            None => {
                self.selection.clear();
                if self.state != EditorState::Idle {
                    self.state = EditorState::FocusedEmpty;
                }
            }
        }
    }

    fn sync_focused_state(&mut self) {
        self.state = if self.selection.is_empty() {
            EditorState::FocusedEmpty
        } else {
            EditorState::FocusedSelected
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Beat, Instrument};

    fn grid() -> BeatGrid {
        BeatGrid::new(vec![
            Beat::new(0.0, 1),
            Beat::new(0.5, 2),
            Beat::new(1.0, 3),
            Beat::new(1.5, 4),
        ])
    }

    fn store() -> NoteStore {
        NoteStore::new(Instrument::LeadGuitar, 0)
    }

    fn controller() -> SelectionController {
        let mut c = SelectionController::new(6);
        c.focus_gained();
        c
    }

    fn snap_at(grid: &BeatGrid, time: f64) -> Snap {
        grid.snap_time(time)
    }

    #[test]
    fn test_focus_transitions() {
        let mut c = SelectionController::new(6);
        assert_eq!(c.state(), EditorState::Idle);
        c.focus_gained();
        assert_eq!(c.state(), EditorState::FocusedEmpty);
        c.focus_lost();
        assert_eq!(c.state(), EditorState::Idle);
    }

    #[test]
    fn test_focus_lost_clears_selection_unconditionally() {
        let mut c = controller();
        let mut s = store();
        let g = grid();
        c.click_cell(0, snap_at(&g, 0.5), KeyModifiers::NONE, &mut s);
        c.select_all(&s);
        assert_eq!(c.selection().len(), 1);

        c.focus_lost();
        assert!(c.selection().is_empty());
    }

    #[test]
    fn test_click_empty_cell_places_note() {
        let mut c = controller();
        let mut s = store();
        let g = grid();

        c.click_cell(2, snap_at(&g, 0.6), KeyModifiers::NONE, &mut s);
        assert_eq!(c.state(), EditorState::FocusedEmpty);
        assert!(s.find_at(2, 0.5).is_some());
        // Cursor follows the placed cell
        assert_eq!(c.cursor(), CursorPosition::new(2, 1));
    }

    #[test]
    fn test_click_cell_with_note_selects_it() {
        let mut c = controller();
        let mut s = store();
        let g = grid();
        s.insert(Note::at_beat(2, &Beat::new(0.5, 2)));

        c.click_cell(2, snap_at(&g, 0.5), KeyModifiers::NONE, &mut s);
        assert_eq!(c.state(), EditorState::FocusedSelected);
        assert_eq!(c.selection().len(), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_click_while_selected_only_deselects() {
        let mut c = controller();
        let mut s = store();
        let g = grid();
        s.insert(Note::at_beat(0, &Beat::new(0.0, 1)));
        c.click_cell(0, snap_at(&g, 0.0), KeyModifiers::NONE, &mut s);
        assert_eq!(c.state(), EditorState::FocusedSelected);

        // Clicking another empty cell deselects without placing a note
        c.click_cell(3, snap_at(&g, 1.0), KeyModifiers::NONE, &mut s);
        assert_eq!(c.state(), EditorState::FocusedEmpty);
        assert!(c.selection().is_empty());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_ctrl_click_is_pure_navigation() {
        let mut c = controller();
        let mut s = store();
        let g = grid();
        s.insert(Note::at_beat(1, &Beat::new(1.0, 3)));
        c.select_all(&s);

        c.click_cell(1, snap_at(&g, 1.0), KeyModifiers::CONTROL, &mut s);
        assert_eq!(c.cursor(), CursorPosition::new(1, 2));
        // Neither store nor selection changed
        assert_eq!(s.len(), 1);
        assert_eq!(c.selection().len(), 1);
    }

    #[test]
    fn test_click_cell_empty_grid_is_noop() {
        let mut c = controller();
        let mut s = store();
        let empty = BeatGrid::empty();

        c.click_cell(0, empty.snap_time(0.4), KeyModifiers::NONE, &mut s);
        assert!(s.is_empty());
        assert_eq!(c.state(), EditorState::FocusedEmpty);
    }

    #[test]
    fn test_right_click_note_deletes_and_clears() {
        let mut c = controller();
        let mut s = store();
        let id = s.insert(Note::at_beat(0, &Beat::new(0.0, 1))).unwrap();
        c.select_all(&s);

        c.click_note(id, MouseButton::Right, KeyModifiers::NONE, &mut s);
        assert!(s.is_empty());
        assert!(c.selection().is_empty());
        assert_eq!(c.state(), EditorState::FocusedEmpty);
    }

    #[test]
    fn test_left_click_note_toggles_membership() {
        let mut c = controller();
        let mut s = store();
        let a = s.insert(Note::at_beat(0, &Beat::new(0.0, 1))).unwrap();
        let b = s.insert(Note::at_beat(1, &Beat::new(0.5, 2))).unwrap();

        // Plain click replaces
        c.click_note(a, MouseButton::Left, KeyModifiers::NONE, &mut s);
        assert!(c.is_selected(a));
        c.click_note(b, MouseButton::Left, KeyModifiers::NONE, &mut s);
        assert!(!c.is_selected(a));
        assert!(c.is_selected(b));

        // Shift click adds
        c.click_note(a, MouseButton::Left, KeyModifiers::SHIFT, &mut s);
        assert!(c.is_selected(a) && c.is_selected(b));
        assert_eq!(c.state(), EditorState::FocusedSelected);

        // Clicking a selected note removes it
        c.click_note(a, MouseButton::Left, KeyModifiers::NONE, &mut s);
        assert!(!c.is_selected(a));
        assert!(c.is_selected(b));
    }

    #[test]
    fn test_drag_rebuilds_selection_from_deltas() {
        let mut c = controller();
        let mut s = store();
        let a = s.insert(Note::at_beat(0, &Beat::new(0.0, 1))).unwrap();
        let b = s.insert(Note::at_beat(1, &Beat::new(0.5, 2))).unwrap();
        c.select_all(&s);

        // Pre-marked selection is cleared at drag start
        c.drag_start();
        assert_eq!(c.state(), EditorState::Dragging);
        assert!(c.selection().is_empty());

        c.drag_update(&[a, b], &[], &s);
        c.drag_update(&[], &[a], &s);
        c.drag_stop();

        assert_eq!(c.state(), EditorState::FocusedSelected);
        assert!(c.is_selected(b));
        assert!(!c.is_selected(a));
    }

    #[test]
    fn test_drag_selecting_nothing_ends_focused_empty() {
        let mut c = controller();
        let s = store();
        c.drag_start();
        c.drag_stop();
        assert_eq!(c.state(), EditorState::FocusedEmpty);
        let _ = s;
    }

    #[test]
    fn test_move_cursor_selects_note_under_cell() {
        let mut c = controller();
        let mut s = store();
        let g = grid();
        s.insert(Note::at_beat(1, &Beat::new(0.5, 2)));

        c.move_cursor(Direction::Right, &s, &g); // (0,1): empty
        assert!(c.selection().is_empty());
        c.move_cursor(Direction::Down, &s, &g); // (1,1): has the note
        assert_eq!(c.selection().len(), 1);
        assert_eq!(c.state(), EditorState::FocusedSelected);
        c.move_cursor(Direction::Right, &s, &g); // (1,2): empty again
        assert!(c.selection().is_empty());
        assert_eq!(c.state(), EditorState::FocusedEmpty);
    }

    #[test]
    fn test_move_cursor_restarts_blink() {
        let mut c = controller();
        let s = store();
        let g = grid();
        let before = c.blink_restarted();
        std::thread::sleep(std::time::Duration::from_millis(2));
        c.move_cursor(Direction::Right, &s, &g);
        assert!(c.blink_restarted() > before);
    }

    #[test]
    fn test_insert_at_cursor_collision_is_noop() {
        let mut c = controller();
        let mut s = store();
        let g = grid();

        c.insert_at_cursor(&mut s, &g);
        assert_eq!(s.len(), 1);
        // Same cell again: warn + no-op
        c.insert_at_cursor(&mut s, &g);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_insert_at_cursor_without_grid_is_noop() {
        let mut c = controller();
        let mut s = store();
        c.insert_at_cursor(&mut s, &BeatGrid::empty());
        assert!(s.is_empty());
    }

    #[test]
    fn test_delete_selection_with_stale_reference() {
        // Stale selection entries don't break deletion
        let mut c = controller();
        let mut s = store();
        let g = grid();
        let a = s.insert(Note::at_beat(0, &Beat::new(0.0, 1))).unwrap();
        s.insert(Note::at_beat(1, &Beat::new(0.5, 2))).unwrap();
        c.select_all(&s);

        // One selected note vanishes behind the controller's back
        s.remove(a);
        assert_eq!(s.len(), 1);

        c.delete_selection(&mut s);
        assert!(s.is_empty());
        assert!(c.selection().is_empty());
        assert_eq!(c.state(), EditorState::FocusedEmpty);
        let _ = g;
    }

    #[test]
    fn test_set_fret_updates_store_and_selection() {
        let mut c = controller();
        let mut s = store();
        s.insert(Note::at_beat(0, &Beat::new(0.0, 1)));
        c.select_all(&s);

        c.set_fret(12, &mut s);
        assert_eq!(s.find_at(0, 0.0).unwrap().fret, 12);
        assert_eq!(c.selection()[0].fret, 12);
    }

    #[test]
    fn test_reset_on_take_switch() {
        let mut c = controller();
        let mut s = store();
        let g = grid();
        c.click_cell(0, g.snap_time(0.0), KeyModifiers::NONE, &mut s);
        c.move_cursor(Direction::Right, &s, &g);

        c.reset(4);
        assert_eq!(c.state(), EditorState::Idle);
        assert_eq!(c.cursor(), CursorPosition::default());
        assert_eq!(c.string_count(), 4);
        assert!(c.selection().is_empty());
    }
}
