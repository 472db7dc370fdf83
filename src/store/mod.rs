// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note storage for a single take.
//!
//! `NoteStore` is the single source of truth for the notes of the active
//! take. It enforces the two collection invariants:
//! - at most one note per `(string, start_time)` cell
//! - notes sorted ascending by `start_time` after every mutating call
//!
//! Every structural mutation (insert, remove, move, and the batch variants
//! used by paste and delete) hands a full snapshot of the take to the
//! persistence adapter; the external format has no diff concept. Collisions
//! are expected input, logged and ignored, never errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::music::{same_time, Beat, Instrument, NoteKind};
use crate::persist::PersistenceAdapter;

/// Opaque note identity, unique within a session.
///
/// `0` marks a note that has not been assigned an id yet (a freshly
/// deserialized v1 document); the store assigns a real id on adoption.
pub type NoteId = u64;

/// A placed, beat-quantized note.
///
/// `start_time` always equals some beat's start in the current grid; the
/// controller resolves raw input through the grid before the store ever
/// sees a time value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// String index, 0-based from the lowest string
    pub string: u32,
    /// Fret number
    pub fret: u32,
    /// Note or chord anchor
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    /// Start of the note in seconds; equals a beat start
    pub start_time: f64,
    /// End of the note in seconds
    pub end_time: f64,
    /// Session-scoped identity
    #[serde(default)]
    pub id: NoteId,
}

impl Note {
    /// Create an open-string note at a beat
    pub fn at_beat(string: u32, beat: &Beat) -> Self {
        Self {
            string,
            fret: 0,
            kind: NoteKind::Note,
            start_time: beat.start,
            end_time: beat.start,
            id: 0,
        }
    }

    /// The `(string, start_time)` cell this note occupies.
    ///
    /// Cell keys, not ids, are what uniqueness and bulk deletion match on;
    /// selection entries can go stale but their keys stay meaningful.
    pub fn cell(&self) -> (u32, f64) {
        (self.string, self.start_time)
    }
}

/// One editing pass of notes for an instrument
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Take {
    /// Placed notes, sorted ascending by start time
    pub notes: Vec<Note>,
    /// Free-form user tags
    pub tags: Vec<String>,
}

/// Canonical note collection for the active take.
pub struct NoteStore {
    instrument: Instrument,
    take_index: usize,
    take: Take,
    next_id: NoteId,
    adapter: Option<Arc<dyn PersistenceAdapter>>,
}

impl NoteStore {
    /// Create an empty store with no persistence attached
    pub fn new(instrument: Instrument, take_index: usize) -> Self {
        Self {
            instrument,
            take_index,
            take: Take::default(),
            next_id: 1,
            adapter: None,
        }
    }

    /// Adopt a loaded take, assigning ids where the document had none
    pub fn from_take(instrument: Instrument, take_index: usize, take: Take) -> Self {
        let mut store = Self::new(instrument, take_index);
        store.adopt(take);
        store
    }

    /// Attach the persistence adapter that receives snapshots on mutation
    pub fn set_adapter(&mut self, adapter: Arc<dyn PersistenceAdapter>) {
        self.adapter = Some(adapter);
    }

    /// Replace the store contents with a loaded take
    pub fn adopt(&mut self, take: Take) {
        self.take = take;
        let max_id = self.take.notes.iter().map(|n| n.id).max().unwrap_or(0);
        self.next_id = max_id + 1;
        for note in &mut self.take.notes {
            if note.id == 0 {
                note.id = self.next_id;
                self.next_id += 1;
            }
        }
        self.sort();
    }

    /// The instrument this store belongs to
    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// The take index within the instrument
    pub fn take_index(&self) -> usize {
        self.take_index
    }

    /// All notes, sorted ascending by start time
    pub fn notes(&self) -> &[Note] {
        &self.take.notes
    }

    /// User tags on this take
    pub fn tags(&self) -> &[String] {
        &self.take.tags
    }

    /// Number of placed notes
    pub fn len(&self) -> usize {
        self.take.notes.len()
    }

    /// Whether the take has no notes
    pub fn is_empty(&self) -> bool {
        self.take.notes.is_empty()
    }

    /// Deep copy of the current take, safe to hand to background I/O
    pub fn snapshot(&self) -> Take {
        self.take.clone()
    }

    /// Find the note occupying a `(string, time)` cell, if any
    pub fn find_at(&self, string: u32, time: f64) -> Option<&Note> {
        self.take
            .notes
            .iter()
            .find(|n| n.string == string && same_time(n.start_time, time))
    }

    /// Find a note by id
    pub fn find_by_id(&self, id: NoteId) -> Option<&Note> {
        self.take.notes.iter().find(|n| n.id == id)
    }

    /// Insert a note, rejecting cell collisions.
    ///
    /// Returns the assigned id, or `None` if the cell is already occupied
    /// (skip-insert-and-warn policy; the second insert of an identical note
    /// is a no-op, not an overwrite).
    pub fn insert(&mut self, mut note: Note) -> Option<NoteId> {
        if self.find_at(note.string, note.start_time).is_some() {
            warn!(
                string = note.string,
                time = note.start_time,
                "note already exists at cell, skipping insert"
            );
            return None;
        }
        if note.id == 0 {
            note.id = self.next_id;
            self.next_id += 1;
        }
        let id = note.id;
        self.take.notes.push(note);
        self.sort();
        self.flush();
        Some(id)
    }

    /// Remove a note by identity; no-op if absent
    pub fn remove(&mut self, id: NoteId) -> bool {
        let before = self.take.notes.len();
        self.take.notes.retain(|n| n.id != id);
        if self.take.notes.len() == before {
            return false;
        }
        self.flush();
        true
    }

    /// Move a note to a new `(string, beat)` cell.
    ///
    /// Only permitted when the destination cell is free (or holds the note
    /// itself); otherwise fails silently so the caller can keep selection
    /// and store referentially consistent. Duration is preserved.
    pub fn move_note(&mut self, id: NoteId, new_string: u32, new_beat: &Beat) -> bool {
        if let Some(occupant) = self.find_at(new_string, new_beat.start) {
            if occupant.id != id {
                warn!(
                    string = new_string,
                    time = new_beat.start,
                    "destination cell occupied, move rejected"
                );
                return false;
            }
        }
        let Some(note) = self.take.notes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        let duration = note.end_time - note.start_time;
        note.string = new_string;
        note.start_time = new_beat.start;
        note.end_time = new_beat.start + duration;
        self.sort();
        self.flush();
        true
    }

    /// Remove every note matching one of the given `(string, time)` cells.
    ///
    /// Matching is by cell rather than id because the selection may hold
    /// stale references after earlier mutation. Flushes once.
    pub fn remove_matching(&mut self, cells: &[(u32, f64)]) -> usize {
        let before = self.take.notes.len();
        self.take
            .notes
            .retain(|n| !cells.iter().any(|&(s, t)| n.string == s && same_time(n.start_time, t)));
        let removed = before - self.take.notes.len();
        if removed > 0 {
            self.flush();
        }
        removed
    }

    /// Place a batch of notes, overwriting any occupied destination cells.
    ///
    /// This is the paste policy: existing notes at target cells are removed
    /// and replaced, unlike `insert` which rejects. Returns the placed notes
    /// (with their assigned ids) so the caller can select them. Flushes once.
    pub fn place_all(&mut self, notes: Vec<Note>) -> Vec<Note> {
        if notes.is_empty() {
            return Vec::new();
        }
        let mut placed = Vec::with_capacity(notes.len());
        for mut note in notes {
            if let Some(existing) = self.find_at(note.string, note.start_time) {
                let evicted = existing.id;
                debug!(id = evicted, "overwriting note at paste destination");
                self.take.notes.retain(|n| n.id != evicted);
            }
            note.id = self.next_id;
            self.next_id += 1;
            placed.push(note.clone());
            self.take.notes.push(note);
        }
        self.sort();
        self.flush();
        placed
    }

    /// Set the fret on every note matching one of the given cells.
    ///
    /// A pure field update; ordering and uniqueness are unaffected.
    /// Flushes once if anything changed.
    pub fn set_fret(&mut self, cells: &[(u32, f64)], fret: u32) -> usize {
        let mut changed = 0;
        for note in &mut self.take.notes {
            if cells
                .iter()
                .any(|&(s, t)| note.string == s && same_time(note.start_time, t))
                && note.fret != fret
            {
                note.fret = fret;
                changed += 1;
            }
        }
        if changed > 0 {
            self.flush();
        }
        changed
    }

    fn sort(&mut self) {
        self.take
            .notes
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }

    fn flush(&self) {
        if let Some(adapter) = &self.adapter {
            adapter.save(self.instrument, self.take_index, self.snapshot());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PersistenceAdapter;
    use std::sync::Mutex;

    /// Adapter that records every save it receives
    #[derive(Default)]
    pub struct RecordingAdapter {
        pub saves: Mutex<Vec<(Instrument, usize, Take)>>,
    }

    impl PersistenceAdapter for RecordingAdapter {
        fn load(&self, _instrument: Instrument, _take_index: usize) -> crate::persist::Result<Take> {
            Ok(Take::default())
        }

        fn save(&self, instrument: Instrument, take_index: usize, take: Take) {
            self.saves.lock().unwrap().push((instrument, take_index, take));
        }
    }

    fn beat(start: f64) -> Beat {
        Beat::new(start, 1)
    }

    fn store() -> NoteStore {
        NoteStore::new(Instrument::LeadGuitar, 0)
    }

    #[test]
    fn test_insert_and_find_at() {
        // 4-beat grid, note at (0, 0.5)
        let mut s = store();
        let id = s.insert(Note::at_beat(0, &beat(0.5)));
        assert!(id.is_some());
        assert!(s.find_at(0, 0.5).is_some());
        assert!(s.find_at(0, 1.0).is_none());
        assert!(s.find_at(1, 0.5).is_none());
    }

    #[test]
    fn test_insert_collision_is_noop() {
        let mut s = store();
        let note = Note::at_beat(2, &beat(1.0));
        assert!(s.insert(note.clone()).is_some());
        assert!(s.insert(note).is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_notes_sorted_after_mutations() {
        let mut s = store();
        s.insert(Note::at_beat(0, &beat(1.5)));
        s.insert(Note::at_beat(0, &beat(0.0)));
        s.insert(Note::at_beat(0, &beat(1.0)));
        s.insert(Note::at_beat(0, &beat(0.5)));

        let times: Vec<f64> = s.notes().iter().map(|n| n.start_time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);

        let id = s.find_at(0, 0.0).unwrap().id;
        s.move_note(id, 0, &beat(2.0));
        let times: Vec<f64> = s.notes().iter().map(|n| n.start_time).collect();
        assert_eq!(times, vec![0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut s = store();
        let id = s.insert(Note::at_beat(1, &beat(0.5))).unwrap();
        assert!(s.remove(id));
        assert!(!s.remove(id));
        assert!(s.is_empty());
    }

    #[test]
    fn test_move_rejected_when_destination_occupied() {
        let mut s = store();
        let id = s.insert(Note::at_beat(0, &beat(0.0))).unwrap();
        s.insert(Note::at_beat(0, &beat(0.5)));

        assert!(!s.move_note(id, 0, &beat(0.5)));
        // Source untouched
        assert!(s.find_at(0, 0.0).is_some());
    }

    #[test]
    fn test_move_onto_own_cell_is_allowed() {
        let mut s = store();
        let id = s.insert(Note::at_beat(0, &beat(0.0))).unwrap();
        assert!(s.move_note(id, 0, &beat(0.0)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_move_preserves_duration() {
        let mut s = store();
        let mut note = Note::at_beat(3, &beat(0.0));
        note.end_time = 0.5;
        let id = s.insert(note).unwrap();
        s.move_note(id, 3, &beat(1.0));
        let moved = s.find_by_id(id).unwrap();
        assert_eq!(moved.start_time, 1.0);
        assert_eq!(moved.end_time, 1.5);
    }

    #[test]
    fn test_remove_matching_tolerates_stale_cells() {
        // Stale selection entries remove only what still exists
        let mut s = store();
        s.insert(Note::at_beat(0, &beat(0.0)));
        s.insert(Note::at_beat(1, &beat(0.5)));

        let removed = s.remove_matching(&[(0, 0.0), (5, 9.0)]);
        assert_eq!(removed, 1);
        assert_eq!(s.len(), 1);
        assert!(s.find_at(1, 0.5).is_some());
    }

    #[test]
    fn test_place_all_overwrites() {
        let mut s = store();
        let mut original = Note::at_beat(0, &beat(0.5));
        original.fret = 3;
        s.insert(original);

        let mut incoming = Note::at_beat(0, &beat(0.5));
        incoming.fret = 7;
        let placed = s.place_all(vec![incoming, Note::at_beat(1, &beat(1.0))]);

        assert_eq!(placed.len(), 2);
        assert_eq!(s.len(), 2);
        assert_eq!(s.find_at(0, 0.5).unwrap().fret, 7);
    }

    #[test]
    fn test_every_structural_change_flushes_full_snapshot() {
        let adapter = Arc::new(RecordingAdapter::default());
        let mut s = store();
        s.set_adapter(adapter.clone());

        let id = s.insert(Note::at_beat(0, &beat(0.0))).unwrap();
        s.insert(Note::at_beat(1, &beat(0.5)));
        s.move_note(id, 2, &beat(1.0));
        s.remove(id);
        s.remove_matching(&[(1, 0.5)]);

        let saves = adapter.saves.lock().unwrap();
        assert_eq!(saves.len(), 5);
        // Each save carried the entire array at that point
        assert_eq!(saves[0].2.notes.len(), 1);
        assert_eq!(saves[1].2.notes.len(), 2);
        assert_eq!(saves[2].2.notes.len(), 2);
        assert_eq!(saves[3].2.notes.len(), 1);
        assert_eq!(saves[4].2.notes.len(), 0);
    }

    #[test]
    fn test_collision_does_not_flush() {
        let adapter = Arc::new(RecordingAdapter::default());
        let mut s = store();
        s.set_adapter(adapter.clone());

        s.insert(Note::at_beat(0, &beat(0.0)));
        s.insert(Note::at_beat(0, &beat(0.0)));
        assert_eq!(adapter.saves.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_adopt_assigns_missing_ids() {
        let take = Take {
            notes: vec![
                Note {
                    id: 0,
                    ..Note::at_beat(0, &beat(0.5))
                },
                Note {
                    id: 7,
                    ..Note::at_beat(1, &beat(0.0))
                },
            ],
            tags: vec!["intro".into()],
        };
        let s = NoteStore::from_take(Instrument::BassGuitar, 2, take);
        assert!(s.notes().iter().all(|n| n.id != 0));
        assert_eq!(s.tags(), ["intro".to_string()]);
        // Sorted on adoption too
        assert_eq!(s.notes()[0].start_time, 0.0);
    }
}
