// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note-file persistence.
//!
//! The editing core hands full take snapshots to a `PersistenceAdapter`
//! after every structural mutation and never waits for the write to finish.
//! This module provides:
//! - the versioned `NoteFile` JSON document (`{ notes, version }`)
//! - the adapter trait consumed by the store
//! - `FileAdapter`, a tokio-backed implementation whose writer task
//!   coalesces bursts of saves and logs failures without surfacing them
//!
//! Project-level concerns (directory bundling, project schema migration)
//! stay with the surrounding application; the adapter only knows how to
//! round-trip one take's notes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::music::Instrument;
use crate::store::{Note, Take};

/// Current note-file schema version
pub const CURRENT_VERSION: u32 = 2;

/// Errors loading a note file
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read note file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse note file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// On-disk document for one take's notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteFile {
    pub notes: Vec<Note>,
    pub version: u32,
}

impl NoteFile {
    /// Wrap a snapshot in a current-version document
    pub fn from_take(take: &Take) -> Self {
        Self {
            notes: take.notes.clone(),
            version: CURRENT_VERSION,
        }
    }

    /// Bump an older document to the current version.
    ///
    /// Version 1 predates note ids; its notes are marked unassigned so the
    /// store hands out fresh ids when it adopts them.
    pub fn migrate(&mut self) {
        if self.version >= CURRENT_VERSION {
            return;
        }
        debug!(
            from = self.version,
            to = CURRENT_VERSION,
            "bumping note file version"
        );
        if self.version < 2 {
            for note in &mut self.notes {
                note.id = 0;
            }
        }
        self.version = CURRENT_VERSION;
    }

    /// Convert into an in-memory take (tags live in the project file)
    pub fn into_take(self) -> Take {
        Take {
            notes: self.notes,
            tags: Vec::new(),
        }
    }
}

/// Storage consumed by the note store.
///
/// `load` runs synchronously when a take becomes active. `save` is
/// fire-and-forget: it must return without blocking on I/O, and failures
/// belong to the adapter (logged, never reported back to editing).
pub trait PersistenceAdapter: Send + Sync {
    /// Load a take's notes
    fn load(&self, instrument: Instrument, take_index: usize) -> Result<Take>;

    /// Persist a full take snapshot; must not block
    fn save(&self, instrument: Instrument, take_index: usize, take: Take);
}

struct SaveRequest {
    instrument: Instrument,
    take_index: usize,
    take: Take,
}

/// File-backed adapter writing one JSON document per take.
///
/// Saves are queued to a background writer task in mutation order. Rapid
/// successive saves of the same take are coalesced so only the latest
/// snapshot hits the disk; every snapshot is complete, so last-write-wins
/// is safe.
pub struct FileAdapter {
    root: PathBuf,
    tx: mpsc::UnboundedSender<SaveRequest>,
}

impl FileAdapter {
    /// Create an adapter rooted at a directory.
    ///
    /// Must be called from within a tokio runtime; the writer task is
    /// spawned on it immediately.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_task(root.clone(), rx));
        Self { root, tx }
    }

    /// Path of the note file for a take
    pub fn note_path(&self, instrument: Instrument, take_index: usize) -> PathBuf {
        note_path(&self.root, instrument, take_index)
    }
}

fn note_path(root: &Path, instrument: Instrument, take_index: usize) -> PathBuf {
    root.join(format!("{}_{:02}.json", instrument.key(), take_index))
}

async fn writer_task(root: PathBuf, mut rx: mpsc::UnboundedReceiver<SaveRequest>) {
    while let Some(first) = rx.recv().await {
        let mut pending = vec![first];
        // Drain whatever else is queued; the latest snapshot per take wins.
        while let Ok(next) = rx.try_recv() {
            pending.retain(|p| {
                !(p.instrument == next.instrument && p.take_index == next.take_index)
            });
            pending.push(next);
        }
        for req in pending {
            let path = note_path(&root, req.instrument, req.take_index);
            let doc = NoteFile::from_take(&req.take);
            let bytes = match serde_json::to_vec_pretty(&doc) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(?path, error = %e, "failed to serialize note file");
                    continue;
                }
            };
            if let Err(e) = tokio::fs::write(&path, bytes).await {
                warn!(?path, error = %e, "failed to write note file");
            } else {
                debug!(?path, notes = req.take.notes.len(), "note file written");
            }
        }
    }
}

impl PersistenceAdapter for FileAdapter {
    fn load(&self, instrument: Instrument, take_index: usize) -> Result<Take> {
        let path = self.note_path(instrument, take_index);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            // A take that was never saved starts out empty
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Take::default());
            }
            Err(e) => return Err(PersistError::Io { path, source: e }),
        };
        let mut doc: NoteFile = serde_json::from_slice(&bytes)
            .map_err(|e| PersistError::Parse { path, source: e })?;
        doc.migrate();
        Ok(doc.into_take())
    }

    fn save(&self, instrument: Instrument, take_index: usize, take: Take) {
        let req = SaveRequest {
            instrument,
            take_index,
            take,
        };
        // The writer task only goes away when the runtime shuts down;
        // at that point there is nothing left to persist for.
        if self.tx.send(req).is_err() {
            warn!("persistence writer task is gone, dropping save");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::Beat;
    use std::time::Duration;
    use tempfile::tempdir;

    fn sample_take() -> Take {
        Take {
            notes: vec![
                Note {
                    fret: 3,
                    id: 1,
                    ..Note::at_beat(0, &Beat::new(0.5, 2))
                },
                Note {
                    id: 2,
                    ..Note::at_beat(2, &Beat::new(1.0, 3))
                },
            ],
            tags: Vec::new(),
        }
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..100 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached within timeout");
    }

    #[test]
    fn test_note_file_field_names() {
        let doc = NoteFile::from_take(&sample_take());
        let json = serde_json::to_value(&doc).unwrap();
        let first = &json["notes"][0];
        assert_eq!(first["startTime"], 0.5);
        assert_eq!(first["endTime"], 0.5);
        assert_eq!(first["type"], "note");
        assert_eq!(first["string"], 0);
        assert_eq!(first["fret"], 3);
        assert_eq!(json["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_migrate_v1_clears_ids() {
        let mut doc = NoteFile {
            notes: sample_take().notes,
            version: 1,
        };
        doc.migrate();
        assert_eq!(doc.version, CURRENT_VERSION);
        assert!(doc.notes.iter().all(|n| n.id == 0));
    }

    #[test]
    fn test_migrate_current_version_untouched() {
        let mut doc = NoteFile::from_take(&sample_take());
        doc.migrate();
        assert!(doc.notes.iter().all(|n| n.id != 0));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::new(dir.path());
        let take = sample_take();

        adapter.save(Instrument::LeadGuitar, 0, take.clone());
        let path = adapter.note_path(Instrument::LeadGuitar, 0);
        wait_for(|| path.exists()).await;

        let loaded = adapter.load(Instrument::LeadGuitar, 0).unwrap();
        assert_eq!(loaded.notes, take.notes);
    }

    #[tokio::test]
    async fn test_burst_saves_end_with_latest_snapshot() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::new(dir.path());

        for n in 1..=10u32 {
            let take = Take {
                notes: (0..n)
                    .map(|i| Note {
                        id: (i + 1) as u64,
                        ..Note::at_beat(i, &Beat::new(i as f64 * 0.5, 1))
                    })
                    .collect(),
                tags: Vec::new(),
            };
            adapter.save(Instrument::RhythmGuitar, 1, take);
        }

        let adapter_ref = &adapter;
        wait_for(move || {
            adapter_ref
                .load(Instrument::RhythmGuitar, 1)
                .map(|t| t.notes.len() == 10)
                .unwrap_or(false)
        })
        .await;
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty_take() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::new(dir.path());
        let take = adapter.load(Instrument::Ukulele, 3).unwrap();
        assert!(take.notes.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let adapter = FileAdapter::new(dir.path());
        let path = adapter.note_path(Instrument::BassGuitar, 0);
        std::fs::write(&path, b"not json{").unwrap();

        let err = adapter.load(Instrument::BassGuitar, 0).unwrap_err();
        assert!(matches!(err, PersistError::Parse { .. }));
    }
}
