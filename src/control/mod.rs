// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for keyboard input.
//!
//! Translates key events into editor actions through a configurable
//! binding table. The editor facade consumes `EditAction` values; nothing
//! here touches editor state directly.

pub mod keyboard;

pub use keyboard::{format_shortcut, KeyBinding, KeyboardController, Shortcut};

use crate::editor::cursor::Direction;

/// Action that can be triggered by keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    // Navigation
    /// Move the cursor one cell
    MoveCursor(Direction),

    // Editing
    /// Insert an open-string note at the cursor
    InsertAtCursor,
    /// Delete every selected note
    DeleteSelection,
    /// Set the fret of every selected note
    SetFret(u32),

    // Selection
    /// Select every note in the take
    SelectAll,

    // Clipboard
    /// Copy the selection
    Copy,
    /// Copy the selection, then delete it
    Cut,
    /// Paste anchored at the cursor's beat
    Paste,
}

impl EditAction {
    /// Check if this is a navigation action
    pub fn is_navigation(&self) -> bool {
        matches!(self, EditAction::MoveCursor(_))
    }

    /// Check if this is a clipboard action
    pub fn is_clipboard(&self) -> bool {
        matches!(self, EditAction::Copy | EditAction::Cut | EditAction::Paste)
    }

    /// Check if this action mutates notes
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            EditAction::InsertAtCursor
                | EditAction::DeleteSelection
                | EditAction::SetFret(_)
                | EditAction::Cut
                | EditAction::Paste
        )
    }
}
