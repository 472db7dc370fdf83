// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! Provides configurable keyboard bindings for cursor navigation, note
//! editing, and clipboard actions.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::EditAction;
use crate::editor::cursor::Direction;

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    /// Create a new shortcut
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    /// Create a shortcut with Shift modifier
    pub fn shift(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::SHIFT)
    }

    /// Check if this shortcut matches a key event
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.code == code && self.modifiers == modifiers
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// The shortcut
    pub shortcut: Shortcut,
    /// The action to perform
    pub action: EditAction,
    /// Description for help display
    pub description: String,
    /// Category for grouping in help
    pub category: String,
}

impl KeyBinding {
    /// Create a new key binding
    pub fn new(shortcut: Shortcut, action: EditAction, description: impl Into<String>) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
            category: "General".to_string(),
        }
    }

    /// Set the category
    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// Keyboard controller with configurable bindings
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a keyboard controller with default bindings
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.add_default_bindings();
        controller
    }

    /// Add default keyboard bindings
    fn add_default_bindings(&mut self) {
        // Navigation
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Up),
            EditAction::MoveCursor(Direction::Up),
            "Cursor Up (wraps)",
        ).category("Navigation"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Down),
            EditAction::MoveCursor(Direction::Down),
            "Cursor Down (wraps)",
        ).category("Navigation"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Left),
            EditAction::MoveCursor(Direction::Left),
            "Cursor Left",
        ).category("Navigation"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Right),
            EditAction::MoveCursor(Direction::Right),
            "Cursor Right",
        ).category("Navigation"));

        // Editing
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Enter),
            EditAction::InsertAtCursor,
            "Insert Note at Cursor",
        ).category("Editing"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Delete),
            EditAction::DeleteSelection,
            "Delete Selection",
        ).category("Editing"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Backspace),
            EditAction::DeleteSelection,
            "Delete Selection",
        ).category("Editing"));

        // Fret entry (0-9)
        for fret in 0..10 {
            let c = char::from_digit(fret, 10).unwrap();
            self.add(KeyBinding::new(
                Shortcut::key(KeyCode::Char(c)),
                EditAction::SetFret(fret),
                format!("Set Fret {}", fret),
            ).category("Editing"));
        }

        // Selection
        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('a')),
            EditAction::SelectAll,
            "Select All",
        ).category("Selection"));

        // Clipboard
        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('c')),
            EditAction::Copy,
            "Copy",
        ).category("Clipboard"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('x')),
            EditAction::Cut,
            "Cut",
        ).category("Clipboard"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('v')),
            EditAction::Paste,
            "Paste at Cursor",
        ).category("Clipboard"));
    }

    /// Add a key binding
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Remove a key binding
    pub fn remove(&mut self, shortcut: &Shortcut) -> Option<KeyBinding> {
        self.bindings.remove(shortcut)
    }

    /// Get action for a key event
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<&EditAction> {
        let shortcut = Shortcut::new(code, modifiers);
        self.bindings.get(&shortcut).map(|b| &b.action)
    }

    /// Process a key event and return the action
    pub fn process_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<EditAction> {
        self.get_action(code, modifiers).copied()
    }

    /// Get all bindings for help display
    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.values()
    }

    /// Get bindings grouped by category
    pub fn bindings_by_category(&self) -> HashMap<String, Vec<&KeyBinding>> {
        let mut grouped: HashMap<String, Vec<&KeyBinding>> = HashMap::new();

        for binding in self.bindings.values() {
            grouped
                .entry(binding.category.clone())
                .or_default()
                .push(binding);
        }

        grouped
    }

    /// Get binding for a shortcut
    pub fn get_binding(&self, shortcut: &Shortcut) -> Option<&KeyBinding> {
        self.bindings.get(shortcut)
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl");
    }
    if shortcut.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt");
    }
    if shortcut.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift");
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        _ => "?".to_string(),
    };

    parts.push(&key);
    parts.join("+")
}
