//! Light/dark theme preference.
//!
//! [`ThemeManager`] owns the current theme, persists changes through a
//! [`ThemeStore`], and broadcasts every change to its subscribers. The chart
//! registry is one such subscriber: it recreates its charts with the new
//! palette when notified.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// The toggle shows a sun while dark (switch to light) and a moon while light.
    pub fn icons(self) -> ThemeIcons {
        ThemeIcons {
            sun_visible: self == Self::Dark,
            moon_visible: self == Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeIcons {
    pub sun_visible: bool,
    pub moon_visible: bool,
}

impl ThemeIcons {
    pub fn glyph(self) -> &'static str {
        if self.sun_visible { "☀" } else { "☾" }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Where the theme preference is kept between runs.
pub trait ThemeStore {
    fn load(&self) -> Option<Theme>;
    fn save(&self, theme: Theme) -> Result<()>;
}

/// Persists the preference as `ui.theme` in the global config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigThemeStore;

impl ThemeStore for ConfigThemeStore {
    fn load(&self) -> Option<Theme> {
        Some(config::load().ui.theme)
    }

    fn save(&self, theme: Theme) -> Result<()> {
        config::set_config_value("ui.theme", theme.as_str())
    }
}

/// In-process store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryThemeStore {
    slot: Arc<Mutex<Option<Theme>>>,
}

impl MemoryThemeStore {
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(theme))),
        }
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> Option<Theme> {
        self.slot.lock().ok().and_then(|slot| *slot)
    }

    fn save(&self, theme: Theme) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("theme store lock poisoned"))?;
        *slot = Some(theme);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct ThemeManager {
    current: Theme,
    store: Box<dyn ThemeStore>,
    subscribers: Vec<Sender<Theme>>,
}

impl ThemeManager {
    /// Start from the stored preference, or `dark` when none is stored.
    pub fn initialize(store: Box<dyn ThemeStore>) -> Self {
        let current = store.load().unwrap_or_default();
        Self {
            current,
            store,
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Receive every subsequent theme change.
    pub fn subscribe(&mut self) -> Receiver<Theme> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn toggle(&mut self) -> Result<Theme> {
        self.set(self.current.toggled())
    }

    /// Switch themes, notify subscribers, then persist the choice.
    pub fn set(&mut self, theme: Theme) -> Result<Theme> {
        self.current = theme;
        self.subscribers.retain(|tx| tx.send(theme).is_ok());
        self.store
            .save(theme)
            .context("failed to persist theme preference")?;
        Ok(theme)
    }
}

impl fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManager")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_dark_without_stored_preference() {
        let manager = ThemeManager::initialize(Box::new(MemoryThemeStore::default()));
        assert_eq!(manager.current(), Theme::Dark);
    }

    #[test]
    fn restores_stored_preference() {
        let store = MemoryThemeStore::with_theme(Theme::Light);
        let manager = ThemeManager::initialize(Box::new(store));
        assert_eq!(manager.current(), Theme::Light);
    }

    #[test]
    fn toggle_persists_and_notifies() {
        let store = MemoryThemeStore::default();
        let mut manager = ThemeManager::initialize(Box::new(store.clone()));
        let updates = manager.subscribe();

        assert_eq!(manager.toggle().unwrap(), Theme::Light);
        assert_eq!(store.load(), Some(Theme::Light));
        assert_eq!(updates.try_recv().unwrap(), Theme::Light);

        assert_eq!(manager.toggle().unwrap(), Theme::Dark);
        assert_eq!(updates.try_recv().unwrap(), Theme::Dark);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut manager = ThemeManager::initialize(Box::new(MemoryThemeStore::default()));
        drop(manager.subscribe());
        manager.toggle().unwrap();
        assert!(manager.subscribers.is_empty());
    }

    #[test]
    fn icons_follow_theme() {
        assert!(Theme::Dark.icons().sun_visible);
        assert!(!Theme::Dark.icons().moon_visible);
        assert!(Theme::Light.icons().moon_visible);
        assert_eq!(Theme::Light.icons().glyph(), "☾");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Theme::parse("Light"), Some(Theme::Light));
        assert_eq!(Theme::parse(" dark "), Some(Theme::Dark));
        assert_eq!(Theme::parse("blue"), None);
    }
}
