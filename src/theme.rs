use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::store::KeyValueStore;

/// Store key holding `"light"` or `"dark"`.
pub const THEME_KEY: &str = "flickr_theme_v1";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Caption for the switch control: names the theme it switches to.
    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "Dark mode",
            Theme::Dark => "Light mode",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(PersistenceError::Unrecognized(other.to_string())),
        }
    }
}

/// Global display state derived from the theme.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAttributes {
    /// Root-level "dark" marker.
    pub dark_class: bool,
    /// Color scheme hint for content rendering.
    pub color_scheme: Theme,
}

impl From<Theme> for DisplayAttributes {
    fn from(theme: Theme) -> Self {
        Self {
            dark_class: theme == Theme::Dark,
            color_scheme: theme,
        }
    }
}

pub struct ThemeManager {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
    display: DisplayAttributes,
}

impl fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManager")
            .field("theme", &self.theme)
            .field("display", &self.display)
            .finish()
    }
}

impl ThemeManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            theme: Theme::default(),
            display: DisplayAttributes::default(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn display(&self) -> DisplayAttributes {
        self.display
    }

    /// Reads the saved preference, defaulting to light when it is missing,
    /// unrecognized, or the store fails.
    pub fn load(&mut self) {
        self.theme = self.read_persisted().unwrap_or_else(|e| {
            debug!("Theme preference unavailable, using light: {}", e);
            Theme::Light
        });
        self.display = self.theme.into();
    }

    fn read_persisted(&self) -> Result<Theme, PersistenceError> {
        match self.store.get(THEME_KEY)? {
            Some(raw) => raw.parse(),
            None => Ok(Theme::default()),
        }
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled());
        self.theme
    }

    pub fn set(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            warn!("Failed to save theme preference: {}", e);
        }
        self.display = theme.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::BrokenStore;
    use crate::store::MemoryStore;

    #[test]
    fn test_toggle_twice_returns_to_original() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = ThemeManager::new(store.clone());
        manager.load();
        let original = manager.theme();

        manager.toggle();
        assert_eq!(manager.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

        manager.toggle();
        assert_eq!(manager.theme(), original);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_mutation_updates_display() {
        let mut manager = ThemeManager::new(Arc::new(MemoryStore::new()));
        manager.set(Theme::Dark);
        assert_eq!(
            manager.display(),
            DisplayAttributes {
                dark_class: true,
                color_scheme: Theme::Dark
            }
        );
        assert_eq!(manager.theme().label(), "Light mode");

        manager.set(Theme::Light);
        assert!(!manager.display().dark_class);
        assert_eq!(manager.theme().label(), "Dark mode");
    }

    #[test]
    fn test_load_reads_saved_value() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "dark").unwrap();

        let mut manager = ThemeManager::new(store);
        manager.load();
        assert_eq!(manager.theme(), Theme::Dark);
        assert!(manager.display().dark_class);

        manager.load();
        assert_eq!(manager.theme(), Theme::Dark);
    }

    #[test]
    fn test_load_unrecognized_value_defaults_light() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "DARK").unwrap();

        let mut manager = ThemeManager::new(store);
        manager.load();
        assert_eq!(manager.theme(), Theme::Light);
    }

    #[test]
    fn test_broken_store_keeps_memory_authoritative() {
        let mut manager = ThemeManager::new(Arc::new(BrokenStore));
        manager.load();
        assert_eq!(manager.theme(), Theme::Light);

        assert_eq!(manager.toggle(), Theme::Dark);
        assert_eq!(manager.theme(), Theme::Dark);
    }

    #[test]
    fn test_theme_wire_format() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), r#""dark""#);
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("blue".parse::<Theme>().is_err());
    }
}
