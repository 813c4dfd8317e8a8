//! Light/dark theme handling, persisted across sessions.

use anyhow::{anyhow, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;

const PREFERENCES_FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn flipped(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct Preferences {
    theme: Theme,
}

/// Loads and saves the active theme under a fixed key in the preferences
/// file. Constructed once in main and handed to the UI; there is no global
/// theme state.
pub struct ThemeManager {
    path: PathBuf,
}

impl ThemeManager {
    /// Use an explicit preferences path, or the platform default
    /// (`<config dir>/outreach/preferences.json`) when none is given.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                let mut dir = dirs::config_dir()
                    .ok_or_else(|| anyhow!("Could not determine config directory"))?;
                dir.push("outreach");
                fs::create_dir_all(&dir)?;
                dir.push(PREFERENCES_FILE_NAME);
                dir
            }
        };

        Ok(ThemeManager { path })
    }

    pub fn in_dir(dir: &PathBuf) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Self::new(Some(dir.join(PREFERENCES_FILE_NAME)))
    }

    /// The saved theme, defaulting to light when nothing was saved yet.
    pub fn load(&self) -> Result<Theme> {
        if !self.path.exists() {
            return Ok(Theme::Light);
        }

        let contents = fs::read_to_string(&self.path)?;
        let prefs: Preferences = serde_json::from_str(&contents)?;
        Ok(prefs.theme)
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &Preferences { theme })?;

        info!("Theme preference saved: {}", theme.name());
        Ok(())
    }

    /// Flip the saved theme and return the new value.
    pub fn toggle(&self) -> Result<Theme> {
        let theme = self.load()?.flipped();
        self.save(theme)?;
        Ok(theme)
    }
}
