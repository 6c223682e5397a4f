//! Editor preferences and settings.
//!
//! Persistent settings that survive editor restarts, stored as TOML.
//! Keys missing from the file fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use void_scene::{DeserializeOptions, UnknownTypePolicy};

use crate::error::{EditorError, Result};

/// Editor preferences and settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    // History settings
    pub max_undo: usize,
    pub max_changes: usize,

    // Snapshot settings
    pub snapshot_capacity: usize,
    pub capture_runtime_on_stop: bool,

    // Document settings
    pub unknown_type_policy: UnknownTypePolicy,
    pub pretty_documents: bool,

    // Recent files
    pub max_recent_files: usize,
    pub recent_scenes: Vec<PathBuf>,

    // Last used directories
    pub last_scene_directory: Option<PathBuf>,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            // History
            max_undo: 100,
            max_changes: 1000,

            // Snapshots
            snapshot_capacity: 16,
            capture_runtime_on_stop: true,

            // Documents
            unknown_type_policy: UnknownTypePolicy::Skip,
            pretty_documents: true,

            // Recent files
            max_recent_files: 10,
            recent_scenes: Vec::new(),

            // Directories
            last_scene_directory: None,
        }
    }
}

impl EditorPreferences {
    /// Load preferences from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let prefs: Self =
            toml::from_str(&content).map_err(|e| EditorError::Preferences(e.to_string()))?;
        log::info!("Loaded preferences from {:?}", path);
        Ok(prefs)
    }

    /// Load from the default path, falling back to defaults on any failure.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Ignoring unreadable preferences at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save preferences to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EditorError::Preferences(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        log::info!("Saved preferences to {:?}", path);
        Ok(())
    }

    /// Get the default preferences path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("void_editor");
            p.push("preferences.toml");
            p
        })
    }

    /// Options for loading documents under these preferences
    pub fn deserialize_options(&self) -> DeserializeOptions {
        DeserializeOptions::with_policy(self.unknown_type_policy)
    }

    /// Move `path` to the front of the recent scenes list
    pub fn add_recent_scene(&mut self, path: PathBuf) {
        if let Some(dir) = path.parent() {
            self.last_scene_directory = Some(dir.to_path_buf());
        }
        self.recent_scenes.retain(|existing| *existing != path);
        self.recent_scenes.insert(0, path);
        self.recent_scenes.truncate(self.max_recent_files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.toml");

        let mut prefs = EditorPreferences::default();
        prefs.max_undo = 25;
        prefs.unknown_type_policy = UnknownTypePolicy::Substitute;
        prefs.add_recent_scene(PathBuf::from("/scenes/a.json"));
        prefs.save(&path).unwrap();

        let loaded = EditorPreferences::load(&path).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let prefs: EditorPreferences = toml::from_str("max_undo = 5\nunknown_type_policy = \"fail\"").unwrap();
        assert_eq!(prefs.max_undo, 5);
        assert_eq!(prefs.unknown_type_policy, UnknownTypePolicy::Fail);
        assert_eq!(prefs.snapshot_capacity, 16);
        assert!(prefs.capture_runtime_on_stop);
    }

    #[test]
    fn test_recent_scenes_are_bounded_and_deduplicated() {
        let mut prefs = EditorPreferences {
            max_recent_files: 2,
            ..Default::default()
        };
        prefs.add_recent_scene(PathBuf::from("/s/a.json"));
        prefs.add_recent_scene(PathBuf::from("/s/b.json"));
        prefs.add_recent_scene(PathBuf::from("/s/a.json"));
        prefs.add_recent_scene(PathBuf::from("/s/c.json"));

        assert_eq!(
            prefs.recent_scenes,
            vec![PathBuf::from("/s/c.json"), PathBuf::from("/s/a.json")]
        );
        assert_eq!(prefs.last_scene_directory, Some(PathBuf::from("/s")));
    }
}
