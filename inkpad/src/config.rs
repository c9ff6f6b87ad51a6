//! User preferences, stored as TOML under the platform's preference directory.

use inkpad_core::color::Color;

const DOCUMENTATION: &str = r##"# Preferences for inkpad. Delete this file to restore the defaults.
#
# tile_size       edge length of a cached raster tile, in document units
# pixel_ratio     device pixels per document unit
# background      canvas color, as "#rrggbb" or "#rrggbbaa"
# history_depth   number of undo steps kept
# [debug]         overlays drawn by the hot layer
# [pen]           initial pen color and width
"##;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no preferences dir found")]
    NoPreferencesDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Copy, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DebugOverlays {
    /// Outline every cached tile.
    pub tile_grid: bool,
    /// Outline the area the active tool reported as changing.
    pub preview_hint: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PenPreferences {
    pub color: Color,
    pub width: f32,
}
impl Default for PenPreferences {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 4.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub tile_size: u32,
    pub pixel_ratio: f32,
    pub background: Color,
    pub history_depth: usize,
    pub debug: DebugOverlays,
    pub pen: PenPreferences,
}
impl Default for Preferences {
    fn default() -> Self {
        Self {
            tile_size: crate::render::tiles::DEFAULT_TILE_SIZE,
            pixel_ratio: 1.0,
            background: Color::WHITE,
            history_depth: inkpad_core::history::DEFAULT_DEPTH,
            debug: DebugOverlays::default(),
            pen: PenPreferences::default(),
        }
    }
}
impl Preferences {
    const FILENAME: &'static str = "preferences.toml";
    /// Load the user's preferences, or the defaults if they are missing or unreadable.
    #[must_use]
    pub fn load_or_default() -> Self {
        let Some(mut path) = preferences_dir() else {
            return Self::default();
        };
        path.push(Self::FILENAME);
        match Self::load(&path) {
            Ok(preferences) => preferences,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                log::warn!("failed to load {path:?}, using defaults: {err}");
                Self::default()
            }
        }
    }
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let string = std::fs::read_to_string(path)?;
        Self::from_toml(&string)
    }
    pub fn from_toml(string: &str) -> Result<Self, ConfigError> {
        let mut preferences: Self = toml::from_str(string)?;
        // A zero tile would never cover anything.
        preferences.tile_size = preferences.tile_size.max(1);
        if !(preferences.pixel_ratio.is_finite() && preferences.pixel_ratio > 0.0) {
            preferences.pixel_ratio = 1.0;
        }
        Ok(preferences)
    }
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let string = toml::ser::to_string_pretty(self)?;
        // Prefix some documentation.
        Ok(DOCUMENTATION.to_owned() + &string)
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences = preferences_dir().ok_or(ConfigError::NoPreferencesDir)?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        std::fs::write(preferences, self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Preferences;
    use inkpad_core::color::Color;

    #[test]
    fn toml_round_trip() {
        let mut preferences = Preferences::default();
        preferences.debug.tile_grid = true;
        preferences.pen.color = Color::from_rgba8(0x12, 0x34, 0x56, 0xff);
        let text = preferences.to_toml().unwrap();
        assert!(text.starts_with("# Preferences"));
        assert!(text.contains("\"#rrggbb\" or \"#rrggbbaa\""));
        assert_eq!(Preferences::from_toml(&text).unwrap(), preferences);
    }
    #[test]
    fn partial_file_fills_defaults() {
        let preferences = Preferences::from_toml("tile_size = 0\n[pen]\nwidth = 9.0\n").unwrap();
        assert_eq!(preferences.tile_size, 1);
        assert_eq!(preferences.pen.width, 9.0);
        assert_eq!(preferences.pen.color, Color::BLACK);
        assert_eq!(preferences.background, Color::WHITE);
    }
    #[test]
    fn rejects_garbage() {
        assert!(Preferences::from_toml("tile_size = \"big\"").is_err());
    }
}
