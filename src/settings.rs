use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::slides::{
    DEFAULT_WARM_RADIUS, DEFAULT_WARM_WORKERS, DisplayPolicy, DisplaySurface, PresenterConfig,
    TransitionStyle,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "slidedeck";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub transition: TransitionStyle,

    #[serde(default)]
    pub display_policy: DisplayPolicy,

    #[serde(default = "default_warm_radius")]
    pub warm_radius: usize,

    #[serde(default = "default_warm_workers")]
    pub warm_workers: usize,

    /// Where displayed slides are written; the working directory if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Surfaces besides the terminal window, e.g. a projector
    #[serde(default)]
    pub displays: Vec<DisplaySurface>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_warm_radius() -> usize {
    DEFAULT_WARM_RADIUS
}

fn default_warm_workers() -> usize {
    DEFAULT_WARM_WORKERS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            transition: TransitionStyle::default(),
            display_policy: DisplayPolicy::default(),
            warm_radius: default_warm_radius(),
            warm_workers: default_warm_workers(),
            export_dir: None,
            log_level: default_log_level(),
            displays: Vec::new(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// File the settings were loaded from; saves go back to it
static SETTINGS_PATH: LazyLock<RwLock<Option<PathBuf>>> = LazyLock::new(|| RwLock::new(None));

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load from the default location, writing defaults there on first run
pub fn load_settings() {
    let Some(path) = default_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    load_settings_from(&path);
}

/// Load from `path`, creating it with defaults if missing. An unreadable
/// file leaves the current settings in place.
pub fn load_settings_from(path: &Path) {
    if let Ok(mut current) = SETTINGS_PATH.write() {
        *current = Some(path.to_path_buf());
    }

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, path);
        }
        return;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let path = SETTINGS_PATH
        .read()
        .ok()
        .and_then(|p| p.clone())
        .or_else(default_config_path);
    let Some(path) = path else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let yaml = match serde_yaml::to_string(settings) {
        Ok(yaml) => yaml,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, format!("{SETTINGS_HEADER}{yaml}")) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# slidedeck settings
# ============================================================================
# transition:      fade | push | reveal | move-in | cube | flip
# display_policy:  "auto", or the 1-based position of a display in the list
#                  (terminal window first, then `displays` below)
# warm_radius:     slides pre-rendered on each side of the current one
# warm_workers:    background render threads (0 disables warming)
# log_level:       off | error | warn | info | debug | trace
#
# Extra displays, e.g. a projector:
#   displays:
#     - id: 2
#       name: "Projector"
#       frame: { width: 1920, height: 1080 }
#       scale_factor: 1.0

"#;

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Replace all settings in memory without saving
pub fn replace_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn get_transition() -> TransitionStyle {
    SETTINGS.read().map(|s| s.transition).unwrap_or_default()
}

pub fn set_transition(style: TransitionStyle) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.transition = style;
    }
    save_settings();
}

pub fn get_display_policy() -> DisplayPolicy {
    SETTINGS.read().map(|s| s.display_policy).unwrap_or_default()
}

pub fn set_display_policy(policy: DisplayPolicy) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.display_policy = policy;
    }
    save_settings();
}

pub fn get_warm_radius() -> usize {
    SETTINGS
        .read()
        .map(|s| s.warm_radius)
        .unwrap_or(DEFAULT_WARM_RADIUS)
}

pub fn get_warm_workers() -> usize {
    SETTINGS
        .read()
        .map(|s| s.warm_workers)
        .unwrap_or(DEFAULT_WARM_WORKERS)
}

pub fn get_export_dir() -> Option<PathBuf> {
    SETTINGS.read().ok().and_then(|s| s.export_dir.clone())
}

pub fn get_log_level() -> LevelFilter {
    let level = SETTINGS
        .read()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| default_log_level());
    level.parse().unwrap_or_else(|_| {
        warn!("Unknown log level {level:?}, using info");
        LevelFilter::Info
    })
}

pub fn get_displays() -> Vec<DisplaySurface> {
    SETTINGS
        .read()
        .map(|s| s.displays.clone())
        .unwrap_or_default()
}

/// Presenter options taken from the current settings
pub fn presenter_config() -> PresenterConfig {
    PresenterConfig {
        transition: get_transition(),
        display_policy: get_display_policy(),
        warm_radius: get_warm_radius(),
        warm_workers: get_warm_workers(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn fresh(dir: &TempDir) -> PathBuf {
        replace_settings(Settings::default());
        dir.path().join("slidedeck").join(SETTINGS_FILENAME)
    }

    #[test]
    #[serial]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = fresh(&dir);

        load_settings_from(&path);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# ====="));
        let parsed: Settings = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    #[serial]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = fresh(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "transition: cube\ndisplay_policy: \"2\"\ndisplays:\n  - id: 7\n    frame: { width: 1280, height: 720 }\n",
        )
        .unwrap();

        load_settings_from(&path);

        assert_eq!(get_transition(), TransitionStyle::Cube);
        assert_eq!(get_display_policy(), DisplayPolicy::Explicit(2));
        assert_eq!(get_warm_radius(), DEFAULT_WARM_RADIUS);
        let displays = get_displays();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].render_size().width, 1280);
        assert!((displays[0].scale_factor - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    #[serial]
    fn setters_persist() {
        let dir = TempDir::new().unwrap();
        let path = fresh(&dir);
        load_settings_from(&path);

        set_transition(TransitionStyle::MoveIn);
        set_display_policy(DisplayPolicy::Automatic);

        let parsed: Settings = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.transition, TransitionStyle::MoveIn);
        assert_eq!(parsed.display_policy, DisplayPolicy::Automatic);
    }

    #[test]
    #[serial]
    fn broken_file_keeps_current_settings() {
        let dir = TempDir::new().unwrap();
        let path = fresh(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "transition: [not, a, style\n").unwrap();

        load_settings_from(&path);

        assert_eq!(get_settings(), Settings::default());
    }

    #[test]
    #[serial]
    fn old_version_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = fresh(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "version: 0\nwarm_radius: 3\n").unwrap();

        load_settings_from(&path);

        assert_eq!(get_settings().version, CURRENT_VERSION);
        assert_eq!(get_warm_radius(), 3);
        let parsed: Settings = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.version, CURRENT_VERSION);
    }

    #[test]
    #[serial]
    fn presenter_config_follows_settings() {
        replace_settings(Settings {
            transition: TransitionStyle::Flip,
            display_policy: DisplayPolicy::Explicit(2),
            warm_radius: 3,
            warm_workers: 0,
            ..Settings::default()
        });

        let config = presenter_config();
        assert_eq!(config.transition, TransitionStyle::Flip);
        assert_eq!(config.display_policy, DisplayPolicy::Explicit(2));
        assert_eq!(config.warm_radius, 3);
        assert_eq!(config.warm_workers, 0);
        replace_settings(Settings::default());
    }

    #[test]
    #[serial]
    fn log_level_falls_back_to_info() {
        replace_settings(Settings {
            log_level: "chatty".to_string(),
            ..Settings::default()
        });
        assert_eq!(get_log_level(), LevelFilter::Info);

        replace_settings(Settings {
            log_level: "debug".to_string(),
            ..Settings::default()
        });
        assert_eq!(get_log_level(), LevelFilter::Debug);
        replace_settings(Settings::default());
    }
}
