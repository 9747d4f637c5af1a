//! Application configuration
//!
//! Supports multiple profiles (debug, release) with different settings.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use super::input::KeyCode;
use super::renderer::ClearColor;

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width
    pub width: f64,
    /// Window height
    pub height: f64,
    /// Whether the window should be fullscreen
    pub fullscreen: bool,
    /// Whether the window should be resizable
    pub resizable: bool,
    /// Whether the window should be decorated (has title bar, borders, etc.)
    pub decorated: bool,
    /// Whether to enable vsync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "hotshade".to_string(),
            width: 1280.0,
            height: 720.0,
            fullscreen: false,
            resizable: true,
            decorated: true,
            vsync: true,
        }
    }
}

/// Asset locations
///
/// Shaders are looked up by bare file name under `<root>/shaders`, models
/// under `<root>/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Assets directory
    pub root: PathBuf,
    /// Vertex shader file name
    pub vertex_shader: String,
    /// Fragment shader file name
    pub fragment_shader: String,
    /// Model file name
    pub model: String,
}

impl AssetConfig {
    pub fn shader_path(&self, name: &str) -> PathBuf {
        self.root.join("shaders").join(name)
    }

    pub fn vertex_shader_path(&self) -> PathBuf {
        self.shader_path(&self.vertex_shader)
    }

    pub fn fragment_shader_path(&self) -> PathBuf {
        self.shader_path(&self.fragment_shader)
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join("models").join(&self.model)
    }

    /// Same file names under a different root
    pub fn with_root(&self, root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..self.clone()
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            vertex_shader: "vertex.wgsl".to_string(),
            fragment_shader: "fragment.wgsl".to_string(),
            model: "triangle.json".to_string(),
        }
    }
}

/// Frame settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Colour each frame is cleared to
    pub clear_color: ClearColor,
}

/// What a failed hot reload does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadFailurePolicy {
    /// Stop the loop and exit with the error
    #[default]
    Abort,
    /// Log the compiler output and keep drawing with the previous program
    KeepLastGood,
}

/// Hot reload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotReloadConfig {
    /// Key that triggers a reload
    pub key: KeyCode,
    pub on_failure: ReloadFailurePolicy,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            key: KeyCode::R,
            on_failure: ReloadFailurePolicy::Abort,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub hot_reload: HotReloadConfig,
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Profiles are loaded from config files in the following order:
    /// 1. config/{profile}.toml (profile-specific configuration)
    /// 2. Environment variables with prefix APP_ (e.g., APP_WINDOW__WIDTH=1920)
    ///
    /// Config files are searched for in:
    /// 1. Next to the executable (target/debug/config or target/release/config)
    /// 2. In the current directory (./config)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match Self::find_config_dir() {
            Some(dir) => {
                builder.add_source(File::from(dir.join(profile).as_path()).required(false))
            }
            None => {
                builder.add_source(File::with_name(&format!("config/{}", profile)).required(false))
            }
        };

        // Nested fields use __ (e.g., APP_HOT_RELOAD__KEY=F5)
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .set_override("profile", profile)?
            .build()?
            .try_deserialize()
    }

    /// Finds the config directory, preferring the one next to the executable
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        cwd_config.exists().then_some(cwd_config)
    }

    /// Loads configuration using the APP_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("APP_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }

    /// Built-in settings for `profile`, ignoring files and environment
    pub fn builtin(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            window: WindowConfig::default(),
            assets: AssetConfig::default(),
            render: RenderConfig::default(),
            hot_reload: HotReloadConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::load("release").unwrap_or_else(|_| Self::builtin("release"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let config = AppConfig::builtin("debug");
        assert_eq!(config.profile, "debug");
        assert_eq!(config.hot_reload.key, KeyCode::R);
        assert_eq!(config.hot_reload.on_failure, ReloadFailurePolicy::Abort);
        assert_eq!(config.render.clear_color, ClearColor::TRANSPARENT);
    }

    #[test]
    fn test_asset_paths_resolve_under_root() {
        let assets = AssetConfig::default().with_root("/tmp/demo");
        assert_eq!(
            assets.vertex_shader_path(),
            PathBuf::from("/tmp/demo/shaders/vertex.wgsl")
        );
        assert_eq!(
            assets.model_path(),
            PathBuf::from("/tmp/demo/models/triangle.json")
        );
    }

    #[test]
    fn test_debug_profile_loads() {
        let config = AppConfig::load("debug").unwrap();
        assert_eq!(config.profile, "debug");
        assert!(config.window.width > 0.0);
        assert!(!config.assets.model.is_empty());
    }

    #[test]
    fn test_missing_profile_falls_back_to_defaults() {
        let config = AppConfig::load("no-such-profile").unwrap();
        assert_eq!(config.profile, "no-such-profile");
        assert_eq!(config.assets.vertex_shader, "vertex.wgsl");
    }

    #[test]
    fn test_shipped_profiles_fail_fast_on_reload() {
        for profile in ["debug", "release"] {
            let config = AppConfig::load(profile).unwrap();
            assert_eq!(config.hot_reload.on_failure, ReloadFailurePolicy::Abort, "{profile}");
        }
    }

    #[test]
    fn test_policy_names() {
        let policy: ReloadFailurePolicy = serde_json::from_str("\"keep_last_good\"").unwrap();
        assert_eq!(policy, ReloadFailurePolicy::KeepLastGood);
        let key: KeyCode = serde_json::from_str("\"f5\"").unwrap();
        assert_eq!(key, KeyCode::F5);
    }
}
