//! Config profile check

use crate::app::AppConfig;
use crate::health::check::{CheckResult, SystemCheck};

/// Loads each profile and sanity-checks the values the window and loop use
pub struct ConfigCheck {
    profiles: Vec<&'static str>,
}

impl ConfigCheck {
    pub fn new() -> Self {
        Self::with_profiles(vec!["debug", "release"])
    }

    pub fn with_profiles(profiles: Vec<&'static str>) -> Self {
        Self { profiles }
    }
}

impl Default for ConfigCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Values that load fine but would make the demo misbehave
fn problems(config: &AppConfig) -> Vec<String> {
    let mut found = Vec::new();
    let window = &config.window;
    if window.width < 1.0 || window.height < 1.0 {
        found.push(format!("window size {}x{} is empty", window.width, window.height));
    }
    if config.assets.vertex_shader == config.assets.fragment_shader {
        found.push(format!(
            "vertex and fragment stage share '{}'",
            config.assets.vertex_shader
        ));
    }
    let clear = config.render.clear_color.0;
    if clear.iter().any(|c| !(0.0..=1.0).contains(c)) {
        found.push(format!("clear colour {clear:?} is outside 0..=1"));
    }
    found
}

impl SystemCheck for ConfigCheck {
    fn name(&self) -> &'static str {
        "Configuration"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Loads every profile and the APP_ environment overrides")
    }

    fn check(&self) -> CheckResult {
        let mut lines = Vec::new();
        let mut failed = 0;
        let mut suspicious = 0;

        for profile in &self.profiles {
            let config = match AppConfig::load(profile) {
                Ok(config) => config,
                Err(e) => {
                    failed += 1;
                    lines.push(format!("  ✗ {profile}: {e}"));
                    continue;
                }
            };

            let issues = problems(&config);
            if issues.is_empty() {
                lines.push(format!(
                    "  ✓ {profile}: {}x{}, model '{}', reload on {} ({:?})",
                    config.window.width,
                    config.window.height,
                    config.assets.model,
                    config.hot_reload.key,
                    config.hot_reload.on_failure,
                ));
            } else {
                suspicious += 1;
                lines.extend(issues.iter().map(|issue| format!("  ⚠ {profile}: {issue}")));
            }
        }

        if let Err(e) = AppConfig::load_from_env() {
            suspicious += 1;
            lines.push(format!("  ⚠ APP_ environment: {e}"));
        }

        let details = lines.join("\n");
        let result = if failed > 0 {
            CheckResult::fail(format!("{failed} profile(s) failed to load"))
        } else if suspicious > 0 {
            CheckResult::warn(format!("{suspicious} profile(s) loaded with problems"))
        } else {
            CheckResult::pass(format!("{} profiles loaded", self.profiles.len()))
        };
        result.with_details(details)
    }
}
