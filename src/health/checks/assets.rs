//! Asset health check

use std::path::Path;

use crate::app::AppConfig;
use crate::app::renderer::{ShaderStage, VertexLayout};
use crate::game::ModelAsset;
use crate::health::check::{CheckResult, SystemCheck};

/// Checks that the configured model parses and both shader files are readable
pub struct AssetsCheck {
    config: Option<AppConfig>,
}

impl AssetsCheck {
    /// Checks the assets of the environment's profile
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Checks the assets named by `config`
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl Default for AssetsCheck {
    fn default() -> Self {
        Self::new()
    }
}

fn check_shader(stage: ShaderStage, path: &Path) -> Result<String, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("  ✗ {stage} shader {}: {e}", path.display()))?;
    if !source.contains(stage.entry_point()) {
        return Err(format!(
            "  ✗ {stage} shader {}: no `{}` entry point",
            path.display(),
            stage.entry_point()
        ));
    }
    Ok(format!(
        "  ✓ {stage} shader {} ({} bytes)",
        path.display(),
        source.len()
    ))
}

impl SystemCheck for AssetsCheck {
    fn name(&self) -> &'static str {
        "Assets"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates the model file and shader sources")
    }

    fn check(&self) -> CheckResult {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => match AppConfig::load_from_env() {
                Ok(config) => config,
                Err(e) => return CheckResult::fail(format!("Config failed to load: {e}")),
            },
        };
        let assets = &config.assets;
        let stride = VertexLayout::position_only().stride();

        let mut details = Vec::new();
        let mut failed = 0;

        match ModelAsset::load(&assets.model_path(), stride) {
            Ok(model) => details.push(format!(
                "  ✓ model {}: {} vertices, {} indices",
                assets.model_path().display(),
                model.vertex_count(stride),
                model.indices().len()
            )),
            Err(e) => {
                details.push(format!("  ✗ model: {e}"));
                failed += 1;
            }
        }

        for (stage, path) in [
            (ShaderStage::Vertex, assets.vertex_shader_path()),
            (ShaderStage::Fragment, assets.fragment_shader_path()),
        ] {
            match check_shader(stage, &path) {
                Ok(line) => details.push(line),
                Err(line) => {
                    details.push(line);
                    failed += 1;
                }
            }
        }

        let details = details.join("\n");
        if failed > 0 {
            CheckResult::fail(format!("{failed} asset(s) unusable")).with_details(details)
        } else {
            CheckResult::pass(format!("Assets under {} valid", assets.root.display()))
                .with_details(details)
        }
    }
}
