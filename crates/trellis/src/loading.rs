//! Loading configuration files.

use std::path::Path;

use ecow::eco_format;
use serde::de::DeserializeOwned;
use serde_json::Value;
use trellis_layout::{LayoutConfig, ThemeManifest};
use trellis_library::diag::{StrResult, Warned};
use trellis_transform::ThemeConfig;
use trellis_validate::{
    ValidationResult, validate_layout_config, validate_manifest, validate_theme_config,
};

/// A configuration file format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    /// Determine the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Parse text into a generic value.
    pub fn parse(self, text: &str) -> StrResult<Value> {
        match self {
            Self::Json => serde_json::from_str(text)
                .map_err(|err| eco_format!("failed to parse JSON ({err})")),
            Self::Toml => toml::from_str(text)
                .map_err(|err| eco_format!("failed to parse TOML ({})", err.message())),
            Self::Yaml => serde_yaml::from_str(text)
                .map_err(|err| eco_format!("failed to parse YAML ({err})")),
        }
    }
}

/// Load a theme configuration.
///
/// Fails with all validation errors at once. Dangling cross-references are
/// returned as warnings.
pub fn load_theme(text: &str, format: Format) -> StrResult<Warned<ThemeConfig>> {
    load(text, format, validate_theme_config)
}

/// Load a layout configuration.
pub fn load_layout(text: &str, format: Format) -> StrResult<Warned<LayoutConfig>> {
    load(text, format, validate_layout_config)
}

/// Load a theme manifest.
pub fn load_manifest(text: &str, format: Format) -> StrResult<Warned<ThemeManifest>> {
    load(text, format, validate_manifest)
}

fn load<T: DeserializeOwned>(
    text: &str,
    format: Format,
    validate: fn(&Value) -> ValidationResult,
) -> StrResult<Warned<T>> {
    let value = format.parse(text)?;
    let warned = validate(&value).into_result()?;
    for warning in &warned.warnings {
        log::warn!("{warning}");
    }
    let output = serde_json::from_value(value)
        .map_err(|err| eco_format!("failed to decode configuration ({err})"))?;
    Ok(warned.map(|()| output))
}
