//! Static checks for Trellis's configuration files.
//!
//! Validation runs on the raw JSON value, before deserialization, so that
//! every problem is reported with its path instead of only the first one
//! serde stumbles over. Structural problems are errors and make a
//! configuration unusable. Dangling cross-references are warnings: a theme
//! under development is often incomplete.

mod layout;
mod manifest;
mod theme;

pub use self::layout::validate_layout_config;
pub use self::manifest::validate_manifest;
pub use self::theme::validate_theme_config;

use ecow::{EcoString, EcoVec, eco_format};
use serde::Serialize;
use serde_json::{Map, Value};
use trellis_library::diag::{ConfigDiagnostic, Severity, StrResult, Warned, join_diagnostics};

/// The outcome of validating a configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Whether there are no errors. Warnings don't count.
    pub valid: bool,
    pub errors: EcoVec<ConfigDiagnostic>,
    pub warnings: EcoVec<ConfigDiagnostic>,
}

impl ValidationResult {
    /// Whether there is an error at exactly this path.
    pub fn has_error(&self, path: &str) -> bool {
        self.errors.iter().any(|diag| diag.path.as_str() == path)
    }

    /// Whether there is a warning at exactly this path.
    pub fn has_warning(&self, path: &str) -> bool {
        self.warnings.iter().any(|diag| diag.path.as_str() == path)
    }

    /// Fail with all errors or pass on the warnings.
    pub fn into_result(self) -> StrResult<Warned<()>> {
        if !self.valid {
            return Err(join_diagnostics(&self.errors));
        }
        Ok(Warned { output: (), warnings: self.warnings })
    }
}

/// Collects diagnostics while walking a configuration object.
#[derive(Default)]
struct Sink {
    errors: EcoVec<ConfigDiagnostic>,
    warnings: EcoVec<ConfigDiagnostic>,
}

impl Sink {
    fn error(&mut self, path: impl Into<EcoString>, message: impl Into<EcoString>) {
        self.errors.push(ConfigDiagnostic::error(path, message));
    }

    fn warn(&mut self, path: impl Into<EcoString>, message: impl Into<EcoString>) {
        self.warnings.push(ConfigDiagnostic::warning(path, message));
    }

    fn push(&mut self, diag: ConfigDiagnostic) {
        match diag.severity {
            Severity::Error => self.errors.push(diag),
            Severity::Warning => self.warnings.push(diag),
        }
    }

    /// Error unless `value` is a non-empty string.
    fn require_str(&mut self, value: Option<&Value>, path: impl Into<EcoString>) {
        if !is_non_empty_str(value) {
            self.error(path, "Required and must be a non-empty string");
        }
    }

    fn finish(self, what: &str) -> ValidationResult {
        log::debug!(
            "validated {what}: {} errors, {} warnings",
            self.errors.len(),
            self.warnings.len()
        );
        ValidationResult {
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

fn is_non_empty_str(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).is_some_and(|s| !s.is_empty())
}

/// Check that an optional field holds an object and visit its entries.
fn each_entry<'a>(
    sink: &mut Sink,
    value: Option<&'a Value>,
    path: &str,
    mut f: impl FnMut(&mut Sink, &'a str, &'a Value),
) -> Option<&'a Map<String, Value>> {
    let value = value?;
    let Some(object) = value.as_object() else {
        sink.error(path, "Must be an object");
        return None;
    };
    for (key, entry) in object {
        f(sink, key.as_str(), entry);
    }
    Some(object)
}

/// Check that an object maps every key to a string.
fn string_map(sink: &mut Sink, value: Option<&Value>, path: &str) {
    each_entry(sink, value, path, |sink, key, entry| {
        if !entry.is_string() {
            sink.error(eco_format!("{path}.{key}"), "Must be a string");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_result() {
        let ok = validate_manifest(&json!({
            "name": "lumina", "version": "1.0.0", "target": "svelte",
            "designTokens": "tokens.css",
            "layouts": { "default": { "component": "D.svelte", "regions": [] } },
            "routeRules": [{ "pattern": "**", "layout": "docs" }]
        }));
        let warned = ok.into_result().unwrap();
        assert_eq!(warned.warnings.len(), 1);

        let bad = validate_manifest(&json!({ "name": "lumina" }));
        let message = bad.into_result().unwrap_err();
        assert!(message.lines().any(|line| line.starts_with("version: ")));
        assert_eq!(message.lines().count(), 3);
    }
}
