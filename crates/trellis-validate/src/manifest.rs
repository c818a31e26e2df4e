use ecow::eco_format;
use serde_json::Value;

use crate::{Sink, ValidationResult, each_entry};

/// Validate a theme manifest.
///
/// Route rules pointing to undeclared layouts only warn, and only if the
/// manifest declares any layouts at all.
pub fn validate_manifest(manifest: &Value) -> ValidationResult {
    let mut sink = Sink::default();
    let Some(object) = manifest.as_object() else {
        sink.error("", "Manifest must be a non-null object");
        return sink.finish("manifest");
    };

    for field in ["name", "version", "target", "designTokens"] {
        sink.require_str(object.get(field), field);
    }

    let mut layouts = vec![];
    each_entry(&mut sink, object.get("layouts"), "layouts", |sink, name, layout| {
        layouts.push(name);
        let Some(layout) = layout.as_object() else {
            sink.error(eco_format!("layouts.{name}"), "Must be an object");
            return;
        };
        sink.require_str(layout.get("component"), eco_format!("layouts.{name}.component"));
        if !layout.get("regions").is_some_and(Value::is_array) {
            sink.error(eco_format!("layouts.{name}.regions"), "Required and must be an array");
        }
    });

    if let Some(rules) = object.get("routeRules") {
        match rules.as_array() {
            None => sink.error("routeRules", "Must be an array"),
            Some(rules) => {
                for (i, rule) in rules.iter().enumerate() {
                    let path = eco_format!("routeRules[{i}]");
                    let Some(rule) = rule.as_object() else {
                        sink.error(path, "Must be an object");
                        continue;
                    };
                    sink.require_str(rule.get("pattern"), eco_format!("{path}.pattern"));
                    match rule.get("layout").and_then(Value::as_str).filter(|l| !l.is_empty()) {
                        None => sink.error(
                            eco_format!("{path}.layout"),
                            "Required and must be a non-empty string",
                        ),
                        Some(layout) if !layouts.is_empty() && !layouts.contains(&layout) => {
                            sink.warn(
                                eco_format!("{path}.layout"),
                                eco_format!(
                                    "References layout \"{layout}\" which is not defined in layouts"
                                ),
                            )
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }

    each_entry(&mut sink, object.get("components"), "components", |sink, name, component| {
        match component.as_object() {
            None => sink.error(eco_format!("components.{name}"), "Must be an object"),
            Some(component) => sink.require_str(
                component.get("component"),
                eco_format!("components.{name}.component"),
            ),
        }
    });

    sink.finish("manifest")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "name": "lumina",
            "version": "0.1.0",
            "target": "svelte",
            "designTokens": "tokens.css",
            "layouts": {
                "default": { "component": "Default.svelte", "regions": ["header"] },
                "docs": { "component": "Docs.svelte", "regions": ["nav"] }
            },
            "routeRules": [
                { "pattern": "docs/**", "layout": "docs" },
                { "pattern": "**", "layout": "default" }
            ],
            "components": { "Hint": { "component": "Hint.svelte" } }
        })
    }

    #[test]
    fn test_valid() {
        let result = validate_manifest(&valid());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_required_fields() {
        assert!(!validate_manifest(&json!([])).valid);
        let result = validate_manifest(&json!({}));
        assert!(!result.valid);
        for path in ["name", "version", "target", "designTokens"] {
            assert!(result.has_error(path));
        }
    }

    #[test]
    fn test_entries() {
        let mut manifest = valid();
        manifest["layouts"]["bad"] = json!({});
        manifest["routeRules"][1] = json!({ "pattern": "" });
        manifest["components"]["Bad"] = json!({ "component": "" });
        let result = validate_manifest(&manifest);
        assert!(!result.valid);
        assert!(result.has_error("layouts.bad.component"));
        assert!(result.has_error("layouts.bad.regions"));
        assert!(result.has_error("routeRules[1].pattern"));
        assert!(result.has_error("routeRules[1].layout"));
        assert!(result.has_error("components.Bad.component"));

        manifest["routeRules"] = json!({});
        assert!(validate_manifest(&manifest).has_error("routeRules"));
    }

    #[test]
    fn test_route_to_undeclared_layout() {
        let mut manifest = valid();
        manifest["routeRules"][0]["layout"] = json!("nonexistent");
        let result = validate_manifest(&manifest);
        assert!(result.valid);
        assert!(result.has_warning("routeRules[0].layout"));
        assert!(result.warnings[0].message.contains("\"nonexistent\""));

        manifest.as_object_mut().unwrap().remove("layouts");
        assert!(validate_manifest(&manifest).warnings.is_empty());
    }
}
