use ecow::{EcoString, eco_format};
use serde_json::{Map, Value};
use trellis_library::diag::ConfigDiagnostic;

use crate::{Sink, ValidationResult, each_entry, is_non_empty_str, string_map};

/// Validate a theme configuration.
///
/// Besides the shape of each field, this cross-checks structure entries
/// against the rune's modifiers and the theme's icon groups.
pub fn validate_theme_config(config: &Value) -> ValidationResult {
    let mut sink = Sink::default();
    let Some(object) = config.as_object() else {
        sink.error("", "Config must be a non-null object");
        return sink.finish("theme config");
    };

    if !is_non_empty_str(object.get("prefix")) {
        sink.error("prefix", "Must be a non-empty string");
    }
    if !is_non_empty_str(object.get("tokenPrefix")) {
        sink.error("tokenPrefix", "Must be a non-empty string");
    }

    let icons = each_entry(&mut sink, object.get("icons"), "icons", |sink, group, variants| {
        let path = eco_format!("icons.{group}");
        let Some(variants) = variants.as_object() else {
            sink.error(path, "Must be an object mapping variant names to SVG strings");
            return;
        };
        for (variant, svg) in variants {
            if !svg.is_string() {
                sink.error(eco_format!("{path}.{variant}"), "Must be an SVG string");
            }
        }
    });
    let no_icons = Map::new();
    let icons = icons.unwrap_or(&no_icons);

    match object.get("runes") {
        None => sink.error("runes", "Required field"),
        runes => {
            each_entry(&mut sink, runes, "runes", |sink, name, rune| {
                validate_rune(sink, name, rune, icons);
            });
        }
    }

    sink.finish("theme config")
}

fn validate_rune(sink: &mut Sink, name: &str, rune: &Value, icons: &Map<String, Value>) {
    let path = eco_format!("runes.{name}");
    let Some(rune) = rune.as_object() else {
        sink.error(path, "Must be an object");
        return;
    };

    sink.require_str(rune.get("block"), eco_format!("{path}.block"));

    let mut modifiers = vec![];
    let path_mods = eco_format!("{path}.modifiers");
    each_entry(sink, rune.get("modifiers"), &path_mods, |sink, name, spec| {
        modifiers.push(name);
        let path = eco_format!("{path_mods}.{name}");
        let Some(spec) = spec.as_object() else {
            sink.error(path, "Must be an object");
            return;
        };
        if !matches!(spec.get("source").and_then(Value::as_str), Some("meta" | "attribute")) {
            sink.error(eco_format!("{path}.source"), "Must be \"meta\" or \"attribute\"");
        }
        if spec.get("default").is_some_and(|d| !d.is_string()) {
            sink.error(eco_format!("{path}.default"), "Must be a string if provided");
        }
    });

    string_map(sink, rune.get("contextModifiers"), &eco_format!("{path}.contextModifiers"));

    if let Some(statics) = rune.get("staticModifiers") {
        let path = eco_format!("{path}.staticModifiers");
        match statics.as_array() {
            None => sink.error(path, "Must be an array of strings"),
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        sink.error(eco_format!("{path}[{i}]"), "Must be a string");
                    }
                }
            }
        }
    }

    string_map(sink, rune.get("autoLabel"), &eco_format!("{path}.autoLabel"));

    if let Some(wrapper) = rune.get("contentWrapper") {
        let path = eco_format!("{path}.contentWrapper");
        match wrapper.as_object() {
            None => sink.error(path, "Must be an object with tag and ref"),
            Some(wrapper) => {
                sink.require_str(wrapper.get("tag"), eco_format!("{path}.tag"));
                sink.require_str(wrapper.get("ref"), eco_format!("{path}.ref"));
            }
        }
    }

    let path_styles = eco_format!("{path}.styles");
    each_entry(sink, rune.get("styles"), &path_styles, |sink, name, spec| {
        let path = eco_format!("{path_styles}.{name}");
        match spec {
            Value::String(_) => {}
            Value::Object(spec) => {
                let prop = spec.get("prop").is_some_and(Value::is_string);
                let template = spec.get("template").is_some_and(Value::is_string);
                if !prop || !template {
                    sink.error(path, "Object form must have \"prop\" and \"template\" strings");
                }
            }
            _ => sink.error(path, "Must be a string or { prop, template } object"),
        }
    });

    let structure = StructureCheck { modifiers: &modifiers, icons };
    let path_structure = eco_format!("{path}.structure");
    each_entry(sink, rune.get("structure"), &path_structure, |sink, name, entry| {
        structure.entry(sink, entry, eco_format!("{path_structure}.{name}"));
    });
}

/// The names a structure entry's `transform` may take.
const TEXT_TRANSFORMS: &[&str] = &["duration", "uppercase", "capitalize"];

/// Cross-references available to a rune's structure entries.
struct StructureCheck<'a> {
    modifiers: &'a [&'a str],
    icons: &'a Map<String, Value>,
}

impl StructureCheck<'_> {
    fn entry(&self, sink: &mut Sink, entry: &Value, path: EcoString) {
        let Some(entry) = entry.as_object() else {
            sink.error(path, "Must be an object");
            return;
        };

        sink.require_str(entry.get("tag"), eco_format!("{path}.tag"));

        if let Some(condition) = entry.get("condition") {
            let path = eco_format!("{path}.condition");
            match condition.as_str() {
                None => sink.error(path, "Must be a string"),
                Some(name) => self.modifier_ref(sink, name, path),
            }
        }

        if let Some(any) = entry.get("conditionAny") {
            let path = eco_format!("{path}.conditionAny");
            match any.as_array() {
                None => sink.error(path, "Must be an array of strings"),
                Some(names) => {
                    for name in names {
                        match name.as_str() {
                            None => sink.error(path.clone(), "All entries must be strings"),
                            Some(name) => self.modifier_ref(sink, name, path.clone()),
                        }
                    }
                }
            }
        }

        if let Some(transform) = entry.get("transform") {
            let path = eco_format!("{path}.transform");
            match transform.as_str() {
                None => sink.error(path, "Must be a string"),
                Some(name) if !TEXT_TRANSFORMS.contains(&name) => sink.push(
                    ConfigDiagnostic::warning(
                        path,
                        eco_format!("Unknown transform \"{name}\", the text is left unchanged"),
                    )
                    .with_hint(eco_format!("known transforms: {}", TEXT_TRANSFORMS.join(", "))),
                ),
                Some(_) => {}
            }
        }

        if let Some(icon) = entry.get("icon") {
            let path = eco_format!("{path}.icon");
            match icon.as_object() {
                None => sink.error(path, "Must be an object with group and variant"),
                Some(icon) => {
                    match icon.get("group").and_then(Value::as_str) {
                        None => sink.error(eco_format!("{path}.group"), "Must be a string"),
                        Some(group) if !self.icons.contains_key(group) => sink.warn(
                            eco_format!("{path}.group"),
                            eco_format!(
                                "References icon group \"{group}\" which is not defined in icons"
                            ),
                        ),
                        Some(_) => {}
                    }
                    if !icon.get("variant").is_some_and(Value::is_string) {
                        sink.error(eco_format!("{path}.variant"), "Must be a string");
                    }
                }
            }
        }

        if let Some(children) = entry.get("children") {
            let path = eco_format!("{path}.children");
            match children.as_array() {
                None => sink.error(path, "Must be an array"),
                Some(children) => {
                    for (i, child) in children.iter().enumerate() {
                        if !child.is_string() {
                            self.entry(sink, child, eco_format!("{path}[{i}]"));
                        }
                    }
                }
            }
        }
    }

    fn modifier_ref(&self, sink: &mut Sink, name: &str, path: EcoString) {
        if self.modifiers.contains(&name) {
            return;
        }
        let mut diag = ConfigDiagnostic::warning(
            path,
            eco_format!("References modifier \"{name}\" which is not defined in modifiers"),
        );
        if !self.modifiers.is_empty() {
            diag = diag.with_hint(eco_format!("declared modifiers: {}", self.modifiers.join(", ")));
        }
        sink.push(diag);
    }
}
