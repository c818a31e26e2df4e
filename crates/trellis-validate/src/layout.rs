use ecow::{EcoString, eco_format};
use serde_json::{Map, Value};
use trellis_layout::{ComputedKind, SlotChild, SlotSource};
use trellis_library::diag::ConfigDiagnostic;

use crate::{Sink, ValidationResult, each_entry, string_map};

/// Validate a layout configuration.
///
/// References to undeclared chrome or computed content and unknown slot
/// sources only warn: they resolve to nothing at composition time.
pub fn validate_layout_config(config: &Value) -> ValidationResult {
    let mut sink = Sink::default();
    let Some(object) = config.as_object() else {
        sink.error("", "Layout must be a non-null object");
        return sink.finish("layout");
    };

    sink.require_str(object.get("block"), "block");

    if let Some(tag) = object.get("tag")
        && !tag.is_string()
    {
        sink.error("tag", "Must be a string");
    }

    if let Some(behaviors) = object.get("behaviors")
        && !behaviors.as_array().is_some_and(|items| items.iter().all(Value::is_string))
    {
        sink.error("behaviors", "Must be an array of strings");
    }

    let chrome = each_entry(&mut sink, object.get("chrome"), "chrome", |sink, name, entry| {
        chrome_entry(sink, entry, eco_format!("chrome.{name}"));
    });

    let computed =
        each_entry(&mut sink, object.get("computed"), "computed", |sink, name, def| {
            computed_content(sink, def, eco_format!("computed.{name}"));
        });

    let refs = Refs { chrome: keys(chrome), computed: keys(computed) };

    match object.get("slots") {
        None => sink.error("slots", "Required field"),
        slots => {
            each_entry(&mut sink, slots, "slots", |sink, name, slot| {
                refs.slot(sink, slot, eco_format!("slots.{name}"));
            });
        }
    }

    sink.finish("layout")
}

fn chrome_entry(sink: &mut Sink, entry: &Value, path: EcoString) {
    let Some(entry) = entry.as_object() else {
        sink.error(path, "Must be an object");
        return;
    };

    sink.require_str(entry.get("tag"), eco_format!("{path}.tag"));

    for key in ["ref", "svg", "pageText", "pageCondition", "textPrefix", "textSuffix"] {
        if entry.get(key).is_some_and(|v| !v.is_string()) {
            sink.error(eco_format!("{path}.{key}"), "Must be a string");
        }
    }

    let path_attrs = eco_format!("{path}.attrs");
    each_entry(sink, entry.get("attrs"), &path_attrs, |sink, key, value| {
        let ok = match value {
            Value::String(_) => true,
            Value::Object(object) => object.get("fromPageData").is_some_and(Value::is_string),
            _ => false,
        };
        if !ok {
            sink.error(
                eco_format!("{path_attrs}.{key}"),
                "Must be a string or { fromPageData } object",
            );
        }
    });

    if let Some(iterate) = entry.get("iterate") {
        let path = eco_format!("{path}.iterate");
        match iterate.as_object() {
            None => sink.error(path, "Must be an object with source and tag"),
            Some(iterate) => {
                sink.require_str(iterate.get("source"), eco_format!("{path}.source"));
                sink.require_str(iterate.get("tag"), eco_format!("{path}.tag"));
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
                        chrome_entry(sink, child, eco_format!("{path}[{i}]"));
                    }
                }
            }
        }
    }
}

fn computed_content(sink: &mut Sink, def: &Value, path: EcoString) {
    let Some(def) = def.as_object() else {
        sink.error(path, "Must be an object");
        return;
    };

    let known = def
        .get("type")
        .is_some_and(|kind| serde_json::from_value::<ComputedKind>(kind.clone()).is_ok());
    if !known {
        sink.push(
            ConfigDiagnostic::error(eco_format!("{path}.type"), "Unknown computed content type")
                .with_hint("expected \"breadcrumb\", \"toc\", \"prev-next\" or \"version-switcher\""),
        );
    }

    if def.get("source").is_some_and(|s| !s.is_string()) {
        sink.error(eco_format!("{path}.source"), "Must be a string");
    }

    if let Some(options) = def.get("options") {
        let path = eco_format!("{path}.options");
        match options.as_object() {
            None => sink.error(path, "Must be an object"),
            Some(options) => {
                for key in ["minLevel", "maxLevel"] {
                    if options.get(key).is_some_and(|v| !v.as_u64().is_some_and(|n| n <= 6)) {
                        sink.error(eco_format!("{path}.{key}"), "Must be a heading level");
                    }
                }
            }
        }
    }
}

/// Names slots may reference.
struct Refs<'a> {
    chrome: Vec<&'a str>,
    computed: Vec<&'a str>,
}

impl Refs<'_> {
    fn slot(&self, sink: &mut Sink, slot: &Value, path: EcoString) {
        let Some(slot) = slot.as_object() else {
            sink.error(path, "Must be an object");
            return;
        };

        sink.require_str(slot.get("tag"), eco_format!("{path}.tag"));

        if let Some(source) = slot.get("source") {
            let path = eco_format!("{path}.source");
            match source.as_str() {
                None => sink.error(path, "Must be a string"),
                Some("") => {}
                Some(raw) => self.source(sink, raw, path),
            }
        }

        for key in ["class", "frontmatterCondition", "conditionalRegion"] {
            if slot.get(key).is_some_and(|v| !v.is_string()) {
                sink.error(eco_format!("{path}.{key}"), "Must be a string");
            }
        }

        string_map(sink, slot.get("attrs"), &eco_format!("{path}.attrs"));

        if let Some(modifier) = slot.get("conditionalModifier") {
            let path = eco_format!("{path}.conditionalModifier");
            match modifier.as_object() {
                None => sink.error(path, "Must be an object with region and modifier"),
                Some(modifier) => {
                    sink.require_str(modifier.get("region"), eco_format!("{path}.region"));
                    sink.require_str(modifier.get("modifier"), eco_format!("{path}.modifier"));
                }
            }
        }

        if let Some(wrapper) = slot.get("wrapper") {
            self.wrapper(sink, wrapper, eco_format!("{path}.wrapper"));
        }

        if let Some(children) = slot.get("children") {
            let path = eco_format!("{path}.children");
            match children.as_array() {
                None => sink.error(path, "Must be an array"),
                Some(children) => {
                    for (i, child) in children.iter().enumerate() {
                        self.child(sink, child, eco_format!("{path}[{i}]"));
                    }
                }
            }
        }
    }

    fn child(&self, sink: &mut Sink, child: &Value, path: EcoString) {
        match child {
            Value::String(s) => {
                if let Some(name) = s.strip_prefix("chrome:") {
                    self.chrome_ref(sink, name, path);
                }
            }
            Value::Object(object) if SlotChild::is_slot(object) => self.slot(sink, child, path),
            Value::Object(_) => chrome_entry(sink, child, path),
            _ => sink.error(path, "Must be a string or an object"),
        }
    }

    fn wrapper(&self, sink: &mut Sink, wrapper: &Value, path: EcoString) {
        let Some(wrapper) = wrapper.as_object() else {
            sink.error(path, "Must be an object with tag");
            return;
        };
        sink.require_str(wrapper.get("tag"), eco_format!("{path}.tag"));
        let Some(modifier) = wrapper.get("conditionalModifier") else { return };
        let path = eco_format!("{path}.conditionalModifier");
        let Some(modifier) = modifier.as_object() else {
            sink.error(path, "Must be an object with computed and modifier");
            return;
        };
        sink.require_str(modifier.get("modifier"), eco_format!("{path}.modifier"));
        match modifier.get("computed").and_then(Value::as_str) {
            None => sink.error(eco_format!("{path}.computed"), "Must be a string"),
            Some(name) => self.computed_ref(sink, name, eco_format!("{path}.computed")),
        }
    }

    fn source(&self, sink: &mut Sink, raw: &str, path: EcoString) {
        match SlotSource::parse(raw) {
            SlotSource::Content | SlotSource::Region(_) | SlotSource::CloneRegion(_) => {}
            SlotSource::Computed(name) => self.computed_ref(sink, &name, path),
            SlotSource::Chrome(name) => self.chrome_ref(sink, &name, path),
            SlotSource::Unknown(_) => sink.push(
                ConfigDiagnostic::warning(path, eco_format!("Unknown source \"{raw}\""))
                    .with_hint(
                        "expected \"content\", \"region:<name>\", \"clone:region:<name>\", \
                         \"computed:<name>\" or \"chrome:<name>\"",
                    ),
            ),
        }
    }

    fn chrome_ref(&self, sink: &mut Sink, name: &str, path: EcoString) {
        if !self.chrome.contains(&name) {
            sink.warn(
                path,
                eco_format!("References chrome \"{name}\" which is not defined in chrome"),
            );
        }
    }

    fn computed_ref(&self, sink: &mut Sink, name: &str, path: EcoString) {
        if !self.computed.contains(&name) {
            sink.warn(
                path,
                eco_format!("References computed content \"{name}\" which is not defined in computed"),
            );
        }
    }
}

/// The names declared in an optional object.
fn keys(object: Option<&Map<String, Value>>) -> Vec<&str> {
    object.map(|m| m.keys().map(String::as_str).collect()).unwrap_or_default()
}
