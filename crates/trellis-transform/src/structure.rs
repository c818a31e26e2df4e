use std::sync::LazyLock;

use ecow::{EcoString, EcoVec, eco_format};
use indexmap::IndexMap;
use regex::Regex;
use trellis_library::node::DATA_NAME;
use trellis_library::{Attrs, Element, Node};

use crate::config::{AttrValue, Icons, StructureChild, StructureEntry, TextTransform};

/// Build one synthesized element.
///
/// Returns `None` if the entry's `condition` or `conditionAny` gate is not
/// met by the resolved modifier values. The element is labeled with the
/// entry's `ref` or, failing that, with `name`.
pub fn build_structure_element(
    entry: &StructureEntry,
    name: &str,
    modifiers: &IndexMap<EcoString, EcoString>,
    icons: &Icons,
) -> Option<Element> {
    let has = |key: &str| modifiers.get(key).is_some_and(|v| !v.is_empty());

    if let Some(condition) = entry.condition.as_deref().filter(|c| !c.is_empty())
        && !has(condition)
    {
        return None;
    }

    if let Some(any) = &entry.condition_any
        && !any.iter().any(|key| has(key))
    {
        return None;
    }

    let mut attrs = Attrs::new().with(DATA_NAME, entry.label.as_deref().unwrap_or(name));
    for (key, value) in &entry.attrs {
        let value = match value {
            AttrValue::Literal(literal) => literal.clone(),
            AttrValue::FromModifier { from_modifier } => match modifiers.get(from_modifier) {
                Some(value) => value.clone(),
                None => {
                    log::debug!("attribute `{key}` reads unresolved modifier `{from_modifier}`");
                    EcoString::new()
                }
            },
        };
        attrs.insert(key.clone(), value);
    }

    let element = Element::new(entry.tag.clone()).with_attrs(attrs);

    if let Some(icon) = &entry.icon {
        // The glyph is supplied by the styling layer.
        if !icons.contains_key(&icon.group) {
            log::debug!("icon group `{}` is not declared", icon.group);
        }
        return Some(element);
    }

    if let Some(key) = entry.meta_text.as_deref().filter(|key| !key.is_empty()) {
        let mut text = modifiers.get(key).cloned().unwrap_or_default();
        if let Some(transform) = entry.transform {
            text = apply_text_transform(transform, &text);
        }
        if let Some(prefix) = entry.text_prefix.as_deref().filter(|p| !p.is_empty()) {
            text = eco_format!("{prefix}{text}");
        }
        if let Some(suffix) = entry.text_suffix.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(suffix);
        }
        return Some(element.with_child(text));
    }

    let children: EcoVec<Node> = entry
        .children
        .iter()
        .filter_map(|child| match child {
            StructureChild::Text(text) => Some(Node::Text(text.clone())),
            StructureChild::Entry(nested) => {
                let name = nested.label.as_deref().unwrap_or("");
                build_structure_element(nested, name, modifiers, icons).map(Node::Element)
            }
        })
        .collect();

    Some(element.with_children(children))
}

/// Apply a named text transform to a modifier value.
pub fn apply_text_transform(transform: TextTransform, text: &str) -> EcoString {
    match transform {
        TextTransform::Duration => format_duration(text),
        TextTransform::Uppercase => text.to_uppercase().into(),
        TextTransform::Capitalize => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => EcoString::new(),
            }
        }
        TextTransform::Unknown => {
            log::debug!("unknown text transform, keeping `{text}`");
            text.into()
        }
    }
}

/// Turn the time part of an ISO 8601 duration into `1h 30m` form.
///
/// Text without any hour, minute or second component is returned as is.
fn format_duration(iso: &str) -> EcoString {
    static DURATION: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap()
    });

    let Some(captures) = DURATION.captures(iso) else { return iso.into() };
    let parts: Vec<String> = [(1, 'h'), (2, 'm'), (3, 's')]
        .into_iter()
        .filter_map(|(i, unit)| captures.get(i).map(|m| format!("{}{unit}", m.as_str())))
        .collect();

    if parts.is_empty() { iso.into() } else { parts.join(" ").into() }
}
