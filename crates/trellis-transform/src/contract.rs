//! Structure contracts: the selectors and markup a theme produces, derived
//! from its configuration alone.

use ecow::{EcoString, eco_format};
use heck::ToKebabCase;
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{
    ModifierSource, RuneConfig, StructureChild, StructureEntry, StyleSpec, ThemeConfig,
};

const SCHEMA: &str = "https://json-schema.org/draft/2020-12/schema";
const DESCRIPTION: &str = "HTML structure contracts for the identity transform. Documents \
    the BEM selectors, data attributes, and HTML structure the engine produces for each \
    rune. Auto-generated from theme config, do not edit by hand.";

/// The contract document for a whole theme.
#[derive(Debug, Clone, Serialize)]
pub struct StructureContract {
    #[serde(rename = "$schema")]
    pub schema: EcoString,
    pub description: EcoString,
    pub prefix: EcoString,
    pub runes: IndexMap<EcoString, RuneContract>,
}

/// The contract for one component type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuneContract {
    pub block: EcoString,
    /// The root selector, e.g. `.rf-hint`.
    pub root: EcoString,
    pub data_rune: EcoString,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub modifiers: IndexMap<EcoString, ModifierContract>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub context_modifiers: IndexMap<EcoString, ContextModifierContract>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static_modifiers: Vec<StaticModifierContract>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub elements: IndexMap<EcoString, ElementContract>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub inline_styles: IndexMap<EcoString, StyleSpec>,
    /// Element labels in output order. The original content shows up as
    /// `{content}` or, when wrapped, as `{content:<label>}`.
    pub child_order: Vec<EcoString>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierContract {
    pub source: ModifierSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<EcoString>,
    pub class_pattern: EcoString,
    pub data_attribute: EcoString,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextModifierContract {
    pub suffix: EcoString,
    pub selector: EcoString,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaticModifierContract {
    pub name: EcoString,
    pub selector: EcoString,
}

/// A named element inside a component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementContract {
    pub tag: EcoString,
    pub selector: EcoString,
    pub source: ElementSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EcoString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<EcoString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_any: Option<Vec<EcoString>>,
}

/// Which configuration feature produces an element.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementSource {
    Structure,
    ContentWrapper,
    AutoLabel,
}

/// Derive the structure contract of a theme.
pub fn generate_structure_contract(config: &ThemeConfig) -> StructureContract {
    StructureContract {
        schema: SCHEMA.into(),
        description: DESCRIPTION.into(),
        prefix: config.prefix.clone(),
        runes: config
            .runes
            .iter()
            .map(|(name, rune)| (name.clone(), rune_contract(name, rune, &config.prefix)))
            .collect(),
    }
}

fn rune_contract(name: &str, rune: &RuneConfig, prefix: &str) -> RuneContract {
    let block = eco_format!("{prefix}-{}", rune.block);

    let modifiers = rune
        .modifiers
        .iter()
        .map(|(name, spec)| {
            let contract = ModifierContract {
                source: spec.source,
                default: spec.default.clone(),
                class_pattern: eco_format!(".{block}--{{value}}"),
                data_attribute: eco_format!("data-{}", name.to_kebab_case()),
            };
            (name.clone(), contract)
        })
        .collect();

    let context_modifiers = rune
        .context_modifiers
        .iter()
        .map(|(parent, suffix)| {
            let contract = ContextModifierContract {
                suffix: suffix.clone(),
                selector: eco_format!(".{block}--{suffix}"),
            };
            (parent.clone(), contract)
        })
        .collect();

    let static_modifiers = rune
        .static_modifiers
        .iter()
        .map(|name| StaticModifierContract {
            name: name.clone(),
            selector: eco_format!(".{block}--{name}"),
        })
        .collect();

    let mut elements = IndexMap::new();
    for (key, entry) in &rune.structure {
        collect_elements(entry, key, &block, None, &mut elements);
    }

    if let Some(wrapper) = &rune.content_wrapper {
        elements.insert(
            wrapper.label.clone(),
            ElementContract {
                tag: wrapper.tag.clone(),
                selector: eco_format!(".{block}__{}", wrapper.label),
                source: ElementSource::ContentWrapper,
                parent: None,
                condition: None,
                condition_any: None,
            },
        );
    }

    for (tag, label) in &rune.auto_label {
        elements.insert(
            label.clone(),
            ElementContract {
                tag: tag.clone(),
                selector: eco_format!(".{block}__{label}"),
                source: ElementSource::AutoLabel,
                parent: None,
                condition: None,
                condition_any: None,
            },
        );
    }

    RuneContract {
        block: rune.block.clone(),
        root: eco_format!(".{block}"),
        data_rune: name.to_lowercase().into(),
        modifiers,
        context_modifiers,
        static_modifiers,
        elements,
        inline_styles: rune.styles.clone(),
        child_order: child_order(rune),
    }
}

/// Collect a structure entry and its labeled descendants. The first entry
/// with a given label wins.
fn collect_elements(
    entry: &StructureEntry,
    key: &str,
    block: &str,
    parent: Option<&str>,
    elements: &mut IndexMap<EcoString, ElementContract>,
) {
    let label = EcoString::from(entry.label.as_deref().unwrap_or(key));
    elements.entry(label.clone()).or_insert_with(|| ElementContract {
        tag: entry.tag.clone(),
        selector: eco_format!(".{block}__{label}"),
        source: ElementSource::Structure,
        parent: parent.map(Into::into),
        condition: entry.condition.clone().filter(|c| !c.is_empty()),
        condition_any: entry.condition_any.clone(),
    });

    for child in &entry.children {
        if let StructureChild::Entry(nested) = child
            && let Some(nested_label) = nested.label.as_deref().filter(|l| !l.is_empty())
        {
            collect_elements(nested, nested_label, block, Some(label.as_str()), elements);
        }
    }
}

fn child_order(rune: &RuneConfig) -> Vec<EcoString> {
    let label = |(key, entry): (&EcoString, &StructureEntry)| {
        entry.label.clone().unwrap_or_else(|| key.clone())
    };

    let mut order: Vec<EcoString> =
        rune.structure.iter().filter(|(_, e)| e.before).map(label).collect();
    order.push(match &rune.content_wrapper {
        Some(wrapper) => eco_format!("{{content:{}}}", wrapper.label),
        None => "{content}".into(),
    });
    order.extend(rune.structure.iter().filter(|(_, e)| !e.before).map(label));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModifierSpec;

    fn recipe() -> ThemeConfig {
        let mut rune = RuneConfig::new("recipe")
            .with_modifier("prepTime", ModifierSpec::meta())
            .with_modifier("difficulty", ModifierSpec::attribute().with_default("easy"))
            .with_context_modifier("Grid", "in-grid")
            .with_structure(
                "meta",
                StructureEntry::new("div")
                    .before()
                    .with_child(StructureEntry::new("span").with_label("item"))
                    .with_child(StructureEntry::new("span").with_label("item").with_condition("x")),
            )
            .with_structure("footer", StructureEntry::new("footer").with_label("foot"))
            .with_content_wrapper("div", "body");
        rune.static_modifiers.push("card".into());
        rune.auto_label.insert("h1".into(), "title".into());
        ThemeConfig::new("rf").with_rune("Recipe", rune)
    }

    #[test]
    fn test_contract() {
        let contract = generate_structure_contract(&recipe());
        let recipe = &contract.runes["Recipe"];
        assert_eq!(recipe.root, ".rf-recipe");
        assert_eq!(recipe.data_rune, "recipe");
        assert_eq!(recipe.modifiers["prepTime"].data_attribute, "data-prep-time");
        assert_eq!(recipe.modifiers["prepTime"].class_pattern, ".rf-recipe--{value}");
        assert_eq!(recipe.context_modifiers["Grid"].selector, ".rf-recipe--in-grid");
        assert_eq!(recipe.static_modifiers[0].selector, ".rf-recipe--card");
        assert_eq!(
            recipe.elements.keys().collect::<Vec<_>>(),
            ["meta", "item", "foot", "body", "title"]
        );
        assert_eq!(recipe.elements["item"].parent.as_deref(), Some("meta"));
        assert_eq!(recipe.elements["item"].condition, None);
        assert_eq!(recipe.elements["body"].source, ElementSource::ContentWrapper);
        assert_eq!(recipe.child_order, ["meta", "{content:body}", "foot"]);
    }

    #[test]
    fn test_contract_json() {
        let json = serde_json::to_value(generate_structure_contract(&recipe())).unwrap();
        assert_eq!(json["$schema"], SCHEMA);
        let recipe = &json["runes"]["Recipe"];
        assert_eq!(recipe["dataRune"], "recipe");
        assert_eq!(recipe["modifiers"]["difficulty"]["default"], "easy");
        assert!(recipe["modifiers"]["prepTime"].get("default").is_none());
        assert_eq!(recipe["elements"]["title"]["source"], "autoLabel");
        assert!(recipe.get("inlineStyles").is_none());

        let bare = generate_structure_contract(
            &ThemeConfig::new("rf").with_rune("Hint", RuneConfig::new("hint")),
        );
        assert_eq!(bare.runes["Hint"].child_order, ["{content}"]);
    }
}
