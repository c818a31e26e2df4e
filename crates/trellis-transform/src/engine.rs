use ecow::{EcoString, EcoVec, eco_format, eco_vec};
use heck::ToKebabCase;
use indexmap::IndexMap;
use trellis_library::node::DATA_NAME;
use trellis_library::{Element, Node};
use trellis_timing::timed;

use crate::config::{ModifierSource, RuneConfig, RuneContext, StyleSpec, ThemeConfig};
use crate::structure::build_structure_element;

/// Interprets a [`ThemeConfig`] over document trees.
///
/// The transformer holds no mutable state, so it can be shared across
/// threads and applied to any number of trees.
///
/// The transform is not idempotent: once the `<meta>` children that carry
/// modifier values are consumed, a second pass falls back to the defaults
/// and appends a second set of classes. Apply it exactly once per tree.
#[derive(Debug, Clone)]
pub struct Transformer {
    config: ThemeConfig,
}

impl Transformer {
    /// Create a transformer for a theme.
    pub fn new(config: ThemeConfig) -> Self {
        Self { config }
    }

    /// The theme this transformer interprets.
    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// Transform a whole tree.
    pub fn transform(&self, tree: &Node) -> Node {
        timed!("identity transform", self.walk(tree, None))
    }

    /// Transform a tree below the given enclosing component type.
    pub fn transform_within(&self, tree: &Node, parent_type: &str) -> Node {
        timed!("identity transform", self.walk(tree, Some(parent_type)))
    }

    fn walk(&self, node: &Node, parent_type: Option<&str>) -> Node {
        match node {
            Node::Array(nodes) => {
                Node::Array(nodes.iter().map(|node| self.walk(node, parent_type)).collect())
            }
            Node::Element(element) => Node::Element(stacker::maybe_grow(
                32 * 1024,
                2 * 1024 * 1024,
                || self.walk_element(element, parent_type),
            )),
            other => other.clone(),
        }
    }

    fn walk_element(&self, element: &Element, parent_type: Option<&str>) -> Element {
        if let Some(type_of) = element.type_of()
            && let Some(rune) = self.config.runes.get(type_of)
        {
            return timed!(
                "rune",
                detail = type_of,
                self.transform_rune(element, type_of, rune, parent_type)
            );
        }

        Element {
            name: element.name.clone(),
            attrs: element.attrs.clone(),
            children: self.walk_children(&element.children, parent_type),
        }
    }

    fn walk_children(&self, children: &[Node], parent_type: Option<&str>) -> EcoVec<Node> {
        children.iter().map(|child| self.walk(child, parent_type)).collect()
    }

    /// Rewrite one component instance.
    fn transform_rune(
        &self,
        element: &Element,
        type_of: &str,
        rune: &RuneConfig,
        parent_type: Option<&str>,
    ) -> Element {
        log::trace!("transforming `{type_of}` inside {parent_type:?}");
        let block = eco_format!("{}-{}", self.config.prefix, rune.block);

        // Modifier values and classes.
        let mut modifiers = IndexMap::<EcoString, EcoString>::new();
        let mut classes = vec![block.clone()];
        for (name, spec) in &rune.modifiers {
            let value = match spec.source {
                ModifierSource::Meta => element.read_meta(name),
                ModifierSource::Attribute => element.attr(name),
            }
            .or(spec.default.as_deref());
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                modifiers.insert(name.clone(), value.into());
                classes.push(eco_format!("{block}--{value}"));
            }
        }

        if let Some(suffix) = parent_type
            .and_then(|parent| rune.context_modifiers.get(parent))
            .filter(|suffix| !suffix.is_empty())
        {
            classes.push(eco_format!("{block}--{suffix}"));
        }

        for suffix in &rune.static_modifiers {
            classes.push(eco_format!("{block}--{suffix}"));
        }

        if let Some(existing) = element.attr("class") {
            classes.push(existing.into());
        }
        classes.retain(|class| !class.is_empty());
        let class = classes.join(" ");

        // Children: labels, scaffolding, element classes, recursion.
        let mut children: EcoVec<Node> =
            element.children.iter().map(|child| self.auto_label(child, rune)).collect();
        children = self.synthesize(children, rune, &modifiers);
        children = children
            .iter()
            .map(|child| match child {
                Node::Element(elem) => {
                    let elem = self.propagate_element_class(elem, &block);
                    self.walk(&Node::Element(elem), Some(type_of))
                }
                other => self.walk(other, Some(type_of)),
            })
            .filter(|child| !is_consumed_meta(child, rune))
            .collect();

        // Inline styles.
        let mut style = EcoString::from(element.attr("style").unwrap_or_default());
        let parts: Vec<EcoString> = rune
            .styles
            .iter()
            .filter_map(|(name, spec)| {
                let value = modifiers.get(name)?;
                Some(match spec {
                    StyleSpec::Property(prop) => eco_format!("{prop}: {value}"),
                    StyleSpec::Template { prop, template } => {
                        eco_format!("{prop}: {}", template.replacen("{}", value, 1))
                    }
                })
            })
            .collect();
        if !parts.is_empty() {
            if !style.is_empty() {
                style.push_str("; ");
            }
            style.push_str(&parts.join("; "));
        }

        // Attributes, later keys win.
        let mut attrs = element.attrs.clone();
        for (name, value) in &modifiers {
            attrs.insert(eco_format!("data-{}", name.to_kebab_case()), value.clone());
        }
        attrs.insert("class", class);
        attrs.insert("data-rune", type_of.to_lowercase());
        attrs.extend(rune.root_attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        if !style.is_empty() {
            attrs.insert("style", style);
        }

        let output = Element { name: element.name.clone(), attrs, children };
        match &rune.post_transform {
            Some(hook) => {
                let context = RuneContext {
                    modifiers,
                    parent_type: parent_type.map(Into::into),
                };
                hook.apply(output, &context)
            }
            None => output,
        }
    }

    /// Label a direct child by its tag name or `property` attribute.
    fn auto_label(&self, child: &Node, rune: &RuneConfig) -> Node {
        let Node::Element(elem) = child else { return child.clone() };
        let label = rune
            .auto_label
            .get(elem.name.as_str())
            .or_else(|| elem.attr("property").and_then(|p| rune.auto_label.get(p)));
        match label {
            Some(label)
                if !label.is_empty() && elem.data_name().is_none_or(str::is_empty) =>
            {
                Node::Element(elem.clone().with_attr(DATA_NAME, label.clone()))
            }
            _ => child.clone(),
        }
    }

    /// Splice synthesized elements and the content wrapper around the
    /// children.
    fn synthesize(
        &self,
        children: EcoVec<Node>,
        rune: &RuneConfig,
        modifiers: &IndexMap<EcoString, EcoString>,
    ) -> EcoVec<Node> {
        let mut prepend = EcoVec::new();
        let mut append = EcoVec::new();
        for (name, entry) in &rune.structure {
            let Some(built) =
                build_structure_element(entry, name, modifiers, &self.config.icons)
            else {
                continue;
            };
            if entry.before {
                prepend.push(Node::Element(built));
            } else {
                append.push(Node::Element(built));
            }
        }

        let content = match &rune.content_wrapper {
            Some(wrapper) => eco_vec![Node::Element(
                Element::new(wrapper.tag.clone())
                    .with_attr(DATA_NAME, wrapper.label.clone())
                    .with_children(children),
            )],
            None if prepend.is_empty() && append.is_empty() => return children,
            None => children,
        };

        prepend.into_iter().chain(content).chain(append).collect()
    }

    /// Add `block__name` classes along a chain of labeled elements.
    ///
    /// Stops at unlabeled elements and at nested component instances, which
    /// only ever get their own block's classes.
    fn propagate_element_class(&self, elem: &Element, block: &str) -> Element {
        if self.is_component(elem) {
            return elem.clone();
        }

        let Some(name) = elem.data_name().filter(|name| !name.is_empty()) else {
            return elem.clone();
        };

        let element_class = eco_format!("{block}__{name}");
        let class = match elem.attr("class").filter(|c| !c.is_empty()) {
            Some(existing) => eco_format!("{element_class} {existing}"),
            None => element_class,
        };

        Element {
            name: elem.name.clone(),
            attrs: elem.attrs.clone().with("class", class),
            children: elem
                .children
                .iter()
                .map(|child| match child {
                    Node::Element(nested) => {
                        Node::Element(self.propagate_element_class(nested, block))
                    }
                    other => other.clone(),
                })
                .collect(),
        }
    }

    fn is_component(&self, elem: &Element) -> bool {
        elem.type_of().is_some_and(|t| self.config.runes.contains_key(t))
    }
}

/// Whether a child is a `<meta>` carrying a declared modifier's value.
fn is_consumed_meta(child: &Node, rune: &RuneConfig) -> bool {
    let Some(elem) = child.as_element() else { return false };
    elem.name == "meta"
        && elem
            .attr("property")
            .is_some_and(|p| !p.is_empty() && rune.modifiers.contains_key(p))
}

/// Create a transform closure for a theme.
pub fn create_transform(config: ThemeConfig) -> impl Fn(&Node) -> Node + Send + Sync {
    let transformer = Transformer::new(config);
    move |tree| transformer.transform(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModifierSpec, StructureEntry};
    use trellis_library::node::TYPEOF;

    fn hint_config() -> ThemeConfig {
        ThemeConfig::new("rf").with_rune(
            "Hint",
            RuneConfig::new("hint")
                .with_modifier("hintType", ModifierSpec::meta().with_default("note")),
        )
    }

    fn meta(property: &str, content: &str) -> Element {
        Element::new("meta").with_attr("property", property).with_attr("content", content)
    }

    fn p(text: &str) -> Element {
        Element::new("p").with_child(text)
    }

    #[track_caller]
    fn transform(config: ThemeConfig, input: Element) -> Element {
        Transformer::new(config)
            .transform(&Node::Element(input))
            .into_element()
            .expect("transform keeps elements")
    }

    #[test]
    fn test_meta_modifier() {
        let input = Element::new("section")
            .with_attr(TYPEOF, "Hint")
            .with_child(meta("hintType", "warning"))
            .with_child(p("Careful"));
        let output = transform(hint_config(), input);
        assert_eq!(output.attr("class"), Some("rf-hint rf-hint--warning"));
        assert_eq!(output.attr("data-hint-type"), Some("warning"));
        assert_eq!(output.attr("data-rune"), Some("hint"));
        assert!(output.find_meta("hintType").is_none());
        assert_eq!(output.children.len(), 1);
    }

    #[test]
    fn test_default_modifier() {
        let input = Element::new("section").with_attr(TYPEOF, "Hint").with_child(p("Hi"));
        let output = transform(hint_config(), input);
        assert_eq!(output.attr("class"), Some("rf-hint rf-hint--note"));
        assert_eq!(output.attr("data-hint-type"), Some("note"));
    }

    #[test]
    fn test_not_idempotent() {
        let input = Element::new("section")
            .with_attr(TYPEOF, "Hint")
            .with_child(meta("hintType", "warning"));
        let once = transform(hint_config(), input);
        let twice = transform(hint_config(), once);
        assert_eq!(
            twice.attr("class"),
            Some("rf-hint rf-hint--note rf-hint rf-hint--warning")
        );
        assert_eq!(twice.attr("data-hint-type"), Some("note"));
    }

    #[test]
    fn test_unmatched_meta_is_kept() {
        let input = Element::new("section")
            .with_attr(TYPEOF, "Hint")
            .with_child(meta("other", "x"))
            .with_child(meta("hintType", "check"));
        let output = transform(hint_config(), input);
        assert_eq!(output.children.len(), 1);
        assert_eq!(output.children[0].as_element().unwrap().attr("property"), Some("other"));
    }

    #[test]
    fn test_attribute_source_and_class_order() {
        let config = ThemeConfig::new("rf").with_rune(
            "Grid",
            RuneConfig {
                static_modifiers: vec!["stacked".into()],
                ..RuneConfig::new("grid")
                    .with_modifier("layout", ModifierSpec::attribute())
                    .with_modifier("gap", ModifierSpec::meta().with_default("md"))
            },
        );
        let input = Element::new("div")
            .with_attr(TYPEOF, "Grid")
            .with_attr("class", "custom")
            .with_attr("layout", "wide");
        let output = transform(config, input);
        assert_eq!(
            output.attr("class"),
            Some("rf-grid rf-grid--wide rf-grid--md rf-grid--stacked custom")
        );
        assert_eq!(
            output.attrs.keys().collect::<Vec<_>>(),
            ["typeof", "class", "layout", "data-layout", "data-gap", "data-rune"]
        );
    }

    #[test]
    fn test_duplicate_classes_are_kept() {
        let config = ThemeConfig::new("rf").with_rune(
            "Badge",
            RuneConfig {
                static_modifiers: vec!["solid".into(), "solid".into()],
                ..RuneConfig::new("badge")
            },
        );
        let output = transform(config, Element::new("span").with_attr(TYPEOF, "Badge"));
        assert_eq!(output.attr("class"), Some("rf-badge rf-badge--solid rf-badge--solid"));
    }

    #[test]
    fn test_structure_and_wrapper() {
        let config = ThemeConfig::new("rf").with_rune(
            "Hint",
            RuneConfig::new("hint")
                .with_structure("header", StructureEntry::new("div").before())
                .with_content_wrapper("div", "body"),
        );
        let input = Element::new("section")
            .with_attr(TYPEOF, "Hint")
            .with_child(p("one"))
            .with_child(p("two"));
        let output = transform(config, input);
        assert_eq!(output.children.len(), 2);
        let header = output.children[0].as_element().unwrap();
        let body = output.children[1].as_element().unwrap();
        assert_eq!(header.data_name(), Some("header"));
        assert_eq!(header.attr("class"), Some("rf-hint__header"));
        assert_eq!(body.data_name(), Some("body"));
        assert_eq!(body.attr("class"), Some("rf-hint__body"));
        assert_eq!(body.children.len(), 2);
    }

    #[test]
    fn test_structure_without_wrapper() {
        let config = ThemeConfig::new("rf").with_rune(
            "Recipe",
            RuneConfig::new("recipe")
                .with_modifier("prepTime", ModifierSpec::meta())
                .with_structure(
                    "meta",
                    StructureEntry::new("div")
                        .before()
                        .with_child(StructureEntry::new("span").with_label("prep").with_meta_text("prepTime")),
                )
                .with_structure("footer", StructureEntry::new("footer"))
                .with_structure("badge", StructureEntry::new("span").with_condition("level")),
        );
        let input = Element::new("article")
            .with_attr(TYPEOF, "Recipe")
            .with_child(meta("prepTime", "PT5M"))
            .with_child(p("a"))
            .with_child(p("b"));
        let output = transform(config, input);
        // meta header, p, p, footer; the consumed meta is gone.
        assert_eq!(output.children.len(), 4);
        let header = output.children[0].as_element().unwrap();
        let prep = header.children[0].as_element().unwrap();
        assert_eq!(prep.attr("class"), Some("rf-recipe__prep"));
        assert_eq!(Node::Element(prep.clone()).text_content(), "PT5M");
        assert_eq!(output.children[3].as_element().unwrap().data_name(), Some("footer"));
    }

    #[test]
    fn test_auto_label() {
        let mut rune = RuneConfig::new("details");
        rune.auto_label.insert("summary".into(), "header".into());
        rune.auto_label.insert("title".into(), "title".into());
        let config = ThemeConfig::new("rf").with_rune("Details", rune);
        let input = Element::new("details")
            .with_attr(TYPEOF, "Details")
            .with_child(Element::new("summary"))
            .with_child(Element::new("span").with_attr("property", "title"))
            .with_child(Element::new("summary").with_attr(DATA_NAME, "kept"));
        let output = transform(config, input);
        let names: Vec<_> = output.child_elements().map(|c| c.attr("class").unwrap()).collect();
        assert_eq!(names, ["rf-details__header", "rf-details__title", "rf-details__kept"]);
    }

    #[test]
    fn test_nested_labels_and_namespace_isolation() {
        let config = ThemeConfig::new("rf")
            .with_rune("Grid", RuneConfig::new("grid"))
            .with_rune("Hint", RuneConfig::new("hint"));
        let hint = Element::new("section")
            .with_attr(TYPEOF, "Hint")
            .with_attr(DATA_NAME, "cell")
            .with_child(Element::new("span").with_attr(DATA_NAME, "icon"));
        let input = Element::new("div").with_attr(TYPEOF, "Grid").with_child(
            Element::new("div")
                .with_attr(DATA_NAME, "cells")
                .with_attr("class", "x")
                .with_child(Element::new("div").with_attr(DATA_NAME, "row"))
                .with_child(hint),
        );
        let output = transform(config, input);
        let cells = output.children[0].as_element().unwrap();
        assert_eq!(cells.attr("class"), Some("rf-grid__cells x"));
        let row = cells.children[0].as_element().unwrap();
        assert_eq!(row.attr("class"), Some("rf-grid__row"));
        let hint = cells.children[1].as_element().unwrap();
        assert_eq!(hint.attr("class"), Some("rf-hint"));
        let icon = hint.children[0].as_element().unwrap();
        assert_eq!(icon.attr("class"), Some("rf-hint__icon"));
    }

    #[test]
    fn test_context_modifier_through_wrappers() {
        let config = ThemeConfig::new("rf")
            .with_rune("Grid", RuneConfig::new("grid"))
            .with_rune("Hint", RuneConfig::new("hint").with_context_modifier("Grid", "in-grid"));
        let input = Element::new("div").with_attr(TYPEOF, "Grid").with_child(
            Element::new("div").with_child(
                Element::new("aside")
                    .with_attr(TYPEOF, "Unknown")
                    .with_child(Element::new("section").with_attr(TYPEOF, "Hint")),
            ),
        );
        let output = transform(config, input);
        let unknown = output.children[0].as_element().unwrap().children[0].as_element().unwrap();
        assert_eq!(unknown.attrs.len(), 1);
        let hint = unknown.children[0].as_element().unwrap();
        assert_eq!(hint.attr("class"), Some("rf-hint rf-hint--in-grid"));
    }

    #[test]
    fn test_styles_and_root_attributes() {
        let mut rune = RuneConfig::new("grid")
            .with_modifier("columns", ModifierSpec::attribute())
            .with_modifier("ratio", ModifierSpec::attribute());
        rune.styles.insert("columns".into(), StyleSpec::Property("--grid-columns".into()));
        rune.styles.insert(
            "ratio".into(),
            StyleSpec::Template {
                prop: "grid-template-columns".into(),
                template: "{}fr 1fr".into(),
            },
        );
        rune.root_attributes.insert("data-rune".into(), "layout-grid".into());
        let config = ThemeConfig::new("rf").with_rune("Grid", rune);
        let input = Element::new("div")
            .with_attr(TYPEOF, "Grid")
            .with_attr("style", "color: red")
            .with_attr("columns", "3")
            .with_attr("ratio", "2");
        let output = transform(config, input);
        assert_eq!(
            output.attr("style"),
            Some("color: red; --grid-columns: 3; grid-template-columns: 2fr 1fr")
        );
        assert_eq!(output.attr("data-rune"), Some("layout-grid"));
    }

    #[test]
    fn test_post_transform_context() {
        let config = ThemeConfig::new("rf")
            .with_rune("Tabs", RuneConfig::new("tabs"))
            .with_rune(
                "Tab",
                RuneConfig::new("tab").with_modifier("name", ModifierSpec::attribute()),
            )
            .with_post_transform("Tab", |_: Element, ctx: &RuneContext| {
                let parent = ctx.parent_type.clone().unwrap_or_default();
                let name = ctx.modifiers.get("name").cloned().unwrap_or_default();
                Element::new("li").with_attr("data-parent", parent).with_child(name)
            });
        let input = Element::new("div")
            .with_attr(TYPEOF, "Tabs")
            .with_child(Element::new("section").with_attr(TYPEOF, "Tab").with_attr("name", "One"));
        let output = transform(config, input);
        let tab = output.children[0].as_element().unwrap();
        assert_eq!(tab.name, "li");
        assert_eq!(tab.attr("data-parent"), Some("Tabs"));
        assert_eq!(tab.children[0], Node::text("One"));
    }

    #[test]
    fn test_passthrough() {
        let tree = Node::Array(eco_vec![
            Node::Null,
            Node::Number(2.0),
            Node::text("x"),
            Node::Element(Element::new("p").with_attr("class", "lead").with_child("y")),
        ]);
        let transform = create_transform(hint_config());
        assert_eq!(transform(&tree), tree);
    }

    #[test]
    fn test_input_is_untouched() {
        let input = Node::Element(
            Element::new("section")
                .with_attr(TYPEOF, "Hint")
                .with_child(meta("hintType", "warning")),
        );
        let before = input.deep_clone();
        let _ = Transformer::new(hint_config()).transform(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn test_deep_nesting() {
        let mut node = Element::new("section").with_attr(TYPEOF, "Hint");
        for _ in 0..1000 {
            node = Element::new("div").with_child(node);
        }
        let output = Transformer::new(hint_config()).transform(&Node::Element(node));
        assert!(output.is_element());
    }
}
