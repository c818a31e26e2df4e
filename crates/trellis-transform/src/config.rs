use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use ecow::EcoString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use trellis_library::Element;

/// Icon markup, grouped by component and keyed by variant.
pub type Icons = IndexMap<EcoString, IndexMap<EcoString, EcoString>>;

/// Top-level theme configuration.
///
/// All maps keep their declaration order. That order is observable: it
/// decides the order of modifier classes and synthesized elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    /// BEM prefix. E.g. `rf` makes `.rf-hint`.
    pub prefix: EcoString,
    /// CSS custom property prefix. E.g. `--rf` makes `--rf-color-text`.
    #[serde(default)]
    pub token_prefix: EcoString,
    /// Icon markup organized by group and variant.
    #[serde(default)]
    pub icons: Icons,
    /// Per-component transform configuration, keyed by `typeof` value.
    #[serde(default)]
    pub runes: IndexMap<EcoString, RuneConfig>,
}

impl ThemeConfig {
    /// Create a configuration with a prefix and nothing else.
    pub fn new(prefix: impl Into<EcoString>) -> Self {
        Self { prefix: prefix.into(), ..Default::default() }
    }

    /// Declare a component type in builder-style.
    pub fn with_rune(mut self, name: impl Into<EcoString>, rune: RuneConfig) -> Self {
        self.runes.insert(name.into(), rune);
        self
    }

    /// Register a post-transform for an already declared component type.
    ///
    /// Hooks are code, not data, so they are attached after loading.
    /// Registering for an undeclared type has no effect.
    pub fn with_post_transform(
        mut self,
        name: &str,
        hook: impl RuneTransform + 'static,
    ) -> Self {
        match self.runes.get_mut(name) {
            Some(rune) => rune.post_transform = Some(PostTransform::new(hook)),
            None => log::debug!("post-transform for undeclared component type `{name}`"),
        }
        self
    }
}

/// Configuration for a single component type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuneConfig {
    /// BEM block name without prefix.
    pub block: EcoString,
    /// The component type this one is grouped under in editors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EcoString>,
    /// Where each modifier value is read from.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub modifiers: IndexMap<EcoString, ModifierSpec>,
    /// Modifier suffixes added when nested inside a given component type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub context_modifiers: IndexMap<EcoString, EcoString>,
    /// Modifier suffixes that are always applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_modifiers: Vec<EcoString>,
    /// Labels children by tag name or `property` attribute.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub auto_label: IndexMap<EcoString, EcoString>,
    /// Wraps the original children in one element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_wrapper: Option<ContentWrapper>,
    /// Elements synthesized around the content, keyed by their label.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub structure: IndexMap<EcoString, StructureEntry>,
    /// Inline styles derived from modifier values.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub styles: IndexMap<EcoString, StyleSpec>,
    /// Literal attributes that override everything computed for the root.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub root_attributes: IndexMap<EcoString, EcoString>,
    /// Runs after all declarative processing.
    #[serde(skip)]
    pub post_transform: Option<PostTransform>,
}

impl RuneConfig {
    /// Create a configuration for a BEM block.
    pub fn new(block: impl Into<EcoString>) -> Self {
        Self { block: block.into(), ..Default::default() }
    }

    /// Declare a modifier in builder-style.
    pub fn with_modifier(mut self, name: impl Into<EcoString>, spec: ModifierSpec) -> Self {
        self.modifiers.insert(name.into(), spec);
        self
    }

    /// Declare a context modifier in builder-style.
    pub fn with_context_modifier(
        mut self,
        parent: impl Into<EcoString>,
        suffix: impl Into<EcoString>,
    ) -> Self {
        self.context_modifiers.insert(parent.into(), suffix.into());
        self
    }

    /// Wrap the content in builder-style.
    pub fn with_content_wrapper(
        mut self,
        tag: impl Into<EcoString>,
        label: impl Into<EcoString>,
    ) -> Self {
        self.content_wrapper = Some(ContentWrapper { tag: tag.into(), label: label.into() });
        self
    }

    /// Declare a structural element in builder-style.
    pub fn with_structure(mut self, key: impl Into<EcoString>, entry: StructureEntry) -> Self {
        self.structure.insert(key.into(), entry);
        self
    }

    /// Attach a post-transform in builder-style.
    pub fn with_post_transform(mut self, hook: impl RuneTransform + 'static) -> Self {
        self.post_transform = Some(PostTransform::new(hook));
        self
    }
}

/// Where a modifier value comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierSpec {
    /// The kind of source.
    pub source: ModifierSource,
    /// Used when the source has no value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<EcoString>,
}

impl ModifierSpec {
    /// Read from a `<meta property=name content=value>` child.
    pub fn meta() -> Self {
        Self { source: ModifierSource::Meta, default: None }
    }

    /// Read from the element's own attribute of the same name.
    pub fn attribute() -> Self {
        Self { source: ModifierSource::Attribute, default: None }
    }

    /// Set the default value in builder-style.
    pub fn with_default(mut self, default: impl Into<EcoString>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The kind of modifier source.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierSource {
    #[default]
    Meta,
    Attribute,
}

/// The element that wraps a component's original children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentWrapper {
    pub tag: EcoString,
    /// The wrapper's `data-name`.
    #[serde(rename = "ref")]
    pub label: EcoString,
}

/// A synthesized element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureEntry {
    /// The element's tag name.
    pub tag: EcoString,
    /// The element's `data-name`. Defaults to the key the entry is declared
    /// under (or nothing for nested entries).
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<EcoString>,
    /// Insert before the content instead of after it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub before: bool,
    /// Only synthesize if this modifier has a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<EcoString>,
    /// Only synthesize if any of these modifiers has a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_any: Option<Vec<EcoString>>,
    /// Emit an empty placeholder that styling fills with an icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconRef>,
    /// Emit the value of this modifier as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_text: Option<EcoString>,
    /// Transform applied to the `metaText` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TextTransform>,
    /// Prepended to the `metaText` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_prefix: Option<EcoString>,
    /// Appended to the `metaText` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_suffix: Option<EcoString>,
    /// Extra attributes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<EcoString, AttrValue>,
    /// Nested text and elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StructureChild>,
}

impl StructureEntry {
    /// Create an entry for a tag.
    pub fn new(tag: impl Into<EcoString>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    /// Insert before the content in builder-style.
    pub fn before(mut self) -> Self {
        self.before = true;
        self
    }

    /// Set the label in builder-style.
    pub fn with_label(mut self, label: impl Into<EcoString>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Gate on a modifier in builder-style.
    pub fn with_condition(mut self, modifier: impl Into<EcoString>) -> Self {
        self.condition = Some(modifier.into());
        self
    }

    /// Emit a modifier value as text in builder-style.
    pub fn with_meta_text(mut self, modifier: impl Into<EcoString>) -> Self {
        self.meta_text = Some(modifier.into());
        self
    }

    /// Add an attribute in builder-style.
    pub fn with_attr(mut self, key: impl Into<EcoString>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Add a child in builder-style.
    pub fn with_child(mut self, child: impl Into<StructureChild>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// A child of a [`StructureEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureChild {
    Text(EcoString),
    Entry(StructureEntry),
}

impl From<StructureEntry> for StructureChild {
    fn from(entry: StructureEntry) -> Self {
        Self::Entry(entry)
    }
}

impl From<&str> for StructureChild {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

/// An attribute value of a synthesized element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Used as is.
    Literal(EcoString),
    /// The resolved value of a modifier, or the empty string.
    FromModifier {
        #[serde(rename = "fromModifier")]
        from_modifier: EcoString,
    },
}

/// Identifies an icon by group and variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconRef {
    pub group: EcoString,
    pub variant: EcoString,
}

/// A pure transform for `metaText` values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    /// `PT1H30M` becomes `1h 30m`.
    Duration,
    Uppercase,
    /// Uppercases the first character.
    Capitalize,
    /// A name without a transform. The text stays unchanged.
    #[serde(other)]
    Unknown,
}

/// How a modifier value turns into an inline style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleSpec {
    /// `property: value`.
    Property(EcoString),
    /// `prop: template` with the first `{}` replaced by the value.
    Template { prop: EcoString, template: EcoString },
}

/// What a post-transform gets to see besides the element.
#[derive(Debug, Clone, Default)]
pub struct RuneContext {
    /// The resolved modifier values, in declaration order.
    pub modifiers: IndexMap<EcoString, EcoString>,
    /// The type of the nearest enclosing component.
    pub parent_type: Option<EcoString>,
}

/// A programmatic escape hatch for one component type.
///
/// It runs after all declarative processing and may replace the element
/// wholesale. Closures with the right signature implement it.
pub trait RuneTransform: Send + Sync {
    fn post_transform(&self, element: Element, context: &RuneContext) -> Element;
}

impl<F> RuneTransform for F
where
    F: Fn(Element, &RuneContext) -> Element + Send + Sync,
{
    fn post_transform(&self, element: Element, context: &RuneContext) -> Element {
        self(element, context)
    }
}

/// A registered [`RuneTransform`].
#[derive(Clone)]
pub struct PostTransform(Arc<dyn RuneTransform>);

impl PostTransform {
    /// Wrap a hook.
    pub fn new(hook: impl RuneTransform + 'static) -> Self {
        Self(Arc::new(hook))
    }

    /// Run the hook.
    pub fn apply(&self, element: Element, context: &RuneContext) -> Element {
        self.0.post_transform(element, context)
    }
}

impl Debug for PostTransform {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("PostTransform(..)")
    }
}
