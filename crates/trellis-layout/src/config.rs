use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use ecow::{EcoString, eco_format};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use trellis_library::Element;

use crate::page::{PageData, is_truthy};

/// A declarative page layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// The layout's name. Becomes `data-layout` and the root class.
    pub block: EcoString,
    /// The root element's tag. Defaults to `div`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<EcoString>,
    /// Client-side behaviors to attach, listed in `data-layout-behaviors`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviors: Vec<EcoString>,
    /// The page's slots, in output order.
    #[serde(default)]
    pub slots: IndexMap<EcoString, LayoutSlot>,
    /// Reusable fragments, referenced as `chrome:<name>`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub chrome: IndexMap<EcoString, ChromeEntry>,
    /// Derived widgets, referenced as `computed:<name>`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub computed: IndexMap<EcoString, ComputedContent>,
    /// Runs after the page is assembled.
    #[serde(skip)]
    pub post_transform: Option<LayoutHook>,
}

impl LayoutConfig {
    /// Create a layout without slots.
    pub fn new(block: impl Into<EcoString>) -> Self {
        Self { block: block.into(), ..Default::default() }
    }

    /// Append a slot in builder-style.
    pub fn with_slot(mut self, name: impl Into<EcoString>, slot: LayoutSlot) -> Self {
        self.slots.insert(name.into(), slot);
        self
    }

    /// Declare a chrome fragment in builder-style.
    pub fn with_chrome(mut self, name: impl Into<EcoString>, entry: ChromeEntry) -> Self {
        self.chrome.insert(name.into(), entry);
        self
    }

    /// Declare computed content in builder-style.
    pub fn with_computed(mut self, name: impl Into<EcoString>, content: ComputedContent) -> Self {
        self.computed.insert(name.into(), content);
        self
    }

    /// Attach a post-transform in builder-style.
    pub fn with_post_transform(mut self, hook: impl LayoutTransform + 'static) -> Self {
        self.post_transform = Some(LayoutHook::new(hook));
        self
    }
}

/// A named placement point in a layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSlot {
    pub tag: EcoString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<EcoString>,
    /// Where the slot's content comes from. An empty specifier is none.
    #[serde(
        default,
        deserialize_with = "non_empty_source",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<SlotSource>,
    /// Omit the slot if its source resolves to nothing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub conditional: bool,
    /// Omit the slot unless this frontmatter value is truthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter_condition: Option<EcoString>,
    /// Omit the slot unless this region exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_region: Option<EcoString>,
    /// Add a class modifier if a region exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_modifier: Option<RegionModifier>,
    /// Wrap the resolved content in one more element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<SlotWrapper>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<EcoString, EcoString>,
    /// Further content, after the source's.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SlotChild>,
}

impl LayoutSlot {
    /// Create a slot for a tag.
    pub fn new(tag: impl Into<EcoString>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    /// Set the class in builder-style.
    pub fn with_class(mut self, class: impl Into<EcoString>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the source in builder-style.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = (!source.is_empty()).then(|| SlotSource::parse(source));
        self
    }

    /// Add a child in builder-style.
    pub fn with_child(mut self, child: SlotChild) -> Self {
        self.children.push(child);
        self
    }
}

/// Adds `<class>--<modifier>` when a region exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionModifier {
    pub region: EcoString,
    pub modifier: EcoString,
}

/// Adds `<class>--<modifier>` when computed content is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedModifier {
    pub computed: EcoString,
    pub modifier: EcoString,
}

/// An element around a slot's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotWrapper {
    pub tag: EcoString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<EcoString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_modifier: Option<ComputedModifier>,
}

/// Where a slot's content comes from.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SlotSource {
    /// The page's rendered content.
    Content,
    /// A region's content, shared with the page data.
    Region(EcoString),
    /// A deep copy of a region's content.
    CloneRegion(EcoString),
    /// A computed widget.
    Computed(EcoString),
    /// A chrome fragment.
    Chrome(EcoString),
    /// Anything else. Resolves to nothing.
    Unknown(EcoString),
}

impl SlotSource {
    /// Parse a source specifier.
    pub fn parse(raw: &str) -> Self {
        if raw == "content" {
            Self::Content
        } else if let Some(name) = raw.strip_prefix("region:") {
            Self::Region(name.into())
        } else if let Some(name) = raw.strip_prefix("clone:region:") {
            Self::CloneRegion(name.into())
        } else if let Some(name) = raw.strip_prefix("computed:") {
            Self::Computed(name.into())
        } else if let Some(name) = raw.strip_prefix("chrome:") {
            Self::Chrome(name.into())
        } else {
            Self::Unknown(raw.into())
        }
    }
}

impl Display for SlotSource {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Content => f.pad("content"),
            Self::Region(name) => write!(f, "region:{name}"),
            Self::CloneRegion(name) => write!(f, "clone:region:{name}"),
            Self::Computed(name) => write!(f, "computed:{name}"),
            Self::Chrome(name) => write!(f, "chrome:{name}"),
            Self::Unknown(raw) => f.pad(raw),
        }
    }
}

impl Serialize for SlotSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::parse(&EcoString::deserialize(deserializer)?))
    }
}

fn non_empty_source<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SlotSource>, D::Error> {
    let raw = Option::<EcoString>::deserialize(deserializer)?;
    Ok(raw.filter(|raw| !raw.is_empty()).map(|raw| SlotSource::parse(&raw)))
}

/// A child of a slot.
#[derive(Debug, Clone)]
pub enum SlotChild {
    /// A `chrome:<name>` reference.
    Chrome(EcoString),
    /// Literal text.
    Text(EcoString),
    /// A nested slot.
    Slot(Box<LayoutSlot>),
    /// An inline chrome fragment.
    Entry(Box<ChromeEntry>),
}

impl SlotChild {
    /// Decide what a configuration object describes.
    ///
    /// An explicit `kind` of `slot` or `chrome` wins. Otherwise fields that
    /// only chrome fragments have make an entry, fields that only slots have
    /// make a slot, and so do `chrome:` references or objects among the
    /// children and a `class` without a `ref`.
    pub fn is_slot(object: &serde_json::Map<String, Value>) -> bool {
        match object.get("kind").and_then(Value::as_str) {
            Some("slot") => return true,
            Some("chrome" | "entry") => return false,
            _ => {}
        }

        let truthy = |key: &str| object.get(key).is_some_and(is_truthy);
        if ["svg", "pageText", "icon", "metaText", "pageCondition", "iterate"]
            .into_iter()
            .any(truthy)
        {
            return false;
        }

        if ["source", "conditionalRegion", "conditionalModifier", "wrapper", "frontmatterCondition"]
            .into_iter()
            .any(truthy)
        {
            return true;
        }

        if let Some(Value::Array(children)) = object.get("children")
            && children.iter().any(|child| match child {
                Value::String(s) => s.starts_with("chrome:"),
                Value::Object(_) | Value::Array(_) => true,
                _ => false,
            })
        {
            return true;
        }

        truthy("class") && !truthy("ref")
    }
}

impl From<ChromeEntry> for SlotChild {
    fn from(entry: ChromeEntry) -> Self {
        Self::Entry(Box::new(entry))
    }
}

impl From<LayoutSlot> for SlotChild {
    fn from(slot: LayoutSlot) -> Self {
        Self::Slot(Box::new(slot))
    }
}

impl Serialize for SlotChild {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        let tagged = |value: Result<Value, serde_json::Error>,
                      kind: &str|
         -> Result<Value, S::Error> {
            let mut value = value.map_err(S::Error::custom)?;
            if let Value::Object(object) = &mut value {
                object.insert("kind".into(), kind.into());
            }
            Ok(value)
        };
        match self {
            Self::Chrome(name) => serializer.collect_str(&eco_format!("chrome:{name}")),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Slot(slot) => tagged(serde_json::to_value(slot), "slot")?.serialize(serializer),
            Self::Entry(entry) => {
                tagged(serde_json::to_value(entry), "chrome")?.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for SlotChild {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(match s.strip_prefix("chrome:") {
                Some(name) => Self::Chrome(name.into()),
                None => Self::Text(s.into()),
            }),
            Value::Object(object) if Self::is_slot(&object) => {
                serde_json::from_value(Value::Object(object))
                    .map(|slot| Self::Slot(Box::new(slot)))
                    .map_err(D::Error::custom)
            }
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(|entry| Self::Entry(Box::new(entry)))
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected a string or an object as slot child, found {other}"
            ))),
        }
    }
}

/// A structural fragment bound to page data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromeEntry {
    pub tag: EcoString,
    /// The element's `data-name`.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<EcoString>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<EcoString, ChromeAttr>,
    /// Pre-escaped markup that the renderer emits without escaping.
    #[serde(rename = "svg", default, skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<EcoString>,
    /// A page data path whose value becomes the text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_text: Option<EcoString>,
    /// Omit the fragment unless this page data path is truthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_condition: Option<EcoString>,
    /// Modifier gates have no meaning in layouts. A fragment that sets one
    /// is never emitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<EcoString>,
    /// Format the `pageText` value as a date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_prefix: Option<EcoString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_suffix: Option<EcoString>,
    /// Emit one child per element of a page data array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterate: Option<Iterate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChromeChild>,
}

impl ChromeEntry {
    /// Create a fragment for a tag.
    pub fn new(tag: impl Into<EcoString>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    /// Set the label in builder-style.
    pub fn with_label(mut self, label: impl Into<EcoString>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Take the text from a page data path in builder-style.
    pub fn with_page_text(mut self, path: impl Into<EcoString>) -> Self {
        self.page_text = Some(path.into());
        self
    }

    /// Add an attribute in builder-style.
    pub fn with_attr(mut self, key: impl Into<EcoString>, value: ChromeAttr) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
}

/// An attribute value of a chrome fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChromeAttr {
    Literal(EcoString),
    FromPageData {
        #[serde(rename = "fromPageData")]
        from_page_data: EcoString,
    },
}

/// A child of a chrome fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChromeChild {
    Text(EcoString),
    Entry(ChromeEntry),
}

/// Emits one `<tag class=..>` per array element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iterate {
    /// A page data path that should resolve to an array.
    pub source: EcoString,
    pub tag: EcoString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<EcoString>,
}

/// Which date parts to show, in en-US conventions.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DateFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<NameStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<NumberStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<MonthStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<NumberStyle>,
}

/// How to show a named date part.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    Long,
    Short,
    Narrow,
}

/// How to show a numeric date part.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum NumberStyle {
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "2-digit")]
    TwoDigit,
}

/// How to show the month.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum MonthStyle {
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "2-digit")]
    TwoDigit,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "narrow")]
    Narrow,
}

/// A derived widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedContent {
    #[serde(rename = "type")]
    pub kind: ComputedKind,
    /// The data the widget is derived from, e.g. `region:nav`.
    #[serde(default)]
    pub source: EcoString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TocOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl ComputedContent {
    /// Create a widget of a kind.
    pub fn new(kind: ComputedKind, source: impl Into<EcoString>) -> Self {
        Self { kind, source: source.into(), options: None, visibility: None }
    }
}

/// The kinds of derived widgets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComputedKind {
    Breadcrumb,
    Toc,
    PrevNext,
    VersionSwitcher,
}

/// Heading levels a table of contents lists.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u8>,
}

/// When a widget is shown at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    /// Hide the widget if this frontmatter flag is exactly `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter_toggle: Option<EcoString>,
    /// Hide a table of contents with fewer entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<usize>,
}

/// A programmatic escape hatch for a whole layout.
pub trait LayoutTransform: Send + Sync {
    fn post_transform(&self, element: Element, page: &PageData) -> Element;
}

impl<F> LayoutTransform for F
where
    F: Fn(Element, &PageData) -> Element + Send + Sync,
{
    fn post_transform(&self, element: Element, page: &PageData) -> Element {
        self(element, page)
    }
}

/// A registered [`LayoutTransform`].
#[derive(Clone)]
pub struct LayoutHook(Arc<dyn LayoutTransform>);

impl LayoutHook {
    pub fn new(hook: impl LayoutTransform + 'static) -> Self {
        Self(Arc::new(hook))
    }

    pub fn apply(&self, element: Element, page: &PageData) -> Element {
        self.0.post_transform(element, page)
    }
}

impl Debug for LayoutHook {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("LayoutHook(..)")
    }
}
