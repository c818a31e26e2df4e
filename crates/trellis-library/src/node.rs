//! The document tree.
//!
//! Trees arrive from the content parser as tagged elements with string
//! attributes and mixed children. Every transform in Trellis takes a tree by
//! reference and builds a new one: children live in [`EcoVec`]s, so unchanged
//! subtrees are shared by reference count and any write copies first.

use std::fmt::{self, Debug, Formatter};

use ecow::{EcoString, EcoVec, eco_format};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The attribute that marks an element as an instance of a component type.
pub const TYPEOF: &str = "typeof";
/// The attribute that labels an element as a named part of its component.
pub const DATA_NAME: &str = "data-name";

/// A node in a document tree.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// An absent node. Passed through untouched.
    Null,
    /// A run of text.
    Text(EcoString),
    /// A bare number, as some parsers emit for numeric content.
    Number(f64),
    /// A list of sibling nodes without an element around them.
    Array(EcoVec<Node>),
    /// A tagged element.
    Element(Element),
}

impl Node {
    /// Create a text node.
    pub fn text(text: impl Into<EcoString>) -> Self {
        Self::Text(text.into())
    }

    /// The element, if this is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Turn this into an element, if it is one.
    pub fn into_element(self) -> Option<Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether this is an element.
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// The text, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The concatenated text of this node and all its descendants.
    pub fn text_content(&self) -> EcoString {
        let mut buf = EcoString::new();
        self.collect_text(&mut buf);
        buf
    }

    fn collect_text(&self, buf: &mut EcoString) {
        match self {
            Self::Null => {}
            Self::Text(text) => buf.push_str(text),
            Self::Number(number) => buf.push_str(&format_number(*number)),
            Self::Array(nodes) => nodes.iter().for_each(|node| node.collect_text(buf)),
            Self::Element(element) => {
                element.children.iter().for_each(|node| node.collect_text(buf))
            }
        }
    }

    /// A structurally equal copy that shares no storage with `self`.
    ///
    /// A plain [`Clone`] shares children by reference count. That is fine for
    /// reading but means the same subtree shows up at two places in an
    /// output tree. Use this when content must be placed twice.
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Array(nodes) => Self::Array(nodes.iter().map(Self::deep_clone).collect()),
            Self::Element(element) => Self::Element(element.deep_clone()),
            Self::Text(text) => Self::Text(text.as_str().into()),
            other => other.clone(),
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Null => f.pad("null"),
            Self::Text(text) => text.fmt(f),
            Self::Number(number) => number.fmt(f),
            Self::Array(nodes) => f.debug_list().entries(nodes.iter()).finish(),
            Self::Element(element) => element.fmt(f),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<EcoString> for Node {
    fn from(text: EcoString) -> Self {
        Self::Text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text.into())
    }
}

/// A tagged element with ordered attributes and children.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$$mdtype", rename = "Tag")]
pub struct Element {
    /// The element's tag name.
    pub name: EcoString,
    /// The element's attributes, in insertion order.
    #[serde(rename = "attributes", default)]
    pub attrs: Attrs,
    /// The element's children.
    #[serde(default)]
    pub children: EcoVec<Node>,
}

impl Element {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self { name: name.into(), attrs: Attrs::new(), children: EcoVec::new() }
    }

    /// Set an attribute in builder-style.
    pub fn with_attr(
        mut self,
        key: impl Into<EcoString>,
        value: impl Into<EcoString>,
    ) -> Self {
        self.attrs.insert(key, value);
        self
    }

    /// Replace the attributes in builder-style.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Append a child in builder-style.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Replace the children in builder-style.
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// The value of an attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key)
    }

    /// The component type this element is an instance of.
    pub fn type_of(&self) -> Option<&str> {
        self.attr(TYPEOF)
    }

    /// The structural label of this element within its component.
    pub fn data_name(&self) -> Option<&str> {
        self.attr(DATA_NAME)
    }

    /// Whether this is a `<meta>` element with a `property`.
    pub fn is_meta(&self) -> bool {
        self.name == "meta" && self.attrs.contains_key("property")
    }

    /// The child elements, skipping text and other nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Find a `<meta>` child by its `property` attribute.
    pub fn find_meta(&self, property: &str) -> Option<&Element> {
        self.child_elements()
            .find(|child| child.name == "meta" && child.attr("property") == Some(property))
    }

    /// Read the `content` of a `<meta>` child by its `property` attribute.
    pub fn read_meta(&self, property: &str) -> Option<&str> {
        self.find_meta(property).and_then(|meta| meta.attr("content"))
    }

    /// Find a child element by its `data-name` attribute.
    pub fn find_by_data_name(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.data_name() == Some(name))
    }

    /// All children that are not `<meta>` elements.
    pub fn non_meta_children(&self) -> impl Iterator<Item = &Node> {
        self.children
            .iter()
            .filter(|child| child.as_element().is_none_or(|elem| elem.name != "meta"))
    }

    /// A structurally equal copy that shares no storage with `self`.
    pub fn deep_clone(&self) -> Self {
        Self {
            name: self.name.as_str().into(),
            attrs: self
                .attrs
                .iter()
                .map(|(k, v)| (EcoString::from(k), EcoString::from(v)))
                .collect(),
            children: self.children.iter().map(Node::deep_clone).collect(),
        }
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in self.attrs.iter() {
            write!(f, " {key}={value:?}")?;
        }
        write!(f, ">")?;
        if !self.children.is_empty() {
            f.debug_list().entries(self.children.iter()).finish()?;
        }
        Ok(())
    }
}

/// Ordered element attributes.
///
/// Inserting an existing key overwrites the value in place, so the key keeps
/// its original position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Attrs(IndexMap<EcoString, EcoString>);

impl Attrs {
    /// Create an empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value of an attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(EcoString::as_str)
    }

    /// Whether an attribute is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set an attribute, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<EcoString>,
        value: impl Into<EcoString>,
    ) -> Option<EcoString> {
        self.0.insert(key.into(), value.into())
    }

    /// Set an attribute in builder-style.
    pub fn with(mut self, key: impl Into<EcoString>, value: impl Into<EcoString>) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove an attribute, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<EcoString> {
        self.0.shift_remove(key)
    }

    /// Iterate over the attributes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over the attribute names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(EcoString::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Attrs
where
    K: Into<EcoString>,
    V: Into<EcoString>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V> Extend<(K, V)> for Attrs
where
    K: Into<EcoString>,
    V: Into<EcoString>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl Serialize for Attrs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attrs {
    /// Parsers hand over attribute values of any scalar type. Numbers and
    /// booleans are stringified, `null` drops the attribute.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<EcoString, serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s.into(),
                    serde_json::Value::Bool(b) => eco_format!("{b}"),
                    serde_json::Value::Number(n) => {
                        n.as_f64().map(format_number).unwrap_or_else(|| eco_format!("{n}"))
                    }
                    other => eco_format!("{other}"),
                };
                Some((key, value))
            })
            .collect())
    }
}

/// Format a number the way it reads in text: integral values without a
/// fractional part.
pub fn format_number(number: f64) -> EcoString {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        eco_format!("{}", number as i64)
    } else {
        eco_format!("{number}")
    }
}
