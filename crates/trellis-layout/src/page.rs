//! Page data, as handed over by the site builder.

use ecow::{EcoString, EcoVec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_library::Node;
use trellis_library::node::format_number;

/// Everything the compositor knows about one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// The page's transformed content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderable: Option<Node>,
    /// Named content regions, e.g. the navigation.
    #[serde(default)]
    pub regions: IndexMap<EcoString, Region>,
    #[serde(default)]
    pub title: EcoString,
    #[serde(default)]
    pub url: EcoString,
    /// All pages of the site.
    #[serde(default)]
    pub pages: Vec<PageEntry>,
    #[serde(default)]
    pub frontmatter: IndexMap<EcoString, Value>,
    /// The page's headings in document order.
    #[serde(default)]
    pub headings: Vec<Heading>,
}

impl PageData {
    /// Resolve a dot path like `title` or `frontmatter.author.name`.
    ///
    /// Returns `None` where the path leaves the data.
    pub fn resolve_path(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let root = match parts.next()? {
            "title" => Value::String(self.title.as_str().into()),
            "url" => Value::String(self.url.as_str().into()),
            "frontmatter" => {
                let Some(key) = parts.next() else {
                    return serde_json::to_value(&self.frontmatter).ok();
                };
                self.frontmatter.get(key)?.clone()
            }
            "pages" => serde_json::to_value(&self.pages).ok()?,
            "headings" => serde_json::to_value(&self.headings).ok()?,
            "regions" => serde_json::to_value(&self.regions).ok()?,
            "renderable" => serde_json::to_value(&self.renderable).ok()?,
            _ => return None,
        };

        parts.try_fold(root, |current, part| match current {
            Value::Object(mut map) => map.remove(part),
            Value::Array(mut items) => {
                let index = part.parse::<usize>().ok().filter(|&i| i < items.len())?;
                Some(items.swap_remove(index))
            }
            Value::String(s) if part == "length" => Some(Value::from(s.chars().count())),
            _ => None,
        })
    }

    /// Whether a frontmatter value is truthy.
    pub fn frontmatter_flag(&self, key: &str) -> bool {
        self.frontmatter.get(key).is_some_and(is_truthy)
    }
}

/// A named content region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: EcoString,
    /// How the region combines with inherited content, e.g. `replace`.
    #[serde(default)]
    pub mode: EcoString,
    #[serde(default)]
    pub content: EcoVec<Node>,
}

/// A page in the site's page list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub url: EcoString,
    #[serde(default)]
    pub title: EcoString,
    #[serde(default)]
    pub draft: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<EcoString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_group: Option<EcoString>,
}

/// A heading of the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: EcoString,
    pub id: EcoString,
}

/// Whether a value counts as present: not `null`, `false`, `0`, `NaN` or
/// the empty string.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Turn a value into attribute or text content.
///
/// Arrays join their items with commas and objects have no useful text.
pub fn display_value(value: &Value) -> EcoString {
    match value {
        Value::Null => EcoString::new(),
        Value::Bool(b) => EcoString::from(if *b { "true" } else { "false" }),
        Value::Number(n) => match n.as_f64() {
            Some(f) => format_number(f),
            None => n.to_string().into(),
        },
        Value::String(s) => s.as_str().into(),
        Value::Array(items) => {
            let parts: Vec<EcoString> = items.iter().map(display_value).collect();
            parts.join(",").into()
        }
        Value::Object(_) => "[object Object]".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> PageData {
        serde_json::from_value(json!({
            "title": "Getting started",
            "url": "/docs/getting-started",
            "frontmatter": {
                "tags": ["intro", "setup"],
                "author": { "name": "Sam" },
                "draft": false,
                "order": 0
            },
            "pages": [{ "url": "/docs/a", "title": "A" }],
            "headings": [{ "level": 2, "text": "Install", "id": "install" }]
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_path() {
        let page = page();
        assert_eq!(page.resolve_path("title"), Some(json!("Getting started")));
        assert_eq!(page.resolve_path("frontmatter.author.name"), Some(json!("Sam")));
        assert_eq!(page.resolve_path("frontmatter.tags.1"), Some(json!("setup")));
        assert_eq!(page.resolve_path("pages.0.title"), Some(json!("A")));
        assert_eq!(page.resolve_path("headings.0.id"), Some(json!("install")));
        assert_eq!(page.resolve_path("frontmatter.missing.deeper"), None);
        assert_eq!(page.resolve_path("nothing"), None);
    }

    #[test]
    fn test_truthiness() {
        let page = page();
        assert!(page.frontmatter_flag("tags"));
        assert!(!page.frontmatter_flag("draft"));
        assert!(!page.frontmatter_flag("order"));
        assert!(!page.frontmatter_flag("missing"));
        assert!(!is_truthy(&json!("")));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!(["a", 2, null])), "a,2,");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!({ "a": 1 })), "[object Object]");
    }
}
