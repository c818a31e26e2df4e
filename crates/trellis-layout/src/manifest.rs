//! Theme manifests and route-to-layout matching.

use ecow::EcoString;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Describes what a theme ships: its layouts, components and how pages are
/// routed to layouts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeManifest {
    pub name: EcoString,
    pub version: EcoString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<EcoString>,
    /// The framework the theme renders with, e.g. `svelte`.
    pub target: EcoString,
    /// Path to the file with the design tokens.
    pub design_tokens: EcoString,
    #[serde(default)]
    pub layouts: IndexMap<EcoString, LayoutDefinition>,
    /// Evaluated in order, the first match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_rules: Vec<RouteRule>,
    /// Component definitions keyed by rune type.
    #[serde(default)]
    pub components: IndexMap<EcoString, ComponentDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsupported_rune_behavior: Option<UnsupportedRuneBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_component: Option<EcoString>,
}

impl ThemeManifest {
    /// The layout a page at `url` renders with.
    pub fn layout_for(&self, url: &str) -> &str {
        match_route_rule(url, &self.route_rules)
    }
}

/// A layout a theme provides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDefinition {
    pub component: EcoString,
    /// All regions the layout knows about.
    #[serde(default)]
    pub regions: Vec<EcoString>,
    /// Regions without which the layout does not render correctly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_regions: Vec<EcoString>,
}

/// A component a theme provides for a rune.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub component: EcoString,
    /// Maps rune attributes to component properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub prop_mapping: IndexMap<EcoString, EcoString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts_children: Option<bool>,
    /// Replacement components keyed by the parent rune.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub context_overrides: IndexMap<EcoString, ComponentOverride>,
}

/// A component used in place of another one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentOverride {
    pub component: EcoString,
}

/// What a renderer does with a rune the theme has no component for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedRuneBehavior {
    Fallback,
    Passthrough,
    Hide,
}

/// Routes pages matching a pattern to a layout.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    /// A glob over the URL without its leading slash. `*` matches within a
    /// path segment and `**` across segments.
    pub pattern: EcoString,
    pub layout: EcoString,
}

impl RouteRule {
    pub fn new(pattern: impl Into<EcoString>, layout: impl Into<EcoString>) -> Self {
        Self { pattern: pattern.into(), layout: layout.into() }
    }

    /// Whether a URL without leading slash matches the pattern.
    pub fn matches(&self, path: &str) -> bool {
        glob_regex(&self.pattern).is_ok_and(|re| re.is_match(path))
    }
}

/// The layout of the first rule matching `url`, or `default`.
pub fn match_route_rule<'a>(url: &str, rules: &'a [RouteRule]) -> &'a str {
    let path = url.strip_prefix('/').unwrap_or(url);
    rules
        .iter()
        .find(|rule| rule.matches(path))
        .map_or("default", |rule| rule.layout.as_str())
}

/// Translate a glob into an anchored regex.
fn glob_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut buf = String::from("^");
    let mut rest = pattern;
    while let Some(i) = rest.find('*') {
        buf.push_str(&regex::escape(&rest[..i]));
        if rest[i..].starts_with("**") {
            buf.push_str(".*");
            rest = &rest[i + 2..];
        } else {
            buf.push_str("[^/]*");
            rest = &rest[i + 1..];
        }
    }
    buf.push_str(&regex::escape(rest));
    buf.push('$');
    Regex::new(&buf)
}
