//! Reusable post-transforms.

use ecow::{EcoString, EcoVec};
use serde_json::Value;
use trellis_library::node::{DATA_NAME, format_number};
use trellis_library::{Element, Node};

use crate::config::{RuneContext, RuneTransform};

/// Renames the element, e.g. to hand a component to another rendering path.
#[derive(Debug, Clone)]
pub struct Retag {
    pub name: EcoString,
}

impl Retag {
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self { name: name.into() }
    }
}

impl RuneTransform for Retag {
    fn post_transform(&self, element: Element, _: &RuneContext) -> Element {
        Element { name: self.name.clone(), ..element }
    }
}

/// Rebuilds a component's content as a `<table>` from JSON row data held in
/// a modifier.
///
/// Rows are either objects, whose keys of the first row become the header,
/// or arrays of cells. Malformed or missing data yields a table with an
/// empty body.
#[derive(Debug, Clone)]
pub struct RowTable {
    /// The modifier that holds the serialized rows.
    pub modifier: EcoString,
}

impl RowTable {
    pub fn new(modifier: impl Into<EcoString>) -> Self {
        Self { modifier: modifier.into() }
    }
}

impl RuneTransform for RowTable {
    fn post_transform(&self, element: Element, context: &RuneContext) -> Element {
        let raw = context.modifiers.get(&self.modifier).map(EcoString::as_str).unwrap_or("");
        let rows = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(rows)) => rows,
            _ => {
                log::debug!("modifier `{}` holds no row data", self.modifier);
                Vec::new()
            }
        };

        let mut table = Element::new("table").with_attr(DATA_NAME, "table");
        let header: Vec<String> = match rows.first() {
            Some(Value::Object(first)) => first.keys().cloned().collect(),
            _ => Vec::new(),
        };
        if !header.is_empty() {
            let cells = header.iter().map(|key| Element::new("th").with_child(key.as_str()));
            let row = Element::new("tr").with_children(cells);
            table = table.with_child(Element::new("thead").with_child(row));
        }

        let body: EcoVec<Node> = rows
            .iter()
            .filter_map(|row| {
                let cells: Vec<EcoString> = match row {
                    Value::Object(map) => header
                        .iter()
                        .map(|key| map.get(key).map(cell_text).unwrap_or_default())
                        .collect(),
                    Value::Array(cells) => cells.iter().map(cell_text).collect(),
                    _ => return None,
                };
                let cells = cells.into_iter().map(|text| Element::new("td").with_child(text));
                Some(Node::Element(Element::new("tr").with_children(cells)))
            })
            .collect();

        table = table.with_child(Element::new("tbody").with_children(body));
        element.with_children([table])
    }
}

fn cell_text(value: &Value) -> EcoString {
    match value {
        Value::Null => EcoString::new(),
        Value::String(s) => s.as_str().into(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string().into()),
        other => other.to_string().into(),
    }
}
