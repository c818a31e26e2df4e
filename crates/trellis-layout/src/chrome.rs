use ecow::{EcoString, EcoVec, eco_format};
use serde_json::Value;
use time::macros::format_description;
use time::{Date, Month};
use trellis_library::node::DATA_NAME;
use trellis_library::{Attrs, Element, Node};

use crate::config::{
    ChromeAttr, ChromeChild, ChromeEntry, DateFormat, MonthStyle, NameStyle, NumberStyle,
};
use crate::page::{PageData, display_value, is_truthy};

/// Build a chrome fragment bound to page data.
///
/// Returns `None` if the fragment's `pageCondition` is falsy or it carries
/// a modifier `condition`, which has nothing to resolve against in a
/// layout. The element is labeled with `name` unless that is empty.
pub fn build_layout_chrome(entry: &ChromeEntry, name: &str, page: &PageData) -> Option<Element> {
    if let Some(path) = &entry.page_condition
        && !page.resolve_path(path).is_some_and(|value| is_truthy(&value))
    {
        return None;
    }

    if entry.condition.as_deref().is_some_and(|c| !c.is_empty()) {
        return None;
    }

    let mut attrs = Attrs::new();
    if !name.is_empty() {
        attrs.insert(DATA_NAME, name);
    }
    for (key, value) in &entry.attrs {
        let value = match value {
            ChromeAttr::Literal(literal) => literal.clone(),
            ChromeAttr::FromPageData { from_page_data } => page
                .resolve_path(from_page_data)
                .map(|value| display_value(&value))
                .unwrap_or_default(),
        };
        attrs.insert(key.clone(), value);
    }

    if let Some(markup) = entry.raw_html.as_ref().filter(|m| !m.is_empty()) {
        attrs.insert("data-raw-html", "true");
        return Some(element(entry, attrs, [Node::Text(markup.clone())]));
    }

    if let Some(path) = entry.page_text.as_ref().filter(|p| !p.is_empty()) {
        let mut text =
            page.resolve_path(path).map(|value| display_value(&value)).unwrap_or_default();
        if let Some(format) = &entry.date_format
            && !text.is_empty()
        {
            text = format_date(&text, format);
        }
        if let Some(prefix) = entry.text_prefix.as_deref().filter(|p| !p.is_empty()) {
            text = eco_format!("{prefix}{text}");
        }
        if let Some(suffix) = entry.text_suffix.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(suffix);
        }
        return Some(element(entry, attrs, [Node::Text(text)]));
    }

    if let Some(iterate) = &entry.iterate {
        let items = match page.resolve_path(&iterate.source) {
            Some(Value::Array(items)) => items,
            _ => return Some(element(entry, attrs, EcoVec::new())),
        };
        let children = items.iter().map(|item| {
            let mut child = Element::new(iterate.tag.clone());
            if let Some(class) = &iterate.class {
                child.attrs.insert("class", class.clone());
            }
            Node::Element(child.with_child(display_value(item)))
        });
        return Some(element(entry, attrs, children));
    }

    let children = entry.children.iter().filter_map(|child| match child {
        ChromeChild::Text(text) => Some(Node::Text(text.clone())),
        ChromeChild::Entry(nested) => {
            let name = nested.label.as_deref().unwrap_or("");
            build_layout_chrome(nested, name, page).map(Node::Element)
        }
    });
    Some(element(entry, attrs, children))
}

fn element(
    entry: &ChromeEntry,
    attrs: Attrs,
    children: impl IntoIterator<Item = Node>,
) -> Element {
    Element { name: entry.tag.clone(), attrs, children: children.into_iter().collect() }
}

/// Format an ISO calendar date the way `en-US` writes it.
///
/// Text that is not a `YYYY-MM-DD` date is returned as is.
pub fn format_date(text: &str, format: &DateFormat) -> EcoString {
    let Ok(date) = Date::parse(text, format_description!("[year]-[month]-[day]")) else {
        log::debug!("cannot format `{text}` as a date");
        return text.into();
    };

    let mut format = *format;
    if format == DateFormat::default() {
        format = DateFormat {
            year: Some(NumberStyle::Numeric),
            month: Some(MonthStyle::Numeric),
            day: Some(NumberStyle::Numeric),
            weekday: None,
        };
    }

    let year = format.year.map(|style| match style {
        NumberStyle::Numeric => eco_format!("{}", date.year()),
        NumberStyle::TwoDigit => eco_format!("{:02}", date.year().rem_euclid(100)),
    });
    let day = format.day.map(|style| number(date.day(), style));
    let weekday = format.weekday.map(|style| {
        let full = eco_format!("{}", date.weekday());
        name(&full, style)
    });

    let body = match format.month {
        Some(style @ (MonthStyle::Long | MonthStyle::Short | MonthStyle::Narrow)) => {
            let month = name(&month_name(date.month()), match style {
                MonthStyle::Short => NameStyle::Short,
                MonthStyle::Narrow => NameStyle::Narrow,
                _ => NameStyle::Long,
            });
            let mut body = month;
            if let Some(day) = &day {
                body = eco_format!("{body} {day}");
            }
            match (&year, day.is_some()) {
                (Some(year), true) => eco_format!("{body}, {year}"),
                (Some(year), false) => eco_format!("{body} {year}"),
                (None, _) => body,
            }
        }
        Some(style) => {
            let month = number(
                u8::from(date.month()),
                if style == MonthStyle::TwoDigit {
                    NumberStyle::TwoDigit
                } else {
                    NumberStyle::Numeric
                },
            );
            let parts: Vec<EcoString> =
                [Some(month), day.clone(), year.clone()].into_iter().flatten().collect();
            parts.join("/").into()
        }
        None => {
            let parts: Vec<EcoString> = [day.clone(), year.clone()].into_iter().flatten().collect();
            parts.join(" ").into()
        }
    };

    match weekday {
        Some(weekday) if body.is_empty() => weekday,
        Some(weekday) => eco_format!("{weekday}, {body}"),
        None => body,
    }
}

fn number(value: u8, style: NumberStyle) -> EcoString {
    match style {
        NumberStyle::Numeric => eco_format!("{value}"),
        NumberStyle::TwoDigit => eco_format!("{value:02}"),
    }
}

fn name(full: &str, style: NameStyle) -> EcoString {
    match style {
        NameStyle::Long => full.into(),
        NameStyle::Short => full.chars().take(3).collect(),
        NameStyle::Narrow => full.chars().take(1).collect(),
    }
}

fn month_name(month: Month) -> EcoString {
    eco_format!("{month}")
}
