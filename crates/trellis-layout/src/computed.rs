//! Widgets derived from page data.
//!
//! Navigation regions follow a fixed shape: groups are `typeof="NavGroup"`
//! elements titled by their first heading, items are `typeof="NavItem"`
//! elements with a `<span property="slug">`.

use std::cmp::Ordering;

use ecow::{EcoString, eco_format};
use rustc_hash::FxHashMap;
use trellis_library::{Element, Node};

use crate::config::{ComputedContent, ComputedKind};
use crate::page::{PageData, PageEntry, display_value, is_truthy};

/// The heading levels a table of contents lists by default.
const DEFAULT_LEVELS: (u8, u8) = (2, 3);

/// Resolve one computed definition. `None` means the widget is omitted.
pub fn resolve_computed(def: &ComputedContent, page: &PageData, prefix: &str) -> Option<Element> {
    if let Some(toggle) = def.visibility.as_ref().and_then(|v| v.frontmatter_toggle.as_ref())
        && page.frontmatter.get(toggle) == Some(&serde_json::Value::Bool(false))
    {
        return None;
    }

    let region = || {
        let name = def.source.strip_prefix("region:").unwrap_or(&def.source);
        page.regions.get(name)
    };

    match def.kind {
        ComputedKind::Breadcrumb => {
            let region = region()?;
            build_breadcrumb(&region.content, &page.url, &page.title, prefix)
        }
        ComputedKind::Toc => {
            let options = def.options.unwrap_or_default();
            let min = options.min_level.unwrap_or(DEFAULT_LEVELS.0);
            let max = options.max_level.unwrap_or(DEFAULT_LEVELS.1);
            let count = page.headings.iter().filter(|h| (min..=max).contains(&h.level)).count();
            let min_count = def.visibility.as_ref().and_then(|v| v.min_count).unwrap_or(0);
            if min_count > 0 && count < min_count {
                return None;
            }
            build_toc(page, prefix, min, max)
        }
        ComputedKind::PrevNext => {
            let region = region()?;
            build_prev_next(&region.content, &page.url, &page.pages, prefix)
        }
        ComputedKind::VersionSwitcher => build_version_switcher(page, prefix),
    }
}

/// The group title and page title of the current page.
pub fn build_breadcrumb(
    nav: &[Node],
    url: &str,
    title: &str,
    prefix: &str,
) -> Option<Element> {
    let mut groups = FxHashMap::default();
    collect_groups(nav, "", &mut groups);
    let category = groups.get(current_slug(url))?;

    Some(
        Element::new("div")
            .with_attr("class", eco_format!("{prefix}-docs-toolbar__breadcrumb"))
            .with_child(span(eco_format!("{prefix}-docs-breadcrumb-category"), category.clone()))
            .with_child(span(eco_format!("{prefix}-docs-breadcrumb-sep"), "\u{203A}".into()))
            .with_child(span(eco_format!("{prefix}-docs-breadcrumb-page"), title.into())),
    )
}

/// A table of contents over the headings within a level range.
pub fn build_toc(page: &PageData, prefix: &str, min: u8, max: u8) -> Option<Element> {
    let items: Vec<Element> = page
        .headings
        .iter()
        .filter(|h| (min..=max).contains(&h.level))
        .map(|heading| {
            Element::new("li")
                .with_attr("class", eco_format!("{prefix}-on-this-page__item"))
                .with_attr("data-level", eco_format!("{}", heading.level))
                .with_child(
                    Element::new("a")
                        .with_attr("href", eco_format!("#{}", heading.id))
                        .with_child(heading.text.clone()),
                )
        })
        .collect();

    if items.is_empty() {
        return None;
    }

    Some(
        Element::new("nav")
            .with_attr("class", eco_format!("{prefix}-on-this-page"))
            .with_attr("data-scrollspy", "")
            .with_child(
                Element::new("p")
                    .with_attr("class", eco_format!("{prefix}-on-this-page__title"))
                    .with_child("On this page"),
            )
            .with_child(
                Element::new("ul")
                    .with_attr("class", eco_format!("{prefix}-on-this-page__list"))
                    .with_children(items),
            ),
    )
}

/// Links to the pages before and after the current one in navigation order.
pub fn build_prev_next(
    nav: &[Node],
    url: &str,
    pages: &[PageEntry],
    prefix: &str,
) -> Option<Element> {
    let mut slugs = Vec::new();
    collect_slugs(nav, &mut slugs);
    let current = current_slug(url);
    let index = slugs.iter().position(|slug| slug == current)?;

    let find = |slug: &EcoString| {
        pages.iter().find(|p| {
            p.url.strip_suffix(slug.as_str()).is_some_and(|rest| rest.ends_with('/'))
        })
    };
    let neighbour = |i: usize| slugs.get(i).filter(|slug| !slug.is_empty()).and_then(find);
    let prev = index.checked_sub(1).and_then(neighbour);
    let next = neighbour(index + 1);
    if prev.is_none() && next.is_none() {
        return None;
    }

    let link = |page: &PageEntry, side: &str, label: &str| {
        Element::new("a")
            .with_attr("class", eco_format!("{prefix}-prev-next__{side}"))
            .with_attr("href", page.url.clone())
            .with_child(span(eco_format!("{prefix}-prev-next__label"), label.into()))
            .with_child(span(eco_format!("{prefix}-prev-next__title"), page.title.clone()))
    };

    let mut nav = Element::new("nav").with_attr("class", eco_format!("{prefix}-prev-next"));
    if let Some(page) = prev {
        nav = nav.with_child(link(page, "prev", "Previous"));
    }
    if let Some(page) = next {
        nav = nav.with_child(link(page, "next", "Next"));
    }
    Some(nav)
}

/// A selector between the versions of the current page.
///
/// Needs the frontmatter keys `version` and `versionGroup` and at least two
/// published pages in the group.
pub fn build_version_switcher(page: &PageData, prefix: &str) -> Option<Element> {
    let value = |key: &str| {
        page.frontmatter.get(key).filter(|v| is_truthy(v)).map(display_value)
    };
    value("version")?;
    let group = value("versionGroup")?;

    let mut peers: Vec<&PageEntry> = page
        .pages
        .iter()
        .filter(|p| p.version_group.as_ref() == Some(&group) && !p.draft)
        .collect();
    if peers.len() < 2 {
        return None;
    }

    peers.sort_by(|a, b| {
        natural_cmp(
            a.version.as_deref().unwrap_or_default(),
            b.version.as_deref().unwrap_or_default(),
        )
    });

    let options = peers.into_iter().map(|peer| {
        let mut option = Element::new("option").with_attr("value", peer.url.clone());
        if peer.url == page.url {
            option.attrs.insert("selected", "");
        }
        option.with_child(peer.version.clone().unwrap_or_default())
    });

    Some(
        Element::new("nav")
            .with_attr("class", eco_format!("{prefix}-version-switcher"))
            .with_attr("data-version-switcher", "")
            .with_child(
                Element::new("label")
                    .with_attr("class", eco_format!("{prefix}-version-switcher__label"))
                    .with_child("Version"),
            )
            .with_child(
                Element::new("select")
                    .with_attr("class", eco_format!("{prefix}-version-switcher__select"))
                    .with_children(options),
            ),
    )
}

fn span(class: EcoString, text: EcoString) -> Element {
    Element::new("span").with_attr("class", class).with_child(text)
}

/// The last non-empty segment of a URL.
fn current_slug(url: &str) -> &str {
    url.split('/').filter(|s| !s.is_empty()).next_back().unwrap_or("")
}

fn nav_type(elem: &Element) -> Option<&str> {
    elem.type_of().filter(|t| *t == "NavGroup" || *t == "NavItem")
}

fn item_slug(item: &Element) -> Option<EcoString> {
    item.child_elements()
        .find(|c| c.name == "span" && c.attr("property") == Some("slug"))
        .map(|span| Node::Element(span.clone()).text_content())
}

/// Map item slugs to the title of the group they are in.
fn collect_groups(nodes: &[Node], group: &str, map: &mut FxHashMap<EcoString, EcoString>) {
    for elem in nodes.iter().filter_map(Node::as_element) {
        match nav_type(elem) {
            Some("NavGroup") => {
                let title = elem
                    .child_elements()
                    .find(|c| is_heading(&c.name))
                    .map(|h| Node::Element(h.clone()).text_content())
                    .unwrap_or_default();
                collect_groups(&elem.children, &title, map);
            }
            Some(_) => {
                if let Some(slug) = item_slug(elem)
                    && !group.is_empty()
                {
                    map.insert(slug, group.into());
                }
            }
            None => collect_groups(&elem.children, group, map),
        }
    }
}

/// Item slugs in navigation order.
fn collect_slugs(nodes: &[Node], slugs: &mut Vec<EcoString>) {
    for elem in nodes.iter().filter_map(Node::as_element) {
        if nav_type(elem) == Some("NavItem") {
            slugs.extend(item_slug(elem));
        } else {
            collect_slugs(&elem.children, slugs);
        }
    }
}

fn is_heading(name: &str) -> bool {
    matches!(name.as_bytes(), [b'h', b'1'..=b'6'])
}

/// Compare strings with digit runs compared by value, ignoring case.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let ((x, xe), (y, ye)) = (digit_run(a), digit_run(b));
                let ord = x.len().cmp(&y.len()).then_with(|| x.cmp(y));
                if ord != Ordering::Equal {
                    return ord;
                }
                a = &a[xe..];
                b = &b[ye..];
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a = &a[x.len_utf8()..];
                b = &b[y.len_utf8()..];
            }
        }
    }
}

/// The leading digits without leading zeros, and where they end.
fn digit_run(s: &str) -> (&str, usize) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (s[..end].trim_start_matches('0'), end)
}
