use ecow::{EcoString, EcoVec, eco_format, eco_vec};
use indexmap::IndexMap;
use trellis_library::{Attrs, Element, Node};
use trellis_timing::timed;

use crate::chrome::build_layout_chrome;
use crate::computed::resolve_computed;
use crate::config::{LayoutConfig, LayoutSlot, SlotChild, SlotSource};
use crate::page::PageData;

/// Compose a page from a layout and page data.
///
/// Computed widgets are resolved first, then each slot in declaration
/// order. The slots end up in a root element carrying `data-layout` and the
/// `<prefix>-layout-<block>` class.
pub fn layout_transform(config: &LayoutConfig, page: &PageData, prefix: &str) -> Element {
    timed!("layout transform", detail = config.block.clone(), {
        let composer = Composer::new(config, page, prefix);
        let children: EcoVec<Node> = config
            .slots
            .values()
            .filter_map(|slot| composer.slot(slot))
            .map(Node::Element)
            .collect();

        let mut attrs = Attrs::new()
            .with("data-layout", config.block.clone())
            .with("class", eco_format!("{prefix}-layout-{}", config.block));
        if !config.behaviors.is_empty() {
            attrs.insert("data-layout-behaviors", config.behaviors.join(" "));
        }

        let root = Element {
            name: config.tag.clone().unwrap_or_else(|| "div".into()),
            attrs,
            children,
        };

        match &config.post_transform {
            Some(hook) => hook.apply(root, page),
            None => root,
        }
    })
}

/// Resolves the slots of one page.
struct Composer<'a> {
    config: &'a LayoutConfig,
    page: &'a PageData,
    computed: IndexMap<EcoString, Option<Element>>,
}

impl<'a> Composer<'a> {
    fn new(config: &'a LayoutConfig, page: &'a PageData, prefix: &str) -> Self {
        let computed = config
            .computed
            .iter()
            .map(|(name, def)| (name.clone(), resolve_computed(def, page, prefix)))
            .collect();
        Self { config, page, computed }
    }

    /// Resolve a slot. `None` means the slot is omitted.
    fn slot(&self, slot: &LayoutSlot) -> Option<Element> {
        stacker::maybe_grow(32 * 1024, 2 * 1024 * 1024, || self.slot_impl(slot))
    }

    fn slot_impl(&self, slot: &LayoutSlot) -> Option<Element> {
        if let Some(key) = &slot.frontmatter_condition
            && !self.page.frontmatter_flag(key)
        {
            return None;
        }

        if let Some(region) = &slot.conditional_region
            && !self.page.regions.contains_key(region)
        {
            return None;
        }

        let mut content = EcoVec::new();
        if let Some(source) = &slot.source {
            content = self.source(source);
            if slot.conditional && content.is_empty() {
                return None;
            }
        }

        for child in &slot.children {
            match child {
                SlotChild::Chrome(name) => content.extend(self.chrome(name)),
                SlotChild::Text(text) => content.push(Node::Text(text.clone())),
                SlotChild::Slot(nested) => {
                    content.extend(self.slot(nested).map(Node::Element));
                }
                SlotChild::Entry(entry) => {
                    let name = entry.label.as_deref().unwrap_or("");
                    content.extend(build_layout_chrome(entry, name, self.page).map(Node::Element));
                }
            }
        }

        let mut class = slot.class.clone().unwrap_or_default();
        if let Some(modifier) = &slot.conditional_modifier
            && self.page.regions.contains_key(&modifier.region)
            && !class.is_empty()
        {
            class = eco_format!("{class} {class}--{}", modifier.modifier);
        }

        if let Some(wrapper) = &slot.wrapper {
            let mut wrapper_class = wrapper.class.clone().unwrap_or_default();
            if let Some(modifier) = &wrapper.conditional_modifier
                && self.computed.get(&modifier.computed).is_some_and(Option::is_some)
                && !wrapper_class.is_empty()
            {
                wrapper_class = eco_format!("{wrapper_class} {wrapper_class}--{}", modifier.modifier);
            }
            let mut element = Element::new(wrapper.tag.clone());
            if !wrapper_class.is_empty() {
                element.attrs.insert("class", wrapper_class);
            }
            content = eco_vec![Node::Element(element.with_children(content))];
        }

        let mut attrs = Attrs::new();
        if !class.is_empty() {
            attrs.insert("class", class);
        }
        attrs.extend(slot.attrs.iter().map(|(k, v)| (k.clone(), v.clone())));

        Some(Element { name: slot.tag.clone(), attrs, children: content })
    }

    /// Resolve a source specifier into content.
    fn source(&self, source: &SlotSource) -> EcoVec<Node> {
        match source {
            SlotSource::Content => self.page.renderable.iter().cloned().collect(),
            SlotSource::Region(name) => {
                self.page.regions.get(name).map(|r| r.content.clone()).unwrap_or_default()
            }
            SlotSource::CloneRegion(name) => self
                .page
                .regions
                .get(name)
                .map(|r| r.content.iter().map(Node::deep_clone).collect())
                .unwrap_or_default(),
            SlotSource::Computed(name) => match self.computed.get(name) {
                Some(Some(element)) => eco_vec![Node::Element(element.clone())],
                Some(None) => EcoVec::new(),
                None => {
                    log::debug!("slot references undeclared computed content `{name}`");
                    EcoVec::new()
                }
            },
            SlotSource::Chrome(name) => self.chrome(name).into_iter().collect(),
            SlotSource::Unknown(raw) => {
                log::debug!("unknown slot source `{raw}`");
                EcoVec::new()
            }
        }
    }

    /// Build a named chrome fragment.
    fn chrome(&self, name: &str) -> Option<Node> {
        let Some(entry) = self.config.chrome.get(name) else {
            log::debug!("slot references undeclared chrome `{name}`");
            return None;
        };
        let label = entry.label.as_deref().unwrap_or(name);
        build_layout_chrome(entry, label, self.page).map(Node::Element)
    }
}
