//! Trellis's page layout compositor.
//!
//! A [`LayoutConfig`] names a page's slots and where their content comes
//! from: the page's rendered content, named regions, chrome fragments bound
//! to page data or computed widgets like a table of contents.
//! [`layout_transform`] assembles one page from such a layout and the
//! page's [`PageData`].

mod chrome;
mod compose;
mod computed;
mod config;
mod manifest;
mod page;

pub use self::chrome::{build_layout_chrome, format_date};
pub use self::compose::layout_transform;
pub use self::computed::{
    build_breadcrumb, build_prev_next, build_toc, build_version_switcher, resolve_computed,
};
pub use self::config::{
    ChromeAttr, ChromeChild, ChromeEntry, ComputedContent, ComputedKind, ComputedModifier,
    DateFormat, Iterate, LayoutConfig, LayoutHook, LayoutSlot, LayoutTransform, MonthStyle,
    NameStyle, NumberStyle, RegionModifier, SlotChild, SlotSource, SlotWrapper, TocOptions,
    Visibility,
};
pub use self::manifest::{
    ComponentDefinition, ComponentOverride, LayoutDefinition, RouteRule, ThemeManifest,
    UnsupportedRuneBehavior, match_route_rule,
};
pub use self::page::{Heading, PageData, PageEntry, Region, display_value, is_truthy};
