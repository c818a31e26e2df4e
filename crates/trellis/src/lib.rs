//! Declarative theming for tagged document trees.
//!
//! # Steps
//! - **Loading:**
//!   A theme's configuration, its layouts and its manifest are [loaded] from
//!   JSON, TOML or YAML. Each is [validated] first: structural problems fail
//!   the load, dangling cross-references come back as warnings.
//! - **Transformation:**
//!   The [identity transform] walks a parsed document tree and dresses up
//!   every element whose `typeof` the theme declares: BEM classes, data
//!   attributes from variant values, synthesized scaffolding.
//! - **Composition:**
//!   The [layout compositor] places the transformed content, named regions,
//!   chrome bound to page data and computed widgets into the slots of a page
//!   layout.
//!
//! The output is a plain element tree, ready for a renderer.
//!
//! [loaded]: load_theme
//! [validated]: validate::validate_theme_config
//! [identity transform]: transform::Transformer
//! [layout compositor]: layout::layout_transform

pub extern crate ecow;

mod loading;

pub use trellis_library::*;
#[doc(inline)]
pub use trellis_layout as layout;
#[doc(inline)]
pub use trellis_timing as timing;
#[doc(inline)]
pub use trellis_transform as transform;
#[doc(inline)]
pub use trellis_validate as validate;

pub use self::loading::{Format, load_layout, load_manifest, load_theme};

use trellis_layout::{LayoutConfig, PageData, layout_transform};
use trellis_timing::timed;
use trellis_transform::Transformer;

/// Transform a page's content with a theme and compose it into a layout.
///
/// Both the page's renderable and every region run through the theme before
/// the layout places them.
pub fn compose_page(theme: &Transformer, layout: &LayoutConfig, mut page: PageData) -> Element {
    timed!("compose page", {
        if let Some(renderable) = &page.renderable {
            page.renderable = Some(theme.transform(renderable));
        }
        for region in page.regions.values_mut() {
            region.content = region.content.iter().map(|node| theme.transform(node)).collect();
        }
        layout_transform(layout, &page, &theme.config().prefix)
    })
}
