//! Trellis's identity transform.
//!
//! A theme declares, per component type, how instances of that type are
//! dressed up: which BEM classes they get, which variant values are read from
//! them, which scaffolding elements are synthesized around their content. The
//! [`Transformer`] interprets such a [`ThemeConfig`] over a document tree and
//! produces an enhanced tree without touching the input.

mod config;
mod contract;
mod engine;
mod hooks;
mod selectors;
mod structure;

pub use self::config::{
    AttrValue, ContentWrapper, IconRef, Icons, ModifierSource, ModifierSpec,
    PostTransform, RuneConfig, RuneContext, RuneTransform, StructureChild,
    StructureEntry, StyleSpec, TextTransform, ThemeConfig,
};
pub use self::contract::{
    ElementContract, ElementSource, RuneContract, StructureContract,
    generate_structure_contract,
};
pub use self::engine::{Transformer, create_transform};
pub use self::hooks::{Retag, RowTable};
pub use self::selectors::extract_selectors;
pub use self::structure::{apply_text_transform, build_structure_element};
