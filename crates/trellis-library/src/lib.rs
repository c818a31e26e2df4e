//! Trellis's shared foundations: the document tree every transform reads and
//! writes, plus the diagnostics used by loading and validation.

pub mod diag;
pub mod node;

pub use self::node::{Attrs, Element, Node};

#[doc(hidden)]
pub use ecow;
