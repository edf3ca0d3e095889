//! Text rendering utilities.

mod wrap;

pub use wrap::{wrap_prefixed, wrap_text};
