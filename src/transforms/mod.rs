//! Document transformations
//!
//! Each transform is a pure function from one document to a new document;
//! tick positions, tempo entries or pitch fields change, nothing else.

mod swing;
mod tempo;
mod transpose;

pub use swing::to_swing;
pub use tempo::{scale_tempo, validate_ratio};
pub use transpose::transpose;
