//! DOM input abstraction and the anchor index built over it.

pub mod anchor_index;
pub mod document;
pub mod normalize;

pub use document::Document;
