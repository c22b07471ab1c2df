//! Track B: the optional language-model augmenter (spec §4.3).

pub mod engine;
pub mod roundtrip;

pub use engine::{augment, AugmenterOptions};
