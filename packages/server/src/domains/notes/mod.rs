pub mod activities;
pub mod data;
pub mod models;
pub mod restate;

pub use data::NoteData;
pub use models::{Note, Noteable};
