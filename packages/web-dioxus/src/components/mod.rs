//! Reusable UI components

mod admin_layout;
mod admin_nav;
mod chat_panel;
mod loading;
mod post_card;

pub use admin_layout::*;
pub use admin_nav::*;
pub use chat_panel::*;
pub use loading::*;
pub use post_card::*;
