//! Chatrooms domain services and virtual objects

pub mod services;
pub mod virtual_objects;

pub use services::*;
pub use virtual_objects::*;
