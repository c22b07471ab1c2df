//! Member domain workflows, services, and virtual objects

pub mod services;
pub mod virtual_objects;
pub mod workflows;

pub use services::*;
pub use virtual_objects::*;
pub use workflows::*;
