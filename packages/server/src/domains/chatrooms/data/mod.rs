//! GraphQL data types for the chatrooms domain.

pub mod container;
pub mod message;

pub use container::*;
pub use message::*;
