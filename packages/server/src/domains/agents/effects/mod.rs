//! Agent domain effects.
//!
//! Watches ChatEvent facts and generates AI responses.

pub mod agent;

pub use agent::agent_effect;
