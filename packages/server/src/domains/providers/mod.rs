//! Providers domain - service provider directory

pub mod activities;
pub mod data;
pub mod models;
pub mod restate;

// Re-export commonly used types
pub use data::{ProviderData, ProviderStatusData, SubmitProviderInput, UpdateProviderInput};
pub use models::{CreateProvider, Provider, ProviderStatus, UpdateProvider};
