//! Data types for the evidence-first extraction pipeline.

pub mod anchor;
pub mod augmentation;
pub mod config;
pub mod contract;
pub mod finding;
pub mod fingerprint;
pub mod negotiation;
pub mod telemetry;
