pub mod activities;
pub mod data;
pub mod models;
pub mod restate;

pub use data::SocialProfileData;
pub use models::SocialProfile;
