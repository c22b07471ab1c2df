// Business domains
pub mod auth;
pub mod chatrooms;
pub mod contacts;
pub mod crawling;
pub mod domain_approval;
pub mod member;
pub mod organization;
pub mod posts;
pub mod providers;
pub mod resources;
pub mod scraping; // DEPRECATED: Use crawling domain instead
pub mod tag;
pub mod website;
