//! Crawling domain workflows
//!
//! Durable workflows for web crawling operations.

pub mod crawl_website;

pub use crawl_website::*;
