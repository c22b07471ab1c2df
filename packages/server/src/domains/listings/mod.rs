pub mod commands;
pub mod data;
pub mod edges;
pub mod effects;
pub mod events;
pub mod machines;
pub mod models;

// Re-export commands
pub use commands::ListingCommand;

// Re-export data types (GraphQL types)
pub use data::listing::{ListingData, ServiceListingData, TagData};
pub use data::types::{
    BusinessInfo, ContactInfo, ContactInfoInput, EditListingInput, ListingConnection,
    ListingStatusData, ListingType, ScrapeJobResult, SubmitListingInput, SubmitResourceLinkInput,
    SubmitResourceLinkResult,
};

// Re-export events
pub use events::ListingEvent;

// Re-export models (domain models)
pub use models::listing::Listing;
pub use models::listing_website_sync::ListingWebsiteSync;
