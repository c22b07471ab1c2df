pub mod tag;
pub mod tag_kind_config;
pub mod taxonomy_crosswalk;

pub use tag::{ActiveCategory, Tag, Taggable, TaggableType};
pub use tag_kind_config::TagKindConfig;
pub use taxonomy_crosswalk::TaxonomyCrosswalk;
