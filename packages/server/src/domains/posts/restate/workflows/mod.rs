pub mod deduplicate_posts;
pub mod extract_posts_from_url;

pub use deduplicate_posts::{DeduplicatePostsWorkflow, DeduplicatePostsWorkflowImpl};
pub use extract_posts_from_url::*;
