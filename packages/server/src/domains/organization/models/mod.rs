pub mod organization;
pub mod post;
pub mod scrape_job;

pub use organization::*;
pub use post::*;
pub use scrape_job::*;
