//! Discovery domain models.

pub mod discovery_filter_rule;
pub mod discovery_query;
pub mod discovery_run;
pub mod discovery_run_result;

pub use discovery_filter_rule::*;
pub use discovery_query::*;
pub use discovery_run::*;
pub use discovery_run_result::*;
