pub mod content;
pub mod embeddings;
pub mod expo;
pub mod geocoding;

pub use content::*;
pub use embeddings::*;
pub use expo::*;
pub use geocoding::*;
