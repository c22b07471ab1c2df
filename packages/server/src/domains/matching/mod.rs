pub mod commands;
pub mod effects;
pub mod events;
pub mod machines;

// Re-export commonly used types
pub use commands::MatchingCommand;
pub use events::MatchingEvent;
pub use machines::MatchingMachine;
