pub mod api;
pub mod client;
pub mod config;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use api::{translate_history, Category, HistoryEntry, PresetQuestion};
pub use client::{BackendClient, ClientError};
pub use config::{Config, Settings};
pub use session::{Outcome, Request, Session, FALLBACK_REPLY, GENERAL_CATEGORY};
pub use state::{ChatMessage, ChatRole};
