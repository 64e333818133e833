// lib.rs - YouNote page controller library
pub mod api_client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod loading;
pub mod render;
pub mod storage;
pub mod terminal;
pub mod types;
pub mod view;

// Re-export commonly used types for convenience
pub use api_client::{SummaryBackend, YouNoteClient};
pub use config::ClientConfig;
pub use controller::PageController;
pub use error::{ApiError, ConfigError, StorageError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::*;
pub use view::{LoadingTarget, PageView};
