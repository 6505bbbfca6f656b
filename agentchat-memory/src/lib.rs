//! # agentchat-memory
//!
//! Persistence for the chat client: each persona's message log, user
//! settings and the signed-in user.
//!
//! Everything is stored as whole JSON documents under string keys through a
//! [`Storage`] backend, either on disk ([`JsonFileStorage`]) or in memory
//! ([`InMemoryStorage`]).

pub mod auth;
pub mod memory;
pub mod settings;
pub mod storage;

pub use auth::{AUTH_USER_KEY, AuthSession, mock_user};
pub use memory::{ChatMemory, MEMORY_STORAGE_KEY};
pub use settings::{SETTINGS_STORAGE_KEY, Settings, SettingsStore};
pub use storage::{InMemoryStorage, JsonFileStorage, Storage};
