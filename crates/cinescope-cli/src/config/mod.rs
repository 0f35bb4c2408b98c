//! Application configuration module.
//!
//! TOML settings for the metadata client and the user-data backend, plus
//! the persisted auth session.

#[allow(clippy::module_inception)]
mod config;
mod paths;
mod session;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, StoreBackend, SupabaseConfig};
pub use paths::{resolve_config_path, resolve_data_dir};
pub use session::{clear_session, load_session, save_session, session_path};
