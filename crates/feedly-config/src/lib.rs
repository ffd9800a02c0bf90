//! Configuration for the Feedly API client.
//!
//! Provides TOML-based configuration with:
//! - The client options recognized by the auth layer (`port`, `base`,
//!   `config_file`, `html_file`, `html_text`, `slop`, `client_id`, `client_secret`)
//! - Config file discovery in the platform config directory
//! - Credential overrides from `FEEDLY_CLIENT_ID` / `FEEDLY_CLIENT_SECRET`
//! - `~` expansion for every path option

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    apply_env_overrides, default_session_path, load_config, load_config_file, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::{FeedlyConfig, expand_tilde};
