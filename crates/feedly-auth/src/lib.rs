//! OAuth 2.0 session lifecycle for the Feedly cloud API.
//!
//! Acquires an authorization grant through a local redirect listener and the
//! system browser, exchanges it for tokens, persists the session, and hands
//! out a valid access token before every authenticated call.
//!
//! # Components
//!
//! - [`session`]: Session record and its JSON file store
//! - [`callback`]: Single-shot localhost listener for the OAuth redirect
//! - [`oauth`]: Authorization URL and token endpoint calls (code, refresh, revoke)
//! - [`token_manager`]: Per-call token decision and single-flight authorization
//! - [`browser`]: Browser handoff

pub mod browser;
pub mod callback;
pub mod config;
pub mod error;
pub mod oauth;
pub mod session;
pub mod token_manager;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use callback::{CallbackListener, CallbackResult};
pub use config::{AuthConfig, AuthConfigBuilder};
pub use error::{AuthError, Result};
pub use oauth::{TokenExchanger, TokenGrant};
pub use session::{SessionRecord, SessionStore, TokenState};
pub use token_manager::TokenManager;
