//! amoCRM integration: OAuth2 authorization-code flow, token file
//! persistence and the leads API client.

pub mod api;
pub mod config;
pub mod error;
pub mod oauth;
pub mod session;
pub mod state_store;
pub mod token_store;

pub use api::CrmApi;
pub use config::CrmConfig;
pub use error::CrmError;
pub use session::{ConnectParams, Connection, SessionManager};
pub use state_store::OAuthStateStore;
pub use token_store::TokenStore;
