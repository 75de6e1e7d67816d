pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod models;
pub mod session;
pub mod store;
pub mod testing;

pub use auth::{Claims, IssueMeta, IssuedTokens, TokenEngine};
pub use config::{Config, TokenConfig};
pub use error::TesseraError;
pub use models::{Principal, Role};
pub use store::{RefreshTokenStore, SeaOrmRefreshTokenStore};
