pub mod engine;
pub mod jwt;
pub mod secret;

pub use engine::{IssueMeta, IssuedTokens, TokenEngine};
pub use jwt::{Claims, create_token, validate_token};
pub use secret::{generate_jti, generate_refresh_secret, hash_secret};
