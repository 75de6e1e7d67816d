pub mod person;
pub mod refresh_token;
pub mod session;

pub use person::{Principal, Role};
