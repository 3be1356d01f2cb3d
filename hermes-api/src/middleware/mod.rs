pub mod auth;

pub use auth::{auth_middleware, issue_token, verify_token, Claims};
