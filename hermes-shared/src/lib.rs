pub mod pii;
pub mod role;

pub use pii::Masked;
pub use role::{Role, UnknownRole};
