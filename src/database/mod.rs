pub mod models;
pub mod provider;

pub use provider::{is_unique_violation, Db};
