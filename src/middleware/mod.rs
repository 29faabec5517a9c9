pub mod identity;

pub use identity::{backlink, CurrentUser, MaybeUser};
