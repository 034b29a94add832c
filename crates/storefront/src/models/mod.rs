//! Domain models for storefront.

pub mod product;
pub mod session;
pub mod user;

pub use product::{Category, Product};
pub use session::{StoredSession, keys as session_keys};
pub use user::{CachedUser, PendingUser, User};
