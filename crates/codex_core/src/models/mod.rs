//! Data models exchanged with the gateway.

pub mod admin;
pub mod collection;
pub mod snippet;
pub mod user;


pub use collection::Collection;
pub use snippet::{Comment, Snippet, Visibility};
pub use user::User;
