//! Common types used across the application.

pub mod id;
pub mod money;
pub mod owner;
pub mod pagination;

pub use id::*;
pub use money::{Currency, Money};
pub use owner::{OwnerKey, OwnerKeyError};
pub use pagination::{PageMeta, PageRequest, PageResponse};
