#![forbid(unsafe_code)]

pub mod http;
pub mod record;
pub mod service;

pub use http::{HttpIdentity, HttpIdentityConfig};
pub use record::{PropertyUpdates, UserRecord};
pub use service::{IdentityError, IdentityService, InMemoryIdentity};
