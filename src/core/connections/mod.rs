pub mod builder;
pub mod service;
pub mod typed;

pub use builder::{ConnectionConfigBuilder, FieldPath};
pub use service::ConnectionService;
pub use typed::*;
