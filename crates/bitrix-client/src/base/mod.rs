//! Service methods: permission introspection (`methods`, `scope`)

mod service;
mod types;

pub use service::*;
pub use types::*;
