//! CRM methods: smart-process types and items

mod service;
mod types;

pub use service::*;
pub use types::*;
