//! Disk methods: storages, folders, files and uploads

mod service;
mod types;

pub use service::*;
pub use types::*;
