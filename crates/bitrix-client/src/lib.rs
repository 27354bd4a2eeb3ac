//! Bitrix24 REST Client Library
//!
//! Typed, blocking client for a subset of the Bitrix24 REST API: permission
//! introspection, CRM smart processes and Disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use bitrix_client::{BitrixClient, BitrixConfig, Credentials, FilePayload};
//! use bitrix_client::crm::ItemListParams;
//! use bitrix_client::SortDirection;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = BitrixConfig::from_yaml_file("bitrix.yaml")?;
//!     let client = BitrixClient::new(config, Credentials::new(159096, "token"))?;
//!
//!     // One page of leads, newest first
//!     let params = ItemListParams::new(1)
//!         .select(["id", "title", "stageId"])
//!         .order_by("id", SortDirection::Desc);
//!     let page = client.crm().item_list(&params)?;
//!     println!("{} items, next page at {:?}", page.result.items.len(), page.next);
//!
//!     // Two-phase upload into folder 8
//!     let file = client
//!         .disk()
//!         .upload_file_complete(8, FilePayload::from_path("report.pdf")?)?;
//!     println!("stored as {}", file.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Calls
//!
//! A parameter struct is encoded into flat form fields ([`params`]), posted
//! to `<base>/<account>/<token>/<method>.json` ([`Transport`]) and the JSON
//! body is decoded into an [`ApiResponse`] ([`decode`]). Bodies carrying an
//! `error` key become [`BitrixError::Api`] even on HTTP 200.
//!
//! # Testing
//!
//! The `testing` module serves a scriptable portal on a local port:
//!
//! ```rust,ignore
//! use bitrix_client::testing::{MockBitrix, TestServer};
//!
//! let mock = MockBitrix::new();
//! mock.respond("disk.folder.get", json!({"result": fixtures::folder(8, "Docs")}));
//! let server = TestServer::start(mock.router())?;
//! let folder = server.client.disk().folder(8)?;
//! ```

pub mod base;
mod client;
pub mod config;
pub mod crm;
pub mod decode;
pub mod disk;
mod error;
pub mod method;
pub mod params;
pub mod testing;
pub mod transport;
mod types;
pub mod upload;

pub use client::BitrixClient;
pub use config::{BitrixConfig, ConfigError, Credentials};
pub use error::{BitrixError, Result};
pub use method::Method;
pub use params::{BitrixParams, EncodedParams};
pub use transport::{Attachment, Transport};
pub use types::*;
pub use upload::{FilePayload, UploadOutcome, Uploader};
