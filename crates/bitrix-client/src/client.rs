//! Bitrix24 REST client
//!
//! Groups the typed methods into service views over one [`Transport`].

use std::path::Path;

use crate::base::BaseService;
use crate::config::{BitrixConfig, Credentials};
use crate::crm::CrmService;
use crate::disk::DiskService;
use crate::error::Result;
use crate::method::Method;
use crate::transport::Transport;

/// Client for one Bitrix24 account
///
/// # Example
///
/// ```no_run
/// use bitrix_client::{BitrixClient, BitrixConfig, Credentials};
///
/// let config = BitrixConfig::builder("https://example.bitrix24.ru/rest").build();
/// let client = BitrixClient::new(config, Credentials::new(1, "token"))?;
///
/// let children = client.disk().children(123, None, None)?;
/// for object in children.result.unwrap_or_default() {
///     println!("{} {}", object.id(), object.name());
/// }
/// # Ok::<(), bitrix_client::BitrixError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BitrixClient {
    config: BitrixConfig,
    transport: Transport,
}

impl BitrixClient {
    pub fn new(config: BitrixConfig, credentials: Credentials) -> Result<Self> {
        let transport = Transport::new(&config, &credentials)?;
        Ok(Self { config, transport })
    }

    /// Load the configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>, credentials: Credentials) -> Result<Self> {
        let config = BitrixConfig::from_yaml_file(path)?;
        Self::new(config, credentials)
    }

    pub fn config(&self) -> &BitrixConfig {
        &self.config
    }

    /// Raw access for methods without a typed binding
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// `methods`, `scope`
    pub fn base(&self) -> BaseService<'_> {
        BaseService::new(&self.transport)
    }

    /// `disk.*`
    pub fn disk(&self) -> DiskService<'_> {
        DiskService::new(&self.transport)
    }

    /// `crm.*`
    pub fn crm(&self) -> CrmService<'_> {
        CrmService::new(&self.transport)
    }

    /// Call any catalogued method
    pub fn call<M: Method>(&self, params: &M) -> Result<M::Output> {
        self.transport.call(params)
    }
}
