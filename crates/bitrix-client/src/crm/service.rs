//! CRM method calls

use tracing::{debug, instrument};

use super::types::*;
use crate::error::Result;
use crate::transport::Transport;

/// Smart-process type and item methods
#[derive(Debug, Clone, Copy)]
pub struct CrmService<'a> {
    transport: &'a Transport,
}

impl<'a> CrmService<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// List smart-process types
    #[instrument(skip(self, params))]
    pub fn type_list(&self, params: &TypeListParams) -> Result<TypeList> {
        let list: TypeList = self.transport.call(params)?;
        debug!("Received {} types", list.result.types.len());
        Ok(list)
    }

    /// List one page of items of an entity type
    #[instrument(skip(self, params), fields(entity_type = params.entity_type_id()))]
    pub fn item_list(&self, params: &ItemListParams) -> Result<ItemList> {
        let list: ItemList = self.transport.call(params)?;
        debug!("Received {} items, next = {:?}", list.result.items.len(), list.next);
        Ok(list)
    }
}
