//! Service-method calls

use tracing::instrument;

use super::types::*;
use crate::error::Result;
use crate::transport::Transport;

/// Permission introspection methods
#[derive(Debug, Clone, Copy)]
pub struct BaseService<'a> {
    transport: &'a Transport,
}

impl<'a> BaseService<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// List API methods, optionally limited to one scope
    ///
    /// `full: None` leaves the flag out so the server applies its own default.
    #[instrument(skip(self))]
    pub fn methods(&self, full: Option<bool>, scope: Option<&str>) -> Result<MethodsResponse> {
        let params = MethodsParams {
            full,
            scope: scope.map(String::from),
        };
        self.transport.call(&params)
    }

    /// List permission scopes
    #[instrument(skip(self))]
    pub fn scope(&self, full: Option<bool>) -> Result<ScopeResponse> {
        self.transport.call(&ScopeParams { full })
    }
}
