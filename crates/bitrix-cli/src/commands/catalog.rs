//! Catalog command - methods with typed bindings

use bitrix_client::method::CATALOG;

use crate::output::{CatalogRow, OutputContext};

/// List the methods this client has typed bindings for
pub fn catalog(ctx: &OutputContext) {
    let rows: Vec<CatalogRow> = CATALOG
        .iter()
        .map(|entry| CatalogRow {
            method: entry.name.to_string(),
            params: entry.params.to_string(),
            output: entry.output.to_string(),
        })
        .collect();
    ctx.print(&rows);
}
