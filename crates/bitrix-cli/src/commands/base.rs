//! Methods and scope commands - permission introspection

use anyhow::Result;
use bitrix_client::BitrixClient;

use crate::output::{NameRow, OutputContext};

/// List REST methods
pub fn methods(
    client: &BitrixClient,
    scope: Option<&str>,
    brief: bool,
    ctx: &OutputContext,
) -> Result<()> {
    // Without `full` the server lists only what the token may call
    let full = if brief { None } else { Some(true) };
    let response = client.base().methods(full, scope)?;
    print_names(response.result.unwrap_or_default(), ctx);
    Ok(())
}

/// List permission scopes
pub fn scope(client: &BitrixClient, ctx: &OutputContext) -> Result<()> {
    let response = client.base().scope(Some(true))?;
    print_names(response.result.unwrap_or_default(), ctx);
    Ok(())
}

fn print_names(names: Vec<String>, ctx: &OutputContext) {
    let rows: Vec<NameRow> = names.into_iter().map(|name| NameRow { name }).collect();
    ctx.print(&rows);
}
