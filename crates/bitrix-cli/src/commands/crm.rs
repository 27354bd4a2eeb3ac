//! Types and items commands - CRM smart processes

use anyhow::Result;
use bitrix_client::crm::{ItemListParams, TypeListParams};
use bitrix_client::BitrixClient;

use super::{parse_filter, parse_order};
use crate::output::{or_dash, ItemRow, OutputContext, TypeRow};

/// List smart-process types
pub fn types(
    client: &BitrixClient,
    order: &[String],
    filter: &[String],
    start: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let params = TypeListParams {
        order: parse_order(order)?,
        filter: parse_filter(filter)?,
        start,
    };
    let list = client.crm().type_list(&params)?;

    let rows: Vec<TypeRow> = list
        .result
        .types
        .into_iter()
        .map(|t| TypeRow {
            id: t.id,
            entity_type_id: t.entity_type_id,
            title: t.title,
            stages: yes_no(t.is_stages_enabled),
            automation: yes_no(t.is_automation_enabled),
        })
        .collect();

    ctx.print(&rows);
    ctx.next_page(list.next, list.total);
    Ok(())
}

/// Options of the items command
pub struct ItemsArgs<'a> {
    pub entity_type_id: i64,
    pub select: &'a [String],
    pub filter: &'a [String],
    pub order: &'a [String],
    pub start: Option<u64>,
    pub original_names: bool,
}

/// List one page of CRM items
pub fn items(client: &BitrixClient, args: ItemsArgs<'_>, ctx: &OutputContext) -> Result<()> {
    let mut params = ItemListParams::new(args.entity_type_id);
    if !args.select.is_empty() {
        params = params.select(args.select.iter().cloned());
    }
    if let Some(filter) = parse_filter(args.filter)? {
        params = params.filter(filter);
    }
    for (field, direction) in parse_order(args.order)?.unwrap_or_default() {
        params = params.order_by(field, direction);
    }
    if let Some(start) = args.start {
        params = params.start(start);
    }
    if args.original_names {
        params = params.use_original_uf_names(true);
    }

    let list = client.crm().item_list(&params)?;
    let rows: Vec<ItemRow> = list
        .result
        .items
        .into_iter()
        .map(|item| ItemRow {
            id: or_dash(item.id),
            title: or_dash(item.title),
            fields: serde_json::Value::Object(item.extra).to_string(),
        })
        .collect();

    ctx.print(&rows);
    ctx.next_page(list.next, list.total);
    Ok(())
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "Yes" } else { "No" };
    text.to_string()
}
