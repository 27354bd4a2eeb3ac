//! Command implementations for bx

pub mod base;
pub mod catalog;
pub mod crm;
pub mod disk;

pub use base::{methods, scope};
pub use catalog::catalog;
pub use crm::{items, types};
pub use disk::{children, file, folder, mkdir, mksubdir, rmtree, storage, storages, upload};

use anyhow::{bail, Result};
use bitrix_client::SortDirection;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parse repeated `KEY=VALUE` arguments into a filter mapping
pub fn parse_filter(pairs: &[String]) -> Result<Option<Map<String, Value>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut filter = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid filter '{}', expected KEY=VALUE", pair);
        };
        filter.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(Some(filter))
}

/// Parse repeated `FIELD=ASC|DESC` arguments into a sort order
pub fn parse_order(pairs: &[String]) -> Result<Option<BTreeMap<String, SortDirection>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut order = BTreeMap::new();
    for pair in pairs {
        let (field, direction) = pair.split_once('=').unwrap_or((pair.as_str(), "ASC"));
        let direction: SortDirection = direction.parse().map_err(anyhow::Error::msg)?;
        order.insert(field.to_string(), direction);
    }
    Ok(Some(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter(&["TYPE=folder".into(), ">SIZE=10".into()])
            .unwrap()
            .unwrap();
        assert_eq!(filter.get("TYPE"), Some(&json!("folder")));
        assert_eq!(filter.get(">SIZE"), Some(&json!("10")));
        assert!(parse_filter(&[]).unwrap().is_none());
        assert!(parse_filter(&["TYPE".into()]).is_err());
    }

    #[test]
    fn test_parse_order() {
        let order = parse_order(&["id=desc".into(), "title".into()]).unwrap().unwrap();
        assert_eq!(order.get("id"), Some(&SortDirection::Desc));
        assert_eq!(order.get("title"), Some(&SortDirection::Asc));
        assert!(parse_order(&["id=sideways".into()]).is_err());
    }
}
