//! CRM parameter and result types

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decode::lenient;
use crate::params::{flag, BitrixParams};
use crate::types::{ApiResponse, SortDirection};

/// Sort order: field name to direction
pub type Order = BTreeMap<String, SortDirection>;

// =============================================================================
// crm.type.list
// =============================================================================

/// Parameters for `crm.type.list`
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    /// Page offset, `(page - 1) * 50`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
}

impl BitrixParams for TypeListParams {}

/// A smart-process type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeInfo {
    #[serde(deserialize_with = "lenient::int")]
    pub id: i64,
    pub title: String,
    pub code: String,
    #[serde(deserialize_with = "lenient::int")]
    pub created_by: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub entity_type_id: i64,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub custom_section_id: Option<i64>,
    #[serde(with = "flag")]
    pub is_categories_enabled: bool,
    #[serde(with = "flag")]
    pub is_stages_enabled: bool,
    #[serde(with = "flag")]
    pub is_begin_close_dates_enabled: bool,
    #[serde(with = "flag")]
    pub is_client_enabled: bool,
    #[serde(with = "flag")]
    pub is_use_in_userfield_enabled: bool,
    #[serde(with = "flag")]
    pub is_link_with_products_enabled: bool,
    #[serde(with = "flag")]
    pub is_mycompany_enabled: bool,
    #[serde(with = "flag")]
    pub is_documents_enabled: bool,
    #[serde(with = "flag")]
    pub is_source_enabled: bool,
    #[serde(with = "flag")]
    pub is_observers_enabled: bool,
    #[serde(with = "flag")]
    pub is_recyclebin_enabled: bool,
    #[serde(with = "flag")]
    pub is_automation_enabled: bool,
    #[serde(with = "flag")]
    pub is_biz_proc_enabled: bool,
    #[serde(with = "flag")]
    pub is_set_open_permissions: bool,
    #[serde(with = "flag")]
    pub is_payments_enabled: bool,
    #[serde(with = "flag")]
    pub is_counters_enabled: bool,
    pub created_time: DateTime<FixedOffset>,
    pub updated_time: DateTime<FixedOffset>,
    #[serde(deserialize_with = "lenient::int")]
    pub updated_by: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeListResult {
    pub types: Vec<TypeInfo>,
}

pub type TypeList = ApiResponse<TypeListResult>;

// =============================================================================
// crm.item.list
// =============================================================================

/// Parameters for `crm.item.list`
#[derive(Debug, Clone, Serialize)]
pub struct ItemListParams {
    #[serde(rename = "entityTypeId")]
    entity_type_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u64>,
    #[serde(
        rename = "useOriginalUfNames",
        with = "flag::option",
        skip_serializing_if = "Option::is_none"
    )]
    use_original_uf_names: Option<bool>,
}

impl ItemListParams {
    /// Items of one system (1 = lead, 2 = deal, ...) or smart-process type
    pub fn new(entity_type_id: i64) -> Self {
        Self {
            entity_type_id,
            select: None,
            filter: None,
            order: None,
            start: None,
            use_original_uf_names: None,
        }
    }

    /// Fields to return, `["*"]` for all
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, filter: Map<String, Value>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order
            .get_or_insert_with(Order::new)
            .insert(field.into(), direction);
        self
    }

    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    /// Return user fields under their `UF_*` names instead of camelCase
    pub fn use_original_uf_names(mut self, original: bool) -> Self {
        self.use_original_uf_names = Some(original);
        self
    }

    pub fn entity_type_id(&self) -> i64 {
        self.entity_type_id
    }
}

impl BitrixParams for ItemListParams {}

/// A CRM item. The field set depends on `select`; undeclared fields are kept
/// in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Look up an undeclared field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemListResult {
    pub items: Vec<Item>,
}

pub type ItemList = ApiResponse<ItemListResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::testing::fixtures;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Some(true), Some("Y"))]
    #[case(Some(false), Some("N"))]
    #[case(None, None)]
    fn test_original_uf_names_flag(#[case] value: Option<bool>, #[case] expected: Option<&str>) {
        let mut params = ItemListParams::new(1);
        if let Some(value) = value {
            params = params.use_original_uf_names(value);
        }
        let encoded = params.to_bx_params().unwrap();
        assert_eq!(
            encoded.get("useOriginalUfNames"),
            expected.map(|v| json!(v)).as_ref()
        );
    }

    #[test]
    fn test_item_list_params_encoding() {
        let params = ItemListParams::new(1)
            .select(["id", "title", "stageId"])
            .filter(fixtures::object(json!({"stageId": "NEW", ">opportunity": 100})))
            .order_by("id", SortDirection::Desc)
            .start(50);
        let encoded = params.to_bx_params().unwrap();

        assert_eq!(
            encoded.keys().collect::<Vec<_>>(),
            vec![
                "entityTypeId",
                "filter[>opportunity]",
                "filter[stageId]",
                "order[id]",
                "select",
                "start"
            ]
        );
        assert_eq!(encoded.get("order[id]"), Some(&json!("DESC")));
        assert_eq!(encoded.get("select"), Some(&json!(["id", "title", "stageId"])));
    }

    #[test]
    fn test_type_list_params_empty_order() {
        let params = TypeListParams {
            order: Some(Order::new()),
            ..Default::default()
        };
        assert!(params.to_bx_params().unwrap().is_empty());
    }

    #[test]
    fn test_decode_type_info() {
        let info: TypeInfo = decode(fixtures::crm_type(128, "Contracts")).unwrap();
        assert_eq!(info.id, 128);
        assert_eq!(info.entity_type_id, 1032);
        assert!(info.is_automation_enabled);
        assert!(!info.is_payments_enabled);
        assert_eq!(info.custom_section_id, None);
    }

    #[test]
    fn test_decode_type_info_rejects_bad_flag() {
        let mut raw = fixtures::crm_type(1, "X");
        raw["isStagesEnabled"] = json!("maybe");
        assert!(decode::<TypeInfo>(raw).is_err());
    }

    #[test]
    fn test_decode_items_keeps_extra_fields() {
        let list: ItemList = decode(json!({
            "result": {"items": [
                {"id": 1, "title": "First", "stageId": "NEW", "opportunity": 100.5},
                {"id": "2", "ufCrm5Color": "red"}
            ]},
            "total": 2,
            "next": 50
        }))
        .unwrap();

        assert_eq!(list.next, Some(50));
        let items = list.result.items;
        assert_eq!(items[0].title.as_deref(), Some("First"));
        assert_eq!(items[0].get("stageId"), Some(&json!("NEW")));
        assert_eq!(items[1].id, Some(2));
        assert_eq!(items[1].title, None);
        assert_eq!(items[1].get("ufCrm5Color"), Some(&json!("red")));
    }

    #[test]
    fn test_decode_item_list_requires_result() {
        assert!(decode::<ItemList>(json!({"total": 0})).is_err());
    }
}
