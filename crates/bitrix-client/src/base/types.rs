//! Parameter and result types for the service methods

use serde::Serialize;

use crate::params::BitrixParams;
use crate::types::ApiResponse;

/// Parameters for `methods`
#[derive(Debug, Clone, Serialize)]
pub struct MethodsParams {
    /// List every method instead of only the ones available to the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<bool>,

    /// Only methods belonging to this permission scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Default for MethodsParams {
    fn default() -> Self {
        Self {
            full: Some(true),
            scope: None,
        }
    }
}

impl BitrixParams for MethodsParams {}

/// Parameters for `scope`
#[derive(Debug, Clone, Serialize)]
pub struct ScopeParams {
    /// List every scope instead of only the granted ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<bool>,
}

impl Default for ScopeParams {
    fn default() -> Self {
        Self { full: Some(true) }
    }
}

impl BitrixParams for ScopeParams {}

/// List of method names
pub type MethodsResponse = ApiResponse<Option<Vec<String>>>;

/// List of permission scopes
pub type ScopeResponse = ApiResponse<Option<Vec<String>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_methods_params_encoding() {
        let params = MethodsParams {
            full: Some(true),
            scope: Some("crm".into()),
        };
        let encoded = params.to_bx_params().unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.get("full"), Some(&json!(true)));
        assert_eq!(encoded.get("scope"), Some(&json!("crm")));
    }

    #[test]
    fn test_default_asks_for_full_list() {
        let encoded = MethodsParams::default().to_bx_params().unwrap();
        assert_eq!(encoded.get("full"), Some(&json!(true)));
        assert!(!encoded.contains_key("scope"));

        let encoded = ScopeParams::default().to_bx_params().unwrap();
        assert_eq!(encoded.get("full"), Some(&json!(true)));
    }

    #[test]
    fn test_nothing_set_encodes_empty() {
        let params = MethodsParams {
            full: None,
            scope: None,
        };
        assert!(params.to_bx_params().unwrap().is_empty());
    }
}
