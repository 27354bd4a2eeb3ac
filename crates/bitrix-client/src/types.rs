//! Types shared by every API family

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Response envelope returned by every REST method
///
/// `result` is required unless `T` is an `Option`. Keys other than the four
/// below are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiResponse<T> {
    pub result: T,

    /// Total number of matching records (list methods)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// Value to pass as `start` to fetch the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,

    /// Request timing reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeInfo>,
}

/// Request execution timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeInfo {
    pub start: f64,
    pub finish: f64,
    pub duration: f64,
    pub processing: f64,
    pub date_start: String,
    pub date_finish: String,
    pub operating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_reset_at: Option<i64>,
}

/// Sort direction for `order` mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(format!("invalid sort direction '{}', expected ASC or DESC", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_optional_result_may_be_missing() {
        let response: ApiResponse<Option<Vec<String>>> =
            serde_json::from_value(json!({"total": 0})).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.total, Some(0));
    }

    #[test]
    fn test_envelope_required_result() {
        let err = serde_json::from_value::<ApiResponse<Vec<String>>>(json!({"total": 0}))
            .unwrap_err();
        assert!(err.to_string().contains("result"));
    }

    #[test]
    fn test_envelope_rejects_unknown_keys() {
        let err = serde_json::from_value::<ApiResponse<Option<bool>>>(
            json!({"result": true, "unexpected": 1}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unexpected"));
    }

    #[test]
    fn test_time_info() {
        let response: ApiResponse<bool> = serde_json::from_value(json!({
            "result": true,
            "time": {
                "start": 1700000000.1,
                "finish": 1700000000.3,
                "duration": 0.2,
                "processing": 0.1,
                "date_start": "2023-11-14T22:13:20+03:00",
                "date_finish": "2023-11-14T22:13:20+03:00",
                "operating": 0,
                "operating_reset_at": 1700000600
            }
        }))
        .unwrap();
        let time = response.time.unwrap();
        assert_eq!(time.operating_reset_at, Some(1700000600));
        assert!((time.duration - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("up".parse::<SortDirection>().is_err());
        assert_eq!(serde_json::to_value(SortDirection::Desc).unwrap(), json!("DESC"));
        assert_eq!(SortDirection::Asc.to_string(), "ASC");
    }
}
