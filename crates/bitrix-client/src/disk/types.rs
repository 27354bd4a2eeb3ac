//! Disk types: storages, folders, files and upload tickets

use chrono::{DateTime, FixedOffset};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::decode::lenient;
use crate::error::{BitrixError, Result};
use crate::params::{payload, BitrixParams};
use crate::types::ApiResponse;

// =============================================================================
// Records
// =============================================================================

/// A storage (user drive, group drive, common drive)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageInfo {
    #[serde(rename = "ID", deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "CODE", default)]
    pub code: Option<String>,
    #[serde(rename = "MODULE_ID")]
    pub module_id: String,
    #[serde(rename = "ENTITY_TYPE")]
    pub entity_type: String,
    #[serde(rename = "ENTITY_ID", deserialize_with = "lenient::string")]
    pub entity_id: String,
    #[serde(rename = "ROOT_OBJECT_ID", deserialize_with = "lenient::string")]
    pub root_object_id: String,
}

/// A folder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderInfo {
    #[serde(rename = "ID", deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "CODE", default)]
    pub code: Option<String>,
    #[serde(rename = "STORAGE_ID", deserialize_with = "lenient::int")]
    pub storage_id: i64,
    /// Object type, `folder`
    #[serde(rename = "TYPE")]
    pub object_type: String,
    #[serde(rename = "REAL_OBJECT_ID", default, deserialize_with = "lenient::opt_int")]
    pub real_object_id: Option<i64>,
    #[serde(rename = "PARENT_ID", default, deserialize_with = "lenient::opt_int")]
    pub parent_id: Option<i64>,
    /// 0 = live, anything else = in the recycle bin
    #[serde(rename = "DELETED_TYPE", deserialize_with = "lenient::int")]
    pub deleted_type: i64,
    #[serde(rename = "CREATE_TIME")]
    pub create_time: DateTime<FixedOffset>,
    #[serde(rename = "UPDATE_TIME")]
    pub update_time: DateTime<FixedOffset>,
    #[serde(rename = "DELETE_TIME", default)]
    pub delete_time: Option<DateTime<FixedOffset>>,
    #[serde(rename = "CREATED_BY", default, deserialize_with = "lenient::opt_int")]
    pub created_by: Option<i64>,
    #[serde(rename = "UPDATED_BY", default, deserialize_with = "lenient::opt_int")]
    pub updated_by: Option<i64>,
    #[serde(rename = "DELETED_BY", default, deserialize_with = "lenient::opt_int")]
    pub deleted_by: Option<i64>,
    #[serde(rename = "DETAIL_URL")]
    pub detail_url: String,
}

/// A file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileInfo {
    #[serde(rename = "ID", deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "CODE", default)]
    pub code: Option<String>,
    #[serde(rename = "STORAGE_ID", deserialize_with = "lenient::int")]
    pub storage_id: i64,
    /// Object type, `file`
    #[serde(rename = "TYPE")]
    pub object_type: String,
    #[serde(rename = "REAL_OBJECT_ID", default, deserialize_with = "lenient::opt_int")]
    pub real_object_id: Option<i64>,
    #[serde(rename = "PARENT_ID", default, deserialize_with = "lenient::opt_int")]
    pub parent_id: Option<i64>,
    #[serde(rename = "DELETED_TYPE", deserialize_with = "lenient::int")]
    pub deleted_type: i64,
    #[serde(rename = "GLOBAL_CONTENT_VERSION", default, deserialize_with = "lenient::opt_int")]
    pub global_content_version: Option<i64>,
    #[serde(rename = "FILE_ID", default, deserialize_with = "lenient::opt_int")]
    pub file_id: Option<i64>,
    #[serde(rename = "SIZE", default, deserialize_with = "lenient::opt_int")]
    pub size: Option<i64>,
    #[serde(rename = "CREATE_TIME")]
    pub create_time: DateTime<FixedOffset>,
    #[serde(rename = "UPDATE_TIME")]
    pub update_time: DateTime<FixedOffset>,
    #[serde(rename = "DELETE_TIME", default)]
    pub delete_time: Option<DateTime<FixedOffset>>,
    #[serde(rename = "CREATED_BY", deserialize_with = "lenient::int")]
    pub created_by: i64,
    #[serde(rename = "UPDATED_BY", deserialize_with = "lenient::int")]
    pub updated_by: i64,
    #[serde(rename = "DELETED_BY", default, deserialize_with = "lenient::opt_int")]
    pub deleted_by: Option<i64>,
    #[serde(rename = "DOWNLOAD_URL")]
    pub download_url: String,
    #[serde(rename = "DETAIL_URL")]
    pub detail_url: String,
}

/// An entry of a folder listing, told apart by its `TYPE`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DiskObject {
    File(FileInfo),
    Folder(FolderInfo),
}

impl<'de> Deserialize<'de> for DiskObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value.get("TYPE").and_then(Value::as_str).map(str::to_owned);
        let object = match kind.as_deref() {
            Some("file") => FileInfo::deserialize(value).map(Self::File),
            Some("folder") => FolderInfo::deserialize(value).map(Self::Folder),
            Some(other) => {
                return Err(D::Error::custom(format!("unknown object TYPE `{}`", other)))
            }
            None => return Err(D::Error::missing_field("TYPE")),
        };
        object.map_err(D::Error::custom)
    }
}

impl DiskObject {
    pub fn id(&self) -> i64 {
        match self {
            Self::File(file) => file.id,
            Self::Folder(folder) => folder.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => &file.name,
            Self::Folder(folder) => &folder.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Destination for the second leg of a two-phase upload
///
/// Single use: [`crate::upload::Uploader::complete`] takes it by value.
///
/// Keys besides `field` and `uploadUrl` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    /// Form field the destination expects the file under
    pub field: String,
    /// Absolute URL to POST the file to
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
}

/// `result` of `disk.folder.uploadfile`: a ticket, or the stored file when
/// the content was sent inline
///
/// A result holding both `uploadUrl` and `field` is a ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UploadResult {
    Ticket(UploadTicket),
    File(FileInfo),
}

impl<'de> Deserialize<'de> for UploadResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let result = if value.get("uploadUrl").is_some() && value.get("field").is_some() {
            UploadTicket::deserialize(value).map(Self::Ticket)
        } else {
            FileInfo::deserialize(value).map(Self::File)
        };
        result.map_err(D::Error::custom)
    }
}

pub type StorageList = ApiResponse<Option<Vec<StorageInfo>>>;
pub type StorageResponse = ApiResponse<Option<StorageInfo>>;
pub type FolderResponse = ApiResponse<Option<FolderInfo>>;
pub type FolderChildren = ApiResponse<Option<Vec<DiskObject>>>;
pub type FileResponse = ApiResponse<Option<FileInfo>>;
pub type DeleteTreeResponse = ApiResponse<Option<bool>>;
pub type UploadResponse = ApiResponse<Option<UploadResult>>;

// =============================================================================
// Parameters
// =============================================================================

/// `data` mappings for new folders and files must name the object
fn require_name(data: &Map<String, Value>) -> Result<()> {
    match data.get("NAME") {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(()),
        Some(other) => Err(BitrixError::validation(format!(
            "data.NAME must be a non-empty string, got {}",
            other
        ))),
        None => Err(BitrixError::validation("data.NAME is required")),
    }
}

/// Build a `data` mapping holding only `NAME`
pub fn name_data(name: impl Into<String>) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("NAME".to_string(), Value::String(name.into()));
    data
}

/// Parameters for `disk.storage.getlist`
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    #[serde(rename = "START", skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
}

impl BitrixParams for StorageListParams {}

/// Parameters for `disk.storage.get`
#[derive(Debug, Clone, Serialize)]
pub struct StorageParams {
    pub id: String,
}

impl BitrixParams for StorageParams {}

/// Parameters for `disk.folder.get`
#[derive(Debug, Clone, Serialize)]
pub struct FolderParams {
    pub id: i64,
}

impl BitrixParams for FolderParams {}

/// Parameters for `disk.folder.getchildren`
#[derive(Debug, Clone, Serialize)]
pub struct FolderChildrenParams {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    #[serde(rename = "START", skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
}

impl FolderChildrenParams {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            filter: None,
            start: None,
        }
    }
}

impl BitrixParams for FolderChildrenParams {}

/// Parameters for `disk.storage.addfolder`
#[derive(Debug, Clone, Serialize)]
pub struct AddFolderParams {
    id: String,
    data: Map<String, Value>,
}

impl AddFolderParams {
    /// `data` must contain `NAME`
    pub fn new(storage_id: impl Into<String>, data: Map<String, Value>) -> Result<Self> {
        require_name(&data)?;
        Ok(Self {
            id: storage_id.into(),
            data,
        })
    }
}

impl BitrixParams for AddFolderParams {}

/// Parameters for `disk.folder.addsubfolder`
#[derive(Debug, Clone, Serialize)]
pub struct AddSubfolderParams {
    id: i64,
    data: Map<String, Value>,
}

impl AddSubfolderParams {
    /// `data` must contain `NAME`
    pub fn new(parent_id: i64, data: Map<String, Value>) -> Result<Self> {
        require_name(&data)?;
        Ok(Self {
            id: parent_id,
            data,
        })
    }
}

impl BitrixParams for AddSubfolderParams {}

/// Parameters for `disk.file.get`
#[derive(Debug, Clone, Serialize)]
pub struct FileParams {
    pub id: i64,
}

impl BitrixParams for FileParams {}

/// Parameters for `disk.folder.deletetree`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteTreeParams {
    pub id: i64,
}

impl BitrixParams for DeleteTreeParams {}

/// Parameters for `disk.folder.uploadfile` with file metadata
///
/// With `file_content` set the file is stored in one call; without it the
/// server answers with an [`UploadTicket`].
#[derive(Debug, Clone, Serialize)]
pub struct UploadFileParams {
    id: i64,
    data: Map<String, Value>,
    #[serde(
        rename = "fileContent",
        with = "payload",
        skip_serializing_if = "Option::is_none"
    )]
    file_content: Option<Vec<u8>>,
    #[serde(rename = "generateUniqueName", skip_serializing_if = "Option::is_none")]
    generate_unique_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rights: Option<Vec<Map<String, Value>>>,
}

impl UploadFileParams {
    /// `data` must contain `NAME`
    pub fn new(folder_id: i64, data: Map<String, Value>) -> Result<Self> {
        require_name(&data)?;
        Ok(Self {
            id: folder_id,
            data,
            file_content: None,
            generate_unique_name: None,
            rights: None,
        })
    }

    /// Send the file bytes inline (single-phase upload)
    pub fn file_content(mut self, bytes: Vec<u8>) -> Self {
        self.file_content = Some(bytes);
        self
    }

    /// Let the server rename the file on a name clash
    pub fn generate_unique_name(mut self, generate: bool) -> Self {
        self.generate_unique_name = Some(generate);
        self
    }

    /// Access rights entries, e.g. `{"TASK_ID": 42, "ACCESS_CODE": "U1"}`
    pub fn rights(mut self, rights: Vec<Map<String, Value>>) -> Self {
        self.rights = Some(rights);
        self
    }

    pub fn folder_id(&self) -> i64 {
        self.id
    }
}

impl BitrixParams for UploadFileParams {}

/// Parameters for `disk.folder.uploadfile` asking only for an upload ticket
#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlParams {
    pub id: i64,
}

impl BitrixParams for UploadUrlParams {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::testing::fixtures;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_children_params_scenario() {
        let params = FolderChildrenParams {
            id: 123,
            filter: Some(fixtures::object(json!({"TYPE": "folder"}))),
            start: Some(50),
        };
        let encoded = params.to_bx_params().unwrap();
        assert_eq!(
            encoded.iter().collect::<Vec<_>>(),
            vec![
                ("START", &json!(50)),
                ("filter[TYPE]", &json!("folder")),
                ("id", &json!(123)),
            ]
        );
    }

    #[test]
    fn test_storage_list_params_empty() {
        assert!(StorageListParams::default().to_bx_params().unwrap().is_empty());
    }

    #[test]
    fn test_add_folder_requires_name() {
        let err = AddFolderParams::new("1", Map::new()).unwrap_err();
        assert!(matches!(err, BitrixError::Validation(_)));

        let err = AddSubfolderParams::new(1, fixtures::object(json!({"NAME": ""}))).unwrap_err();
        assert!(matches!(err, BitrixError::Validation(_)));

        let err = UploadFileParams::new(1, fixtures::object(json!({"NAME": 5}))).unwrap_err();
        assert!(matches!(err, BitrixError::Validation(_)));
    }

    #[test]
    fn test_add_folder_encodes_data_brackets() {
        let params = AddFolderParams::new("3", name_data("Reports")).unwrap();
        let encoded = params.to_bx_params().unwrap();
        assert_eq!(encoded.get("id"), Some(&json!("3")));
        assert_eq!(encoded.get("data[NAME]"), Some(&json!("Reports")));
        assert!(!encoded.contains_key("data"));
    }

    #[test]
    fn test_upload_params_encoding() {
        let params = UploadFileParams::new(8, name_data("a.txt"))
            .unwrap()
            .file_content(b"hi".to_vec())
            .generate_unique_name(true)
            .rights(vec![fixtures::object(json!({"TASK_ID": 42, "ACCESS_CODE": "U1"}))]);
        let encoded = params.to_bx_params().unwrap();

        assert_eq!(encoded.get("id"), Some(&json!(8)));
        assert_eq!(encoded.get("data[NAME]"), Some(&json!("a.txt")));
        assert_eq!(encoded.get("fileContent"), Some(&json!("aGk=")));
        assert_eq!(encoded.get("generateUniqueName"), Some(&json!(true)));
        assert_eq!(
            encoded.get("rights"),
            Some(&json!([{"TASK_ID": 42, "ACCESS_CODE": "U1"}]))
        );
    }

    #[test]
    fn test_upload_params_minimal() {
        let encoded = UploadFileParams::new(8, name_data("a.txt"))
            .unwrap()
            .to_bx_params()
            .unwrap();
        assert_eq!(encoded.len(), 2);
    }

    #[test]
    fn test_decode_folder() {
        let folder: FolderInfo = decode(fixtures::folder(10, "Docs")).unwrap();
        assert_eq!(folder.id, 10);
        assert_eq!(folder.name, "Docs");
        assert_eq!(folder.object_type, "folder");
        assert_eq!(folder.parent_id, Some(1));
        assert!(folder.delete_time.is_none());
    }

    #[test]
    fn test_decode_folder_missing_required() {
        let mut raw = fixtures::folder(10, "Docs");
        raw.as_object_mut().unwrap().remove("DETAIL_URL");
        assert!(decode::<FolderInfo>(raw).is_err());
    }

    #[test]
    fn test_decode_file_rejects_unknown_field() {
        let mut raw = fixtures::file(11, "a.pdf");
        raw["UNEXPECTED"] = json!(1);
        let err = decode::<FileInfo>(raw).unwrap_err();
        assert!(err.to_string().contains("UNEXPECTED"));
    }

    #[test]
    fn test_decode_children_mixed() {
        let children: FolderChildren = decode(json!({
            "result": [fixtures::folder(2, "Sub"), fixtures::file(3, "a.pdf")],
            "total": 2
        }))
        .unwrap();
        let items = children.result.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_folder());
        assert!(!items[1].is_folder());
        assert_eq!(items[1].name(), "a.pdf");
        assert_eq!(items[1].id(), 3);
    }

    #[test]
    fn test_decode_storage_with_numeric_ids() {
        let storage: StorageInfo = decode(fixtures::storage(1)).unwrap();
        assert_eq!(storage.id, "1");
        assert_eq!(storage.root_object_id, "101");
    }

    #[test]
    fn test_decode_upload_result() {
        let ticket: UploadResponse =
            decode(json!({"result": {"uploadUrl": "https://x", "field": "f"}})).unwrap();
        match ticket.result {
            Some(UploadResult::Ticket(t)) => {
                assert_eq!(t.upload_url, "https://x");
                assert_eq!(t.field, "f");
            }
            other => panic!("expected a ticket, got {other:?}"),
        }

        let file: UploadResponse = decode(json!({"result": fixtures::file(5, "b.txt")})).unwrap();
        assert!(matches!(file.result, Some(UploadResult::File(f)) if f.id == 5));
    }

    #[test]
    fn test_decode_ticket_ignores_extra_keys() {
        let ticket: UploadResponse = decode(json!({
            "result": {"uploadUrl": "https://x", "field": "f", "expires": 60}
        }))
        .unwrap();
        match ticket.result {
            Some(UploadResult::Ticket(t)) => {
                assert_eq!(t.upload_url, "https://x");
                assert_eq!(t.field, "f");
            }
            other => panic!("expected a ticket, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_upload_file_reports_cause() {
        let mut raw = fixtures::file(5, "b.txt");
        raw.as_object_mut().unwrap().remove("DOWNLOAD_URL");
        let err = decode::<UploadResponse>(json!({"result": raw})).unwrap_err();
        assert!(err.to_string().contains("DOWNLOAD_URL"), "{err}");
    }

    #[test]
    fn test_decode_children_reports_cause() {
        let mut broken = fixtures::file(3, "a.pdf");
        broken["SIZE"] = json!("big");
        let err = decode::<FolderChildren>(json!({"result": [broken]})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("expected an integer"), "{msg}");
        assert!(!msg.contains("did not match any variant"), "{msg}");
    }

    #[test]
    fn test_decode_children_unknown_type() {
        let mut raw = fixtures::folder(2, "Sub");
        raw["TYPE"] = json!("link");
        let err = decode::<FolderChildren>(json!({"result": [raw]})).unwrap_err();
        assert!(err.to_string().contains("link"));

        raw.as_object_mut().unwrap().remove("TYPE");
        let err = decode::<FolderChildren>(json!({"result": [raw]})).unwrap_err();
        assert!(err.to_string().contains("TYPE"));
    }
}
