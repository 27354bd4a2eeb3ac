//! Disk method calls

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::types::*;
use crate::error::Result;
use crate::transport::Transport;
use crate::upload::{FilePayload, UploadOutcome, Uploader};

/// Storage, folder and file methods
#[derive(Debug, Clone, Copy)]
pub struct DiskService<'a> {
    transport: &'a Transport,
}

impl<'a> DiskService<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    // =========================================================================
    // Storages
    // =========================================================================

    /// List storages visible to the account
    #[instrument(skip(self, filter))]
    pub fn storages(
        &self,
        filter: Option<Map<String, Value>>,
        start: Option<u64>,
    ) -> Result<StorageList> {
        self.transport.call(&StorageListParams { filter, start })
    }

    /// Get one storage
    #[instrument(skip(self))]
    pub fn storage(&self, id: &str) -> Result<StorageResponse> {
        self.transport.call(&StorageParams { id: id.to_string() })
    }

    /// Create a folder in the root of a storage
    #[instrument(skip(self, data))]
    pub fn add_folder(&self, storage_id: &str, data: Map<String, Value>) -> Result<FolderResponse> {
        let params = AddFolderParams::new(storage_id, data)?;
        let response: FolderResponse = self.transport.call(&params)?;
        if let Some(folder) = &response.result {
            info!("Created folder {} ({})", folder.name, folder.id);
        }
        Ok(response)
    }

    // =========================================================================
    // Folders
    // =========================================================================

    /// Get one folder
    #[instrument(skip(self))]
    pub fn folder(&self, id: i64) -> Result<FolderResponse> {
        self.transport.call(&FolderParams { id })
    }

    /// List one page of a folder's direct children
    #[instrument(skip(self, filter))]
    pub fn children(
        &self,
        id: i64,
        filter: Option<Map<String, Value>>,
        start: Option<u64>,
    ) -> Result<FolderChildren> {
        self.transport
            .call(&FolderChildrenParams { id, filter, start })
    }

    /// Create a folder inside another folder
    #[instrument(skip(self, data))]
    pub fn add_subfolder(&self, parent_id: i64, data: Map<String, Value>) -> Result<FolderResponse> {
        let params = AddSubfolderParams::new(parent_id, data)?;
        let response: FolderResponse = self.transport.call(&params)?;
        if let Some(folder) = &response.result {
            info!("Created subfolder {} ({}) in {}", folder.name, folder.id, parent_id);
        }
        Ok(response)
    }

    /// Permanently delete a folder and everything below it
    #[instrument(skip(self))]
    pub fn delete_tree(&self, id: i64) -> Result<DeleteTreeResponse> {
        let response: DeleteTreeResponse = self.transport.call(&DeleteTreeParams { id })?;
        if response.result == Some(true) {
            info!("Deleted folder tree {}", id);
        } else {
            warn!("Folder tree {} was not deleted", id);
        }
        Ok(response)
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Get one file
    #[instrument(skip(self))]
    pub fn file(&self, id: i64) -> Result<FileResponse> {
        self.transport.call(&FileParams { id })
    }

    /// Call `disk.folder.uploadfile` with metadata (and optionally inline bytes)
    pub fn upload_file(&self, params: &UploadFileParams) -> Result<UploadOutcome> {
        self.uploader().request(params)
    }

    /// Ask for an upload ticket for a folder
    pub fn get_upload_url(&self, folder_id: i64) -> Result<UploadOutcome> {
        self.uploader().request_ticket(folder_id)
    }

    /// Upload a file into a folder using the two-phase protocol
    pub fn upload_file_complete(&self, folder_id: i64, payload: FilePayload) -> Result<FileInfo> {
        self.uploader().upload(folder_id, payload)
    }

    pub fn uploader(&self) -> Uploader<'a> {
        Uploader::new(self.transport)
    }
}
