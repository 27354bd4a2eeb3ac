//! Two-phase file upload
//!
//! `disk.folder.uploadfile` either stores the file directly (when the bytes
//! are sent inline as `fileContent`) or answers with an [`UploadTicket`]. A
//! ticket is completed by posting the bytes as multipart to its URL under
//! its field name. The ticket is spent by that single attempt, whatever the
//! outcome.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::decode::decode;
use crate::disk::{
    FileInfo, FileResponse, UploadFileParams, UploadResponse, UploadResult, UploadTicket,
    UploadUrlParams,
};
use crate::error::{BitrixError, Result};
use crate::transport::{Attachment, Transport, DEFAULT_CONTENT_TYPE};

/// File bytes for the second upload leg
#[derive(Clone)]
pub struct FilePayload {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Read a local file; the payload is named after the file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                BitrixError::validation(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(name, bytes))
    }

    fn into_attachment(self, field: String) -> Attachment {
        Attachment::new(field, self.name, self.bytes).with_content_type(self.content_type)
    }
}

impl std::fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePayload")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of the first upload leg
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Bytes still have to be sent to the ticket's URL
    Ticket(UploadTicket),
    /// The file was stored in one call
    Completed(Box<FileInfo>),
}

impl UploadOutcome {
    pub fn ticket(self) -> Option<UploadTicket> {
        match self {
            Self::Ticket(ticket) => Some(ticket),
            Self::Completed(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

impl TryFrom<UploadResponse> for UploadOutcome {
    type Error = BitrixError;

    fn try_from(response: UploadResponse) -> Result<Self> {
        match response.result {
            Some(UploadResult::Ticket(ticket)) => Ok(Self::Ticket(ticket)),
            Some(UploadResult::File(file)) => Ok(Self::Completed(Box::new(file))),
            None => Err(BitrixError::validation(
                "upload response carries neither a ticket nor a file",
            )),
        }
    }
}

/// Runs the upload protocol over a [`Transport`]
#[derive(Debug, Clone, Copy)]
pub struct Uploader<'a> {
    transport: &'a Transport,
}

impl<'a> Uploader<'a> {
    pub fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// First leg with full metadata
    #[instrument(skip(self, params), fields(folder = params.folder_id()))]
    pub fn request(&self, params: &UploadFileParams) -> Result<UploadOutcome> {
        let outcome = UploadOutcome::try_from(self.transport.call(params)?)?;
        if outcome.is_completed() {
            info!("File stored without a second leg");
        }
        Ok(outcome)
    }

    /// First leg with only the folder id
    #[instrument(skip(self))]
    pub fn request_ticket(&self, folder_id: i64) -> Result<UploadOutcome> {
        UploadOutcome::try_from(self.transport.call(&UploadUrlParams { id: folder_id })?)
    }

    /// Second leg: post the bytes to the ticket's destination
    #[instrument(skip(self, ticket, payload), fields(file = %payload.name, bytes = payload.bytes.len()))]
    pub fn complete(&self, ticket: UploadTicket, payload: FilePayload) -> Result<FileInfo> {
        let UploadTicket { field, upload_url } = ticket;
        debug!("Sending file under field '{}'", field);

        let raw = self
            .transport
            .post_file(&upload_url, payload.into_attachment(field))?;
        let response: FileResponse = decode(raw)?;
        let file = response.result.ok_or_else(|| {
            BitrixError::validation("upload completion response carries no file record")
        })?;

        info!("Uploaded {} as file {}", file.name, file.id);
        Ok(file)
    }

    /// Both legs: request a ticket for `folder_id`, then send `payload`
    pub fn upload(&self, folder_id: i64, payload: FilePayload) -> Result<FileInfo> {
        match self.request_ticket(folder_id)? {
            UploadOutcome::Ticket(ticket) => self.complete(ticket, payload),
            UploadOutcome::Completed(file) => Ok(*file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use crate::types::ApiResponse;
    use serde_json::json;

    #[test]
    fn test_outcome_from_ticket() {
        let response: UploadResponse =
            decode(json!({"result": {"uploadUrl": "https://x", "field": "f"}})).unwrap();
        let ticket = UploadOutcome::try_from(response).unwrap().ticket().unwrap();
        assert_eq!(ticket.upload_url, "https://x");
        assert_eq!(ticket.field, "f");
    }

    #[test]
    fn test_outcome_from_file() {
        let response: UploadResponse = decode(json!({"result": fixtures::file(9, "a.txt")})).unwrap();
        let outcome = UploadOutcome::try_from(response).unwrap();
        assert!(outcome.is_completed());
        assert!(outcome.ticket().is_none());
    }

    #[test]
    fn test_outcome_without_result() {
        let response: UploadResponse = ApiResponse {
            result: None,
            total: None,
            next: None,
            time: None,
        };
        assert!(matches!(
            UploadOutcome::try_from(response),
            Err(BitrixError::Validation(_))
        ));
    }

    #[test]
    fn test_payload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, b"a,b\n").unwrap();

        let payload = FilePayload::from_path(&path).unwrap();
        assert_eq!(payload.name, "report.csv");
        assert_eq!(payload.bytes, b"a,b\n");
        assert_eq!(payload.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_payload_from_missing_path() {
        let err = FilePayload::from_path("/nonexistent/file.bin").unwrap_err();
        assert!(matches!(err, BitrixError::Io(_)));
    }

    #[test]
    fn test_payload_debug_omits_bytes() {
        let payload = FilePayload::new("a.bin", vec![1, 2, 3]).with_content_type("image/png");
        let debug = format!("{:?}", payload);
        assert!(debug.contains("len: 3"));
        assert!(!debug.contains("[1, 2, 3]"));
    }
}
