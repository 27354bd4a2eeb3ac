//! Test utilities for bitrix-client
//!
//! [`MockBitrix`] is an axum router that plays the REST endpoint and an
//! upload-ticket destination; [`TestServer`] serves a router on a local port
//! and hands out a [`BitrixClient`] pointed at it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::warn;

use crate::config::{BitrixConfig, Credentials};
use crate::{BitrixClient, Result};

/// Account id the [`TestServer`] client uses
pub const TEST_ACCOUNT: &str = "1";
/// Access token the [`TestServer`] client uses
pub const TEST_TOKEN: &str = "test-token";

/// A test server that shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: BitrixClient,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on an ephemeral port
    ///
    /// The blocking client cannot run inside a tokio runtime, so the server
    /// gets its own runtime on a background thread.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bitrix_client::testing::{MockBitrix, TestServer};
    /// use serde_json::json;
    ///
    /// let mock = MockBitrix::new();
    /// mock.respond("scope", json!({"result": ["crm", "disk"]}));
    /// let server = TestServer::start(mock.router())?;
    ///
    /// let scopes = server.client.base().scope(None)?;
    /// # Ok::<(), bitrix_client::BitrixError>(())
    /// ```
    pub fn start(router: Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2))
    }

    /// Serve `router` with custom client timeouts
    pub fn start_with_timeout(
        router: Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // Bound before the thread starts, so early requests just queue
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = std::thread::spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        warn!("Test server failed to adopt listener: {}", e);
                        return;
                    }
                };
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .ok();
            });
        });

        let config = BitrixConfig::builder(format!("http://{}/rest", addr))
            .request_timeout_ms(timeout.as_millis() as u64)
            .connect_timeout_ms(connect_timeout.as_millis() as u64)
            .upload_timeout_ms(timeout.as_millis() as u64)
            .build();
        let client = BitrixClient::new(config, Credentials::new(TEST_ACCOUNT, TEST_TOKEN))?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &BitrixClient {
        &self.client
    }

    /// Shutdown the server and wait for its thread
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // The thread winds down on its own once the signal arrives
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle.take();
    }
}

// =============================================================================
// Mock REST endpoint
// =============================================================================

/// A file part received by the mock
#[derive(Debug, Clone)]
pub struct RecordedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fields and file parts of one received request body
#[derive(Debug, Clone, Default)]
pub struct FormData {
    /// Text fields in the order received, repeated keys kept
    pub fields: Vec<(String, String)>,
    pub files: Vec<RecordedFile>,
    /// Whether the body was `multipart/form-data`
    pub multipart: bool,
}

impl FormData {
    /// First value of a text field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of a repeated text field
    pub fn field_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn file(&self, field: &str) -> Option<&RecordedFile> {
        self.files.iter().find(|file| file.field == field)
    }
}

/// One REST call received by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub account: String,
    pub token: String,
    pub method: String,
    pub form: FormData,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    body: String,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<String, CannedResponse>>,
    upload_response: Mutex<Option<CannedResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    uploads: Mutex<Vec<FormData>>,
}

/// Scriptable stand-in for a Bitrix24 portal
///
/// Serves `POST /rest/{account}/{token}/{method}.json` from canned bodies
/// and `POST /upload` as the upload-ticket destination. `{base}` in a canned
/// body is replaced by the server's `http://host:port`.
#[derive(Clone, Default)]
pub struct MockBitrix {
    state: Arc<MockState>,
}

impl MockBitrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with HTTP 200 and `body`
    pub fn respond(&self, method: &str, body: Value) -> &Self {
        self.respond_with_status(method, 200, body.to_string())
    }

    /// Answer `method` with an arbitrary status and raw body
    pub fn respond_with_status(&self, method: &str, status: u16, body: impl Into<String>) -> &Self {
        self.state.responses.lock().insert(
            method.to_string(),
            CannedResponse {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body: body.into(),
            },
        );
        self
    }

    /// Answer the upload destination with `status` and a raw body
    pub fn upload_responds(&self, status: u16, body: impl Into<String>) -> &Self {
        *self.state.upload_response.lock() = Some(CannedResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.into(),
        });
        self
    }

    /// REST calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// Most recent call of `method`
    pub fn last_call(&self, method: &str) -> Option<RecordedCall> {
        self.state
            .calls
            .lock()
            .iter()
            .rev()
            .find(|call| call.method == method)
            .cloned()
    }

    /// Bodies received by the upload destination
    pub fn uploads(&self) -> Vec<FormData> {
        self.state.uploads.lock().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/rest/{account}/{token}/{method}", post(handle_call))
            .route("/upload", post(handle_upload))
            .with_state(self.state.clone())
    }
}

async fn handle_call(
    State(state): State<Arc<MockState>>,
    Path((account, token, method)): Path<(String, String, String)>,
    request: Request,
) -> Response {
    let base = base_from(request.headers());
    let Some(method) = method.strip_suffix(".json").map(String::from) else {
        return (StatusCode::NOT_FOUND, "expected <method>.json").into_response();
    };
    let form = match read_form(request).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    state.calls.lock().push(RecordedCall {
        account,
        token,
        method: method.clone(),
        form,
    });

    let canned = state.responses.lock().get(&method).cloned();
    match canned {
        Some(canned) => json_response(canned, &base),
        None => json_response(
            CannedResponse {
                status: StatusCode::NOT_FOUND,
                body: json!({
                    "error": "ERROR_METHOD_NOT_FOUND",
                    "error_description": "Method not found!"
                })
                .to_string(),
            },
            &base,
        ),
    }
}

async fn handle_upload(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let base = base_from(request.headers());
    let form = match read_form(request).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    state.uploads.lock().push(form);

    let canned = state.upload_response.lock().clone();
    match canned {
        Some(canned) => json_response(canned, &base),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no upload response configured").into_response(),
    }
}

fn base_from(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{}", host)
}

fn json_response(canned: CannedResponse, base: &str) -> Response {
    (
        canned.status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body.replace("{base}", base),
    )
        .into_response()
}

async fn read_form(request: Request) -> std::result::Result<FormData, Response> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(|e| bad_request(e.to_string()))?;
        let fields = url::form_urlencoded::parse(&body).into_owned().collect();
        return Ok(FormData {
            fields,
            ..Default::default()
        });
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(IntoResponse::into_response)?;
    let mut form = FormData {
        multipart: true,
        ..Default::default()
    };
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;

        if file_name.is_some() {
            form.files.push(RecordedFile {
                field: name,
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            form.fields
                .push((name, String::from_utf8_lossy(&bytes).into_owned()));
        }
    }
    Ok(form)
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

/// Realistic record bodies as the portal returns them
pub mod fixtures {
    use serde_json::{json, Map, Value};

    /// JSON object literal as a map (non-objects give an empty map)
    pub fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn storage(id: i64) -> Value {
        json!({
            "ID": id.to_string(),
            "NAME": "Shared drive",
            "CODE": null,
            "MODULE_ID": "disk",
            "ENTITY_TYPE": "common",
            "ENTITY_ID": "shared_files_s1",
            "ROOT_OBJECT_ID": (100 + id).to_string()
        })
    }

    pub fn folder(id: i64, name: &str) -> Value {
        json!({
            "ID": id.to_string(),
            "NAME": name,
            "CODE": null,
            "STORAGE_ID": "1",
            "TYPE": "folder",
            "REAL_OBJECT_ID": id.to_string(),
            "PARENT_ID": "1",
            "DELETED_TYPE": "0",
            "CREATE_TIME": "2024-03-01T10:15:00+03:00",
            "UPDATE_TIME": "2024-03-02T08:00:00+03:00",
            "DELETE_TIME": null,
            "CREATED_BY": "1",
            "UPDATED_BY": "1",
            "DELETED_BY": "0",
            "DETAIL_URL": format!("https://example.bitrix24.ru/docs/path/{}/", name)
        })
    }

    pub fn file(id: i64, name: &str) -> Value {
        json!({
            "ID": id.to_string(),
            "NAME": name,
            "CODE": null,
            "STORAGE_ID": "1",
            "TYPE": "file",
            "REAL_OBJECT_ID": id.to_string(),
            "PARENT_ID": "8",
            "DELETED_TYPE": "0",
            "GLOBAL_CONTENT_VERSION": "1",
            "FILE_ID": (5000 + id).to_string(),
            "SIZE": "1024",
            "CREATE_TIME": "2024-03-01T10:15:00+03:00",
            "UPDATE_TIME": "2024-03-01T10:15:00+03:00",
            "DELETE_TIME": null,
            "CREATED_BY": "1",
            "UPDATED_BY": "1",
            "DELETED_BY": "0",
            "DOWNLOAD_URL": format!("https://example.bitrix24.ru/disk/downloadFile/{}/", id),
            "DETAIL_URL": format!("https://example.bitrix24.ru/docs/file/{}", name)
        })
    }

    pub fn crm_type(id: i64, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "code": "",
            "createdBy": 1,
            "entityTypeId": 1032,
            "customSectionId": null,
            "isCategoriesEnabled": "N",
            "isStagesEnabled": "Y",
            "isBeginCloseDatesEnabled": "Y",
            "isClientEnabled": "Y",
            "isUseInUserfieldEnabled": "N",
            "isLinkWithProductsEnabled": "N",
            "isMycompanyEnabled": "N",
            "isDocumentsEnabled": "N",
            "isSourceEnabled": "N",
            "isObserversEnabled": "Y",
            "isRecyclebinEnabled": "Y",
            "isAutomationEnabled": "Y",
            "isBizProcEnabled": "Y",
            "isSetOpenPermissions": "Y",
            "isPaymentsEnabled": "N",
            "isCountersEnabled": "N",
            "createdTime": "2024-01-10T12:00:00+03:00",
            "updatedTime": "2024-01-11T09:30:00+03:00",
            "updatedBy": "1"
        })
    }

    /// Upload ticket pointing at the mock's upload destination
    pub fn ticket(field: &str) -> Value {
        json!({"uploadUrl": "{base}/upload", "field": field})
    }

    pub fn time() -> Value {
        json!({
            "start": 1709280000.123,
            "finish": 1709280000.245,
            "duration": 0.122,
            "processing": 0.05,
            "date_start": "2024-03-01T11:00:00+03:00",
            "date_finish": "2024-03-01T11:00:00+03:00",
            "operating": 0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_data_lookup() {
        let form = FormData {
            fields: vec![
                ("select".into(), "id".into()),
                ("select".into(), "title".into()),
                ("entityTypeId".into(), "1".into()),
            ],
            ..Default::default()
        };
        assert_eq!(form.field("select"), Some("id"));
        assert_eq!(form.field_all("select"), vec!["id", "title"]);
        assert_eq!(form.field("missing"), None);
        assert!(form.file("file").is_none());
    }

    #[test]
    fn test_fixture_object() {
        assert_eq!(fixtures::object(json!({"a": 1})).len(), 1);
        assert!(fixtures::object(json!([1])).is_empty());
    }

    #[test]
    fn test_base_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(base_from(&headers), "http://127.0.0.1:4000");
    }
}
