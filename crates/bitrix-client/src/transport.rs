//! Blocking HTTP transport for REST method calls
//!
//! Every call is one form-encoded POST to
//! `<base>/<account_id>/<token>/<method>.json`. The access token lives in the
//! URL path, so URLs are never logged and are stripped from HTTP errors.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, Response};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{BitrixConfig, Credentials};
use crate::decode::decode;
use crate::error::{BitrixError, Result};
use crate::method::Method;
use crate::params::{BitrixParams, EncodedParams};

/// Default MIME type for file parts
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file sent as a multipart part
#[derive(Clone)]
pub struct Attachment {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    fn into_part(self) -> Result<(String, multipart::Part)> {
        let part = multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?;
        Ok((self.field, part))
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Performs REST method calls against one account
#[derive(Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    upload_timeout: Duration,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("host", &self.base_url.host_str())
            .field("upload_timeout", &self.upload_timeout)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Create a transport for the given account
    pub fn new(config: &BitrixConfig, credentials: &Credentials) -> Result<Self> {
        if credentials.account_id.trim().is_empty() {
            return Err(BitrixError::validation("account id must not be empty"));
        }
        if credentials.token.trim().is_empty() {
            return Err(BitrixError::validation("access token must not be empty"));
        }

        let client = Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()?;

        let base = config.connection.base_url.trim_end_matches('/');
        let base_url = Url::parse(&format!(
            "{}/{}/{}/",
            base, credentials.account_id, credentials.token
        ))?;

        info!(
            "Bitrix24 transport created for {}",
            base_url.host_str().unwrap_or("<no host>")
        );

        Ok(Self {
            client,
            base_url,
            upload_timeout: config.timeouts.upload(),
        })
    }

    /// Full URL of a remote method. Contains the access token.
    pub fn method_url(&self, method: &str) -> Result<Url> {
        if method.is_empty() || method.contains(['/', '\\', '?', '#', ':']) {
            return Err(BitrixError::validation(format!(
                "invalid method name '{}'",
                method
            )));
        }
        Ok(self.base_url.join(&format!("{}.json", method))?)
    }

    /// Encode, send and decode one typed method call
    pub fn call<M: Method>(&self, params: &M) -> Result<M::Output> {
        let encoded = BitrixParams::to_bx_params(params)?;
        let raw = self.invoke(M::NAME, &encoded)?;
        decode(raw)
    }

    /// Call a method with form parameters, returning the raw JSON body
    pub fn invoke(&self, method: &str, params: &EncodedParams) -> Result<Value> {
        self.invoke_with_files(method, params, Vec::new())
    }

    /// Call a method, sending the parameters as multipart when files are attached
    #[instrument(skip(self, params, attachments), fields(params = params.len(), files = attachments.len()))]
    pub fn invoke_with_files(
        &self,
        method: &str,
        params: &EncodedParams,
        attachments: Vec<Attachment>,
    ) -> Result<Value> {
        let url = self.method_url(method)?;
        let request = self.client.post(url);

        let request = if attachments.is_empty() {
            request.form(&params.to_form())
        } else {
            let mut form = multipart::Form::new();
            for (key, value) in params.to_form() {
                form = form.text(key, value);
            }
            for attachment in attachments {
                let (field, part) = attachment.into_part()?;
                form = form.part(field, part);
            }
            request.multipart(form)
        };

        debug!("Calling {}", method);
        let response = request.send().map_err(strip_url)?;
        let status = response.status();
        let body = read_text(response)?;

        if !status.is_success() {
            warn!("{} returned HTTP {}", method, status);
            return Err(BitrixError::Status {
                status: status.as_u16(),
                body,
            });
        }

        check_api_error(parse_json(&body)?)
    }

    /// POST one file to an absolute URL handed out by the API (upload ticket).
    ///
    /// No account credentials are attached. A non-success status is an
    /// upload failure; a success body goes through the same error check as
    /// API responses.
    #[instrument(skip(self, url, attachment), fields(field = %attachment.field, bytes = attachment.bytes.len()))]
    pub fn post_file(&self, url: &str, attachment: Attachment) -> Result<Value> {
        let url = Url::parse(url)?;
        let (field, part) = attachment.into_part()?;
        let form = multipart::Form::new().part(field, part);

        debug!("Transferring file to {}", url.host_str().unwrap_or("<no host>"));
        let response = self
            .client
            .post(url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .map_err(strip_url)?;
        let status = response.status();
        let body = read_text(response)?;

        if !status.is_success() {
            warn!("File transfer returned HTTP {}", status);
            return Err(BitrixError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        check_api_error(parse_json(&body)?)
    }
}

fn strip_url(error: reqwest::Error) -> BitrixError {
    BitrixError::Http(error.without_url())
}

fn read_text(response: Response) -> Result<String> {
    response.text().map_err(strip_url)
}

fn parse_json(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| BitrixError::ParseError(e.to_string()))
}

/// Turn a body carrying an `error` key into [`BitrixError::Api`]
pub fn check_api_error(body: Value) -> Result<Value> {
    let Some(error) = body.get("error") else {
        return Ok(body);
    };

    let code = match error {
        Value::String(code) => code.clone(),
        other => other.to_string(),
    };
    let description = body
        .get("error_description")
        .and_then(Value::as_str)
        .map(String::from);

    warn!("API error {}: {}", code, description.as_deref().unwrap_or(""));
    Err(BitrixError::api(code, description))
}
