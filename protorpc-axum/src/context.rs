//! Per-call context for remote request handling.
//!
//! A [`CallContext`] is built once per request from the method, headers,
//! querystring and buffered body. It is read-only afterwards and dropped when
//! the call returns; nothing in it is shared between calls.

pub mod config;

pub use config::{DEFAULT_MAX_BODY_SIZE, RemoteConfig, StatusMode};

use crate::error::RpcError;
use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderName, Method,
        header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE},
    },
};
use bytes::Bytes;
use indexmap::IndexMap;
use mime::Mime;

/// Flattened form or querystring fields. A repeated key keeps its last value.
pub type FormFields = IndexMap<String, String>;

/// Request body encoding, derived from the `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/x-www-form-urlencoded`
    Form,
    /// `multipart/form-data`
    Multipart,
    /// `application/json` or any `+json` structured suffix
    Json,
    /// Some other or unparseable content type
    Other,
    /// No `Content-Type` header
    Missing,
}

impl ContentKind {
    /// Classify a `Content-Type` header value.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Missing;
        };
        let Ok(mime) = content_type.parse::<Mime>() else {
            return Self::Other;
        };
        if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Self::Form
        } else if mime.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() {
            Self::Multipart
        } else if mime.essence_str() == mime::APPLICATION_JSON.essence_str()
            || (mime.type_() == mime::APPLICATION && mime.suffix() == Some(mime::JSON))
        {
            Self::Json
        } else {
            Self::Other
        }
    }

    /// Whether form fields are read from the body.
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form | Self::Multipart)
    }
}

/// Per-call state read by the request extractor.
#[derive(Debug, Clone)]
pub struct CallContext {
    method: Method,
    url: String,
    content_type: Option<String>,
    content_kind: ContentKind,
    accept: Option<String>,
    query: Option<String>,
    form: FormFields,
    body: Bytes,
    payload: bool,
}

impl CallContext {
    /// Build the context for one call, buffering the request body.
    ///
    /// `GET` bodies are never read. Form fields are parsed up front for
    /// form-encoded and multipart bodies.
    pub async fn from_request(req: Request, config: &RemoteConfig) -> Result<Self, RpcError> {
        let (parts, body) = req.into_parts();

        let header = |headers: &HeaderMap, name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let content_type = header(&parts.headers, CONTENT_TYPE);
        let content_kind = ContentKind::from_content_type(content_type.as_deref());
        let accept = header(&parts.headers, ACCEPT);

        let is_get = parts.method == Method::GET;
        let body = if is_get {
            Bytes::new()
        } else {
            read_body(body, &parts.headers, config).await?
        };

        let form = match content_kind {
            _ if is_get => FormFields::new(),
            ContentKind::Form => parse_urlencoded(&body)?,
            ContentKind::Multipart => {
                parse_multipart(content_type.as_deref().unwrap_or_default(), body.clone()).await?
            }
            _ => FormFields::new(),
        };

        Ok(Self {
            url: parts.uri.to_string(),
            query: parts.uri.query().map(str::to_owned),
            method: parts.method,
            content_type,
            content_kind,
            accept,
            form,
            body,
            payload: config.payload_enabled(),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URL as received (path and querystring).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw `Content-Type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    /// The raw querystring, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Querystring parameters, flattened so a repeated key keeps its last value.
    pub fn query_fields(&self) -> Result<FormFields, RpcError> {
        parse_urlencoded(self.query.as_deref().unwrap_or_default().as_bytes())
    }

    /// Form fields from a form-encoded or multipart body.
    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the endpoint reads POST requests from the `payload` form field.
    pub fn payload(&self) -> bool {
        self.payload
    }

    /// Whether the client accepts a JSON response.
    ///
    /// A missing or empty `Accept` header accepts anything.
    pub fn accepts_json(&self) -> bool {
        let Some(accept) = self.accept.as_deref() else {
            return true;
        };
        if accept.trim().is_empty() {
            return true;
        }
        accept
            .split(',')
            .filter_map(|range| range.split(';').next())
            .map(str::trim)
            .any(|range| matches!(range, "*/*" | "application/*" | "application/json"))
    }
}

/// Read the whole body, enforcing the configured limit.
async fn read_body(body: Body, headers: &HeaderMap, config: &RemoteConfig) -> Result<Bytes, RpcError> {
    // Reject early when the declared length already exceeds the limit
    if let Some(length) = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        config.check_body_size(length)?;
    }

    axum::body::to_bytes(body, config.read_limit())
        .await
        .map_err(|e| RpcError::request_data(format!("failed to read request body: {e}")))
}

fn parse_urlencoded(input: &[u8]) -> Result<FormFields, RpcError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)
        .map_err(|e| RpcError::request_data(format!("malformed form data: {e}")))?;
    Ok(pairs.into_iter().collect())
}

/// Collect the text parts of a multipart body. File parts are skipped.
async fn parse_multipart(content_type: &str, body: Bytes) -> Result<FormFields, RpcError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| RpcError::request_data(format!("invalid multipart content-type: {e}")))?;

    let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = FormFields::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RpcError::request_data(format!("malformed multipart body: {e}")))?
    {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| RpcError::request_data(format!("malformed multipart field {name}: {e}")))?;
        fields.insert(name, value);
    }
    Ok(fields)
}
