//! Request message extraction.
//!
//! Picks where the request message comes from (querystring, `payload` form
//! field, form fields or JSON body) and decodes it into the handler's
//! request type.
use crate::context::{CallContext, ContentKind, FormFields, RemoteConfig};
use crate::error::RpcError;
use axum::http::Method;
use protorpc_axum_core::{Message, Source, codec};
use serde_json::{Map, Value};

/// Form field read by payload-mode endpoints.
const PAYLOAD_FIELD: &str = "payload";

/// Decoded request message passed to a remote handler.
#[derive(Debug, Clone)]
pub struct RemoteRequest<T>(pub T);

impl<T> RemoteRequest<T> {
    /// Extract the inner message.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Reject the call up front when the endpoint requires a JSON-accepting
/// client and this one is not.
pub fn negotiate(ctx: &CallContext, config: &RemoteConfig) -> Result<(), RpcError> {
    if config.json_accept_required() && !ctx.accepts_json() {
        return Err(RpcError::MimeType(
            "The request must accept an application/json response.".to_string(),
        ));
    }
    Ok(())
}

/// Choose the raw source of the request message.
///
/// In order: `GET` reads the querystring, payload-mode `POST` reads the
/// `payload` form field, form bodies read their fields and JSON bodies are
/// read as text. Anything else is an unknown content type.
pub fn extract_source(ctx: &CallContext) -> Result<Source, RpcError> {
    if ctx.method() == Method::GET {
        return Ok(Source::Mapping(into_mapping(ctx.query_fields()?)));
    }

    if ctx.method() == Method::POST && ctx.payload() {
        let raw = ctx
            .form()
            .get(PAYLOAD_FIELD)
            .map(String::as_str)
            .unwrap_or("{}");
        let payload: Value = serde_json::from_str(raw).map_err(|e| {
            RpcError::request_data(format!("The payload field is not valid json: {e}"))
        })?;
        let mut map = Map::new();
        map.insert(PAYLOAD_FIELD.to_string(), payload);
        return Ok(Source::Mapping(map));
    }

    match ctx.content_kind() {
        ContentKind::Form | ContentKind::Multipart => {
            Ok(Source::Mapping(into_mapping(ctx.form().clone())))
        }
        ContentKind::Json if ctx.body().is_empty() => Err(RpcError::request_data(
            "No data sent in the request body.",
        )),
        ContentKind::Json => Ok(Source::Text(ctx.body().clone())),
        ContentKind::Other | ContentKind::Missing => Err(RpcError::ContentType(
            "Unknown content-type request header.".to_string(),
        )),
    }
}

/// Decode the request message from its source.
///
/// Schema violations name the method, the offending field and the URL.
/// Any other failure is logged together with the raw data.
pub fn decode_request<T: Message>(ctx: &CallContext, source: Source) -> Result<T, RpcError> {
    let raw = source.clone();
    codec::decode::<T>(source).map_err(|err| {
        if err.is_validation() {
            RpcError::Validation(format!(
                "Error parsing the {} rpc request: \"{}\" from {}",
                ctx.method(),
                err,
                ctx.url()
            ))
        } else {
            tracing::error!(
                target: "protorpc_axum",
                error = %err,
                data = %raw,
                "exception serializing the request data"
            );
            RpcError::request_data(format!("Error parsing the request to rpc: {err}"))
        }
    })
}

fn into_mapping(fields: FormFields) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use protorpc_axum_core::ValidationError;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Pair {
        x: i64,
        #[serde(default)]
        y: Option<String>,
    }

    impl Message for Pair {}

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Defaults {
        count: u32,
        label: String,
    }

    impl Message for Defaults {}

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapped {
        payload: Pair,
    }

    impl Message for Wrapped {}

    #[derive(Debug, Serialize, Deserialize)]
    struct Bounded {
        n: u32,
    }

    impl Message for Bounded {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.n > 10 {
                return Err(ValidationError::field("n", "must be at most 10"));
            }
            Ok(())
        }
    }

    async fn context(
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
        config: &RemoteConfig,
    ) -> CallContext {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        CallContext::from_request(req, config).await.unwrap()
    }

    fn extract<T: Message>(ctx: &CallContext) -> Result<T, RpcError> {
        let source = extract_source(ctx)?;
        decode_request(ctx, source)
    }

    #[tokio::test]
    async fn test_get_query_decodes_typed_fields() {
        let config = RemoteConfig::default();
        let ctx = context(Method::GET, "/pair?x=1&y=a", None, "", &config).await;
        let pair: Pair = extract(&ctx).unwrap();
        assert_eq!(
            pair,
            Pair {
                x: 1,
                y: Some("a".into())
            }
        );
    }

    #[tokio::test]
    async fn test_get_without_query_uses_defaults() {
        let config = RemoteConfig::default();
        let ctx = context(Method::GET, "/defaults", None, "", &config).await;
        let message: Defaults = extract(&ctx).unwrap();
        assert_eq!(message, Defaults::default());
    }

    #[tokio::test]
    async fn test_get_repeated_key_last_value_wins() {
        let config = RemoteConfig::default();
        let ctx = context(Method::GET, "/pair?x=1&x=5", None, "", &config).await;
        let pair: Pair = extract(&ctx).unwrap();
        assert_eq!(pair.x, 5);
    }

    #[tokio::test]
    async fn test_json_body() {
        let config = RemoteConfig::default();
        let ctx = context(
            Method::POST,
            "/pair",
            Some("application/json"),
            r#"{"x": 3, "y": "b"}"#,
            &config,
        )
        .await;
        let pair: Pair = extract(&ctx).unwrap();
        assert_eq!(
            pair,
            Pair {
                x: 3,
                y: Some("b".into())
            }
        );
    }

    #[tokio::test]
    async fn test_json_put_body() {
        let config = RemoteConfig::default();
        let ctx = context(
            Method::PUT,
            "/pair",
            Some("application/json; charset=utf-8"),
            r#"{"x": 4}"#,
            &config,
        )
        .await;
        let pair: Pair = extract(&ctx).unwrap();
        assert_eq!(pair, Pair { x: 4, y: None });
    }

    #[tokio::test]
    async fn test_empty_json_body_is_rejected() {
        let config = RemoteConfig::default();
        let ctx = context(Method::POST, "/pair", Some("application/json"), "", &config).await;
        let err = extract::<Pair>(&ctx).unwrap_err();
        assert!(matches!(err, RpcError::RequestData(_)));
        let status = err.into_status_message();
        assert_eq!(status.status, 400);
        assert_eq!(
            status.msg,
            "Error with rpc request: No data sent in the request body."
        );
    }

    #[tokio::test]
    async fn test_form_body() {
        let config = RemoteConfig::default();
        let ctx = context(
            Method::POST,
            "/pair",
            Some("application/x-www-form-urlencoded"),
            "x=9&y=form",
            &config,
        )
        .await;
        let pair: Pair = extract(&ctx).unwrap();
        assert_eq!(
            pair,
            Pair {
                x: 9,
                y: Some("form".into())
            }
        );
    }

    #[tokio::test]
    async fn test_payload_mode_wraps_field() {
        let config = RemoteConfig::new().payload(true);
        let ctx = context(
            Method::POST,
            "/wrapped",
            Some("application/x-www-form-urlencoded"),
            "payload=%7B%22x%22%3A1%7D",
            &config,
        )
        .await;
        let wrapped: Wrapped = extract(&ctx).unwrap();
        assert_eq!(wrapped.payload, Pair { x: 1, y: None });
    }

    #[tokio::test]
    async fn test_payload_mode_defaults_to_empty_object() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Optional {
            payload: Defaults,
        }
        impl Message for Optional {}

        let config = RemoteConfig::new().payload(true);
        let ctx = context(Method::POST, "/optional", None, "", &config).await;
        let message: Optional = extract(&ctx).unwrap();
        assert_eq!(message.payload, Defaults::default());
    }

    #[tokio::test]
    async fn test_payload_mode_rejects_malformed_json() {
        let config = RemoteConfig::new().payload(true);
        let ctx = context(
            Method::POST,
            "/wrapped",
            Some("application/x-www-form-urlencoded"),
            "payload=not-json",
            &config,
        )
        .await;
        let err = extract::<Wrapped>(&ctx).unwrap_err();
        assert!(matches!(err, RpcError::RequestData(_)));
    }

    #[tokio::test]
    async fn test_unknown_content_type() {
        let config = RemoteConfig::default();
        let ctx = context(Method::POST, "/pair", Some("text/plain"), "x=1", &config).await;
        let err = extract::<Pair>(&ctx).unwrap_err();
        assert!(matches!(err, RpcError::ContentType(_)));
        assert_eq!(
            err.into_status_message().msg,
            "Error with rpc request: Unknown content-type request header."
        );
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let config = RemoteConfig::default();
        let ctx = context(Method::POST, "/pair", None, r#"{"x": 1}"#, &config).await;
        let err = extract::<Pair>(&ctx).unwrap_err();
        assert!(matches!(err, RpcError::ContentType(_)));
    }

    #[tokio::test]
    async fn test_type_mismatch_names_method_field_and_url() {
        let config = RemoteConfig::default();
        let ctx = context(Method::GET, "/pair?x=abc", None, "", &config).await;
        let err = extract::<Pair>(&ctx).unwrap_err();
        assert!(matches!(err, RpcError::Validation(_)));
        let msg = err.into_status_message().msg;
        assert!(
            msg.starts_with("Error with rpc request: Error parsing the GET rpc request: \"x: "),
            "{msg}"
        );
        assert!(msg.ends_with("\" from /pair?x=abc"), "{msg}");
    }

    #[tokio::test]
    async fn test_validate_hook_failure_is_validation_error() {
        let config = RemoteConfig::default();
        let ctx = context(
            Method::POST,
            "/bounded",
            Some("application/json"),
            r#"{"n": 11}"#,
            &config,
        )
        .await;
        let err = extract::<Bounded>(&ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error parsing the POST rpc request: \"n: must be at most 10\" from /bounded"
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_request_data_error() {
        let config = RemoteConfig::default();
        let ctx = context(
            Method::POST,
            "/pair",
            Some("application/json"),
            "{not json",
            &config,
        )
        .await;
        let err = extract::<Pair>(&ctx).unwrap_err();
        assert!(matches!(err, RpcError::RequestData(_)));
        assert!(
            err.to_string()
                .starts_with("Error parsing the request to rpc: malformed json")
        );
    }

    #[tokio::test]
    async fn test_negotiate() {
        let strict = RemoteConfig::new().require_json_accept(true);
        let req = Request::builder()
            .method(Method::GET)
            .uri("/pair?x=1")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let ctx = CallContext::from_request(req, &strict).await.unwrap();
        assert!(matches!(
            negotiate(&ctx, &strict),
            Err(RpcError::MimeType(_))
        ));
        // Not enforced unless configured
        assert!(negotiate(&ctx, &RemoteConfig::default()).is_ok());
    }
}
