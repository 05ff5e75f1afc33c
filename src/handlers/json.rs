use std::fmt;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::error::Category;

use crate::models::errors::{JsonError, ToolkitError};
use crate::models::response::JsonResponse;
use crate::Toolkit;

impl Toolkit {
    /// Decodes the request body as exactly one JSON value of type `T`.
    ///
    /// The body is capped at `max_json_size` bytes and, unless
    /// `allow_unknown_fields` is set, keys that `T` does not declare are
    /// rejected. Failures come back as [`JsonError`]s whose messages are meant
    /// for the client.
    pub async fn read_json<T>(&self, request: Request) -> Result<T, JsonError>
    where
        T: DeserializeOwned,
    {
        let limit = self.config().max_json_size;
        let body = read_limited(request.into_body(), limit).await?;
        decode_single(&body, self.config().allow_unknown_fields)
    }
}

/// Buffers the body, failing as soon as it grows past `limit` bytes
async fn read_limited(body: Body, limit: usize) -> Result<Vec<u8>, JsonError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| JsonError::Body {
            message: e.to_string(),
        })?;
        if buf.len() + chunk.len() > limit {
            tracing::debug!("Rejecting JSON body larger than {} bytes", limit);
            return Err(JsonError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

fn decode_single<T>(body: &[u8], allow_unknown_fields: bool) -> Result<T, JsonError>
where
    T: DeserializeOwned,
{
    let mut de = serde_json::Deserializer::from_slice(body);
    let mut track = serde_path_to_error::Track::new();
    let mut unknown = Vec::new();

    let result: Result<T, serde_json::Error> = serde_ignored::deserialize(
        serde_path_to_error::Deserializer::new(&mut de, &mut track),
        |path| unknown.push(path.to_string()),
    );

    let value = match result {
        Ok(value) => value,
        Err(e) => return Err(classify(e, &track.path(), body)),
    };

    if !allow_unknown_fields {
        if let Some(field) = unknown.into_iter().next() {
            return Err(JsonError::UnknownField { field });
        }
    }

    // anything but trailing whitespace means a second document
    de.end().map_err(|_| JsonError::MultipleValues)?;

    Ok(value)
}

fn classify(err: serde_json::Error, path: &serde_path_to_error::Path, body: &[u8]) -> JsonError {
    let offset = byte_offset(body, err.line(), err.column());

    match err.classify() {
        Category::Syntax => JsonError::Syntax { offset },
        Category::Eof if body.iter().all(u8::is_ascii_whitespace) => JsonError::Empty,
        Category::Eof => JsonError::Truncated,
        Category::Data if is_type_mismatch(&err) => {
            if path.iter().next().is_some() {
                JsonError::WrongType {
                    field: path.to_string(),
                }
            } else {
                JsonError::WrongTypeAt { offset }
            }
        }
        Category::Data | Category::Io => JsonError::Invalid {
            message: err.to_string(),
        },
    }
}

/// serde reports type mismatches through `invalid_type`, `invalid_value`
/// and `invalid_length`, whose messages share these prefixes
fn is_type_mismatch(err: &serde_json::Error) -> bool {
    let message = err.to_string();
    ["invalid type", "invalid value", "invalid length"]
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

/// Converts serde_json's 1-based line/column into a byte offset
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = body
        .split(|b| *b == b'\n')
        .take(line - 1)
        .map(|l| l.len() + 1)
        .sum();
    line_start + column
}

/// Serializes `data` into a JSON response with `status`.
///
/// Every header in `headers` replaces any same-named header on the response;
/// `Content-Type` is always `application/json`.
pub fn write_json<T>(
    status: StatusCode,
    data: &T,
    headers: Option<&HeaderMap>,
) -> Result<Response, ToolkitError>
where
    T: Serialize + ?Sized,
{
    let out = serde_json::to_vec(data)?;

    let mut response = Response::new(Body::from(out));
    *response.status_mut() = status;

    if let Some(extra) = headers {
        let target = response.headers_mut();
        for key in extra.keys() {
            target.remove(key);
            for value in extra.get_all(key) {
                target.append(key.clone(), value.clone());
            }
        }
    }

    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(response)
}

/// Sends `err` in the error envelope with `400 Bad Request`
pub fn error_json<E>(err: &E) -> Result<Response, ToolkitError>
where
    E: fmt::Display + ?Sized,
{
    error_json_with_status(err, StatusCode::BAD_REQUEST)
}

/// Sends `err` in the error envelope with the given status
pub fn error_json_with_status<E>(err: &E, status: StatusCode) -> Result<Response, ToolkitError>
where
    E: fmt::Display + ?Sized,
{
    let payload: JsonResponse = JsonResponse::failure(err.to_string());
    write_json(status, &payload, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::ToolsConfig;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize)]
    struct Foo {
        foo: String,
    }

    fn toolkit(max_json_size: usize, allow_unknown_fields: bool) -> Toolkit {
        Toolkit::new(
            ToolsConfig::builder()
                .max_json_size(max_json_size)
                .allow_unknown_fields(allow_unknown_fields)
                .build(),
        )
    }

    fn request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read(body: &str, max_json_size: usize, allow_unknown: bool) -> Result<Foo, JsonError> {
        toolkit(max_json_size, allow_unknown)
            .read_json::<Foo>(request(body))
            .await
    }

    #[tokio::test]
    async fn test_read_json_good() {
        let decoded = read(r#"{"foo": "bar"}"#, 1024, false).await.unwrap();
        assert_eq!(decoded.foo, "bar");
    }

    #[tokio::test]
    async fn test_read_json_rejections() {
        let cases = [
            ("badly formed json", r#"{"foo": }"#, 1024, false),
            ("incorrect type", r#"{"foo": 1}"#, 1024, false),
            ("two json values", r#"{"foo": "1"}{"foo": "bar"}"#, 1024, false),
            ("empty body", "", 1024, false),
            ("syntax error", r#"{"foo": 1""#, 1024, false),
            ("unknown field", r#"{"alpha": "bar", "foo": "x"}"#, 1024, false),
            ("missing field name", r#"{alpha: "bar"}"#, 1024, true),
            ("body too large", r#"{"foo": "bar"}"#, 5, false),
            ("not json", "hello world", 1024, false),
            ("truncated", r#"{"foo": "ba"#, 1024, false),
        ];

        for (name, body, max, allow_unknown) in cases {
            assert!(
                read(body, max, allow_unknown).await.is_err(),
                "{name}: error expected"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_fields_allowed() {
        let decoded = read(r#"{"alpha": "bar", "foo": "x"}"#, 1024, true)
            .await
            .unwrap();
        assert_eq!(decoded.foo, "x");
    }

    #[tokio::test]
    async fn test_error_classification() {
        assert!(matches!(
            read(r#"{"foo": }"#, 1024, false).await,
            Err(JsonError::Syntax { offset: 9 })
        ));
        assert_eq!(
            read(r#"{"foo": 1}"#, 1024, false).await.unwrap_err(),
            JsonError::WrongType {
                field: "foo".to_string()
            }
        );
        assert_eq!(
            read(r#"{"foo": "1"}{"foo": "bar"}"#, 1024, false)
                .await
                .unwrap_err(),
            JsonError::MultipleValues
        );
        assert_eq!(read("", 1024, false).await.unwrap_err(), JsonError::Empty);
        assert_eq!(read("   \n", 1024, false).await.unwrap_err(), JsonError::Empty);
        assert_eq!(
            read(r#"{"foo": "ba"#, 1024, false).await.unwrap_err(),
            JsonError::Truncated
        );
        assert_eq!(
            read(r#"{"foo": "bar"}"#, 5, false).await.unwrap_err(),
            JsonError::TooLarge { limit: 5 }
        );
        assert_eq!(
            read(r#"{"alpha": "bar", "foo": "x"}"#, 1024, false)
                .await
                .unwrap_err(),
            JsonError::UnknownField {
                field: "alpha".into()
            }
        );
        assert!(matches!(
            read(r#""foo""#, 1024, false).await,
            Err(JsonError::WrongTypeAt { .. })
        ));
        assert!(matches!(
            read(r#"{}"#, 1024, false).await,
            Err(JsonError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_trailing_whitespace_is_single_value() {
        let decoded = read("{\"foo\": \"bar\"}\n\n", 1024, false).await.unwrap();
        assert_eq!(decoded.foo, "bar");
    }

    #[test]
    fn test_byte_offset_across_lines() {
        let body = b"{\n  \"foo\": }";
        assert_eq!(byte_offset(body, 2, 10), 12);
        assert_eq!(byte_offset(body, 0, 0), 0);
    }

    #[tokio::test]
    async fn test_write_json() {
        let payload: JsonResponse = JsonResponse::success("foo", json!({"n": 1}));

        let mut headers = HeaderMap::new();
        headers.insert("foo", HeaderValue::from_static("BAR"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = write_json(StatusCode::OK, &payload, Some(&headers)).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["foo"], "BAR");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let decoded: JsonResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_write_json_serialization_failure() {
        let mut data = HashMap::new();
        data.insert((1, 2), "tuple keys are not valid JSON object keys");

        let result = write_json(StatusCode::OK, &data, None);
        assert!(matches!(result, Err(ToolkitError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_error_json() {
        let err = std::io::Error::other("some error");
        let response = error_json_with_status(&err, StatusCode::SERVICE_UNAVAILABLE).unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: JsonResponse = serde_json::from_slice(&body).unwrap();
        assert!(payload.error);
        assert_eq!(payload.message, "some error");
        assert!(payload.data.is_none());
    }

    #[test]
    fn test_error_json_defaults_to_bad_request() {
        let response = error_json("invalid input").unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
