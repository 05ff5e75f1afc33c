use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::Serialize;

use crate::models::errors::ToolkitError;

/// Serializes `data` and POSTs it to `uri` with a freshly built client.
///
/// Returns the raw response with its status; reading (or dropping) the body
/// is left to the caller. Non-2xx statuses are not treated as errors.
pub async fn push_json_to_remote<T>(
    uri: &str,
    data: &T,
) -> Result<(Response, StatusCode), ToolkitError>
where
    T: Serialize + ?Sized,
{
    push_json_to_remote_with_client(&Client::new(), uri, data).await
}

/// Same as [`push_json_to_remote`] but sends through `client`
pub async fn push_json_to_remote_with_client<T>(
    client: &Client,
    uri: &str,
    data: &T,
) -> Result<(Response, StatusCode), ToolkitError>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(data)?;

    tracing::debug!("Pushing {} bytes of JSON to {}", body.len(), uri);

    let response = client
        .post(uri)
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(body)
        .send()
        .await?;

    let status = response.status();
    tracing::debug!("Remote {} answered with {}", uri, status);

    Ok((response, status))
}
