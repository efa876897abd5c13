use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::errors::NetworkError;

/// Execute a single request and deserialize a JSON body, classifying every
/// failure into the closed [`NetworkError`] set.
///
/// - transport failures map through `From<reqwest::Error>` (unresolvable
///   host → `NoInternet`, timeouts and mid-request I/O → `RequestTimeout`);
/// - non-2xx statuses map through [`NetworkError::from_status`];
/// - a 2xx response with an empty body is `ServerError`;
/// - a body that is not valid JSON for `T` is `Serialization`.
///
/// Cancellation is dropping the returned future; a dropped call never
/// produces a value, so no cancellation is ever mislabeled as an error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, NetworkError> {
    let response = request.send().await.map_err(NetworkError::from)?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::from_status(status));
    }

    let body = response.bytes().await.map_err(NetworkError::from)?;
    if body.is_empty() {
        return Err(NetworkError::ServerError);
    }

    serde_json::from_slice(&body).map_err(|_| NetworkError::Serialization)
}
