//! Shared request plumbing for the verifier clients.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::VerifierError;

/// Error body shape used by the World ID developer portal, and accepted
/// from any verifier that happens to return it.
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    code: Option<String>,
    detail: Option<String>,
    #[serde(alias = "message")]
    error: Option<String>,
}

/// POST a JSON body and decode a JSON response.
///
/// 2xx decodes into `R`, 4xx becomes [`VerifierError::Rejected`] with the
/// upstream `code`/`detail` carried verbatim, and 5xx or transport failure
/// becomes [`VerifierError::Unreachable`].
pub(crate) async fn post_json<B, R>(
    http: &reqwest::Client,
    url: &str,
    endpoint: &str,
    bearer: Option<&str>,
    body: &B,
) -> Result<R, VerifierError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut req = http.post(url).json(body);
    if let Some(token) = bearer {
        req = req.bearer_auth(token);
    }

    let resp = req.send().await.map_err(|e| transport_error(endpoint, e))?;
    let status = resp.status();

    if status.is_success() {
        return resp.json::<R>().await.map_err(|e| {
            if e.is_timeout() {
                VerifierError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                VerifierError::Deserialization {
                    endpoint: endpoint.to_string(),
                    detail: e.to_string(),
                }
            }
        });
    }

    let text = resp.text().await.unwrap_or_default();
    if status.is_client_error() {
        let parsed = serde_json::from_str::<UpstreamErrorBody>(&text).ok();
        let code = parsed
            .as_ref()
            .and_then(|b| b.code.clone())
            .unwrap_or_else(|| format!("http_{}", status.as_u16()));
        let detail = parsed
            .and_then(|b| b.detail.or(b.error))
            .unwrap_or(text);
        return Err(VerifierError::Rejected {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            code,
            detail,
        });
    }

    Err(VerifierError::Unreachable {
        endpoint: endpoint.to_string(),
        detail: format!("HTTP {}: {}", status.as_u16(), text),
    })
}

fn transport_error(endpoint: &str, e: reqwest::Error) -> VerifierError {
    if e.is_timeout() {
        VerifierError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        VerifierError::Unreachable {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        }
    }
}

/// Join a path onto a base URL without doubling the slash.
pub(crate) fn join(base: &url::Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
