use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SyncError;

const BODY_SNIPPET_MAX: usize = 512;

/// Bearer-authenticated JSON client for the Fabric REST API.
///
/// One instance per run; runs never share a client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, SyncError> {
        let http = Client::builder()
            .user_agent(concat!("lakesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SyncError::Other(err.into()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| SyncError::Request {
                path: path.to_string(),
                source,
            })?;
        decode(path, response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, SyncError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|source| SyncError::Request {
                path: path.to_string(),
                source,
            })?;
        decode(path, response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, SyncError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|source| SyncError::Request {
            path: path.to_string(),
            source,
        })?;
    decode_body(path, status, &body)
}

fn decode_body<T: DeserializeOwned>(
    path: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<T, SyncError> {
    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound {
            path: path.to_string(),
        });
    }
    if !status.is_success() {
        return Err(SyncError::Transport {
            path: path.to_string(),
            status: status.as_u16(),
            body: snippet(&String::from_utf8_lossy(body)),
        });
    }
    serde_json::from_slice(body).map_err(|err| SyncError::Schema {
        context: path.to_string(),
        reason: err.to_string(),
    })
}

/// Error bodies can be multi-kilobyte HTML pages; keep diagnostics short.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_MAX {
        return trimmed.to_string();
    }
    let mut cut = BODY_SNIPPET_MAX;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        id: String,
    }

    #[test]
    fn not_found_maps_to_its_own_variant() {
        let err = decode_body::<Payload>("/v1/workspaces/w/lakehouses/l", StatusCode::NOT_FOUND, b"")
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
    }

    #[test]
    fn non_success_maps_to_transport_with_body() {
        let err = decode_body::<Payload>(
            "/v1.0/myorg/lhdatamarts/ep",
            StatusCode::SERVICE_UNAVAILABLE,
            b"try again later",
        )
        .unwrap_err();
        match err {
            SyncError::Transport { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "try again later");
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_success_body_is_a_schema_error() {
        let err =
            decode_body::<Payload>("/v1/thing", StatusCode::OK, b"{\"unexpected\":true}").unwrap_err();
        assert!(matches!(err, SyncError::Schema { .. }));
    }

    #[test]
    fn decodable_success_body_round_trips() {
        let payload: Payload =
            decode_body("/v1/thing", StatusCode::OK, b"{\"id\":\"ep-1\"}").unwrap();
        assert_eq!(payload.id, "ep-1");
    }

    #[test]
    fn snippet_truncates_on_char_boundaries() {
        let long = "é".repeat(600);
        let short = snippet(&long);
        assert!(short.ends_with('…'));
        assert!(short.len() <= BODY_SNIPPET_MAX + '…'.len_utf8());

        assert_eq!(snippet("  short body  "), "short body");
    }
}
