use super::types::RemoteResponse;
use crate::configuration::CustomerCredentials;
use crate::error_handling::types::RecordingError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type ApiFuture = Pin<Box<dyn Future<Output = Result<RemoteResponse, RecordingError>> + Send>>;

/// The remote cloud-recording control API.
///
/// Paths are relative to the per-application `cloud_recording` root, e.g.
/// `/acquire` or `/resourceid/<id>/mode/<mode>/start`.
pub trait RecordingApi: Send + Sync {
    fn post(&self, path: &str, body: serde_json::Value) -> ApiFuture;
    fn get(&self, path: &str) -> ApiFuture;
}

/// `Authorization` header value for the customer key/secret pair.
pub fn basic_authorization(credentials: &CustomerCredentials) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", credentials.key, credentials.secret))
    )
}

/// [`RecordingApi`] over HTTPS with a precomputed Basic authorization header.
#[derive(Clone)]
pub struct HttpRecordingApi {
    client: Client,
    root: String,
    authorization: String,
}

impl HttpRecordingApi {
    pub fn new(
        api_base_url: &str,
        app_id: &str,
        credentials: &CustomerCredentials,
        timeout: Duration,
    ) -> Result<Self, RecordingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecordingError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            root: format!(
                "{}/apps/{}/cloud_recording",
                api_base_url.trim_end_matches('/'),
                app_id
            ),
            authorization: basic_authorization(credentials),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }
}

impl RecordingApi for HttpRecordingApi {
    fn post(&self, path: &str, body: serde_json::Value) -> ApiFuture {
        let request = self
            .client
            .post(self.url(path))
            .header(AUTHORIZATION, self.authorization.as_str())
            .json(&body);
        let url = self.url(path);
        Box::pin(async move {
            debug!("POST {}", url);
            let response = request.send().await?;
            read_response(response).await
        })
    }

    fn get(&self, path: &str) -> ApiFuture {
        let request = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, self.authorization.as_str());
        let url = self.url(path);
        Box::pin(async move {
            debug!("GET {}", url);
            let response = request.send().await?;
            read_response(response).await
        })
    }
}

/// Keeps the remote body as JSON when it parses, otherwise as a JSON string.
async fn read_response(response: Response) -> Result<RemoteResponse, RecordingError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;

    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                debug!("Remote body is not JSON ({}), passing it on as text", e);
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    };

    Ok(RemoteResponse { status, body })
}
