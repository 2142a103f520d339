use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Identity, StatusCode};
use tracing::{debug, error, info};

use crate::certificate::Certificate;
use crate::config::{DispatcherConfig, Environment};
use crate::error::ApnsError;
use crate::notification::Payload;

/// A single APNs request, built fresh for every push
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub payload: Payload,
    pub device_token: String,
    pub environment: Environment,
    pub certificate: Certificate,
}

/// Raw APNs response
///
/// Status codes and reason bodies (`BadDeviceToken`, `Unregistered`, ...) are
/// left for the caller to interpret.
#[derive(Debug, Clone)]
pub struct PushResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl PushResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait for anything able to deliver a built APNs request
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver the request and return the response untouched
    ///
    /// # Returns
    /// `Ok(PushResponse)` whenever the request reached APNs, whatever the
    /// status code; `Err(ApnsError::Transport)` if it never did
    async fn send(&self, request: PushRequest) -> Result<PushResponse, ApnsError>;
}

pub type DynPushSender = Arc<dyn PushSender>;

/// Full request URL for a device token
///
/// The token is appended verbatim.
pub fn endpoint(environment: Environment, device_token: &str) -> String {
    format!("https://{}/3/device/{}", environment.host(), device_token)
}

/// Whether a token looks like an APNs device token (64 hex characters)
///
/// `push` does not call this; tokens are sent as given.
pub fn is_valid_device_token(device_token: &str) -> bool {
    device_token.len() == 64 && device_token.chars().all(|c| c.is_ascii_hexdigit())
}

/// HTTP/2 dispatcher authenticating with the APNs client certificate
///
/// Every call builds its own client, so no connection is shared between pushes.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    fn build_client(&self, certificate: &Certificate) -> Result<reqwest::Client, ApnsError> {
        let identity_pem = certificate.identity_pem()?;
        let identity = Identity::from_pem(&identity_pem).map_err(|e| {
            ApnsError::Configuration(format!("Failed to load client certificate: {}", e))
        })?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity);

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

#[async_trait::async_trait]
impl PushSender for Dispatcher {
    async fn send(&self, request: PushRequest) -> Result<PushResponse, ApnsError> {
        let device_token_prefix = request.device_token.chars().take(8).collect::<String>();

        debug!(
            environment = %request.environment,
            url = %request.url,
            "Dispatching APNs request for token {}",
            device_token_prefix
        );

        let client = self.build_client(&request.certificate)?;

        let mut http_request = client.post(&request.url);
        for (name, value) in &request.headers {
            http_request = http_request.header(name.as_str(), value.as_str());
        }

        let response = match http_request.json(&request.payload).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("APNs send failed for token {}: {}", device_token_prefix, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        info!(
            status = status.as_u16(),
            apns_id = ?apns_id(&headers),
            "APNs responded for token {}",
            device_token_prefix
        );

        Ok(PushResponse::new(status, headers, body))
    }
}

fn apns_id(headers: &HeaderMap) -> Option<&str> {
    headers.get("apns-id").and_then(|v| v.to_str().ok())
}
