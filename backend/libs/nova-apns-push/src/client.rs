use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::certificate::Certificate;
use crate::config::{ApnsConfig, Environment, PushType};
use crate::dispatcher::{endpoint, Dispatcher, DynPushSender, PushRequest, PushResponse};
use crate::error::ApnsError;
use crate::notification::{build_headers, NotificationContent, Payload};

/// Certificate-authenticated APNs notification builder
///
/// Content setters consume and return the builder so calls can be chained.
/// `push` only borrows it, so the same builder can send again after further
/// edits; its content is never reset.
#[derive(Clone)]
pub struct ApnsPush {
    config: ApnsConfig,
    content: NotificationContent,
    sender: DynPushSender,
}

impl ApnsPush {
    /// Creates a push builder from a validated configuration, using the HTTP/2 [`Dispatcher`]
    pub fn new(config: ApnsConfig) -> Self {
        info!(
            "Initialized APNs push for bundle_id={}, push_type={}, certificate_files={}",
            config.bundle_id(),
            config.push_type(),
            config.certificate().paths().len()
        );

        Self {
            config,
            content: NotificationContent::default(),
            sender: Arc::new(Dispatcher::default()),
        }
    }

    /// Creates a push builder straight from bundle id and certificate file(s)
    ///
    /// # Arguments
    /// * `bundle_id` - App bundle identifier, sent as `apns-topic`
    /// * `certificate_files` - Combined PEM file, or separate cert and key files
    /// * `cert_password` - Password of an encrypted private key
    ///
    /// # Returns
    /// `Err(ApnsError::Configuration)` if any certificate file is not readable
    pub fn configure<I, P>(
        bundle_id: impl Into<String>,
        certificate_files: I,
        cert_password: Option<&str>,
    ) -> Result<Self, ApnsError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let certificate = Certificate::new(certificate_files, cert_password.map(str::to_string))?;
        Ok(Self::new(ApnsConfig::new(bundle_id, certificate)))
    }

    /// Replace the request sender (custom transport or test double)
    pub fn with_sender(mut self, sender: DynPushSender) -> Self {
        self.sender = sender;
        self
    }

    /// Set push type from its header value
    ///
    /// Fails with `ApnsError::Validation` for anything outside
    /// alert, background, location, voip, complication, fileprovider, mdm.
    pub fn set_push_type(self, push_type: &str) -> Result<Self, ApnsError> {
        let push_type = push_type.parse::<PushType>()?;
        Ok(self.with_push_type(push_type))
    }

    pub fn with_push_type(mut self, push_type: PushType) -> Self {
        self.config = self.config.with_push_type(push_type);
        self
    }

    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.content.title = Some(title.into());
        self
    }

    pub fn set_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.content.subtitle = Some(subtitle.into());
        self
    }

    pub fn set_body(mut self, body: impl Into<String>) -> Self {
        self.content.body = Some(body.into());
        self
    }

    /// Attach custom data, nested under `alert.custom` as a whole
    pub fn set_custom(mut self, custom: Map<String, Value>) -> Self {
        self.content.custom = Some(custom);
        self
    }

    pub fn config(&self) -> &ApnsConfig {
        &self.config
    }

    pub fn content(&self) -> &NotificationContent {
        &self.content
    }

    pub fn build_headers(&self) -> Vec<(String, String)> {
        build_headers(self.config.bundle_id(), self.config.push_type())
    }

    pub fn build_payload(&self) -> Payload {
        self.content.to_payload()
    }

    /// Send the current notification to one device
    ///
    /// The response is returned as received; errors from the sender are
    /// passed through unchanged.
    pub async fn push(
        &self,
        device_token: &str,
        environment: Environment,
    ) -> Result<PushResponse, ApnsError> {
        let request = PushRequest {
            url: endpoint(environment, device_token),
            headers: self.build_headers(),
            payload: self.build_payload(),
            device_token: device_token.to_string(),
            environment,
            certificate: self.config.certificate().clone(),
        };

        debug!(
            environment = %environment,
            push_type = %self.config.push_type(),
            "Pushing APNs notification to token {}",
            device_token.chars().take(8).collect::<String>()
        );

        self.sender.send(request).await
    }
}

impl std::fmt::Debug for ApnsPush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApnsPush")
            .field("config", &self.config)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn test_push() -> (TempDir, ApnsPush) {
        let temp = TempDir::new().unwrap();
        let cert_path = temp.path().join("aps.pem");
        fs::write(&cert_path, "placeholder").unwrap();

        let push = ApnsPush::configure("com.example.app", [&cert_path], None).unwrap();
        (temp, push)
    }

    #[test]
    fn test_configure_missing_certificate() {
        let result = ApnsPush::configure("com.example.app", ["/nonexistent/aps.pem"], None);
        assert!(matches!(result, Err(ApnsError::Configuration(_))));
    }

    #[test]
    fn test_default_push_type_is_voip() {
        let (_temp, push) = test_push();
        assert_eq!(push.config().push_type(), PushType::Voip);
        assert_eq!(push.build_headers()[1].1, "voip");
    }

    #[test]
    fn test_set_push_type_reflected_in_headers() {
        let (_temp, push) = test_push();
        for push_type in PushType::ALL {
            let push = push.clone().set_push_type(push_type.as_str()).unwrap();
            let headers = push.build_headers();
            assert_eq!(headers[1], ("apns-push-type".to_string(), push_type.to_string()));
        }
    }

    #[test]
    fn test_set_push_type_rejects_unknown() {
        let (_temp, push) = test_push();
        let result = push.set_push_type("silent");
        assert!(matches!(result, Err(ApnsError::Validation(_))));
    }

    #[test]
    fn test_build_headers_exactly_three() {
        let (_temp, push) = test_push();
        assert_eq!(
            push.build_headers(),
            vec![
                ("apns-topic".to_string(), "com.example.app".to_string()),
                ("apns-push-type".to_string(), "voip".to_string()),
                (
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_payload_defaults() {
        let (_temp, push) = test_push();
        assert_eq!(
            serde_json::to_value(push.build_payload()).unwrap(),
            json!({
                "aps": {"alert": {"title": "Default Title", "body": "Default Body"}},
                "sound": "default"
            })
        );
    }

    #[test]
    fn test_payload_title_and_body_overwrite_defaults() {
        let (_temp, push) = test_push();
        let push = push.set_title("X").set_body("Y");
        assert_eq!(
            serde_json::to_value(push.build_payload()).unwrap(),
            json!({"aps": {"alert": {"title": "X", "body": "Y"}}, "sound": "default"})
        );
    }

    #[test]
    fn test_payload_custom_nested_in_alert() {
        let (_temp, push) = test_push();
        let mut custom = Map::new();
        custom.insert("k".to_string(), json!("v"));

        let push = push.set_custom(custom);
        assert_eq!(
            serde_json::to_value(push.build_payload()).unwrap(),
            json!({
                "aps": {"alert": {
                    "title": "Default Title",
                    "body": "Default Body",
                    "custom": {"k": "v"}
                }},
                "sound": "default"
            })
        );
    }

    #[test]
    fn test_last_write_wins() {
        let (_temp, push) = test_push();
        let push = push.set_subtitle("first").set_subtitle("second");
        assert_eq!(
            push.build_payload().aps.alert.subtitle.as_deref(),
            Some("second")
        );
    }
}
