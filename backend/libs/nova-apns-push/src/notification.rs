use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PushType;

pub const DEFAULT_TITLE: &str = "Default Title";
pub const DEFAULT_BODY: &str = "Default Body";
pub const DEFAULT_SOUND: &str = "default";

pub const HEADER_APNS_TOPIC: &str = "apns-topic";
pub const HEADER_APNS_PUSH_TYPE: &str = "apns-push-type";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_VALUE: &str = "application/x-www-form-urlencoded";

/// Notification text and custom data, last write wins per field
///
/// Empty strings and empty maps count as unset when the payload is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub custom: Option<Map<String, Value>>,
}

impl NotificationContent {
    pub fn to_payload(&self) -> Payload {
        Payload {
            aps: Aps {
                alert: Alert {
                    title: non_empty(&self.title).unwrap_or(DEFAULT_TITLE).to_string(),
                    body: non_empty(&self.body).unwrap_or(DEFAULT_BODY).to_string(),
                    subtitle: non_empty(&self.subtitle).map(str::to_string),
                    custom: self.custom.clone().filter(|map| !map.is_empty()),
                },
            },
            sound: DEFAULT_SOUND.to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// APNs JSON payload: `{"aps": {"alert": {...}}, "sound": "default"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub aps: Aps,
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aps {
    pub alert: Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<Map<String, Value>>,
}

/// Request headers in a fixed order: topic, push type, content type
pub fn build_headers(bundle_id: &str, push_type: PushType) -> Vec<(String, String)> {
    vec![
        (HEADER_APNS_TOPIC.to_string(), bundle_id.to_string()),
        (HEADER_APNS_PUSH_TYPE.to_string(), push_type.as_str().to_string()),
        (HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_VALUE.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_content_uses_defaults() {
        let payload = serde_json::to_value(NotificationContent::default().to_payload()).unwrap();
        assert_eq!(
            payload,
            json!({
                "aps": {"alert": {"title": "Default Title", "body": "Default Body"}},
                "sound": "default"
            })
        );
    }

    #[test]
    fn test_empty_strings_count_as_unset() {
        let content = NotificationContent {
            title: Some(String::new()),
            subtitle: Some(String::new()),
            body: Some(String::new()),
            custom: Some(Map::new()),
        };
        assert_eq!(content.to_payload(), NotificationContent::default().to_payload());
    }

    #[test]
    fn test_zero_string_is_a_value() {
        let content = NotificationContent {
            title: Some("0".to_string()),
            subtitle: Some("0".to_string()),
            body: Some("0".to_string()),
            custom: None,
        };

        let alert = content.to_payload().aps.alert;
        assert_eq!(alert.title, "0");
        assert_eq!(alert.body, "0");
        assert_eq!(alert.subtitle.as_deref(), Some("0"));
    }

    #[test]
    fn test_serialized_key_order() {
        let mut custom = Map::new();
        custom.insert("k".to_string(), json!("v"));
        let content = NotificationContent {
            title: Some("T".to_string()),
            subtitle: Some("S".to_string()),
            body: Some("B".to_string()),
            custom: Some(custom),
        };

        let encoded = serde_json::to_string(&content.to_payload()).unwrap();
        assert_eq!(
            encoded,
            r#"{"aps":{"alert":{"title":"T","body":"B","subtitle":"S","custom":{"k":"v"}}},"sound":"default"}"#
        );
    }

    #[test]
    fn test_headers_order() {
        let headers = build_headers("com.example.app", PushType::Background);
        let names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["apns-topic", "apns-push-type", "Content-Type"]);
        assert_eq!(headers[1].1, "background");
    }
}
