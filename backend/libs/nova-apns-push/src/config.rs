use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::error::ApnsError;

/// Value of the `apns-push-type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    Alert,
    Background,
    Location,
    #[default]
    Voip,
    Complication,
    Fileprovider,
    Mdm,
}

impl PushType {
    pub const ALL: [PushType; 7] = [
        PushType::Alert,
        PushType::Background,
        PushType::Location,
        PushType::Voip,
        PushType::Complication,
        PushType::Fileprovider,
        PushType::Mdm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Location => "location",
            PushType::Voip => "voip",
            PushType::Complication => "complication",
            PushType::Fileprovider => "fileprovider",
            PushType::Mdm => "mdm",
        }
    }
}

impl FromStr for PushType {
    type Err = ApnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PushType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ApnsError::Validation(format!("Unknown push type '{}'", s)))
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target APNs environment, chosen per push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Sandbox,
}

impl Environment {
    /// Get APNs API host for this environment
    pub fn host(&self) -> &'static str {
        match self {
            Environment::Production => "api.push.apple.com",
            Environment::Sandbox => "api.sandbox.push.apple.com",
        }
    }

    /// Numeric code used by older integrations (1 = production, 2 = sandbox)
    pub fn code(&self) -> u8 {
        match self {
            Environment::Production => 1,
            Environment::Sandbox => 2,
        }
    }
}

impl TryFrom<u8> for Environment {
    type Error = ApnsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Environment::Production),
            2 => Ok(Environment::Sandbox),
            other => Err(ApnsError::Validation(format!(
                "Invalid environment '{}'",
                other
            ))),
        }
    }
}

impl FromStr for Environment {
    type Err = ApnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            other => Err(ApnsError::Validation(format!(
                "Invalid environment '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Sandbox => f.write_str("sandbox"),
        }
    }
}

/// APNs Configuration
#[derive(Debug, Clone)]
pub struct ApnsConfig {
    bundle_id: String,
    push_type: PushType,
    certificate: Certificate,
}

impl ApnsConfig {
    /// Create new APNs configuration with the default `voip` push type
    pub fn new(bundle_id: impl Into<String>, certificate: Certificate) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            push_type: PushType::default(),
            certificate,
        }
    }

    /// Set push type
    pub fn with_push_type(mut self, push_type: PushType) -> Self {
        self.push_type = push_type;
        self
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn push_type(&self) -> PushType {
        self.push_type
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Load configuration from environment variables
    ///
    /// - `APNS_BUNDLE_ID` (required)
    /// - `APNS_CERTIFICATE_PATH` (required, comma separated for split cert/key files)
    /// - `APNS_CERTIFICATE_PASSPHRASE` (optional)
    /// - `APNS_PUSH_TYPE` (optional, default `voip`)
    pub fn from_env() -> Result<Self, ApnsError> {
        dotenvy::dotenv().ok();

        let bundle_id = required_var("APNS_BUNDLE_ID")?;
        let paths = parse_list(&required_var("APNS_CERTIFICATE_PATH")?);
        let passphrase = optional_var("APNS_CERTIFICATE_PASSPHRASE");

        let push_type = match optional_var("APNS_PUSH_TYPE") {
            Some(value) => value.parse()?,
            None => PushType::default(),
        };

        let certificate = Certificate::new(paths, passphrase)?;

        Ok(Self::new(bundle_id, certificate).with_push_type(push_type))
    }
}

/// Transport settings for the dispatcher
///
/// No timeouts are applied unless configured.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl DispatcherConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Load from `APNS_REQUEST_TIMEOUT_SECS` and `APNS_CONNECT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ApnsError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            timeout: secs_var("APNS_REQUEST_TIMEOUT_SECS")?,
            connect_timeout: secs_var("APNS_CONNECT_TIMEOUT_SECS")?,
        })
    }
}

fn required_var(name: &str) -> Result<String, ApnsError> {
    optional_var(name).ok_or_else(|| ApnsError::Configuration(format!("{} missing", name)))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_var(name: &str) -> Result<Option<Duration>, ApnsError> {
    optional_var(name)
        .map(|v| {
            v.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ApnsError::Configuration(format!("{} must be a number of seconds", name))
            })
        })
        .transpose()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
