//! Nova APNs Push Library
//!
//! Certificate-based Apple Push Notification Service (APNs) client used to
//! deliver notifications to iOS and macOS devices over HTTP/2.
//!
//! It handles:
//! - Eager validation of the PEM client certificate file(s)
//! - Push type and environment validation
//! - `apns-topic` / `apns-push-type` / `Content-Type` header assembly
//! - `aps` JSON payload assembly with default title and body
//! - One HTTP/2 POST per push to the sandbox or production endpoint
//!
//! Responses are returned untouched; interpreting APNs status codes and
//! reasons is up to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use nova_apns_push::{ApnsPush, Environment};
//!
//! # async fn run() -> Result<(), nova_apns_push::ApnsError> {
//! let push = ApnsPush::configure("com.example.app", ["/etc/apns/aps.pem"], None)?
//!     .set_push_type("alert")?
//!     .set_title("New message")
//!     .set_body("You have a new message");
//!
//! let response = push.push("0123abcd", Environment::Sandbox).await?;
//! println!("{} {}", response.status(), response.text());
//! # Ok(())
//! # }
//! ```
pub mod certificate;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notification;

pub use certificate::Certificate;
pub use client::ApnsPush;
pub use config::{ApnsConfig, DispatcherConfig, Environment, PushType};
pub use dispatcher::{
    endpoint, is_valid_device_token, Dispatcher, DynPushSender, PushRequest, PushResponse,
    PushSender,
};
pub use error::ApnsError;
pub use notification::{NotificationContent, Payload};
