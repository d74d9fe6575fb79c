//! Push notifications
//!
//! Supported platforms:
//! - LINE Messaging API (one-way push messages)

pub mod line;

use async_trait::async_trait;

use crate::error::Result;

pub use line::{LineClient, LineConfig};

/// A one-way text push channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// Deliver `text` to `recipient`. Never retried by the caller.
    async fn push_text(&self, recipient: &str, text: &str) -> Result<()>;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;

    /// Platform name, for logs
    fn name(&self) -> &'static str;
}
