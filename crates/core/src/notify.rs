//! Outbound transactional email.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// A single HTML email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Something that can deliver an [`Email`].
///
/// Delivery is best-effort from the caller's point of view: the gateway
/// spawns `send` and only logs the outcome.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// A human-readable name for this mailer (e.g., "resend").
    fn name(&self) -> &str;

    async fn send(&self, email: Email) -> Result<(), NotifyError>;
}
