//! Contact-form mail relay.

pub mod message;
pub mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailError;

pub use message::{ContactSubmission, OutgoingEmail, SUBJECT_PREFIX, escape_html};
pub use smtp::{SmtpConfig, SmtpMailer, TlsMode, TlsPolicy, UnavailableMailer};

/// Result of a successful submission, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInfo {
    /// `Message-ID` header of the sent email.
    pub message_id: String,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// Final SMTP reply, e.g. `250 Ok`.
    pub response: String,
}

/// Outbound mail transport.
///
/// One instance lives for the whole process and is shared by every request.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Probe the relay (connect, handshake, authenticate).
    async fn verify(&self) -> Result<(), MailError>;

    /// Submit one email.
    async fn send(&self, email: OutgoingEmail) -> Result<SendInfo, MailError>;
}
