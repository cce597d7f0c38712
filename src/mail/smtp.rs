//! SMTP transport via lettre.
//!
//! lettre's `SmtpTransport` is blocking, so every network call runs inside
//! `spawn_blocking`. The transport keeps a connection pool and is built once
//! at startup.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use uuid::Uuid;

use super::{Mailer, OutgoingEmail, SendInfo};
use crate::config::{Env, env_flag, env_or, env_parse, env_required};
use crate::error::{ConfigError, MailError};

pub const DEFAULT_SMTP_HOST: &str = "smtp.zoho.in";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_RECIPIENT: &str = "vijayakumar@inochiinternational.in";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Configuration ───────────────────────────────────────────────────

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain connect, upgrade with STARTTLS when the server offers it.
    StartTls,
    /// Plain connect, STARTTLS mandatory.
    Required,
    /// TLS from the first byte (SMTPS, usually port 465).
    Wrapper,
    /// No TLS at all.
    None,
}

impl FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" | "opportunistic" => Ok(TlsMode::StartTls),
            "required" => Ok(TlsMode::Required),
            "wrapper" | "smtps" | "tls" => Ok(TlsMode::Wrapper),
            "none" | "plain" => Ok(TlsMode::None),
            other => Err(format!(
                "unknown TLS mode '{other}' (expected starttls, required, wrapper or none)"
            )),
        }
    }
}

/// SMTP relay configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    /// Skip certificate and hostname verification of the relay.
    ///
    /// The relay this service was written against is reached with
    /// verification disabled, so the default is `true`. Set
    /// `SMTP_ACCEPT_INVALID_CERTS=false` to verify.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
    /// Login name, also used as the sender address.
    pub username: String,
    pub password: SecretString,
    /// Fixed destination of every contact email.
    pub recipient: String,
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or(env, "SMTP_HOST", DEFAULT_SMTP_HOST),
            port: env_parse(env, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
            tls: env_parse(env, "SMTP_TLS", TlsMode::StartTls)?,
            accept_invalid_certs: env_flag(env, "SMTP_ACCEPT_INVALID_CERTS", true)?,
            timeout: Duration::from_secs(env_parse(
                env,
                "SMTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            username: env_required(env, "EMAIL_USER")?,
            password: SecretString::from(env_required(env, "EMAIL_PASS")?),
            recipient: env_or(env, "CONTACT_RECIPIENT", DEFAULT_RECIPIENT),
        })
    }
}

// ── Message construction ────────────────────────────────────────────

/// Turn an [`OutgoingEmail`] into a lettre message.
///
/// Returns the message together with its generated `Message-ID`.
pub fn build_message(
    sender: &Address,
    recipient: &Address,
    email: OutgoingEmail,
) -> Result<(Message, String), MailError> {
    let message_id = format!("<{}@{}>", Uuid::new_v4(), sender.domain());

    let mut builder = Message::builder()
        .from(Mailbox::new(email.from_name, sender.clone()))
        .to(Mailbox::new(None, recipient.clone()))
        .subject(email.subject)
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_HTML);

    if let Some(reply_to) = email.reply_to {
        let mailbox: Mailbox = reply_to
            .parse()
            .map_err(|e| MailError::Build(format!("Invalid reply-to address '{reply_to}': {e}")))?;
        builder = builder.reply_to(mailbox);
    }

    let message = builder
        .body(email.html_body)
        .map_err(|e| MailError::Build(e.to_string()))?;

    Ok((message, message_id))
}

// ── TLS ─────────────────────────────────────────────────────────────

/// Resolved TLS settings for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsPolicy {
    pub mode: TlsMode,
    pub accept_invalid_certs: bool,
    pub accept_invalid_hostnames: bool,
}

impl TlsPolicy {
    /// The leniency flag only applies when TLS is in use.
    pub fn from_config(config: &SmtpConfig) -> Self {
        let lenient = config.accept_invalid_certs && config.tls != TlsMode::None;
        Self {
            mode: config.tls,
            accept_invalid_certs: lenient,
            accept_invalid_hostnames: lenient,
        }
    }

    /// Build lettre's TLS setting for `host`.
    pub fn into_tls(self, host: &str) -> Result<Tls, MailError> {
        if self.mode == TlsMode::None {
            return Ok(Tls::None);
        }

        let params = TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(self.accept_invalid_certs)
            .dangerous_accept_invalid_hostnames(self.accept_invalid_hostnames)
            .build_rustls()
            .map_err(|e| MailError::Connection(format!("TLS setup failed: {e}")))?;

        Ok(match self.mode {
            TlsMode::Required => Tls::Required(params),
            TlsMode::Wrapper => Tls::Wrapper(params),
            TlsMode::StartTls | TlsMode::None => Tls::Opportunistic(params),
        })
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// Process-wide SMTP mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    sender: Address,
    recipient: Address,
}

impl SmtpMailer {
    /// Build the pooled transport. No network I/O happens here.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let sender: Address = config.username.parse().map_err(|e| {
            MailError::Connection(format!("Invalid sender address '{}': {e}", config.username))
        })?;
        let recipient: Address = config.recipient.parse().map_err(|e| {
            MailError::Connection(format!(
                "Invalid recipient address '{}': {e}",
                config.recipient
            ))
        })?;

        let policy = TlsPolicy::from_config(config);
        if policy.accept_invalid_certs {
            warn!(
                host = %config.host,
                "SMTP certificate verification is disabled (SMTP_ACCEPT_INVALID_CERTS=true)"
            );
        }
        let tls = policy.into_tls(&config.host)?;

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::builder_dangerous(config.host.as_str())
            .port(config.port)
            .tls(tls)
            .credentials(credentials)
            .timeout(Some(config.timeout))
            .build();

        info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            recipient = %recipient,
            "SMTP transport configured"
        );

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn verify(&self) -> Result<(), MailError> {
        let transport = self.transport.clone();
        let connected = tokio::task::spawn_blocking(move || transport.test_connection())
            .await
            .map_err(|e| MailError::Task(e.to_string()))?
            .map_err(|e| MailError::Verify(e.to_string()))?;

        if connected {
            Ok(())
        } else {
            Err(MailError::Verify("relay did not accept the connection".into()))
        }
    }

    async fn send(&self, email: OutgoingEmail) -> Result<SendInfo, MailError> {
        let (message, message_id) = build_message(&self.sender, &self.recipient, email)?;
        let accepted: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();

        let transport = self.transport.clone();
        let response = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Task(e.to_string()))?
            .map_err(|e| MailError::Send(e.to_string()))?;

        let response = match response.first_line() {
            Some(line) => format!("{} {line}", response.code()),
            None => response.code().to_string(),
        };

        info!(message_id = %message_id, "Message sent");
        Ok(SendInfo {
            message_id,
            accepted,
            rejected: Vec::new(),
            response,
        })
    }
}

/// Stand-in used when the real transport could not be configured.
///
/// Keeps the server up (chat still works) while every send fails loudly.
#[derive(Debug, Clone)]
pub struct UnavailableMailer {
    reason: String,
}

impl UnavailableMailer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Mailer for UnavailableMailer {
    async fn verify(&self) -> Result<(), MailError> {
        Err(MailError::Unavailable(self.reason.clone()))
    }

    async fn send(&self, _email: OutgoingEmail) -> Result<SendInfo, MailError> {
        Err(MailError::Unavailable(self.reason.clone()))
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config_from(pairs: &[(&str, &str)]) -> Result<SmtpConfig, ConfigError> {
        let vars = lookup(pairs);
        SmtpConfig::from_lookup(&|key| vars.get(key).cloned())
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from_name: Some("Asha Rao".into()),
            reply_to: Some("asha@example.com".into()),
            subject: "New Contact Form Submission: Bulk order".into(),
            html_body: "<p>hi</p>".into(),
        }
    }

    fn addresses() -> (Address, Address) {
        (
            "relay@inochi.example".parse().unwrap(),
            "sales@inochi.example".parse().unwrap(),
        )
    }

    #[test]
    fn tls_mode_parsing() {
        assert_eq!("starttls".parse::<TlsMode>(), Ok(TlsMode::StartTls));
        assert_eq!("Required".parse::<TlsMode>(), Ok(TlsMode::Required));
        assert_eq!("smtps".parse::<TlsMode>(), Ok(TlsMode::Wrapper));
        assert_eq!("none".parse::<TlsMode>(), Ok(TlsMode::None));
        assert!("sslv3".parse::<TlsMode>().is_err());
    }

    #[test]
    fn config_defaults() {
        let config = config_from(&[("EMAIL_USER", "relay@inochi.example"), ("EMAIL_PASS", "pw")])
            .unwrap();
        assert_eq!(config.host, DEFAULT_SMTP_HOST);
        assert_eq!(config.port, 587);
        assert_eq!(config.tls, TlsMode::StartTls);
        assert!(config.accept_invalid_certs);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.recipient, DEFAULT_RECIPIENT);
        assert_eq!(config.password.expose_secret(), "pw");
    }

    #[test]
    fn config_overrides() {
        let config = config_from(&[
            ("EMAIL_USER", "relay@inochi.example"),
            ("EMAIL_PASS", "pw"),
            ("SMTP_HOST", "smtp.test"),
            ("SMTP_PORT", "465"),
            ("SMTP_TLS", "wrapper"),
            ("SMTP_ACCEPT_INVALID_CERTS", "false"),
            ("CONTACT_RECIPIENT", "sales@inochi.example"),
        ])
        .unwrap();
        assert_eq!(config.host, "smtp.test");
        assert_eq!(config.port, 465);
        assert_eq!(config.tls, TlsMode::Wrapper);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.recipient, "sales@inochi.example");
    }

    #[test]
    fn config_requires_credentials() {
        let err = config_from(&[("EMAIL_USER", "relay@inochi.example")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "EMAIL_PASS"));
    }

    #[test]
    fn config_rejects_bad_port() {
        let err = config_from(&[
            ("EMAIL_USER", "relay@inochi.example"),
            ("EMAIL_PASS", "pw"),
            ("SMTP_PORT", "smtp"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SMTP_PORT"));
    }

    fn header<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        raw.lines()
            .find(|line| line.to_ascii_lowercase().starts_with(&prefix))
    }

    #[test]
    fn message_headers() {
        let (sender, recipient) = addresses();
        let (message, message_id) = build_message(&sender, &recipient, email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        let from = header(&raw, "From").unwrap();
        assert!(from.contains("Asha Rao"));
        assert!(from.contains("relay@inochi.example"));
        assert!(header(&raw, "To").unwrap().contains("sales@inochi.example"));
        assert!(header(&raw, "Reply-To").unwrap().contains("asha@example.com"));
        assert!(
            header(&raw, "Subject")
                .unwrap()
                .contains("New Contact Form Submission: Bulk order")
        );
        assert!(header(&raw, "Message-ID").unwrap().contains(&message_id));
        assert!(header(&raw, "Content-Type").unwrap().contains("text/html"));
        assert!(message_id.ends_with("@inochi.example>"));
    }

    #[test]
    fn message_without_reply_to() {
        let (sender, recipient) = addresses();
        let mut email = email();
        email.reply_to = None;
        email.from_name = None;
        let (message, _) = build_message(&sender, &recipient, email).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(header(&raw, "Reply-To").is_none());
        assert!(header(&raw, "From").unwrap().contains("relay@inochi.example"));
    }

    #[test]
    fn malformed_reply_to_is_a_build_error() {
        let (sender, recipient) = addresses();
        let mut email = email();
        email.reply_to = Some("not an address".into());
        let err = build_message(&sender, &recipient, email).unwrap_err();
        assert!(matches!(err, MailError::Build(_)));
    }

    fn install_crypto_provider() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    fn policy_for(pairs: &[(&str, &str)]) -> TlsPolicy {
        let mut vars = vec![("EMAIL_USER", "relay@inochi.example"), ("EMAIL_PASS", "pw")];
        vars.extend_from_slice(pairs);
        TlsPolicy::from_config(&config_from(&vars).unwrap())
    }

    #[test]
    fn lenient_tls_by_default() {
        let policy = policy_for(&[]);
        assert_eq!(policy.mode, TlsMode::StartTls);
        assert!(policy.accept_invalid_certs);
        assert!(policy.accept_invalid_hostnames);
    }

    #[test]
    fn strict_tls_when_flag_is_off() {
        let policy = policy_for(&[("SMTP_ACCEPT_INVALID_CERTS", "false")]);
        assert!(!policy.accept_invalid_certs);
        assert!(!policy.accept_invalid_hostnames);
    }

    #[test]
    fn no_tls_ignores_leniency_flag() {
        let policy = policy_for(&[("SMTP_TLS", "none"), ("SMTP_ACCEPT_INVALID_CERTS", "true")]);
        assert_eq!(policy.mode, TlsMode::None);
        assert!(!policy.accept_invalid_certs);
        assert!(!policy.accept_invalid_hostnames);
    }

    #[test]
    fn tls_mode_selects_lettre_variant() {
        install_crypto_provider();
        for (mode, lenient) in [
            ("starttls", "true"),
            ("starttls", "false"),
            ("required", "true"),
            ("required", "false"),
            ("wrapper", "true"),
            ("wrapper", "false"),
            ("none", "false"),
        ] {
            let tls = policy_for(&[("SMTP_TLS", mode), ("SMTP_ACCEPT_INVALID_CERTS", lenient)])
                .into_tls("smtp.test")
                .unwrap();
            let selected = match tls {
                Tls::None => "none",
                Tls::Opportunistic(_) => "starttls",
                Tls::Required(_) => "required",
                Tls::Wrapper(_) => "wrapper",
                #[allow(unreachable_patterns)]
                _ => "other",
            };
            assert_eq!(selected, mode, "SMTP_TLS={mode} lenient={lenient}");
        }
    }

    #[test]
    fn mailer_rejects_bad_sender() {
        let config = config_from(&[("EMAIL_USER", "not-an-address"), ("EMAIL_PASS", "pw")])
            .unwrap();
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_mailer_fails_everything() {
        let mailer = UnavailableMailer::new("EMAIL_USER not set");
        assert!(matches!(
            mailer.verify().await,
            Err(MailError::Unavailable(_))
        ));
        assert!(matches!(
            mailer.send(email()).await,
            Err(MailError::Unavailable(_))
        ));
    }
}
