//! Outbound mail used to contact suppliers when a product runs out
//!
//! Three transports sit behind [`ContactDispatcher`]: SMTP relay, an HTTP
//! mail API, and a log-only sink for development.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MailConfig, MailTransport};

/// A message addressed to one supplier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery failure. Callers log it and carry on.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("mail API rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait ContactDispatcher: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> Result<(), DispatchError>;
}

/// Build the dispatcher selected by configuration
pub fn build_dispatcher(config: &MailConfig) -> anyhow::Result<Arc<dyn ContactDispatcher>> {
    let dispatcher: Arc<dyn ContactDispatcher> = match config.transport {
        MailTransport::Smtp => Arc::new(SmtpDispatcher::from_config(config)?),
        MailTransport::Http => Arc::new(HttpMailDispatcher::from_config(config)?),
        MailTransport::Log => Arc::new(LogDispatcher),
    };
    Ok(dispatcher)
}

// ============================================================================
// SMTP
// ============================================================================

pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpDispatcher {
    pub fn from_config(config: &MailConfig) -> anyhow::Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("mail.smtp_host is required for the smtp transport"))?;
        let from: Mailbox = config.from_address.parse()?;

        let mut builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(pass)) => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
                .credentials(Credentials::new(user.clone(), pass.clone())),
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        if let Some(port) = config.smtp_port {
            builder = builder.port(port);
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl ContactDispatcher for SmtpDispatcher {
    async fn send(&self, message: &ContactMessage) -> Result<(), DispatchError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| DispatchError::InvalidAddress {
                address: message.to.clone(),
                reason: e.to_string(),
            })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| DispatchError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        Ok(())
    }
}

// ============================================================================
// HTTP mail API
// ============================================================================

/// Client for a JSON mail-sending API authenticated with a bearer key
pub struct HttpMailDispatcher {
    endpoint: String,
    api_key: String,
    from: String,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct MailApiResponse {
    message: Option<String>,
}

impl HttpMailDispatcher {
    pub fn new(endpoint: String, api_key: String, from: String) -> Self {
        Self {
            endpoint,
            api_key,
            from,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &MailConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .api_endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("mail.api_endpoint is required for the http transport"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("mail.api_key is required for the http transport"))?;
        Ok(Self::new(endpoint, api_key, config.from_address.clone()))
    }
}

#[async_trait]
impl ContactDispatcher for HttpMailDispatcher {
    async fn send(&self, message: &ContactMessage) -> Result<(), DispatchError> {
        let request = SendMailRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: MailApiResponse = response.json().await.unwrap_or(MailApiResponse {
            message: Some("Unknown error".to_string()),
        });
        Err(DispatchError::Rejected {
            status: status.as_u16(),
            message: body.message.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Log only
// ============================================================================

pub struct LogDispatcher;

#[async_trait]
impl ContactDispatcher for LogDispatcher {
    async fn send(&self, message: &ContactMessage) -> Result<(), DispatchError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Supplier contact (log transport)"
        );
        Ok(())
    }
}
