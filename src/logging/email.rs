// file: src/logging/email.rs
// description: email notification handler for warning and error records
// reference: https://docs.rs/lettre

use super::record::LogRecord;
use crate::config::EmailHandlerConfig;
use crate::error::{Result, UtilitiesError};
use chrono::Local;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::{SmtpTransport, Transport};
use std::time::Duration;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Delivers one notification. Implementations must not log through
/// `tracing`, they run inside the subscriber.
pub trait Mailer: Send + Sync {
    fn send(&self, subject: &str, body: &str) -> Result<()>;
}

/// Plain SMTP delivery: no authentication, no TLS, no retry.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    to: Vec<Mailbox>,
    mail_host: String,
}

impl SmtpMailer {
    /// Parses the addresses up front; the mail host is not contacted until
    /// the first send.
    pub fn new(config: &EmailHandlerConfig) -> Result<Self> {
        let from: Mailbox = config.from.parse()?;
        let to = config
            .to
            .iter()
            .map(|address| address.parse::<Mailbox>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(UtilitiesError::Email("no recipients configured".to_string()));
        }

        let transport = SmtpTransport::builder_dangerous(config.mail_host.as_str())
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            mail_host: config.mail_host.clone(),
        })
    }

    pub fn mail_host(&self) -> &str {
        &self.mail_host
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        Ok(builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;
        self.transport
            .send(&message)
            .map_err(|e| UtilitiesError::Email(format!("{}: {}", self.mail_host, e)))?;
        Ok(())
    }
}

/// Sends every event it sees as one email. Level filtering is applied by the
/// caller with a per-layer filter.
pub struct EmailLayer {
    mailer: Box<dyn Mailer>,
    subject: String,
}

impl EmailLayer {
    pub fn new(mailer: Box<dyn Mailer>, subject: impl Into<String>) -> Self {
        Self {
            mailer,
            subject: subject.into(),
        }
    }
}

impl<S> Layer<S> for EmailLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let body = LogRecord::from_event(event).render(Local::now());
        if let Err(e) = self.mailer.send(&self.subject, &body) {
            // Reporting through tracing here would re-enter this layer.
            eprintln!("--- Logging error ---\nemail handler failed: {}\n{}", e, body);
        }
    }
}
