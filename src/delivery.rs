//! SMTP delivery of a rendered report.
//!
//! The session is driven stage by stage (connect, STARTTLS, login, send)
//! so that each failure surfaces as its own [`DeliveryError`] variant.

use core::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{Address, Message};
use secrecy::{ExposeSecret as _, SecretString};

use crate::error::DeliveryError;
use crate::render::RenderedReport;

/// Display name on the `From:` header.
const SENDER_NAME: &str = "monthly-report";

/// SMTP login.
#[derive(Debug)]
pub struct SmtpCredentials {
    /// User name.
    pub user: String,
    /// Password.
    pub password: SecretString,
}

/// Where and how to hand over the report.
#[derive(Debug)]
pub struct SmtpSettings {
    /// Server host name.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Upgrade the connection with STARTTLS before logging in.
    pub starttls: bool,
    /// Login, if the server requires one.
    pub credentials: Option<SmtpCredentials>,
    /// Timeout for each SMTP command.
    pub timeout: Duration,
}

/// Builds the report email: a plain text part with an HTML alternative.
///
/// # Errors
///
/// Returns [`DeliveryError::Message`] for an unparsable address, an empty
/// recipient list, or a message lettre refuses to build.
pub fn build_message(
    from: &str,
    to: &[String],
    report: &RenderedReport,
) -> Result<Message, DeliveryError> {
    if to.is_empty() {
        return Err(DeliveryError::Message("no recipients".to_owned()));
    }
    let mut builder = Message::builder()
        .from(Mailbox::new(Some(SENDER_NAME.to_owned()), parse_address(from)?))
        .subject(report.subject.as_str());
    for recipient in to {
        builder = builder.to(Mailbox::new(None, parse_address(recipient)?));
    }
    builder
        .multipart(MultiPart::alternative_plain_html(
            report.text.clone(),
            report.html.clone(),
        ))
        .map_err(|err| DeliveryError::Message(err.to_string()))
}

/// Parses one email address.
fn parse_address(raw: &str) -> Result<Address, DeliveryError> {
    raw.trim()
        .parse()
        .map_err(|err| DeliveryError::Message(format!("invalid address {raw:?}: {err}")))
}

/// Sends messages through one SMTP server.
#[derive(Debug)]
pub struct SmtpMailer {
    /// Server settings.
    settings: SmtpSettings,
}

impl SmtpMailer {
    /// Creates a mailer for the given server.
    #[inline]
    #[must_use]
    pub const fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Delivers `message` in one SMTP session.
    ///
    /// # Errors
    ///
    /// Fails with the variant of the stage that failed:
    /// [`DeliveryError::Connect`], [`DeliveryError::StartTls`],
    /// [`DeliveryError::Authentication`] or [`DeliveryError::Send`].
    #[tracing::instrument(skip_all, fields(server = %self.settings.server, port = self.settings.port))]
    pub fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        let settings = &self.settings;
        let hello = ClientId::default();
        let mut connection = SmtpConnection::connect(
            (settings.server.as_str(), settings.port),
            Some(settings.timeout),
            &hello,
            None,
            None,
        )
        .map_err(DeliveryError::Connect)?;
        tracing::debug!("connected to SMTP server");

        if settings.starttls {
            let tls = TlsParameters::new(settings.server.clone()).map_err(DeliveryError::StartTls)?;
            connection
                .starttls(&tls, &hello)
                .map_err(DeliveryError::StartTls)?;
            tracing::debug!("upgraded connection with STARTTLS");
        }

        if let Some(login) = settings.credentials.as_ref() {
            let credentials =
                Credentials::new(login.user.clone(), login.password.expose_secret().to_owned());
            let reply = connection
                .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
                .map_err(DeliveryError::Authentication)?;
            tracing::debug!(user = %login.user, code = %reply.code(), "authenticated");
        }

        let reply = connection
            .send(message.envelope(), &message.formatted())
            .map_err(DeliveryError::Send)?;
        tracing::debug!(code = %reply.code(), "message accepted");
        if let Err(err) = connection.quit() {
            tracing::debug!(error = %err, "QUIT failed after delivery");
        }
        tracing::info!("report handed to SMTP server");
        Ok(())
    }
}
