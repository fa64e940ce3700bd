//! Error types for the monthly report.

use chrono::NaiveDate;

/// Exit code for missing or invalid configuration.
pub const EXIT_CONFIGURATION: u8 = 1;

/// Exit code for a failed STARTTLS upgrade.
pub const EXIT_STARTTLS: u8 = 2;

/// Exit code for rejected SMTP credentials.
pub const EXIT_AUTHENTICATION: u8 = 3;

/// Exit code for every other failure during a run.
pub const EXIT_FAILURE: u8 = 99;

/// All errors that can abort a report run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Required settings are missing or unusable.
    #[error("missing configuration values: {}", .0.join(", "))]
    Configuration(Vec<String>),

    /// The finance API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the server.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured base URL or a derived endpoint URL is invalid.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A response was valid JSON but not in the expected shape.
    #[error("unexpected response shape: {0}")]
    DataShape(String),

    /// The reporting period could not be derived from the given date.
    #[error("cannot derive a reporting period from {0}")]
    InvalidPeriod(NaiveDate),

    /// The HTML report template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Writing report output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sending the report email failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl ReportError {
    /// Returns `true` if the API reported the resource as missing.
    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Returns `true` for failures worth repeating an idempotent request for.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Configuration(_)
            | Self::Serialization(_)
            | Self::InvalidUrl(_)
            | Self::DataShape(_)
            | Self::InvalidPeriod(_)
            | Self::Template(_)
            | Self::Io(_)
            | Self::Delivery(_) => false,
        }
    }

    /// Process exit code for this error.
    #[inline]
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => EXIT_CONFIGURATION,
            Self::Delivery(DeliveryError::StartTls(_)) => EXIT_STARTTLS,
            Self::Delivery(DeliveryError::Authentication(_)) => EXIT_AUTHENTICATION,
            Self::Api { .. }
            | Self::Http(_)
            | Self::Serialization(_)
            | Self::InvalidUrl(_)
            | Self::DataShape(_)
            | Self::InvalidPeriod(_)
            | Self::Template(_)
            | Self::Io(_)
            | Self::Delivery(_) => EXIT_FAILURE,
        }
    }
}

/// Failures while handing the report to the SMTP server, one per stage.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The message could not be assembled (bad address, bad header).
    #[error("could not build message: {0}")]
    Message(String),

    /// The TCP connection or greeting failed.
    #[error("could not connect to SMTP server: {0}")]
    Connect(#[source] lettre::transport::smtp::Error),

    /// The STARTTLS upgrade failed.
    #[error("could not connect to SMTP server with STARTTLS: {0}")]
    StartTls(#[source] lettre::transport::smtp::Error),

    /// The server rejected the credentials.
    #[error("could not authenticate with SMTP server: {0}")]
    Authentication(#[source] lettre::transport::smtp::Error),

    /// The server refused the message.
    #[error("failed to send report: {0}")]
    Send(#[source] lettre::transport::smtp::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_serde_json() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = ReportError::from(serde_err);
        assert!(matches!(err, ReportError::Serialization(_)));
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn configuration_lists_every_missing_key() {
        let err = ReportError::Configuration(vec![
            "FIREFLY_URL or firefly-url in config.yaml".to_owned(),
            "SMTP_PORT or smtp.port in config.yaml".to_owned(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("FIREFLY_URL"));
        assert!(msg.contains("SMTP_PORT"));
        assert_eq!(err.exit_code(), EXIT_CONFIGURATION);
    }

    #[test]
    fn not_found_only_for_404() {
        let missing = ReportError::Api {
            status: 404,
            message: r#"{"message":"Resource not found"}"#.to_owned(),
        };
        let denied = ReportError::Api {
            status: 401,
            message: "Unauthenticated".to_owned(),
        };
        assert!(missing.is_not_found());
        assert!(!denied.is_not_found());
    }

    #[test]
    fn server_errors_are_retryable() {
        let busy = ReportError::Api {
            status: 503,
            message: String::new(),
        };
        let shape = ReportError::DataShape("no data".to_owned());
        assert!(busy.is_retryable());
        assert!(!shape.is_retryable());
    }

    #[test]
    fn api_and_shape_errors_use_catch_all_exit_code() {
        let api = ReportError::Api {
            status: 500,
            message: String::new(),
        };
        assert_eq!(api.exit_code(), EXIT_FAILURE);
        assert_eq!(
            ReportError::DataShape("x".to_owned()).exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn message_errors_use_catch_all_exit_code() {
        let err = ReportError::from(DeliveryError::Message("bad address".to_owned()));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(err.to_string().contains("bad address"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReportError>();
    }
}
