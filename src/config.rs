//! Run configuration.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, environment variables, and a YAML file. Each layer is read into
//! a [`RawConfig`] of optional strings; the layers are merged with
//! [`RawConfig::or`] and validated once with [`RawConfig::resolve`].

use core::time::Duration;
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::delivery::{SmtpCredentials, SmtpSettings};
use crate::error::{ReportError, Result};
use crate::report::ReportOptions;

/// YAML file read when no other path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Per-request timeout when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Unvalidated settings from one source. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    /// `FIREFLY_URL` / `firefly-url`.
    pub firefly_url: Option<String>,
    /// `ACCESSTOKEN` / `accesstoken`.
    pub access_token: Option<String>,
    /// `CURRENCY` / `currency`.
    pub currency: Option<String>,
    /// `CURRENCYSYMBOL` / `currencySymbol`.
    pub currency_symbol: Option<String>,
    /// `EMAIL_FROM` / `email.from`.
    pub email_from: Option<String>,
    /// `EMAIL_TO` (comma separated) / `email.to` (string or list).
    pub email_to: Option<Vec<String>>,
    /// `SMTP_SERVER` / `smtp.server`.
    pub smtp_server: Option<String>,
    /// `SMTP_PORT` / `smtp.port`.
    pub smtp_port: Option<String>,
    /// `SMTP_STARTTLS` / `smtp.starttls`.
    pub smtp_starttls: Option<String>,
    /// `SMTP_AUTHENTICATION` / `smtp.authentication`.
    pub smtp_authentication: Option<String>,
    /// `SMTP_USER` / `smtp.user`.
    pub smtp_user: Option<String>,
    /// `SMTP_PASSWORD` / `smtp.password`.
    pub smtp_password: Option<String>,
    /// `REQUEST_TIMEOUT` / `request-timeout`, in seconds.
    pub request_timeout: Option<String>,
}

impl RawConfig {
    /// Reads settings from the process environment.
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps an environment variable
    /// name to its value.
    #[must_use]
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self {
            firefly_url: lookup("FIREFLY_URL"),
            access_token: lookup("ACCESSTOKEN"),
            currency: lookup("CURRENCY"),
            currency_symbol: lookup("CURRENCYSYMBOL"),
            email_from: lookup("EMAIL_FROM"),
            email_to: lookup("EMAIL_TO").map(|list| split_recipients(&list)),
            smtp_server: lookup("SMTP_SERVER"),
            smtp_port: lookup("SMTP_PORT"),
            smtp_starttls: lookup("SMTP_STARTTLS"),
            smtp_authentication: lookup("SMTP_AUTHENTICATION"),
            smtp_user: lookup("SMTP_USER"),
            smtp_password: lookup("SMTP_PASSWORD"),
            request_timeout: lookup("REQUEST_TIMEOUT"),
        }
        .without_blanks()
    }

    /// Reads settings from a YAML file.
    ///
    /// A missing file yields no settings. A file that cannot be read or
    /// parsed is logged and ignored.
    #[must_use]
    pub fn from_file(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file");
            return Self::default();
        }
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read configuration file, ignoring it");
                return Self::default();
            }
        };
        match Self::from_yaml(&text) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded configuration file");
                config
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to parse configuration file, ignoring it");
                Self::default()
            }
        }
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed YAML or mistyped sections.
    pub fn from_yaml(text: &str) -> core::result::Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: FileConfig = serde_yaml::from_str(text)?;
        Ok(file.into_raw())
    }

    /// Fills every unset field from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            firefly_url: self.firefly_url.or(fallback.firefly_url),
            access_token: self.access_token.or(fallback.access_token),
            currency: self.currency.or(fallback.currency),
            currency_symbol: self.currency_symbol.or(fallback.currency_symbol),
            email_from: self.email_from.or(fallback.email_from),
            email_to: self.email_to.or(fallback.email_to),
            smtp_server: self.smtp_server.or(fallback.smtp_server),
            smtp_port: self.smtp_port.or(fallback.smtp_port),
            smtp_starttls: self.smtp_starttls.or(fallback.smtp_starttls),
            smtp_authentication: self.smtp_authentication.or(fallback.smtp_authentication),
            smtp_user: self.smtp_user.or(fallback.smtp_user),
            smtp_password: self.smtp_password.or(fallback.smtp_password),
            request_timeout: self.request_timeout.or(fallback.request_timeout),
        }
    }

    /// Validates the merged settings.
    ///
    /// With `require_delivery` unset (a dry run), mail settings are
    /// optional and [`Config::delivery`] is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Configuration`] naming every missing or
    /// unusable value at once.
    pub fn resolve(self, require_delivery: bool) -> Result<Config> {
        let raw = self.without_blanks();
        let mut missing = Vec::new();

        let firefly_url = raw.firefly_url.clone();
        if firefly_url.is_none() {
            missing.push(describe("FIREFLY_URL", "firefly-url"));
        }
        let access_token = raw.access_token.clone();
        if access_token.is_none() {
            missing.push(describe("ACCESSTOKEN", "accesstoken"));
        }
        let request_timeout = match raw.request_timeout.as_deref() {
            None => Some(DEFAULT_REQUEST_TIMEOUT),
            Some(seconds) => seconds.trim().parse().ok().map(Duration::from_secs),
        };
        if request_timeout.is_none() {
            missing.push(format!(
                "{} (whole seconds)",
                describe("REQUEST_TIMEOUT", "request-timeout")
            ));
        }

        let timeout = request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let delivery = if require_delivery {
            raw.delivery(timeout, &mut missing)
        } else {
            None
        };

        match (firefly_url, access_token, request_timeout) {
            (Some(url), Some(token), Some(request_timeout)) if missing.is_empty() => {
                tracing::info!("configuration loaded");
                Ok(Config {
                    firefly_url: url,
                    access_token: SecretString::from(token),
                    currency: raw.currency,
                    currency_symbol: raw.currency_symbol,
                    request_timeout,
                    delivery,
                })
            }
            _ => Err(ReportError::Configuration(missing)),
        }
    }

    /// Validates the mail settings, recording what is missing.
    fn delivery(&self, timeout: Duration, missing: &mut Vec<String>) -> Option<DeliveryConfig> {
        let server = self.smtp_server.clone();
        if server.is_none() {
            missing.push(describe("SMTP_SERVER", "smtp.server"));
        }
        let port = self
            .smtp_port
            .as_deref()
            .and_then(|port| port.trim().parse::<u16>().ok())
            .filter(|&port| port != 0);
        if port.is_none() {
            missing.push(describe("SMTP_PORT", "smtp.port"));
        }
        let from = self.email_from.clone();
        if from.is_none() {
            missing.push(describe("EMAIL_FROM", "email.from"));
        }
        let to = self.email_to.clone().filter(|to| !to.is_empty());
        if to.is_none() {
            missing.push(describe("EMAIL_TO", "email.to"));
        }

        let starttls = parse_bool(self.smtp_starttls.as_deref(), true);
        let credentials = if parse_bool(self.smtp_authentication.as_deref(), true) {
            if self.smtp_user.is_none() {
                missing.push(describe("SMTP_USER", "smtp.user"));
            }
            if self.smtp_password.is_none() {
                missing.push(describe("SMTP_PASSWORD", "smtp.password"));
            }
            match (self.smtp_user.clone(), self.smtp_password.clone()) {
                (Some(user), Some(password)) => Some(SmtpCredentials {
                    user,
                    password: SecretString::from(password),
                }),
                _ => return None,
            }
        } else {
            None
        };

        Some(DeliveryConfig {
            from: from?,
            to: to?,
            smtp: SmtpSettings {
                server: server?,
                port: port?,
                starttls,
                credentials,
                timeout,
            },
        })
    }

    /// Treats empty and whitespace-only values as unset.
    fn without_blanks(self) -> Self {
        Self {
            firefly_url: non_blank(self.firefly_url),
            access_token: non_blank(self.access_token),
            currency: non_blank(self.currency),
            currency_symbol: non_blank(self.currency_symbol),
            email_from: non_blank(self.email_from),
            email_to: self.email_to,
            smtp_server: non_blank(self.smtp_server),
            smtp_port: non_blank(self.smtp_port),
            smtp_starttls: non_blank(self.smtp_starttls),
            smtp_authentication: non_blank(self.smtp_authentication),
            smtp_user: non_blank(self.smtp_user),
            smtp_password: non_blank(self.smtp_password),
            request_timeout: non_blank(self.request_timeout),
        }
    }
}

/// Validated settings for one run.
#[derive(Debug)]
pub struct Config {
    /// Firefly III base URL.
    pub firefly_url: String,
    /// Personal access token.
    pub access_token: SecretString,
    /// Reporting currency code.
    pub currency: Option<String>,
    /// Symbol printed before amounts.
    pub currency_symbol: Option<String>,
    /// Per-request timeout for API and SMTP calls.
    pub request_timeout: Duration,
    /// Mail settings; `None` for a dry run.
    pub delivery: Option<DeliveryConfig>,
}

impl Config {
    /// Currency options for the report engine.
    #[inline]
    #[must_use]
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            currency: self.currency.clone(),
            currency_symbol: self.currency_symbol.clone(),
        }
    }
}

/// Sender, recipients and server for the report email.
#[derive(Debug)]
pub struct DeliveryConfig {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// SMTP server.
    pub smtp: SmtpSettings,
}

/// Interprets a flag value; `1`, `true`, `yes` and `on` are true.
#[must_use]
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    value.map_or(default, |raw| {
        matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// Splits a comma separated recipient list.
fn split_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Drops empty values.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Names a setting by both of its sources.
fn describe(env: &str, yaml: &str) -> String {
    format!("{env} or {yaml} in {DEFAULT_CONFIG_FILE}")
}

/// Layout of the YAML file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    /// Base URL.
    #[serde(rename = "firefly-url", default)]
    firefly_url: Option<Scalar>,
    /// Access token.
    #[serde(default)]
    accesstoken: Option<Scalar>,
    /// Currency code.
    #[serde(default)]
    currency: Option<Scalar>,
    /// Currency symbol.
    #[serde(rename = "currencySymbol", default)]
    currency_symbol: Option<Scalar>,
    /// Request timeout in seconds.
    #[serde(rename = "request-timeout", default)]
    request_timeout: Option<Scalar>,
    /// `email` section.
    #[serde(default)]
    email: Option<FileEmail>,
    /// `smtp` section.
    #[serde(default)]
    smtp: Option<FileSmtp>,
}

/// `email` section of the YAML file.
#[derive(Debug, Default, Deserialize)]
struct FileEmail {
    /// Sender.
    #[serde(default)]
    from: Option<Scalar>,
    /// Recipients.
    #[serde(default)]
    to: Option<Recipients>,
}

/// `smtp` section of the YAML file.
#[derive(Debug, Default, Deserialize)]
struct FileSmtp {
    /// Host.
    #[serde(default)]
    server: Option<Scalar>,
    /// Port.
    #[serde(default)]
    port: Option<Scalar>,
    /// STARTTLS flag.
    #[serde(default)]
    starttls: Option<Scalar>,
    /// Authentication flag.
    #[serde(default)]
    authentication: Option<Scalar>,
    /// User name.
    #[serde(default)]
    user: Option<Scalar>,
    /// Password.
    #[serde(default)]
    password: Option<Scalar>,
}

/// `email.to`: one comma separated string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Recipients {
    /// YAML sequence.
    List(Vec<Scalar>),
    /// Single string.
    One(Scalar),
}

/// A YAML scalar of any type, read back as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    /// `true` / `false`.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Text(String),
}

impl Scalar {
    /// Text form of the value.
    fn into_text(self) -> String {
        match self {
            Self::Bool(flag) => flag.to_string(),
            Self::Int(number) => number.to_string(),
            Self::Float(number) => number.to_string(),
            Self::Text(text) => text,
        }
    }
}

impl FileConfig {
    /// Flattens the file layout into a [`RawConfig`].
    fn into_raw(self) -> RawConfig {
        let email = self.email.unwrap_or_default();
        let smtp = self.smtp.unwrap_or_default();
        let email_to = email.to.map(|recipients| match recipients {
            Recipients::List(list) => list
                .into_iter()
                .map(Scalar::into_text)
                .map(|address| address.trim().to_owned())
                .filter(|address| !address.is_empty())
                .collect(),
            Recipients::One(list) => split_recipients(&list.into_text()),
        });
        RawConfig {
            firefly_url: self.firefly_url.map(Scalar::into_text),
            access_token: self.accesstoken.map(Scalar::into_text),
            currency: self.currency.map(Scalar::into_text),
            currency_symbol: self.currency_symbol.map(Scalar::into_text),
            email_from: email.from.map(Scalar::into_text),
            email_to,
            smtp_server: smtp.server.map(Scalar::into_text),
            smtp_port: smtp.port.map(Scalar::into_text),
            smtp_starttls: smtp.starttls.map(Scalar::into_text),
            smtp_authentication: smtp.authentication.map(Scalar::into_text),
            smtp_user: smtp.user.map(Scalar::into_text),
            smtp_password: smtp.password.map(Scalar::into_text),
            request_timeout: self.request_timeout.map(Scalar::into_text),
        }
        .without_blanks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret as _;
    use std::collections::HashMap;
    use std::io::Write as _;

    const FULL_YAML: &str = "
firefly-url: https://firefly.example.com
accesstoken: file-token
currency: EUR
currencySymbol: \"€\"
email:
  from: report@example.com
  to:
    - one@example.com
    - two@example.com
smtp:
  server: mail.example.com
  port: 587
  starttls: true
  authentication: true
  user: mailer
  password: hunter2
";

    fn env(pairs: &[(&str, &str)]) -> RawConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        RawConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn full_file_resolves() {
        let config = RawConfig::from_yaml(FULL_YAML).unwrap().resolve(true).unwrap();
        assert_eq!(config.firefly_url, "https://firefly.example.com");
        assert_eq!(config.access_token.expose_secret(), "file-token");
        assert_eq!(config.currency_symbol.as_deref(), Some("€"));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        let delivery = config.delivery.unwrap();
        assert_eq!(delivery.to, vec!["one@example.com", "two@example.com"]);
        assert_eq!(delivery.smtp.port, 587);
        assert!(delivery.smtp.starttls);
        assert_eq!(delivery.smtp.credentials.unwrap().user, "mailer");
    }

    #[test]
    fn environment_overrides_file() {
        let file = RawConfig::from_yaml(FULL_YAML).unwrap();
        let config = env(&[("ACCESSTOKEN", "env-token"), ("EMAIL_TO", "a@example.com, b@example.com,")])
            .or(file)
            .resolve(true)
            .unwrap();
        assert_eq!(config.access_token.expose_secret(), "env-token");
        assert_eq!(config.delivery.unwrap().to, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn all_missing_values_are_reported_together() {
        let err = RawConfig::default().resolve(true).unwrap_err();
        let ReportError::Configuration(missing) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(
            missing,
            vec![
                "FIREFLY_URL or firefly-url in config.yaml",
                "ACCESSTOKEN or accesstoken in config.yaml",
                "SMTP_SERVER or smtp.server in config.yaml",
                "SMTP_PORT or smtp.port in config.yaml",
                "EMAIL_FROM or email.from in config.yaml",
                "EMAIL_TO or email.to in config.yaml",
                "SMTP_USER or smtp.user in config.yaml",
                "SMTP_PASSWORD or smtp.password in config.yaml",
            ]
        );
    }

    #[test]
    fn dry_run_needs_only_api_settings() {
        let config = env(&[("FIREFLY_URL", "http://localhost"), ("ACCESSTOKEN", "t")])
            .resolve(false)
            .unwrap();
        assert!(config.delivery.is_none());
    }

    #[test]
    fn credentials_optional_without_authentication() {
        let config = env(&[
            ("FIREFLY_URL", "http://localhost"),
            ("ACCESSTOKEN", "t"),
            ("SMTP_SERVER", "localhost"),
            ("SMTP_PORT", "25"),
            ("SMTP_STARTTLS", "off"),
            ("SMTP_AUTHENTICATION", "no"),
            ("EMAIL_FROM", "a@example.com"),
            ("EMAIL_TO", "b@example.com"),
        ])
        .resolve(true)
        .unwrap();
        let smtp = config.delivery.unwrap().smtp;
        assert!(!smtp.starttls);
        assert!(smtp.credentials.is_none());
    }

    #[test]
    fn unparsable_port_counts_as_missing() {
        let err = env(&[
            ("FIREFLY_URL", "http://localhost"),
            ("ACCESSTOKEN", "t"),
            ("SMTP_SERVER", "localhost"),
            ("SMTP_PORT", "smtp"),
            ("SMTP_AUTHENTICATION", "0"),
            ("EMAIL_FROM", "a@example.com"),
            ("EMAIL_TO", "b@example.com"),
        ])
        .resolve(true)
        .unwrap_err();
        assert_eq!(err.to_string(), "missing configuration values: SMTP_PORT or smtp.port in config.yaml");
    }

    #[test]
    fn invalid_timeout_is_reported() {
        let err = env(&[
            ("FIREFLY_URL", "http://localhost"),
            ("ACCESSTOKEN", "t"),
            ("REQUEST_TIMEOUT", "soon"),
        ])
        .resolve(false)
        .unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT"));
    }

    #[test]
    fn custom_timeout_is_used() {
        let config = env(&[
            ("FIREFLY_URL", "http://localhost"),
            ("ACCESSTOKEN", "t"),
            ("REQUEST_TIMEOUT", "5"),
        ])
        .resolve(false)
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let raw = env(&[("FIREFLY_URL", "  "), ("CURRENCY", "")]);
        assert_eq!(raw.firefly_url, None);
        assert_eq!(raw.currency, None);
    }

    #[test]
    fn boolean_spellings() {
        for truthy in ["1", "true", "YES", " On "] {
            assert!(parse_bool(Some(truthy), false), "{truthy}");
        }
        for falsy in ["0", "false", "nope", ""] {
            assert!(!parse_bool(Some(falsy), true), "{falsy}");
        }
        assert!(parse_bool(None, true));
    }

    #[test]
    fn recipients_as_comma_separated_string() {
        let raw = RawConfig::from_yaml("email:\n  to: a@example.com, b@example.com\n").unwrap();
        assert_eq!(
            raw.email_to,
            Some(vec!["a@example.com".to_owned(), "b@example.com".to_owned()])
        );
    }

    #[test]
    fn file_is_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_YAML.as_bytes()).unwrap();

        let raw = RawConfig::from_file(file.path());
        assert_eq!(raw.smtp_port.as_deref(), Some("587"));
        assert_eq!(raw.smtp_starttls.as_deref(), Some("true"));
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"firefly-url: [unclosed\n").unwrap();

        assert_eq!(RawConfig::from_file(file.path()), RawConfig::default());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawConfig::from_file(&dir.path().join("config.yaml"));
        assert_eq!(raw, RawConfig::default());
    }

    #[test]
    fn empty_file_is_empty() {
        assert_eq!(RawConfig::from_yaml("\n").unwrap(), RawConfig::default());
    }
}
