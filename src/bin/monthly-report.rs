//! Builds last month's Firefly III report and emails it.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use monthly_report::client::FireflyClient;
use monthly_report::config::{DEFAULT_CONFIG_FILE, RawConfig};
use monthly_report::delivery::{SmtpMailer, build_message};
use monthly_report::error::Result;
use monthly_report::period::ReportingPeriod;
use monthly_report::render::render;
use monthly_report::report::build_report;
use owo_colors::OwoColorize;
use secrecy::ExposeSecret as _;
use tracing_subscriber::EnvFilter;

/// Environment variable with the fallback log level.
const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Firefly III monthly report: budgets, spending and savings for the
/// previous month, sent by email.
#[derive(Debug, Parser)]
#[command(name = "monthly-report", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Print the plain text report instead of sending it.
    #[arg(long)]
    dry_run: bool,
    /// Firefly III base URL (overrides FIREFLY_URL).
    #[arg(long, value_name = "URL")]
    firefly_url: Option<String>,
    /// Reporting currency code, e.g. EUR (overrides CURRENCY).
    #[arg(long, value_name = "CODE")]
    currency: Option<String>,
    /// Symbol printed before amounts (overrides CURRENCYSYMBOL).
    #[arg(long, value_name = "SYMBOL")]
    currency_symbol: Option<String>,
    /// Recipients, comma separated (overrides EMAIL_TO).
    #[arg(long, value_name = "ADDRESSES", value_delimiter = ',')]
    email_to: Option<Vec<String>>,
    /// Per-request timeout in seconds (overrides REQUEST_TIMEOUT).
    #[arg(long, value_name = "SECONDS")]
    request_timeout: Option<u64>,
}

impl Cli {
    /// Settings given on the command line.
    fn overrides(&self) -> RawConfig {
        RawConfig {
            firefly_url: self.firefly_url.clone(),
            currency: self.currency.clone(),
            currency_symbol: self.currency_symbol.clone(),
            email_to: self.email_to.clone(),
            request_timeout: self.request_timeout.map(|seconds| seconds.to_string()),
            ..RawConfig::default()
        }
    }
}

/// Log filter from `RUST_LOG`, else `LOG_LEVEL`, else `info`.
fn log_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| EnvFilter::try_new(level.trim().to_ascii_lowercase()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Builds the report and sends or prints it.
fn run(cli: &Cli) -> Result<()> {
    let config = cli
        .overrides()
        .or(RawConfig::from_env())
        .or(RawConfig::from_file(&cli.config))
        .resolve(!cli.dry_run)?;

    let client = FireflyClient::builder()
        .token(config.access_token.expose_secret())
        .base_url(config.firefly_url.as_str())
        .timeout(config.request_timeout)
        .build()?;
    match client.about() {
        Ok(about) => tracing::info!(
            version = %about.version,
            api_version = about.api_version.as_deref().unwrap_or("unknown"),
            "connected to Firefly III"
        ),
        Err(err) => tracing::warn!(error = %err, "could not read server version"),
    }

    let period = ReportingPeriod::last_month()?;
    tracing::info!(start = %period.start(), end = %period.end(), "reporting period");
    let report = build_report(&client, period, config.report_options())?;
    let rendered = render(&report)?;

    let Some(delivery) = config.delivery else {
        writeln!(io::stdout().lock(), "{}", rendered.text)?;
        return Ok(());
    };
    let message = build_message(&delivery.from, &delivery.to, &rendered)?;
    SmtpMailer::new(delivery.smtp).send(&message)?;
    tracing::info!(recipients = %delivery.to.join(", "), "monthly report sent");
    Ok(())
}

fn main() -> ExitCode {
    let _dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("starting monthly report");
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "monthly report failed");
            let _ignored = writeln!(io::stderr().lock(), "{} {err}", "error:".red().bold());
            ExitCode::from(err.exit_code())
        }
    }
}
