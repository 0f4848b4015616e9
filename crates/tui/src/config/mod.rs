use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;
use planner::PollPolicy;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/tripwise.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub auth_url: String,
    pub auth_api_key: String,
    pub storage_bucket: String,
    pub email: String,
    pub timezone: String,
    pub log_level: String,
    pub log_file: String,
    pub state_file: String,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub versions_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            auth_url: "http://127.0.0.1:54321".to_string(),
            auth_api_key: String::new(),
            storage_bucket: "trip-covers".to_string(),
            email: String::new(),
            timezone: "UTC".to_string(),
            log_level: "info".to_string(),
            log_file: "logs/tripwise_tui.log".to_string(),
            state_file: "config/tripwise_state.json".to_string(),
            poll_interval_ms: 2_000,
            poll_max_attempts: 150,
            versions_page_size: 20,
        }
    }
}

impl AppConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms.max(100)),
            max_attempts: self.poll_max_attempts.max(1),
        }
    }

    /// Display timezone; an unknown name falls back to UTC.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "unknown timezone, using UTC");
            Tz::UTC
        })
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "tripwise_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the backend API URL (e.g. http://127.0.0.1:8000).
    #[arg(long)]
    api_url: Option<String>,
    /// Override the auth provider URL.
    #[arg(long)]
    auth_url: Option<String>,
    /// Override the sign-in email (password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TRIPWISE_TUI"));
    let settings: AppConfig = builder.build()?.try_deserialize()?;

    Ok(apply_args(settings, args))
}

fn apply_args(mut settings: AppConfig, args: Args) -> AppConfig {
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(auth_url) = args.auth_url {
        settings.auth_url = auth_url;
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    settings
}
