//! Command line and environment configuration

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::error::ConfigError;
use crate::timeframe::{Bound, DateRange, Timeframe, parse_bound};

pub const DEFAULT_API_BASE_URL: &str = "https://api.zoom.us/v2";
pub const DEFAULT_TOKEN_URL: &str = "https://zoom.us/oauth/token";

/// Download Zoom Contact Center call recordings for a date range
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server-to-Server OAuth app account ID
    #[arg(long, env = "ACCOUNT_ID", hide_env_values = true)]
    pub account_id: Option<String>,

    /// Server-to-Server OAuth app client ID
    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Server-to-Server OAuth app client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Inclusive range start (YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD)
    #[arg(long = "from", env = "START_DATE")]
    pub start_date: Option<String>,

    /// Inclusive range end (YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD)
    #[arg(long = "to", env = "END_DATE")]
    pub end_date: Option<String>,

    /// Named range used when --from/--to are not given
    #[arg(long, env = "TIMEFRAME", value_enum, default_value_t = Timeframe::LastWeek)]
    pub timeframe: Timeframe,

    /// Directory the recordings are written to [default: ~/Desktop/Recordings]
    #[arg(long = "output", env = "RECORDING_PATH")]
    pub recording_path: Option<PathBuf>,

    /// Channel type filter for the recordings query
    #[arg(long, env = "CHANNEL_TYPE", default_value = "voice")]
    pub channel_type: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    #[arg(long, env = "ZOOM_API_BASE_URL", default_value = DEFAULT_API_BASE_URL, hide = true)]
    pub api_base_url: String,

    #[arg(long, env = "ZOOM_TOKEN_URL", default_value = DEFAULT_TOKEN_URL, hide = true)]
    pub token_url: String,
}

#[derive(Clone)]
pub struct Credentials {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_base_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub range: DateRange,
    pub output_dir: PathBuf,
    pub channel_type: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl Config {
    /// Validate parsed arguments, resolving the timeframe against the local date
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        Self::from_args_on(args, Local::now().date_naive())
    }

    pub fn from_args_on(args: Args, today: NaiveDate) -> Result<Self, ConfigError> {
        let credentials = Credentials {
            account_id: required(args.account_id, "ACCOUNT_ID")?,
            client_id: required(args.client_id, "CLIENT_ID")?,
            client_secret: required(args.client_secret, "CLIENT_SECRET")?,
        };

        let fallback = args.timeframe.range(today);
        let from = match args.start_date.as_deref() {
            Some(value) => parse_bound("START_DATE", value, Bound::Start)?,
            None => fallback.from,
        };
        let to = match args.end_date.as_deref() {
            Some(value) => parse_bound("END_DATE", value, Bound::End)?,
            None => fallback.to,
        };

        let output_dir = match args.recording_path {
            Some(path) => path,
            None => default_recording_path()?,
        };

        Ok(Self {
            credentials,
            range: DateRange::new(from, to),
            output_dir,
            channel_type: args.channel_type,
            timeout: Duration::from_secs(args.timeout_secs),
            endpoints: Endpoints {
                api_base_url: args.api_base_url.trim_end_matches('/').to_string(),
                token_url: args.token_url,
            },
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn default_recording_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join("Desktop").join("Recordings"))
        .ok_or(ConfigError::NoHomeDir)
}
