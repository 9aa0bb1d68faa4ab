use crate::error::ConfigError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
/// STARTTLS submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Mail credentials and routing for submission notices
///
/// Read once at startup and handed to the mailer on every send, so tests and
/// callers can supply their own values without touching process state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailConfig {
    #[serde(rename = "SENDER_EMAIL", default)]
    pub sender_email: Option<String>,

    #[serde(rename = "SENDER_PASSWORD", default)]
    pub sender_password: Option<String>,

    #[serde(rename = "RECIPIENT_EMAIL", default)]
    pub recipient_email: Option<String>,

    #[serde(rename = "SMTP_SERVER", default)]
    pub smtp_server: Option<String>,

    #[serde(rename = "SMTP_PORT", default)]
    pub smtp_port: Option<u16>,
}

impl MailConfig {
    /// Load the configuration file
    ///
    /// A missing file is not an error: the service keeps running and
    /// notifications are skipped. Malformed JSON is reported.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "No config file at {}; mail notifications are disabled",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// True when sender, password and recipient are all present and non-empty
    pub fn is_complete(&self) -> bool {
        [
            &self.sender_email,
            &self.sender_password,
            &self.recipient_email,
        ]
        .iter()
        .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }

    pub fn server(&self) -> &str {
        self.smtp_server.as_deref().unwrap_or(DEFAULT_SMTP_SERVER)
    }

    pub fn port(&self) -> u16 {
        self.smtp_port.unwrap_or(DEFAULT_SMTP_PORT)
    }
}

/// Command line options for the survey intake server
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "survey_server", about = "Software request survey intake service")]
pub struct ServerConfig {
    /// JSON file holding SENDER_EMAIL, SENDER_PASSWORD and RECIPIENT_EMAIL
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Directory receiving the daily request_YYYYMMDD.csv files
    #[arg(long, default_value = "./sw_requests")]
    pub save_dir: String,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Directory served under /static
    #[arg(long, default_value = "static")]
    pub static_dir: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Command line options for the chart viewer
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "chart_viewer", about = "Line chart viewer for spreadsheet data")]
pub struct ChartArgs {
    /// Spreadsheet (.xlsx, .xls, .ods) or .csv file to plot
    pub path: String,

    /// Sheet to read from the workbook
    #[arg(long, default_value = "Sheet2")]
    pub sheet: String,

    /// Export resolution in dots per inch
    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    /// Where the live preview image is written after every change
    #[arg(long)]
    pub preview: Option<String>,
}
