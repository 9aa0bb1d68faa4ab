use thiserror::Error;

/// Errors raised while reading a spreadsheet or CSV table
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sheet '{0}' not found (available: {1})")]
    SheetNotFound(String, String),

    #[error("Sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised while accepting a survey submission
#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("save task failed: {0}")]
    Task(String),
}

/// Errors raised by the chart viewer and exporter
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("no {0} checkbox named '{1}'")]
    UnknownToggle(&'static str, String),

    #[error("drawing error: {0}")]
    Draw(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading the JSON configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while sending a notification email
#[cfg(feature = "web")]
#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail configuration is incomplete")]
    MissingConfig,

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
