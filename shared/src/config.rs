//! Configuration management for Lambda functions.

use std::env;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// ARN of the secret containing the LINE channel secret and access token.
    /// Only the webhook needs it.
    pub line_secret_arn: Option<String>,
    /// Public-holiday REST endpoint; `None` disables holiday coloring
    pub holiday_api_url: Option<String>,
    /// Service key for the holiday endpoint
    pub holiday_api_key: Option<String>,
    /// Offset used to decide what "today" is for a check-in
    pub utc_offset_hours: i32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let utc_offset_hours = match env::var("UTC_OFFSET_HOURS") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("UTC_OFFSET_HOURS '{}': {}", raw, e)))?,
            Err(_) => 9,
        };

        Ok(Self {
            db_host: required("DB_HOST")?,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "attendance".to_string()),
            db_secret_arn: required("DB_SECRET_ARN")?,
            line_secret_arn: env::var("LINE_SECRET_ARN").ok(),
            holiday_api_url: env::var("HOLIDAY_API_URL").ok(),
            holiday_api_key: env::var("HOLIDAY_API_KEY").ok(),
            utc_offset_hours,
        })
    }

    /// `LINE_SECRET_ARN`, for functions that cannot run without it.
    pub fn require_line_secret_arn(&self) -> Result<&str> {
        self.line_secret_arn
            .as_deref()
            .ok_or_else(|| Error::Config("LINE_SECRET_ARN not set".to_string()))
    }

    /// The configured fixed offset, falling back to UTC if out of range.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Today's date in the configured offset.
    pub fn local_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_offset(hours: i32) -> Config {
        Config {
            db_host: "localhost".into(),
            db_name: "attendance".into(),
            db_secret_arn: "arn".into(),
            line_secret_arn: None,
            holiday_api_url: None,
            holiday_api_key: None,
            utc_offset_hours: hours,
        }
    }

    #[test]
    fn test_offset() {
        assert_eq!(config_with_offset(9).offset().local_minus_utc(), 9 * 3600);
        // 30 hours is outside what FixedOffset accepts
        assert_eq!(config_with_offset(30).offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_line_secret_arn_is_required() {
        let mut config = config_with_offset(9);
        assert!(matches!(config.require_line_secret_arn(), Err(Error::Config(_))));

        config.line_secret_arn = Some("arn:line".into());
        assert_eq!(config.require_line_secret_arn().unwrap(), "arn:line");
    }
}
