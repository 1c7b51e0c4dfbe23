use directories::ProjectDirs;
use std::{
    collections::HashMap,
    env, fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

use crate::model::ForecastRequest;

/// The weather provider reports forecasts in fixed 3-hour steps.
pub const HOURS_PER_ENTRY: u32 = 3;

pub const DEFAULT_ALERT_MESSAGE: &str = "It will rain today! Don't forget to bring an umbrella!";
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Setting names as they appear in the `.env` file or the environment.
pub mod keys {
    pub const API_ENDPOINT: &str = "API_ENDPOINT";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const API_KEY: &str = "API_KEY";
    pub const FORECAST_HOURS: &str = "FORECAST_HOURS";
    pub const TWILIO_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
    pub const TWILIO_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
    pub const TWILIO_PHONE_NUMBER: &str = "TWILIO_PHONE_NUMBER";
    pub const MY_PHONE_NUMBER: &str = "MY_PHONE_NUMBER";
    pub const ALERT_MESSAGE: &str = "ALERT_MESSAGE";
    pub const TWILIO_API_BASE: &str = "TWILIO_API_BASE";
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error(
        "Missing required setting `{0}`.\n\
         Hint: add it to your .env file, export it, or run `rain-alert configure`."
    )]
    Missing(&'static str),

    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Settings for one rain check. Read-only once loaded.
#[derive(Clone, PartialEq)]
pub struct Config {
    api_endpoint: String,
    latitude: String,
    longitude: String,
    api_key: String,
    forecast_hours: u32,
    twilio_account_sid: String,
    twilio_auth_token: String,
    twilio_phone_number: String,
    my_phone_number: String,
    alert_message: String,
    twilio_api_base: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_endpoint", &self.api_endpoint)
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("api_key", &"<redacted>")
            .field("forecast_hours", &self.forecast_hours)
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field("twilio_auth_token", &"<redacted>")
            .field("twilio_phone_number", &self.twilio_phone_number)
            .field("my_phone_number", &self.my_phone_number)
            .field("alert_message", &self.alert_message)
            .field("twilio_api_base", &self.twilio_api_base)
            .finish()
    }
}

impl Config {
    /// Load settings from a dotenv file.
    ///
    /// Keys missing from the file are looked up in the process environment,
    /// so a missing file is fine as long as the environment has everything.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path.as_ref(), |key| env::var(key).ok())
    }

    /// Like [`Config::load`], with `fallback` standing in for the environment.
    fn load_with<F>(path: &Path, fallback: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_values = read_env_file(path)?;

        Self::from_lookup(|key| file_values.get(key).cloned().or_else(|| fallback(key)))
    }

    /// Build and validate a config from any key-value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let api_endpoint = required(keys::API_ENDPOINT)?;
        let latitude = required(keys::LATITUDE)?;
        let longitude = required(keys::LONGITUDE)?;
        let api_key = required(keys::API_KEY)?;
        let forecast_hours = required(keys::FORECAST_HOURS)?;
        let twilio_account_sid = required(keys::TWILIO_ACCOUNT_SID)?;
        let twilio_auth_token = required(keys::TWILIO_AUTH_TOKEN)?;
        let twilio_phone_number = required(keys::TWILIO_PHONE_NUMBER)?;
        let my_phone_number = required(keys::MY_PHONE_NUMBER)?;

        validate_coordinate(keys::LATITUDE, &latitude, 90.0)?;
        validate_coordinate(keys::LONGITUDE, &longitude, 180.0)?;

        let forecast_hours = forecast_hours
            .parse::<u32>()
            .map_err(|_| ConfigError::Invalid {
                key: keys::FORECAST_HOURS,
                reason: format!(
                    "expected a non-negative whole number of hours, got '{forecast_hours}'"
                ),
            })?;

        let alert_message = match lookup(keys::ALERT_MESSAGE) {
            Some(msg) if msg.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    key: keys::ALERT_MESSAGE,
                    reason: "message body must not be empty".to_string(),
                });
            }
            Some(msg) => msg,
            None => DEFAULT_ALERT_MESSAGE.to_string(),
        };

        let twilio_api_base = lookup(keys::TWILIO_API_BASE)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string());

        Ok(Self {
            api_endpoint,
            latitude,
            longitude,
            api_key,
            forecast_hours,
            twilio_account_sid,
            twilio_auth_token,
            twilio_phone_number,
            my_phone_number,
            alert_message,
            twilio_api_base,
        })
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    pub fn longitude(&self) -> &str {
        &self.longitude
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn forecast_hours(&self) -> u32 {
        self.forecast_hours
    }

    pub fn twilio_account_sid(&self) -> &str {
        &self.twilio_account_sid
    }

    pub fn twilio_auth_token(&self) -> &str {
        &self.twilio_auth_token
    }

    pub fn twilio_phone_number(&self) -> &str {
        &self.twilio_phone_number
    }

    pub fn my_phone_number(&self) -> &str {
        &self.my_phone_number
    }

    pub fn alert_message(&self) -> &str {
        &self.alert_message
    }

    pub fn twilio_api_base(&self) -> &str {
        &self.twilio_api_base
    }

    /// Number of 3-hour forecast entries covering the look-ahead window.
    pub fn entry_count(&self) -> u32 {
        self.forecast_hours / HOURS_PER_ENTRY
    }

    pub fn forecast_request(&self) -> ForecastRequest {
        ForecastRequest {
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            api_key: self.api_key.clone(),
            count: self.entry_count(),
        }
    }

    /// Save config as a dotenv file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        fs::write(path, self.to_env_string()).map_err(write_err)?;
        debug!(path = %path.display(), "Configuration saved");

        Ok(())
    }

    fn to_env_string(&self) -> String {
        let forecast_hours = self.forecast_hours.to_string();
        let mut entries = vec![
            (keys::API_ENDPOINT, self.api_endpoint.as_str()),
            (keys::LATITUDE, self.latitude.as_str()),
            (keys::LONGITUDE, self.longitude.as_str()),
            (keys::API_KEY, self.api_key.as_str()),
            (keys::FORECAST_HOURS, forecast_hours.as_str()),
            (keys::TWILIO_ACCOUNT_SID, self.twilio_account_sid.as_str()),
            (keys::TWILIO_AUTH_TOKEN, self.twilio_auth_token.as_str()),
            (keys::TWILIO_PHONE_NUMBER, self.twilio_phone_number.as_str()),
            (keys::MY_PHONE_NUMBER, self.my_phone_number.as_str()),
        ];
        if self.alert_message != DEFAULT_ALERT_MESSAGE {
            entries.push((keys::ALERT_MESSAGE, self.alert_message.as_str()));
        }
        if self.twilio_api_base != DEFAULT_TWILIO_API_BASE {
            entries.push((keys::TWILIO_API_BASE, self.twilio_api_base.as_str()));
        }

        entries
            .into_iter()
            .map(|(key, value)| format!("{key}=\"{}\"\n", escape_value(value)))
            .collect()
    }

    /// `./.env` when present, otherwise the platform config directory.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(".env");
        if local.exists() {
            return local;
        }

        ProjectDirs::from("dev", "rain-alert", "rain-alert")
            .map(|dirs| dirs.config_dir().join(".env"))
            .unwrap_or(local)
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let read_err = |source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            debug!(path = %path.display(), "No config file, using the environment only");
            return Ok(HashMap::new());
        }
        Err(err) => return Err(read_err(err)),
    };

    iter.collect::<Result<HashMap<_, _>, _>>().map_err(read_err)
}

fn validate_coordinate(key: &'static str, value: &str, limit: f64) -> Result<(), ConfigError> {
    let parsed = value.parse::<f64>().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("expected a number, got '{value}'"),
    })?;

    if !(-limit..=limit).contains(&parsed) {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("{parsed} is outside -{limit}..={limit}"),
        });
    }

    Ok(())
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
