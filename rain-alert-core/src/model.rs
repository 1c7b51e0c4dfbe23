use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::Config;

/// One 3-hour slot from the provider's `list` array.
///
/// Kept as raw JSON so a single oddly-shaped entry never fails the whole
/// response; fields are read on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastEntry(Value);

impl ForecastEntry {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// First condition code (`weather[0].id`), if the entry has one.
    pub fn condition_code(&self) -> Option<i64> {
        self.0.get("weather")?.get(0)?.get("id")?.as_i64()
    }

    /// Start of the slot, from the unix `dt` field.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let ts = self.0.get("dt")?.as_i64()?;
        DateTime::from_timestamp(ts, 0)
    }
}

/// Query for one forecast call: `lat`, `lon`, `appid`, `cnt`.
#[derive(Clone, PartialEq)]
pub struct ForecastRequest {
    pub latitude: String,
    pub longitude: String,
    pub api_key: String,
    pub count: u32,
}

impl ForecastRequest {
    pub fn query(&self) -> [(&'static str, String); 4] {
        [
            ("lat", self.latitude.clone()),
            ("lon", self.longitude.clone()),
            ("appid", self.api_key.clone()),
            ("cnt", self.count.to_string()),
        ]
    }
}

impl fmt::Debug for ForecastRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastRequest")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("api_key", &"<redacted>")
            .field("count", &self.count)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub body: String,
    pub from: String,
    pub to: String,
}

impl OutboundMessage {
    pub fn from_config(config: &Config) -> Self {
        Self {
            body: config.alert_message().to_string(),
            from: config.twilio_phone_number().to_string(),
            to: config.my_phone_number().to_string(),
        }
    }
}

/// Acceptance receipt returned by the messaging provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryReceipt {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}
