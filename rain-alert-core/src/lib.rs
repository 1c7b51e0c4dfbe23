//! Core library for the `rain-alert` notifier.
//!
//! This crate defines:
//! - Configuration loading from a `.env` file or the environment
//! - The forecast client and the rain predicate
//! - The SMS notification client
//! - The orchestrator that ties one check together
//!
//! It is used by `rain-alert-cli`, but the pieces are usable on their own.

pub mod alert;
pub mod config;
pub mod forecast;
mod http;
pub mod model;
pub mod notify;
pub mod rain;

pub use alert::{AlertError, Outcome, RainAlert};
pub use config::{Config, ConfigError};
pub use forecast::{ForecastClient, ForecastError, ForecastResult, OpenWeatherClient};
pub use http::REQUEST_TIMEOUT;
pub use model::{DeliveryReceipt, ForecastEntry, ForecastRequest, OutboundMessage};
pub use notify::{NotificationClient, NotificationError, TwilioClient};
pub use rain::{RAIN_THRESHOLD, extract_condition_code, indicates_rain};
