use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use rain_alert_core::config::{self, Config, keys};

const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Prompt for every setting, validate, and write the dotenv file.
pub fn run(path: &Path) -> Result<()> {
    let existing = Config::load(path).ok();
    let current = |f: fn(&Config) -> String| existing.as_ref().map(f);

    println!("Writing settings to {}", path.display());

    let mut values: HashMap<&str, String> = HashMap::new();

    values.insert(
        keys::API_ENDPOINT,
        text(
            "Forecast API endpoint:",
            current(|c| c.api_endpoint().to_string()),
            DEFAULT_ENDPOINT,
        )?,
    );
    values.insert(
        keys::LATITUDE,
        text("Latitude:", current(|c| c.latitude().to_string()), "")?,
    );
    values.insert(
        keys::LONGITUDE,
        text("Longitude:", current(|c| c.longitude().to_string()), "")?,
    );
    values.insert(
        keys::API_KEY,
        secret("OpenWeatherMap API key:", current(|c| c.api_key().to_string()))?,
    );

    let hours = CustomType::<u32>::new("Look-ahead window (hours):")
        .with_default(existing.as_ref().map_or(12, Config::forecast_hours))
        .with_help_message("Checked in 3-hour steps")
        .with_error_message("Please enter a whole number of hours")
        .prompt()
        .context("Prompt cancelled")?;
    values.insert(keys::FORECAST_HOURS, hours.to_string());

    values.insert(
        keys::TWILIO_ACCOUNT_SID,
        text(
            "Twilio account SID:",
            current(|c| c.twilio_account_sid().to_string()),
            "",
        )?,
    );
    values.insert(
        keys::TWILIO_AUTH_TOKEN,
        secret("Twilio auth token:", current(|c| c.twilio_auth_token().to_string()))?,
    );
    values.insert(
        keys::TWILIO_PHONE_NUMBER,
        text(
            "Twilio sender number:",
            current(|c| c.twilio_phone_number().to_string()),
            "",
        )?,
    );
    values.insert(
        keys::MY_PHONE_NUMBER,
        text("Your phone number:", current(|c| c.my_phone_number().to_string()), "")?,
    );
    values.insert(
        keys::ALERT_MESSAGE,
        text(
            "Alert message:",
            current(|c| c.alert_message().to_string()),
            config::DEFAULT_ALERT_MESSAGE,
        )?,
    );
    if let Some(base) = current(|c| c.twilio_api_base().to_string()) {
        values.insert(keys::TWILIO_API_BASE, base);
    }

    let cfg = Config::from_lookup(|key| values.get(key).cloned())
        .context("The entered settings are not valid")?;
    cfg.save(path)?;

    println!("Saved settings to {}", path.display());
    Ok(())
}

fn text(prompt: &str, current: Option<String>, fallback: &str) -> Result<String> {
    let default = current.unwrap_or_else(|| fallback.to_string());
    let mut question = Text::new(prompt);
    if !default.is_empty() {
        question = question.with_default(&default);
    }

    question.prompt().context("Prompt cancelled")
}

/// Hidden input; an empty answer keeps the current value.
fn secret(prompt: &str, current: Option<String>) -> Result<String> {
    let mut question = Password::new(prompt)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked);
    if current.is_some() {
        question = question.with_help_message("Leave empty to keep the current value");
    }

    let answer = question.prompt().context("Prompt cancelled")?;
    Ok(match current {
        Some(existing) if answer.is_empty() => existing,
        _ => answer,
    })
}
