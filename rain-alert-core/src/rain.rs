//! Decide whether a forecast calls for an umbrella.

use crate::model::ForecastEntry;

/// OpenWeatherMap condition codes below 700 are precipitation:
/// 2xx thunderstorm, 3xx drizzle, 5xx rain, 6xx snow.
pub const RAIN_THRESHOLD: i64 = 700;

/// First condition code of an entry (`weather[0].id`), if the entry has one.
pub fn extract_condition_code(entry: &ForecastEntry) -> Option<i64> {
    entry.condition_code()
}

fn is_precipitation(code: i64) -> bool {
    (0..RAIN_THRESHOLD).contains(&code)
}

/// True if any entry carries a precipitation code. Entries without a
/// readable code are skipped.
pub fn indicates_rain(forecast: &[ForecastEntry]) -> bool {
    first_rain_entry(forecast).is_some()
}

pub fn first_rain_entry(forecast: &[ForecastEntry]) -> Option<&ForecastEntry> {
    forecast
        .iter()
        .find(|entry| extract_condition_code(entry).is_some_and(is_precipitation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn entry(raw: Value) -> ForecastEntry {
        ForecastEntry::new(raw)
    }

    fn with_code(code: i64) -> ForecastEntry {
        entry(json!({ "weather": [{ "id": code, "main": "x" }] }))
    }

    #[test]
    fn empty_forecast_is_dry() {
        assert!(!indicates_rain(&[]));
    }

    #[test]
    fn extracts_first_condition_code() {
        let e = entry(json!({ "weather": [{ "id": 801 }, { "id": 500 }] }));
        assert_eq!(extract_condition_code(&e), Some(801));
    }

    #[test]
    fn malformed_entries_yield_no_code() {
        let cases = [
            json!({}),
            json!({ "weather": [] }),
            json!({ "weather": {} }),
            json!({ "weather": [{}] }),
            json!({ "weather": [{ "id": null }] }),
            json!({ "weather": [{ "id": "500" }] }),
            json!({ "weather": [{ "id": 500.5 }] }),
            json!("sunny"),
            Value::Null,
        ];

        for raw in cases {
            assert_eq!(extract_condition_code(&entry(raw.clone())), None, "{raw}");
        }
    }

    #[test]
    fn threshold_boundaries() {
        assert!(indicates_rain(&[with_code(0)]));
        assert!(indicates_rain(&[with_code(200)]));
        assert!(indicates_rain(&[with_code(500)]));
        assert!(indicates_rain(&[with_code(699)]));
        assert!(!indicates_rain(&[with_code(700)]));
        assert!(!indicates_rain(&[with_code(800)]));
        assert!(!indicates_rain(&[with_code(-1)]));
    }

    #[test]
    fn any_rainy_entry_is_enough() {
        let forecast = vec![with_code(800), with_code(801), with_code(501), with_code(800)];
        assert!(indicates_rain(&forecast));
    }

    #[test]
    fn removing_the_only_rainy_entry_flips_back() {
        let mut forecast = vec![with_code(800), with_code(602), with_code(741)];
        assert!(indicates_rain(&forecast));

        forecast.remove(1);
        assert!(!indicates_rain(&forecast));

        forecast.push(with_code(311));
        assert!(indicates_rain(&forecast));
    }

    #[test]
    fn malformed_entries_do_not_stop_the_scan() {
        let forecast = vec![
            entry(json!({ "dt": 1 })),
            entry(json!({ "weather": [] })),
            entry(json!(42)),
            with_code(520),
        ];

        assert!(indicates_rain(&forecast));
        assert_eq!(first_rain_entry(&forecast), Some(&forecast[3]));
    }
}
