//! One rain check, start to finish.
//!
//! The run walks a fixed sequence: compute the look-ahead window, fetch the
//! forecast, decide, then notify or skip. There is no retry and no loop.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::Config,
    forecast::ForecastClient,
    model::{DeliveryReceipt, OutboundMessage},
    notify::{NotificationClient, NotificationError},
    rain::{first_rain_entry, indicates_rain},
};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rain expected and the provider accepted the SMS.
    Notified(DeliveryReceipt),
    /// Rain expected, but this was a dry run.
    WouldNotify(OutboundMessage),
    /// No rain in the window.
    Skipped,
    /// The forecast could not be fetched, so rain is unknown.
    Undetermined(String),
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Failed to send rain alert: {0}")]
    Notification(#[from] NotificationError),
}

#[derive(Debug)]
pub struct RainAlert<F, N> {
    forecast: F,
    notifier: N,
    dry_run: bool,
}

impl<F, N> RainAlert<F, N>
where
    F: ForecastClient,
    N: NotificationClient,
{
    pub fn new(forecast: F, notifier: N) -> Self {
        Self {
            forecast,
            notifier,
            dry_run: false,
        }
    }

    /// Evaluate the forecast but never send anything.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub async fn run(&self, config: &Config) -> Result<Outcome, AlertError> {
        let request = config.forecast_request();
        info!(
            hours = config.forecast_hours(),
            entries = request.count,
            "Look-ahead window computed"
        );

        // An empty window cannot contain rain; the provider would ignore cnt=0.
        if request.count == 0 {
            info!("Look-ahead window is shorter than one forecast step, nothing to check");
            return Ok(Outcome::Skipped);
        }

        let fetched = self.forecast.fetch_forecast(config.api_endpoint(), &request).await;
        let entries = match fetched {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "Forecast unavailable, rain cannot be determined");
                return Ok(Outcome::Undetermined(err.to_string()));
            }
        };
        info!(entries = entries.len(), "Forecast fetched");

        if !indicates_rain(&entries) {
            info!("No precipitation in the forecast window");
            return Ok(Outcome::Skipped);
        }

        match first_rain_entry(&entries).and_then(|entry| entry.timestamp()) {
            Some(at) => info!(%at, "Precipitation expected"),
            None => info!("Precipitation expected"),
        }

        let message = OutboundMessage::from_config(config);
        if self.dry_run {
            info!(to = %message.to, "Dry run, not sending");
            return Ok(Outcome::WouldNotify(message));
        }

        let receipt = self.notifier.send_alert(&message).await?;
        info!(sid = %receipt.sid, "Rain alert delivered");

        Ok(Outcome::Notified(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{keys, tests::sample_values},
        forecast::{ForecastError, ForecastResult},
        model::{ForecastEntry, ForecastRequest},
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct FakeForecast {
        result: ForecastResult,
        calls: Mutex<Vec<u32>>,
    }

    impl FakeForecast {
        fn returning(result: ForecastResult) -> Self {
            Self {
                result,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_codes(codes: &[i64]) -> Self {
            let entries = codes
                .iter()
                .map(|id| ForecastEntry::new(json!({ "weather": [{ "id": id }] })))
                .collect();
            Self::returning(Ok(entries))
        }
    }

    #[async_trait]
    impl ForecastClient for FakeForecast {
        async fn fetch_forecast(
            &self,
            _endpoint: &str,
            request: &ForecastRequest,
        ) -> ForecastResult {
            self.calls.lock().unwrap().push(request.count);
            self.result.clone()
        }
    }

    #[derive(Debug, Default)]
    struct FakeNotifier {
        reject: bool,
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl NotificationClient for FakeNotifier {
        async fn send_alert(
            &self,
            message: &OutboundMessage,
        ) -> Result<DeliveryReceipt, NotificationError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.reject {
                return Err(NotificationError::Rejected {
                    status: 400,
                    code: Some(21211),
                    message: "Invalid 'To' Phone Number".into(),
                });
            }
            Ok(DeliveryReceipt {
                sid: "SM42".into(),
                status: Some("queued".into()),
            })
        }
    }

    fn config() -> Config {
        let values = sample_values();
        Config::from_lookup(|k| values.get(k).cloned()).unwrap()
    }

    #[tokio::test]
    async fn rain_sends_one_message_to_configured_recipient() {
        let alert = RainAlert::new(FakeForecast::with_codes(&[500]), FakeNotifier::default());

        let outcome = alert.run(&config()).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Notified(DeliveryReceipt {
                sid: "SM42".into(),
                status: Some("queued".into()),
            })
        );
        let sent = alert.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+15550002222");
        assert_eq!(*alert.forecast.calls.lock().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn clear_sky_never_notifies() {
        let alert = RainAlert::new(FakeForecast::with_codes(&[800]), FakeNotifier::default());

        assert_eq!(alert.run(&config()).await.unwrap(), Outcome::Skipped);
        assert!(alert.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_undetermined_not_dry() {
        let err = ForecastError::Status {
            status: 500,
            body: "boom".into(),
        };
        let alert = RainAlert::new(FakeForecast::returning(Err(err)), FakeNotifier::default());

        let outcome = alert.run(&config()).await.unwrap();

        match outcome {
            Outcome::Undetermined(reason) => assert!(reason.contains("500")),
            other => panic!("expected Undetermined, got {other:?}"),
        }
        assert!(alert.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_rejection_propagates() {
        let notifier = FakeNotifier {
            reject: true,
            ..Default::default()
        };
        let alert = RainAlert::new(FakeForecast::with_codes(&[800, 201]), notifier);

        let err = alert.run(&config()).await.unwrap_err();
        assert!(matches!(
            err,
            AlertError::Notification(NotificationError::Rejected { code: Some(21211), .. })
        ));
    }

    #[tokio::test]
    async fn dry_run_builds_message_without_sending() {
        let alert = RainAlert::new(FakeForecast::with_codes(&[611]), FakeNotifier::default())
            .dry_run(true);

        let outcome = alert.run(&config()).await.unwrap();

        assert_eq!(outcome, Outcome::WouldNotify(OutboundMessage::from_config(&config())));
        assert!(alert.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_hour_window_skips_fetch() {
        let mut values = sample_values();
        values.insert(keys::FORECAST_HOURS.to_string(), "2".to_string());
        let config = Config::from_lookup(|k| values.get(k).cloned()).unwrap();

        let alert = RainAlert::new(FakeForecast::with_codes(&[500]), FakeNotifier::default());

        assert_eq!(alert.run(&config).await.unwrap(), Outcome::Skipped);
        assert!(alert.forecast.calls.lock().unwrap().is_empty());
        assert!(alert.notifier.sent.lock().unwrap().is_empty());
    }
}
