use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use rain_alert_core::{Config, OpenWeatherClient, Outcome, RainAlert, TwilioClient};

/// Exit status when the forecast could not be fetched.
const EXIT_UNDETERMINED: u8 = 2;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "rain-alert", version, about = "Text me when rain is on the way")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the forecast and send an SMS if rain is expected.
    Check {
        /// Settings file; defaults to ./.env, then the platform config dir.
        #[arg(long, value_name = "PATH")]
        env_file: Option<PathBuf>,

        /// Evaluate the forecast but do not send the SMS.
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactively write the settings file.
    Configure {
        /// Where to write; same default as `check`.
        #[arg(long, value_name = "PATH")]
        env_file: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Check { env_file, dry_run } => {
                let path = env_file.unwrap_or_else(Config::default_path);
                check(path, dry_run).await
            }
            Command::Configure { env_file } => {
                let path = env_file.unwrap_or_else(Config::default_path);
                crate::configure::run(&path)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

async fn check(path: PathBuf, dry_run: bool) -> anyhow::Result<ExitCode> {
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!(?config, "Configuration loaded");

    let forecast = OpenWeatherClient::new().context("Failed to set up the forecast client")?;
    let notifier = TwilioClient::from_config(&config).context("Failed to set up the SMS client")?;

    let outcome = RainAlert::new(forecast, notifier)
        .dry_run(dry_run)
        .run(&config)
        .await?;

    let (line, code) = report(&outcome);
    match code {
        Exit::Success => println!("{line}"),
        Exit::Undetermined => eprintln!("{line}"),
    }

    Ok(code.into())
}

/// How a finished check ends for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Success,
    Undetermined,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Undetermined => ExitCode::from(EXIT_UNDETERMINED),
        }
    }
}

/// Console line for an outcome. `Undetermined` goes to stderr.
fn report(outcome: &Outcome) -> (String, Exit) {
    match outcome {
        Outcome::Notified(receipt) => (format!("Message sent: {}", receipt.sid), Exit::Success),
        Outcome::WouldNotify(message) => (
            format!("Dry run, would send to {}: {}", message.to, message.body),
            Exit::Success,
        ),
        Outcome::Skipped => ("It will not rain today.".to_string(), Exit::Success),
        Outcome::Undetermined(reason) => (
            format!("Could not determine whether it will rain: {reason}"),
            Exit::Undetermined,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rain_alert_core::{DeliveryReceipt, OutboundMessage};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_with_flags() {
        let cli = Cli::parse_from([
            "rain-alert",
            "-vv",
            "check",
            "--env-file",
            "/tmp/x.env",
            "--dry-run",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Check { env_file, dry_run } => {
                assert_eq!(env_file, Some(PathBuf::from("/tmp/x.env")));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_defaults_to_sending() {
        let cli = Cli::parse_from(["rain-alert", "check"]);
        assert!(matches!(cli.command, Command::Check { env_file: None, dry_run: false }));
    }

    #[test]
    fn notified_reports_receipt_sid() {
        let outcome = Outcome::Notified(DeliveryReceipt {
            sid: "SM123".into(),
            status: Some("queued".into()),
        });

        assert_eq!(report(&outcome), ("Message sent: SM123".to_string(), Exit::Success));
    }

    #[test]
    fn skipped_reports_no_rain() {
        assert_eq!(
            report(&Outcome::Skipped),
            ("It will not rain today.".to_string(), Exit::Success)
        );
    }

    #[test]
    fn dry_run_reports_recipient_and_body() {
        let outcome = Outcome::WouldNotify(OutboundMessage {
            body: "Umbrella!".into(),
            from: "+15550001111".into(),
            to: "+15550002222".into(),
        });

        let (line, exit) = report(&outcome);
        assert_eq!(line, "Dry run, would send to +15550002222: Umbrella!");
        assert_eq!(exit, Exit::Success);
    }

    #[test]
    fn undetermined_exits_with_status_two() {
        let outcome = Outcome::Undetermined("Forecast request timed out".into());

        let (line, exit) = report(&outcome);
        assert!(line.contains("Forecast request timed out"));
        assert_eq!(exit, Exit::Undetermined);
        assert_eq!(EXIT_UNDETERMINED, 2);
    }
}
