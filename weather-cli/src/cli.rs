use anyhow::{Context, bail};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};
use weather_poller_core::{
    Config, Credentials, JsonLinesSink, MemorySink, ObservationSink, PollingScheduler, connect,
    validate_city_list,
};

use crate::console::ConsoleSink;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-poller",
    version,
    about = "Periodically fetch weather for a list of cities and store the observations"
)]
pub struct Cli {
    /// Password for the weather API account configured in `weather_api.user_name`.
    #[arg(short, long)]
    pub password: String,

    /// Cities to poll, e.g. "Vilnius, Kaunas, Klaipėda".
    #[arg(short, long)]
    pub cities: String,

    /// Config file; defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append observations as JSON lines to this file (overrides `output.path`).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        match &self.config {
            Some(path) => println!("Using config file: {}", path.display()),
            None => {
                match Config::config_file_path() {
                    Ok(path) if path.exists() => println!("Using config file: {}", path.display()),
                    _ => println!("No config file found, using environment settings"),
                }
            }
        }

        let credentials = Credentials::new(config.weather_api.user_name.clone(), self.password);
        let provider = connect(&config, credentials)
            .await
            .context("Could not authenticate against the weather API")?;

        let validation = validate_city_list(&self.cities, &provider)
            .await
            .with_context(|| format!("Cities '{}' are not valid", self.cities))?;

        for city in &validation.rejected {
            println!("City {city} is not supported and will be skipped");
        }
        if validation.accepted.is_empty() {
            bail!("None of the requested cities are supported, nothing to poll.");
        }

        let store: Arc<dyn ObservationSink> = match self.output.or(config.output.path.clone()) {
            Some(path) => {
                info!(path = %path.display(), "appending observations to file");
                Arc::new(JsonLinesSink::new(path))
            }
            None => Arc::new(MemorySink::new()),
        };

        let scheduler = PollingScheduler::new(
            Arc::new(provider),
            Arc::new(ConsoleSink::new(store)),
            validation.accepted,
            config.weather_api.delay(),
        );

        println!(
            "Polling {} city(ies) every {} s. Press Ctrl-C to exit.",
            scheduler.cities().len(),
            config.weather_api.delay_in_seconds
        );

        let handle = scheduler.start();

        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C, stopping");
        }

        println!("Stopping, waiting for the current cycle to finish...");
        handle.stop().await;
        println!("Stopped after {} cycle(s).", scheduler.executions());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from(["weather-poller", "-p", "pw", "-c", "Vilnius, Kaunas"])
            .expect("valid args");
        assert_eq!(cli.password, "pw");
        assert_eq!(cli.cities, "Vilnius, Kaunas");
        assert!(cli.config.is_none());
        assert!(cli.output.is_none());
    }

    #[test]
    fn missing_password_or_cities_is_usage_error() {
        assert!(Cli::try_parse_from(["weather-poller", "-c", "Vilnius"]).is_err());
        assert!(Cli::try_parse_from(["weather-poller", "--password", "pw"]).is_err());
    }

    #[test]
    fn accepts_config_and_output_paths() {
        let cli = Cli::try_parse_from([
            "weather-poller",
            "--password",
            "pw",
            "--cities",
            "Vilnius",
            "--config",
            "/tmp/poller.toml",
            "--output",
            "/tmp/out.jsonl",
        ])
        .expect("valid args");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/poller.toml")));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/out.jsonl")));
    }
}
