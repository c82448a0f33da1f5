use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use sonos_neuron::logging::{self, LoggingMode};
use sonos_neuron::{
    CoordinatorPolicy, InMemoryVariables, Invocation, Neuron, NeuronConfig, Outcome, UpnpController,
};

/// Sonos neuron host
///
/// Initializes the neuron from a config file and flags, then runs one
/// action, e.g. `sonos-neuron -c neuron.json play room=Kitchen item="jazz radio"`.
#[derive(Parser, Debug)]
#[command(name = "sonos-neuron")]
#[command(about = "Control Sonos rooms and favorites the way the voice assistant does")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default room (overrides the config file)
    #[arg(short, long)]
    room: Option<String>,

    /// Private address of the speaker to talk to; discovered by room name when absent
    #[arg(long)]
    ipv4: Option<String>,

    /// What to do when --ipv4 is not a group coordinator (fail, fallback)
    #[arg(long)]
    coordinator_policy: Option<CoordinatorPolicy>,

    /// Discovery timeout in seconds
    #[arg(short = 'd', long)]
    discovery_timeout: Option<u64>,

    /// Print the published variables as JSON when done
    #[arg(long)]
    print_variables: bool,

    /// Verbose logging with source locations
    #[arg(short, long)]
    verbose: bool,

    /// Action to run after init (play, pause, stop, next, previous, mute, unmute, sync)
    action: Option<String>,

    /// Action parameters as key=value (room, item)
    #[arg(value_parser = parse_parameter)]
    parameters: Vec<(String, String)>,
}

impl Args {
    /// Config file values with command-line overrides applied
    fn config(&self) -> Result<NeuronConfig> {
        let mut config = match &self.config {
            Some(path) => NeuronConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => {
                let room = self
                    .room
                    .as_deref()
                    .context("Either --config or --room is required")?;
                NeuronConfig::new(room)
            }
        };

        if let Some(room) = &self.room {
            config.room = room.clone();
        }
        if let Some(ipv4) = &self.ipv4 {
            config = config.with_ipv4(ipv4).context("Invalid --ipv4")?;
        }
        if let Some(policy) = self.coordinator_policy {
            config = config.with_coordinator_policy(policy);
        }
        if let Some(timeout) = self.discovery_timeout {
            config.discovery_timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    fn invocation(&self, action: &str) -> Result<Invocation> {
        let mut invocation = Invocation::new(action);
        for (key, value) in &self.parameters {
            match key.as_str() {
                "room" => invocation.room = Some(value.clone()),
                "item" => invocation.item = Some(value.clone()),
                other => anyhow::bail!("Unknown parameter '{}' (expected room or item)", other),
            }
        }
        Ok(invocation)
    }
}

fn parse_parameter(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn main() -> Result<()> {
    let args = Args::parse();

    if std::env::var_os(logging::LOG_MODE_ENV).is_some() {
        logging::init_logging_from_env()?;
    } else {
        logging::init_logging(if args.verbose {
            LoggingMode::Debug
        } else {
            LoggingMode::Development
        })?;
    }

    let config = args.config()?;
    let controller = UpnpController::new(config.discovery_timeout());
    let mut neuron = Neuron::new(controller, InMemoryVariables::new())
        .with_coordinator_policy(config.coordinator_policy);

    let report = neuron.init(&config).context("Failed to initialize")?;
    info!(rooms = report.rooms, favorites = report.favorites, "initialized");

    match args.action.as_deref() {
        None | Some("init") => {}
        Some(action) => match neuron.run(&args.invocation(action)?)? {
            Outcome::Synced(report) => {
                for warning in &report.warnings {
                    warn!("{}", warning);
                }
                println!("Synced {} rooms and {} favorites", report.rooms, report.favorites);
            }
            Outcome::Done => println!("{} done", action),
        },
    }

    if args.print_variables {
        println!("{}", serde_json::to_string_pretty(neuron.variables())?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameter() {
        assert_eq!(
            parse_parameter("item=jazz radio").unwrap(),
            ("item".to_string(), "jazz radio".to_string())
        );
        assert!(parse_parameter("kitchen").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "sonos-neuron",
            "--room",
            "Kitchen",
            "--ipv4",
            "192.168.1.20",
            "--coordinator-policy",
            "fallback",
            "play",
            "item=Jazz",
        ]);
        let config = args.config().unwrap();
        assert_eq!(config.room, "Kitchen");
        assert_eq!(config.coordinator_policy, CoordinatorPolicy::Fallback);

        let invocation = args.invocation("play").unwrap();
        assert_eq!(invocation.item.as_deref(), Some("Jazz"));
        assert_eq!(invocation.room_name(), None);
    }

    #[test]
    fn test_public_ipv4_flag_is_rejected() {
        let args = Args::parse_from(["sonos-neuron", "--room", "Kitchen", "--ipv4", "8.8.8.8"]);
        assert!(args.config().is_err());
    }
}
