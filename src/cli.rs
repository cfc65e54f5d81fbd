use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::adapters::BrokerClient;
use crate::error::{BrokerError, Result};
use crate::logs::{extract_events, FleetStateAggregator, LogDirectory, LogEvent};

#[derive(Parser)]
#[command(name = "fleet-broker")]
#[command(version)]
#[command(about = "Coordination broker for CVRP route manager and dispatcher agents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and {BROKER_ENV}.toml
    #[arg(short, long, default_value = "config", env = "BROKER_CONFIG_DIR")]
    pub config: PathBuf,

    /// Override server.port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override logs.dir (the shared agent log directory)
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// Override client.base_url for client commands
    #[arg(long)]
    pub broker_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the broker (default)
    Serve,
    /// Extract events from one agent log file and print them as JSON
    Parse {
        /// Log file to read
        file: PathBuf,
        /// Only keep the events produced by this role
        #[arg(long, value_enum)]
        role: Option<Role>,
    },
    /// Print the system-state view built from the agent logs
    State {
        /// Run sub-folder inside the log directory
        #[arg(long)]
        run: Option<String>,
    },
    /// Submit a routing request from a JSON file to a running broker
    Submit {
        /// JSON file with a `customers` array
        file: PathBuf,
    },
    /// Show the status of a submitted request
    Status {
        /// Request id returned by `submit`
        id: String,
    },
    /// List agent statuses known to a running broker
    Agents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Route manager: communication and progress markers
    Mra,
    /// Dispatcher: movement, queue and route lifecycle markers
    Da,
}

impl Role {
    pub fn keeps(&self, event: &LogEvent) -> bool {
        match self {
            Role::Mra => matches!(event, LogEvent::Communication(_) | LogEvent::Progress(_)),
            Role::Da => matches!(
                event,
                LogEvent::Movement(_) | LogEvent::Queue(_) | LogEvent::RouteLifecycle(_)
            ),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Extract events from a log file, optionally filtered by role
pub fn events_for_file(file: &Path, role: Option<Role>) -> Result<Vec<LogEvent>> {
    let bytes = std::fs::read(file)?;
    let text = String::from_utf8_lossy(&bytes);

    Ok(extract_events(&text)
        .into_iter()
        .filter(|event| role.map_or(true, |r| r.keeps(event)))
        .collect())
}

pub fn parse_log_file(file: &Path, role: Option<Role>) -> Result<()> {
    print_json(&events_for_file(file, role)?)
}

pub fn show_system_state(logs_dir: &Path, run: Option<&str>) -> Result<()> {
    let aggregator = FleetStateAggregator::new(LogDirectory::new(logs_dir));
    print_json(&aggregator.system_state(run)?)
}

pub async fn submit_request(client: &BrokerClient, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;

    let response = client.submit_request(payload).await?;
    println!("✓ submitted request {}", response.request_id);
    Ok(())
}

pub async fn show_status(client: &BrokerClient, id: &str) -> Result<()> {
    match client.solution_status(id).await {
        Ok(status) => print_json(&status),
        Err(BrokerError::NotFound(_)) => {
            println!("✗ request {} not found", id);
            Err(BrokerError::not_found(format!("request {}", id)))
        }
        Err(e) => Err(e),
    }
}

pub async fn show_agents(client: &BrokerClient) -> Result<()> {
    let summary = client.agent_statuses().await?;

    println!(
        "active: {} (mra {}, da {})",
        summary.total_active, summary.mra_count, summary.da_count
    );
    for agent in &summary.agents {
        println!(
            "  {:<4} {:<16} {:<10} {}",
            agent.kind.as_str(),
            agent.name,
            agent.status.as_str(),
            agent.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults_to_serve() {
        let cli = Cli::try_parse_from(["fleet-broker", "--port", "9000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(9000));

        let cli = Cli::try_parse_from(["fleet-broker", "parse", "x.log", "--role", "da"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Parse {
                role: Some(Role::Da),
                ..
            })
        ));
    }

    #[test]
    fn test_role_filter() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("DA-DA1_conversations.log");
        std::fs::write(
            &file,
            "[t1] Route R1 added to queue. Queue size: 1\n\
             [t2] Querying DA: DA1\n",
        )
        .unwrap();

        let all = events_for_file(&file, None).unwrap();
        let da = events_for_file(&file, Some(Role::Da)).unwrap();
        let mra = events_for_file(&file, Some(Role::Mra)).unwrap();

        assert_eq!(all.len(), da.len() + mra.len());
        assert!(da.iter().all(|e| !matches!(e, LogEvent::Progress(_))));
        assert_eq!(mra.len(), 1);
    }
}
