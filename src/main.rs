use clap::Parser;
use fleet_broker::adapters::{start_api_server, BrokerClient};
use fleet_broker::cli::{self, Cli, Commands};
use fleet_broker::config::{AppConfig, LoggingConfig};
use fleet_broker::error::BrokerError;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,fleet_broker=debug";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_logging(&config.logging);
            info!(
                host = %config.server.host,
                port = config.server.port,
                logs_dir = %config.logs.dir.display(),
                "starting fleet broker"
            );
            start_api_server(&config, shutdown_signal()).await
        }
        Commands::Parse { file, role } => {
            init_logging_simple();
            cli::parse_log_file(&file, role)
        }
        Commands::State { run } => {
            init_logging_simple();
            cli::show_system_state(&config.logs.dir, run.as_deref())
        }
        Commands::Submit { file } => {
            init_logging_simple();
            match BrokerClient::from_config(&config.client) {
                Ok(client) => cli::submit_request(&client, &file).await,
                Err(e) => Err(e),
            }
        }
        Commands::Status { id } => {
            init_logging_simple();
            match BrokerClient::from_config(&config.client) {
                Ok(client) => cli::show_status(&client, &id).await,
                Err(e) => Err(e),
            }
        }
        Commands::Agents => {
            init_logging_simple();
            match BrokerClient::from_config(&config.client) {
                Ok(client) => cli::show_agents(&client).await,
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ BrokerError::Unreachable { .. }) => {
            eprintln!("✗ broker unreachable: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Layered config plus command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    use anyhow::Context;

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = &cli.logs_dir {
        config.logs.dir = dir.clone();
    }
    if let Some(url) = &cli.broker_url {
        config.client.base_url = url.clone();
    }

    config
        .validate()
        .map_err(|problems| anyhow::anyhow!("invalid configuration: {}", problems.join("; ")))?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if logging.level.eq_ignore_ascii_case("info") {
            EnvFilter::new(DEFAULT_FILTER)
        } else {
            EnvFilter::new(format!("{},fleet_broker={}", logging.level, logging.level))
        }
    });

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // file, so writability is checked first.
    let file_layer = logging.dir.as_ref().and_then(|log_dir| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                log_dir.display(),
                e
            );
            return None;
        }

        let test_path = log_dir.join(".fleet_broker_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(log_dir, "fleet-broker.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the life of the process
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    log_dir.display(),
                    e
                );
                None
            }
        }
    });

    let console_layer = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let (true, Some(dir)) = (file_logging_enabled, &logging.dir) {
        eprintln!("Logging to: {}/fleet-broker.log", dir.display());
    }
}

fn init_logging_simple() {
    // Minimal logging for client commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
