use exitcode::{self, ExitCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use std::path::Path;
use std::process;

use splitvpn_lib::config::{self, Config};
use splitvpn_lib::logging;
use splitvpn_lib::manager::{self, NetworkManager};
use splitvpn_lib::networksetup;
use splitvpn_lib::repository;
use splitvpn_lib::route_sync;
use splitvpn_lib::shell_command_ext::{self, ShellRunner};
use splitvpn_lib::storage::Storage;

use cli::{Command, HostCommand, NetworkCommand, VpnCommand};

mod cli;

async fn load_config(args: &cli::Cli) -> Result<Config, ExitCode> {
    let path = match &args.config_path {
        Some(path) => path.clone(),
        None => config::default_path().map_err(|e| {
            eprintln!("Unable to determine configuration path: {e}");
            exitcode::CONFIG
        })?,
    };
    config::read_or_default(&path).await.map_err(|e| {
        eprintln!("Error reading configuration {}: {e}", path.display());
        exitcode::CONFIG
    })
}

fn setup_logging(log_file: Option<&Path>) -> Result<(), ExitCode> {
    match log_file {
        Some(path) => logging::setup_log_file(path).map_err(|e| {
            eprintln!("Unable to open log file {}: {e}", path.display());
            exitcode::CANTCREAT
        }),
        None => {
            logging::setup_stderr();
            Ok(())
        }
    }
}

fn ctrlc_cancel(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received interrupt, cancelling");
                cancel.cancel();
            }
            Err(e) => tracing::error!(error = %e, "error setting up interrupt handler"),
        }
    });
}

async fn run(args: cli::Cli) -> Result<(), ExitCode> {
    let config = load_config(&args).await?;
    setup_logging(args.log_file.as_deref().or(config.log_file.as_deref()))?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting {}", env!("CARGO_PKG_NAME"));

    let storage = Storage::new(&config.database).await.map_err(|e| {
        tracing::error!(error = %e, url = %config.database.url, "failed to open database");
        exitcode::IOERR
    })?;
    let manager = NetworkManager::new(ShellRunner, storage);

    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    execute(&manager, &cancel, args.command, args.json).await.map_err(|e| {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        exit_code(&e)
    })
}

async fn execute(
    manager: &NetworkManager<ShellRunner>,
    cancel: &CancellationToken,
    command: Command,
    json: bool,
) -> Result<(), manager::Error> {
    match command {
        Command::Network(NetworkCommand::Add { name }) => {
            let network = manager.create_network(&name).await?;
            output(json, &network, |n| format!("Created network {} ({})", n.name, n.id));
        }
        Command::Network(NetworkCommand::List) => {
            let networks = manager.list_networks(cancel).await?;
            output(json, &networks, |list| {
                list.iter()
                    .map(|s| {
                        let marker = if s.active { " (connected)" } else { "" };
                        format!("{}\t{}{}", s.network.id, s.network.name, marker)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
        Command::Network(NetworkCommand::Remove { network_id }) => {
            manager.delete_network(cancel, network_id).await?;
            output(json, &network_id, |id| format!("Removed network {id}"));
        }
        Command::Host(HostCommand::Add {
            network_id,
            address,
            description,
        }) => {
            let host = manager.add_host(network_id, &address, description.as_deref()).await?;
            output(json, &host, |h| format!("Added host {} ({})", h.address, h.id));
        }
        Command::Host(HostCommand::List { network_id }) => {
            let hosts = manager.list_hosts(network_id).await?;
            output(json, &hosts, |list| {
                list.iter()
                    .map(|h| format!("{}\t{}\t{}", h.id, h.address, h.description.as_deref().unwrap_or("")))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
        Command::Host(HostCommand::Remove { host_id }) => {
            manager.delete_host(host_id).await?;
            output(json, &host_id, |id| format!("Removed host {id}"));
        }
        Command::Sync { network_id } => {
            manager.sync(cancel, network_id).await?;
            let routes = manager.applied_routes(network_id).await?;
            output(json, &routes, |list| {
                let mut lines = vec![format!("Applied {} additional routes", list.len())];
                lines.extend(
                    list.iter()
                        .map(|r| format!("  {} {} via {}", r.network_host_ip, r.subnet_mask, r.router)),
                );
                lines.join("\n")
            });
        }
        Command::Reset { network_id } => {
            manager.reset(cancel, network_id).await?;
            output(json, &network_id, |id| format!("Cleared additional routes of network {id}"));
        }
        Command::Vpn(VpnCommand::List) => {
            let vpns = manager.list_vpn(cancel).await?;
            output(json, &vpns, |list| {
                list.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
            });
        }
        Command::Vpn(VpnCommand::Current) => {
            let vpn = manager.current_vpn(cancel).await?;
            output(json, &vpn, |current| match current {
                Some(vpn) => vpn.to_string(),
                None => "No VPN connected".to_string(),
            });
        }
        Command::Reveal { path } => {
            manager.reveal(cancel, &path).await?;
        }
    }
    Ok(())
}

fn output<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => tracing::error!(error = %e, "failed to serialize output"),
        }
    } else {
        let s = text(value);
        if !s.is_empty() {
            println!("{s}");
        }
    }
}

fn exit_code(error: &manager::Error) -> ExitCode {
    match error {
        manager::Error::EmptyName => exitcode::USAGE,
        manager::Error::Sync(route_sync::Error::VpnServiceNotFound(_)) => exitcode::UNAVAILABLE,
        manager::Error::Sync(route_sync::Error::NetworkSetup(e)) | manager::Error::NetworkSetup(e) => {
            network_setup_exit_code(e)
        }
        manager::Error::Sync(route_sync::Error::Repository(e)) | manager::Error::Repository(e) => {
            repository_exit_code(e)
        }
    }
}

fn network_setup_exit_code(error: &networksetup::Error) -> ExitCode {
    match error {
        networksetup::Error::ExecutionFailed {
            source: shell_command_ext::Error::Cancelled,
            ..
        } => exitcode::TEMPFAIL,
        networksetup::Error::ExecutionFailed { .. } => exitcode::OSERR,
        networksetup::Error::VpnServiceNotFound
        | networksetup::Error::InterfaceNotFound
        | networksetup::Error::ServiceNotFound(_)
        | networksetup::Error::NetworkInfoNotFound(_) => exitcode::UNAVAILABLE,
    }
}

fn repository_exit_code(error: &repository::Error) -> ExitCode {
    match error {
        repository::Error::NotFound => exitcode::NOINPUT,
        repository::Error::AlreadyExists | repository::Error::InvalidAddress(_) => exitcode::DATAERR,
        repository::Error::Batch { .. } | repository::Error::Database(_) => exitcode::IOERR,
    }
}

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(code) = run(args).await {
        process::exit(code);
    }
}
