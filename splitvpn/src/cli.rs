use clap::{Parser, Subcommand};
use splitvpn_lib::{config, logging};
use std::path::PathBuf;

/// SplitVPN - route selected hosts through macOS L2TP VPN services
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify configuration path [default: <home>/config/config.toml]
    #[arg(short, long, env = config::ENV_VAR)]
    pub config_path: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = logging::ENV_VAR_LOG_FILE)]
    pub log_file: Option<PathBuf>,

    /// Format output as json
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage networks, each named after a VPN service
    #[command(subcommand)]
    Network(NetworkCommand),

    /// Manage the hosts routed through a network
    #[command(subcommand)]
    Host(HostCommand),

    /// Apply the network's hosts as additional routes of its VPN service
    #[command()]
    Sync {
        /// Network id
        network_id: i64,
    },

    /// Remove all additional routes of the network's VPN service
    #[command()]
    Reset {
        /// Network id
        network_id: i64,
    },

    /// Inspect the VPN services known to the system
    #[command(subcommand)]
    Vpn(VpnCommand),

    /// Reveal a file in Finder
    #[command()]
    Reveal { path: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Register a network, the name must match a VPN service
    Add { name: String },
    /// List networks and whether their VPN is connected
    List,
    /// Reset and remove a network with all its hosts
    Remove { network_id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum HostCommand {
    /// Add an IPv4 host to a network
    Add {
        network_id: i64,
        address: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List the hosts of a network
    List { network_id: i64 },
    /// Remove a host; run `sync` afterwards to drop its route from the VPN service
    Remove { host_id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum VpnCommand {
    /// List all L2TP VPN services
    List,
    /// Show the connected VPN service
    Current,
}

pub fn parse() -> Cli {
    Cli::parse()
}
