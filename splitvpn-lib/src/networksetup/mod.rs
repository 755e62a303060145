//! Inspects and configures the macOS network stack through its command line tools.
//!
//! [`NetworkSetup`] issues a fixed set of commands through a [`CommandRunner`]
//! and hands their output to the pure parsers in [`parse`]. Nothing is cached:
//! every call re-queries the OS.

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use std::fmt;
use std::path::Path;

use crate::models::{Network, NetworkHostSetup};
use crate::shell_command_ext::{self, CommandRunner};

pub mod parse;

const ROUTE: &str = "route";
const NETWORKSETUP: &str = "networksetup";
const SCUTIL: &str = "scutil";
const OPEN: &str = "open";

#[derive(Debug, Error)]
pub enum Error {
    #[error("{op} failed: {source}")]
    ExecutionFailed {
        op: &'static str,
        #[source]
        source: shell_command_ext::Error,
    },
    #[error("Default network interface not found")]
    InterfaceNotFound,
    #[error("Network service not found for interface {0}")]
    ServiceNotFound(NetworkInterface),
    #[error("Network info not found for service {0}")]
    NetworkInfoNotFound(NetworkService),
    #[error("VPN service not found")]
    VpnServiceNotFound,
}

impl Error {
    /// The command ran but its output lacked the expected fact.
    pub fn is_parse_not_found(&self) -> bool {
        matches!(
            self,
            Error::InterfaceNotFound | Error::ServiceNotFound(_) | Error::NetworkInfoNotFound(_)
        )
    }
}

/// OS device identifier, e.g. `en0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NetworkInterface(String);

/// Human facing name of a network adapter or VPN, e.g. `Wi-Fi`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NetworkService(String);

/// Name of an L2TP network service as listed by `scutil --nc list`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VpnService(String);

macro_rules! string_id {
    ($($name:ident),+) => {
        $(
            impl $name {
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

string_id!(NetworkInterface, NetworkService, VpnService);

/// Local subnet facts of a network service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub subnet_mask: String,
    pub router: String,
}

#[derive(Clone, Debug)]
pub struct NetworkSetup<R> {
    runner: R,
}

impl<R: CommandRunner> NetworkSetup<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub async fn default_network_interface(&self, cancel: &CancellationToken) -> Result<NetworkInterface, Error> {
        let args = ["-n", "get", "default"].map(String::from);
        let lines = self.run(cancel, "get default route", ROUTE, &args).await?;
        parse::default_interface(&lines).inspect_err(|_| {
            tracing::error!(output = %lines.join("\n"), "unable to determine default interface");
        })
    }

    pub async fn network_service_by_interface(
        &self,
        cancel: &CancellationToken,
        iface: &NetworkInterface,
    ) -> Result<NetworkService, Error> {
        let args = ["-listnetworkserviceorder".to_string()];
        let lines = self.run(cancel, "list network services", NETWORKSETUP, &args).await?;
        parse::network_service(&lines, iface)
    }

    pub async fn network_info_by_service(
        &self,
        cancel: &CancellationToken,
        service: &NetworkService,
    ) -> Result<NetworkInfo, Error> {
        let args = ["-getinfo".to_string(), service.to_string()];
        let lines = self.run(cancel, "get network service info", NETWORKSETUP, &args).await?;
        parse::network_info(&lines, service)
    }

    /// Replaces all additional routes of the network's VPN service.
    /// An empty `setups` slice clears them.
    pub async fn set_additional_routes(
        &self,
        cancel: &CancellationToken,
        network: &Network,
        setups: &[NetworkHostSetup],
    ) -> Result<(), Error> {
        let args = additional_routes_args(&network.name, setups);
        self.run(cancel, "set additional routes", NETWORKSETUP, &args).await?;
        tracing::info!(service = %network.name, routes = setups.len(), "additional routes applied");
        Ok(())
    }

    pub async fn list_vpn(&self, cancel: &CancellationToken) -> Result<Vec<VpnService>, Error> {
        let lines = self.list_connections(cancel).await?;
        Ok(parse::vpn_services(&lines))
    }

    /// Fails with [`Error::VpnServiceNotFound`] when no VPN is connected.
    pub async fn current_vpn(&self, cancel: &CancellationToken) -> Result<VpnService, Error> {
        let lines = self.list_connections(cancel).await?;
        parse::connected_vpn_service(&lines)
    }

    pub async fn open_in_finder(&self, cancel: &CancellationToken, path: &Path) -> Result<(), Error> {
        let args = ["-R".to_string(), path.to_string_lossy().to_string()];
        self.run(cancel, "reveal in finder", OPEN, &args).await?;
        Ok(())
    }

    async fn list_connections(&self, cancel: &CancellationToken) -> Result<Vec<String>, Error> {
        let args = ["--nc", "list"].map(String::from);
        self.run(cancel, "list network connections", SCUTIL, &args).await
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        op: &'static str,
        program: &str,
        args: &[String],
    ) -> Result<Vec<String>, Error> {
        self.runner
            .run(cancel, program, args)
            .await
            .map_err(|source| Error::ExecutionFailed { op, source })
    }
}

/// Build the argument list for `networksetup -setadditionalroutes`.
///
/// Each setup contributes an `(ip, subnet mask, router)` triple, in order.
fn additional_routes_args(service: &str, setups: &[NetworkHostSetup]) -> Vec<String> {
    let mut args = Vec::with_capacity(2 + setups.len() * 3);
    args.push("-setadditionalroutes".to_string());
    args.push(service.to_string());
    for setup in setups {
        args.push(setup.network_host_ip.clone());
        args.push(setup.subnet_mask.clone());
        args.push(setup.router.clone());
    }
    args
}
