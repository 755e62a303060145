//! Use-case layer on top of the synchronizer and the repositories.
//!
//! Operations on the same network are serialized here, since the synchronizer
//! itself holds no locks.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::models::{Network, NetworkHost, NetworkHostSetup};
use crate::networksetup::{self, NetworkSetup, VpnService};
use crate::repository::{self, NetworkHostRepository, NetworkHostSetupRepository, NetworkRepository};
use crate::route_sync::{self, RouteSynchronizer};
use crate::shell_command_ext::CommandRunner;
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Network name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Sync(#[from] route_sync::Error),
    #[error(transparent)]
    NetworkSetup(#[from] networksetup::Error),
    #[error(transparent)]
    Repository(#[from] repository::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    #[serde(flatten)]
    pub network: Network,
    /// Whether the network's VPN service is the one currently connected.
    pub active: bool,
}

pub struct NetworkManager<R> {
    inspector: NetworkSetup<R>,
    synchronizer: RouteSynchronizer<R>,
    networks: NetworkRepository,
    hosts: NetworkHostRepository,
    setups: NetworkHostSetupRepository,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl<R: CommandRunner + Clone> NetworkManager<R> {
    pub fn new(runner: R, storage: Storage) -> Self {
        let inspector = NetworkSetup::new(runner);
        Self {
            synchronizer: RouteSynchronizer::new(inspector.clone(), storage.clone()),
            inspector,
            networks: NetworkRepository::new(storage.clone()),
            hosts: NetworkHostRepository::new(storage.clone()),
            setups: NetworkHostSetupRepository::new(storage),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn create_network(&self, name: &str) -> Result<Network, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let network = self.networks.create(name).await?;
        tracing::info!(network_id = network.id, name = %network.name, "network created");
        Ok(network)
    }

    /// Lists all networks and flags the one whose VPN is connected.
    /// No connected VPN is a normal state, not an error.
    pub async fn list_networks(&self, cancel: &CancellationToken) -> Result<Vec<NetworkStatus>, Error> {
        let current = self.current_vpn(cancel).await?;
        let networks = self.networks.list().await?;
        Ok(networks
            .into_iter()
            .map(|network| NetworkStatus {
                active: current.as_ref().is_some_and(|vpn| vpn.as_str() == network.name),
                network,
            })
            .collect())
    }

    /// Resets the network before removing it so no additional routes outlive it.
    pub async fn delete_network(&self, cancel: &CancellationToken, network_id: i64) -> Result<(), Error> {
        let _guard = self.lock(network_id).await;
        match self.synchronizer.reset_by_network_id(cancel, network_id).await {
            Ok(()) => (),
            Err(route_sync::Error::VpnServiceNotFound(name)) => {
                // the OS no longer knows the service, so it holds no routes for it
                tracing::warn!(%name, "VPN service gone, dropping persisted routes only");
                let host_ids = self.hosts.list_ids(network_id).await?;
                self.setups.delete_batch_by_network_host_ids(&host_ids).await?;
            }
            Err(e) => return Err(e.into()),
        }
        self.networks.delete(network_id).await?;
        self.locks.lock().await.remove(&network_id);
        tracing::info!(network_id, "network deleted");
        Ok(())
    }

    pub async fn add_host(&self, network_id: i64, address: &str, description: Option<&str>) -> Result<NetworkHost, Error> {
        let host = self.hosts.create(network_id, address, description).await?;
        tracing::info!(network_id, host_id = host.id, address = %host.address, "host added");
        Ok(host)
    }

    pub async fn list_hosts(&self, network_id: i64) -> Result<Vec<NetworkHost>, Error> {
        self.networks.get(network_id).await?;
        Ok(self.hosts.list(network_id).await?)
    }

    /// Removes the host together with its persisted setup. The OS keeps the
    /// route until the network is synchronized again.
    pub async fn delete_host(&self, host_id: i64) -> Result<(), Error> {
        let host = self.hosts.get(host_id).await?;
        let _guard = self.lock(host.network_id).await;
        self.setups.delete_batch_by_network_host_ids(&[host.id]).await?;
        self.hosts.delete(host.id).await?;
        tracing::info!(network_id = host.network_id, host_id, "host deleted");
        Ok(())
    }

    pub async fn sync(&self, cancel: &CancellationToken, network_id: i64) -> Result<(), Error> {
        let _guard = self.lock(network_id).await;
        Ok(self.synchronizer.sync_by_network_id(cancel, network_id).await?)
    }

    pub async fn reset(&self, cancel: &CancellationToken, network_id: i64) -> Result<(), Error> {
        let _guard = self.lock(network_id).await;
        Ok(self.synchronizer.reset_by_network_id(cancel, network_id).await?)
    }

    pub async fn applied_routes(&self, network_id: i64) -> Result<Vec<NetworkHostSetup>, Error> {
        Ok(self.synchronizer.applied(network_id).await?)
    }

    pub async fn list_vpn(&self, cancel: &CancellationToken) -> Result<Vec<VpnService>, Error> {
        Ok(self.inspector.list_vpn(cancel).await?)
    }

    /// The connected VPN service, `None` when no VPN is active.
    pub async fn current_vpn(&self, cancel: &CancellationToken) -> Result<Option<VpnService>, Error> {
        match self.inspector.current_vpn(cancel).await {
            Ok(vpn) => Ok(Some(vpn)),
            Err(networksetup::Error::VpnServiceNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn reveal(&self, cancel: &CancellationToken, path: &Path) -> Result<(), Error> {
        Ok(self.inspector.open_in_finder(cancel, path).await?)
    }

    async fn lock(&self, network_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(network_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
