//! Reconciles the hosts declared for a network with the additional routes of
//! its VPN service.
//!
//! Both entry points are full replace operations. The store and the OS are two
//! independently failing systems, so a failure half way leaves them out of
//! step; running the same operation again converges them.

use thiserror::Error;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::models::{Network, NetworkHostSetup};
use crate::networksetup::{self, NetworkInfo, NetworkSetup, VpnService};
use crate::repository::{self, NetworkHostRepository, NetworkHostSetupRepository, NetworkRepository};
use crate::shell_command_ext::CommandRunner;
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No VPN service named {0}")]
    VpnServiceNotFound(String),
    #[error("Network setup error: {0}")]
    NetworkSetup(#[from] networksetup::Error),
    #[error("Repository error: {0}")]
    Repository(#[from] repository::Error),
}

#[derive(Clone, Debug)]
pub struct RouteSynchronizer<R> {
    inspector: NetworkSetup<R>,
    networks: NetworkRepository,
    hosts: NetworkHostRepository,
    setups: NetworkHostSetupRepository,
}

impl<R: CommandRunner> RouteSynchronizer<R> {
    pub fn new(inspector: NetworkSetup<R>, storage: Storage) -> Self {
        Self {
            inspector,
            networks: NetworkRepository::new(storage.clone()),
            hosts: NetworkHostRepository::new(storage.clone()),
            setups: NetworkHostSetupRepository::new(storage),
        }
    }

    /// Routes every host of the network around the VPN through the current
    /// physical gateway.
    ///
    /// Local network facts are resolved before anything is written, so a
    /// machine without a usable default route leaves store and OS untouched.
    #[tracing::instrument(name = "RouteSynchronizer::sync", level = "info", skip(self, cancel), err)]
    pub async fn sync_by_network_id(&self, cancel: &CancellationToken, network_id: i64) -> Result<(), Error> {
        let network = self.networks.get(network_id).await?;
        self.ensure_vpn_service(cancel, &network).await?;
        let info = self.local_network_info(cancel).await?;

        let hosts = self.hosts.list(network_id).await?;
        let created_at = OffsetDateTime::now_utc();
        let setups: Vec<NetworkHostSetup> = hosts
            .iter()
            .map(|host| NetworkHostSetup::new(host, &info, created_at))
            .collect();
        let host_ids: Vec<i64> = hosts.iter().map(|host| host.id).collect();

        self.setups.delete_batch_by_network_host_ids(&host_ids).await?;
        self.setups.add_batch(&setups).await?;
        self.inspector.set_additional_routes(cancel, &network, &setups).await?;

        tracing::info!(
            network = %network.name,
            hosts = setups.len(),
            subnet_mask = %info.subnet_mask,
            router = %info.router,
            "network synchronized"
        );
        Ok(())
    }

    /// Drops the persisted setups of the network and clears the additional
    /// routes of its VPN service.
    #[tracing::instrument(name = "RouteSynchronizer::reset", level = "info", skip(self, cancel), err)]
    pub async fn reset_by_network_id(&self, cancel: &CancellationToken, network_id: i64) -> Result<(), Error> {
        let network = self.networks.get(network_id).await?;
        self.ensure_vpn_service(cancel, &network).await?;

        let host_ids = self.hosts.list_ids(network_id).await?;
        self.setups.delete_batch_by_network_host_ids(&host_ids).await?;
        self.inspector.set_additional_routes(cancel, &network, &[]).await?;

        tracing::info!(network = %network.name, hosts = host_ids.len(), "network reset");
        Ok(())
    }

    /// Setups currently persisted for the hosts of the network.
    pub async fn applied(&self, network_id: i64) -> Result<Vec<NetworkHostSetup>, Error> {
        let host_ids = self.hosts.list_ids(network_id).await?;
        Ok(self.setups.list_by_network_host_ids(&host_ids).await?)
    }

    async fn local_network_info(&self, cancel: &CancellationToken) -> Result<NetworkInfo, Error> {
        let iface = self.inspector.default_network_interface(cancel).await?;
        let service = self.inspector.network_service_by_interface(cancel, &iface).await?;
        let info = self.inspector.network_info_by_service(cancel, &service).await?;
        tracing::debug!(%iface, %service, ?info, "resolved local network");
        Ok(info)
    }

    async fn ensure_vpn_service(&self, cancel: &CancellationToken, network: &Network) -> Result<(), Error> {
        let expected = VpnService::from(network.name.as_str());
        let services = self.inspector.list_vpn(cancel).await?;
        if services.contains(&expected) {
            Ok(())
        } else {
            tracing::warn!(network = %network.name, available = ?services, "network has no matching VPN service");
            Err(Error::VpnServiceNotFound(network.name.clone()))
        }
    }
}
