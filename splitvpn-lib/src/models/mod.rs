//! Persisted entities and their table definitions.

mod network;
mod network_host;
mod network_host_setup;

pub use network::{Network, NetworkTable};
pub use network_host::{NetworkHost, NetworkHostTable};
pub use network_host_setup::{NetworkHostSetup, NetworkHostSetupTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;
}

/// Tables in creation order, referenced tables first.
pub fn schema() -> Vec<Box<dyn Table + Send + Sync>> {
    vec![
        Box::new(NetworkTable),
        Box::new(NetworkHostTable),
        Box::new(NetworkHostSetupTable),
    ]
}
