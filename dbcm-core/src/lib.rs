//! dbcm core library
//!
//! Cluster-manager resource command building and cluster health inspection
//! for a distributed database.

pub mod config;
pub mod logging;
pub mod topology;

// Cluster-manager resources
pub mod cm;

// Health inspection
pub mod inspection;

pub use config::DbcmConfig;
pub use topology::{load_topology, TopologyProvider};
