//! Cluster topology model
//!
//! Describes the database nodes of a cluster and the network addresses each
//! node and data-node instance uses. The topology is read-only input for the
//! inspection items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Role an address plays on a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    Back,   // management/back-channel
    Ssh,
    Ha,     // data-node replication
    Listen, // data-node client listener
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Back => write!(f, "back"),
            Self::Ssh => write!(f, "ssh"),
            Self::Ha => write!(f, "ha"),
            Self::Listen => write!(f, "listen"),
        }
    }
}

/// An address tagged with the role it was collected from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAddress {
    pub role: AddressRole,
    pub addr: IpAddr,
}

/// Data-node instance hosted on a database node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataNodeInstance {
    pub instance_id: u32,
    #[serde(default)]
    pub ha_ips: Vec<IpAddr>,
    #[serde(default)]
    pub listen_ips: Vec<IpAddr>,
}

/// Database node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbNode {
    pub name: String,
    #[serde(default)]
    pub node_id: u32,
    #[serde(default)]
    pub back_ips: Vec<IpAddr>,
    #[serde(default)]
    pub ssh_ips: Vec<IpAddr>,
    #[serde(default)]
    pub datanodes: Vec<DataNodeInstance>,
}

impl DbNode {
    /// Every address of the node in collection order: back, ssh, then the
    /// ha and listen addresses of each data node. Duplicates are kept.
    pub fn role_addresses(&self) -> Vec<RoleAddress> {
        let tag = |role: AddressRole| move |addr: &IpAddr| RoleAddress { role, addr: *addr };

        let mut all: Vec<RoleAddress> = Vec::new();
        all.extend(self.back_ips.iter().map(tag(AddressRole::Back)));
        all.extend(self.ssh_ips.iter().map(tag(AddressRole::Ssh)));
        for dn in &self.datanodes {
            all.extend(dn.ha_ips.iter().map(tag(AddressRole::Ha)));
            all.extend(dn.listen_ips.iter().map(tag(AddressRole::Listen)));
        }
        all
    }
}

/// Cluster topology
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterTopology {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub nodes: Vec<DbNode>,
}

impl ClusterTopology {
    /// Look up a node by host name
    pub fn node(&self, name: &str) -> Option<&DbNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}
