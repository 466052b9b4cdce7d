//! Cluster-manager resource registration
//!
//! Builds `cm_ctl res` command lines from attribute records and optionally
//! runs them against the cluster manager.

pub mod attrs;
pub mod command;
pub mod ctl;

pub use attrs::{AttrPayload, InstanceAttributes, ResourceAttributes, ResourceType};
pub use command::{ResAction, ResourceCommand, CM_CTL};
pub use ctl::{CmCtl, CommandOutput, DEFAULT_CM_TIMEOUT};
