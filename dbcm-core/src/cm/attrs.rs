//! Cluster-manager attribute records
//!
//! Each record maps its fields to `key=value` pairs in a fixed order. The
//! rendered payload is the whole list joined by commas inside one pair of
//! double quotes, e.g. `"node_id=1,res_instance_id=20,res_args=/opt/dss"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use dbcm_common::Error;

/// A record that can be rendered as a cluster-manager attribute string
pub trait AttrPayload {
    /// Field name/value pairs, in rendering order
    fn pairs(&self) -> Vec<(&'static str, String)>;

    /// Hook for record-specific value rewriting
    fn render_value(&self, value: &str) -> String {
        value.to_string()
    }

    /// Render as `"k1=v1,k2=v2,..."`
    fn render(&self) -> String {
        let body = self
            .pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, self.render_value(&value)))
            .collect::<Vec<_>>()
            .join(",");
        format!("\"{}\"", body)
    }
}

/// Resource type understood by the cluster manager
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    #[default]
    Dn,  // database node
    App, // custom application resource
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dn => write!(f, "DN"),
            Self::App => write!(f, "APP"),
        }
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DN" => Ok(Self::Dn),
            "APP" => Ok(Self::App),
            other => Err(Error::Validation(format!("unknown resource type '{}'", other))),
        }
    }
}

pub const DEFAULT_CHECK_INTERVAL: u32 = 1;
pub const DEFAULT_TIME_OUT: u32 = 120;
pub const DEFAULT_RESTART_TIMES: u32 = 5;
pub const DEFAULT_RESTART_DELAY: u32 = 1;
pub const DEFAULT_RESTART_PERIOD: u32 = 1;

/// Resource registration attributes (`--res_attr`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceAttributes {
    resource_type: ResourceType,
    script: PathBuf,
    check_interval: u32,
    time_out: u32,
    restart_times: u32,
    restart_delay: u32,
    restart_period: u32,
}

impl ResourceAttributes {
    /// Attributes for a resource controlled by `script`, with the cluster
    /// manager's default health and restart policy
    pub fn new(script: impl Into<PathBuf>, resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            script: script.into(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            time_out: DEFAULT_TIME_OUT,
            restart_times: DEFAULT_RESTART_TIMES,
            restart_delay: DEFAULT_RESTART_DELAY,
            restart_period: DEFAULT_RESTART_PERIOD,
        }
    }

    pub fn with_check_interval(mut self, secs: u32) -> Self {
        self.check_interval = secs;
        self
    }

    pub fn with_time_out(mut self, secs: u32) -> Self {
        self.time_out = secs;
        self
    }

    pub fn with_restart_times(mut self, times: u32) -> Self {
        self.restart_times = times;
        self
    }

    pub fn with_restart_delay(mut self, secs: u32) -> Self {
        self.restart_delay = secs;
        self
    }

    pub fn with_restart_period(mut self, secs: u32) -> Self {
        self.restart_period = secs;
        self
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn script(&self) -> &PathBuf {
        &self.script
    }

    pub fn check_interval(&self) -> u32 {
        self.check_interval
    }

    pub fn time_out(&self) -> u32 {
        self.time_out
    }

    pub fn restart_times(&self) -> u32 {
        self.restart_times
    }

    pub fn restart_delay(&self) -> u32 {
        self.restart_delay
    }

    pub fn restart_period(&self) -> u32 {
        self.restart_period
    }
}

impl AttrPayload for ResourceAttributes {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("resources_type", self.resource_type.to_string()),
            ("script", self.script.display().to_string()),
            ("check_interval", self.check_interval.to_string()),
            ("time_out", self.time_out.to_string()),
            ("restart_times", self.restart_times.to_string()),
            ("restart_delay", self.restart_delay.to_string()),
            ("restart_period", self.restart_period.to_string()),
        ]
    }
}

impl fmt::Display for ResourceAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Per-instance attributes (`--add_inst`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceAttributes {
    node_id: u32,
    res_instance_id: u32,
    res_args: String,
}

impl InstanceAttributes {
    /// `res_args` is usually the instance home directory. Multiple values are
    /// separated with `;` and rendered space-separated.
    pub fn new(node_id: u32, res_instance_id: u32, res_args: impl Into<String>) -> Self {
        Self {
            node_id,
            res_instance_id,
            res_args: res_args.into(),
        }
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    pub fn res_instance_id(&self) -> u32 {
        self.res_instance_id
    }

    pub fn res_args(&self) -> &str {
        &self.res_args
    }
}

impl AttrPayload for InstanceAttributes {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("node_id", self.node_id.to_string()),
            ("res_instance_id", self.res_instance_id.to_string()),
            ("res_args", self.res_args.clone()),
        ]
    }

    fn render_value(&self, value: &str) -> String {
        value.replace(';', " ")
    }
}

impl fmt::Display for InstanceAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
