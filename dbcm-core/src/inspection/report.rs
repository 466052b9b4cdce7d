//! Inspection item reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Outcome of an inspection item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultStatus {
    /// Check passed
    Ok,
    /// Check ran and found problems
    Ng,
    /// Check could not be carried out
    Error,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Ng => write!(f, "NG"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Report produced by one run of an inspection item
///
/// A report is created when the item starts and finished exactly once through
/// one of the `ok`/`ng`/`error` methods, which consume the pending value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionReport {
    pub item: String,
    pub host: String,
    pub status: ResultStatus,
    pub message: String,
    pub unreachable: Vec<IpAddr>,
    pub probed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A report that has not been finished yet
#[derive(Debug)]
pub struct PendingReport {
    item: String,
    host: String,
    started_at: DateTime<Utc>,
}

impl PendingReport {
    pub fn new(item: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            host: host.into(),
            started_at: Utc::now(),
        }
    }

    fn finish(self, status: ResultStatus, message: String, unreachable: Vec<IpAddr>, probed: usize) -> InspectionReport {
        InspectionReport {
            item: self.item,
            host: self.host,
            status,
            message,
            unreachable,
            probed,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn ok(self, message: impl Into<String>, probed: usize) -> InspectionReport {
        self.finish(ResultStatus::Ok, message.into(), Vec::new(), probed)
    }

    pub fn ng(self, message: impl Into<String>, unreachable: Vec<IpAddr>, probed: usize) -> InspectionReport {
        self.finish(ResultStatus::Ng, message.into(), unreachable, probed)
    }

    pub fn error(self, message: impl Into<String>, probed: usize) -> InspectionReport {
        self.finish(ResultStatus::Error, message.into(), Vec::new(), probed)
    }
}

impl InspectionReport {
    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
