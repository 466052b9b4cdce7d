//! Cluster health inspection items

pub mod cancel;
pub mod ping;
pub mod probe;
pub mod report;

pub use cancel::CheckCanceller;
pub use ping::{dedup_addresses, NodeAddressSet, ReachabilityChecker, CHECK_PING, DEFAULT_PARALLEL_NUM};
pub use probe::{PingProber, ProbeOutcome, Prober};
pub use report::{InspectionReport, PendingReport, ResultStatus};
