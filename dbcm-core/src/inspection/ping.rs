//! Node network reachability check
//!
//! Collects every address a node uses (back-channel, SSH, and the HA and
//! listener addresses of its data nodes), removes duplicates and pings the
//! distinct addresses through a bounded worker pool. The report lists the
//! addresses that did not answer.

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dbcm_common::{DbNode, Error, Result, RoleAddress};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::cancel::{cancelled, CheckCanceller};
use super::probe::{ProbeOutcome, Prober};
use super::report::{InspectionReport, PendingReport};
use crate::config::InspectionConfig;
use crate::topology::TopologyProvider;

/// Inspection item name
pub const CHECK_PING: &str = "CheckPing";

/// Default number of concurrent probes
pub const DEFAULT_PARALLEL_NUM: usize = 12;

/// All role-tagged addresses of one node
#[derive(Debug, Clone)]
pub struct NodeAddressSet {
    host: String,
    addresses: Vec<RoleAddress>,
}

impl NodeAddressSet {
    pub fn new(host: impl Into<String>, addresses: Vec<RoleAddress>) -> Self {
        Self {
            host: host.into(),
            addresses,
        }
    }

    pub fn from_node(node: &DbNode) -> Self {
        Self::new(node.name.clone(), node.role_addresses())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Addresses as collected, duplicates included
    pub fn addresses(&self) -> &[RoleAddress] {
        &self.addresses
    }

    /// Distinct addresses, sorted
    pub fn distinct(&self) -> Vec<IpAddr> {
        dedup_addresses(self.addresses.iter().map(|a| a.addr))
    }
}

/// Sort and deduplicate: every distinct input appears exactly once
pub fn dedup_addresses<I>(addrs: I) -> Vec<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    let mut sorted: Vec<IpAddr> = addrs.into_iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Parallel ping checker
#[derive(Clone)]
pub struct ReachabilityChecker {
    prober: Arc<dyn Prober>,
    parallelism: usize,
    check_timeout: Option<Duration>,
}

impl ReachabilityChecker {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            parallelism: DEFAULT_PARALLEL_NUM,
            check_timeout: None,
        }
    }

    pub fn from_config(prober: Arc<dyn Prober>, config: &InspectionConfig) -> Self {
        Self::new(prober)
            .with_parallelism(config.parallelism)
            .with_check_timeout(Duration::from_secs(config.check_timeout_secs))
    }

    /// Concurrency ceiling, at least 1
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Deadline for the whole check
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Look up `host` in the topology and check it
    pub async fn check_host<T>(
        &self,
        topology: &T,
        host: &str,
        canceller: &CheckCanceller,
    ) -> Result<InspectionReport>
    where
        T: TopologyProvider + ?Sized,
    {
        let node = topology
            .node_by_name(host)
            .ok_or_else(|| Error::NodeNotFound(host.to_string()))?;

        Ok(self.check(&NodeAddressSet::from_node(node), canceller).await)
    }

    /// Check every distinct address of `set`
    pub async fn check(&self, set: &NodeAddressSet, canceller: &CheckCanceller) -> InspectionReport {
        let pending = PendingReport::new(CHECK_PING, set.host());
        let targets = set.distinct();
        let probed = targets.len();

        info!(
            host = set.host(),
            collected = set.addresses().len(),
            distinct = probed,
            parallelism = self.parallelism,
            "Checking address reachability"
        );

        if targets.is_empty() {
            return pending.ok("All IP can pinged.", 0);
        }

        let start = Instant::now();
        let completed = AtomicUsize::new(0);
        // Dropping `run` on expiry aborts the in-flight probes; the caller's
        // canceller is left untouched.
        let run = self.probe_all(targets, canceller.subscribe(), &completed);
        let result = match self.check_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "reachability check exceeded {:?}",
                    limit
                ))),
            },
            None => run.await,
        };
        let completed = completed.load(Ordering::SeqCst);

        debug!(
            host = set.host(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Reachability probes finished"
        );

        match result {
            Ok(unreachable) if unreachable.is_empty() => {
                info!(host = set.host(), probed, "All addresses reachable");
                pending.ok("All IP can pinged.", probed)
            }
            Ok(unreachable) => {
                let list = unreachable
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                warn!(
                    host = set.host(),
                    unreachable = %list.replace('\n', ","),
                    "Unreachable addresses found"
                );
                pending.ng(
                    format!("The following IP can not pinged: \n{}", list),
                    unreachable,
                    probed,
                )
            }
            Err(Error::Cancelled) => {
                warn!(host = set.host(), completed, "Reachability check cancelled");
                pending.error("check cancelled", completed)
            }
            Err(e) => {
                error!(host = set.host(), completed, error = %e, "Reachability check failed");
                pending.error(format!("Reachability check failed: {}", e), completed)
            }
        }
    }

    /// Probe `targets` with at most `parallelism` probes in flight. Returns the
    /// unreachable addresses, sorted; the first probe execution error aborts
    /// the remaining probes. `completed` counts probes that returned a verdict.
    async fn probe_all(
        &self,
        targets: Vec<IpAddr>,
        cancel_rx: watch::Receiver<bool>,
        completed: &AtomicUsize,
    ) -> Result<Vec<IpAddr>> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut join_set = JoinSet::new();

        for addr in targets {
            let sem = semaphore.clone();
            let prober = self.prober.clone();
            let cancel_rx = cancel_rx.clone();

            join_set.spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return Err(Error::Cancelled),
                };
                let is_cancelled = *cancel_rx.borrow();
                if is_cancelled {
                    return Err(Error::Cancelled);
                }

                tokio::select! {
                    outcome = prober.probe(addr) => outcome.map(|o| (addr, o)),
                    _ = cancelled(cancel_rx) => Err(Error::Cancelled),
                }
            });
        }

        let mut unreachable = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok((addr, ProbeOutcome::Unreachable))) => {
                    completed.fetch_add(1, Ordering::SeqCst);
                    debug!(addr = %addr, "Address unreachable");
                    unreachable.push(addr);
                }
                Ok(Ok((addr, ProbeOutcome::Reachable))) => {
                    completed.fetch_add(1, Ordering::SeqCst);
                    debug!(addr = %addr, "Address reachable");
                }
                Ok(Err(e)) => {
                    join_set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    join_set.abort_all();
                    return Err(Error::ProbeExecution(format!("probe task failed: {}", e)));
                }
            }
        }

        unreachable.sort();
        Ok(unreachable)
    }
}
