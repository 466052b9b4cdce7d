//! Reachability check tests
//! Drive the checker with a scripted prober: verdicts, aggregation,
//! concurrency ceiling, execution failures, cancellation and deadlines

use async_trait::async_trait;
use dbcm_common::{AddressRole, ClusterTopology, DataNodeInstance, DbNode, Error, RoleAddress};
use dbcm_core::inspection::{
    CheckCanceller, NodeAddressSet, ProbeOutcome, Prober, ReachabilityChecker, ResultStatus,
};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============== Scripted Prober ==============

#[derive(Default)]
struct ScriptedProber {
    unreachable: HashSet<IpAddr>,
    broken: Option<IpAddr>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProber {
    fn down(addrs: &[&str]) -> Self {
        Self {
            unreachable: addrs.iter().map(|a| ip(a)).collect(),
            ..Default::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, addr: IpAddr) -> dbcm_common::Result<ProbeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.broken == Some(addr) {
            return Err(Error::ProbeExecution("ping: socket: Operation not permitted".to_string()));
        }
        if self.unreachable.contains(&addr) {
            Ok(ProbeOutcome::Unreachable)
        } else {
            Ok(ProbeOutcome::Reachable)
        }
    }
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn ssh_set(addrs: &[&str]) -> NodeAddressSet {
    NodeAddressSet::new(
        "db1",
        addrs
            .iter()
            .map(|a| RoleAddress { role: AddressRole::Ssh, addr: ip(a) })
            .collect(),
    )
}

// ============== Verdicts ==============

#[tokio::test]
async fn test_duplicate_input_single_unreachable() {
    let prober = Arc::new(ScriptedProber::down(&["10.0.0.2"]));
    let checker = ReachabilityChecker::new(prober.clone());

    let set = ssh_set(&["10.0.0.1", "10.0.0.2", "10.0.0.1"]);
    let report = checker.check(&set, &CheckCanceller::new()).await;

    assert_eq!(prober.calls(), 2);
    assert_eq!(report.probed, 2);
    assert_eq!(report.status, ResultStatus::Ng);
    assert_eq!(report.unreachable, vec![ip("10.0.0.2")]);
    assert!(report.message.starts_with("The following IP can not pinged:"));
    assert!(report.message.contains("10.0.0.2"));
    assert_eq!(report.item, "CheckPing");
    assert_eq!(report.host, "db1");
}

#[tokio::test]
async fn test_empty_set_is_ok_without_probes() {
    let prober = Arc::new(ScriptedProber::default());
    let checker = ReachabilityChecker::new(prober.clone());

    let report = checker.check(&ssh_set(&[]), &CheckCanceller::new()).await;

    assert_eq!(report.status, ResultStatus::Ok);
    assert_eq!(report.message, "All IP can pinged.");
    assert_eq!(prober.calls(), 0);
}

#[tokio::test]
async fn test_single_unreachable_address() {
    let prober = Arc::new(ScriptedProber::down(&["10.0.0.7"]));
    let checker = ReachabilityChecker::new(prober);

    let report = checker.check(&ssh_set(&["10.0.0.7"]), &CheckCanceller::new()).await;

    assert_eq!(report.status, ResultStatus::Ng);
    assert_eq!(report.unreachable, vec![ip("10.0.0.7")]);
}

#[tokio::test]
async fn test_all_reachable() {
    let checker = ReachabilityChecker::new(Arc::new(ScriptedProber::default()));
    let report = checker
        .check(&ssh_set(&["10.0.0.1", "10.0.0.2", "fe80::1"]), &CheckCanceller::new())
        .await;

    assert!(report.is_ok());
    assert!(report.unreachable.is_empty());
    assert_eq!(report.probed, 3);
}

#[tokio::test]
async fn test_repeated_runs_agree() {
    let down = ["10.0.0.3", "10.0.0.9", "10.0.0.5"];
    let addrs = ["10.0.0.1", "10.0.0.3", "10.0.0.5", "10.0.0.9", "10.0.0.3"];
    let checker = ReachabilityChecker::new(Arc::new(ScriptedProber::down(&down))).with_parallelism(2);

    let first = checker.check(&ssh_set(&addrs), &CheckCanceller::new()).await;
    let second = checker.check(&ssh_set(&addrs), &CheckCanceller::new()).await;

    let a: HashSet<IpAddr> = first.unreachable.iter().copied().collect();
    let b: HashSet<IpAddr> = second.unreachable.iter().copied().collect();
    assert_eq!(a, b);
    let expected: HashSet<IpAddr> = down.iter().map(|d| ip(d)).collect();
    assert_eq!(a, expected);
    assert_eq!(first.status, second.status);

    let reachable = ReachabilityChecker::new(Arc::new(ScriptedProber::default()));
    let ok1 = reachable.check(&ssh_set(&addrs), &CheckCanceller::new()).await;
    let ok2 = reachable.check(&ssh_set(&addrs), &CheckCanceller::new()).await;
    assert!(ok1.is_ok() && ok2.is_ok());
}

// ============== Concurrency ==============

#[tokio::test]
async fn test_concurrency_ceiling_respected() {
    let prober = Arc::new(ScriptedProber::default().with_delay(Duration::from_millis(20)));
    let checker = ReachabilityChecker::new(prober.clone()).with_parallelism(3);

    let addrs: Vec<String> = (1..=20).map(|i| format!("10.0.2.{}", i)).collect();
    let refs: Vec<&str> = addrs.iter().map(String::as_str).collect();
    let report = checker.check(&ssh_set(&refs), &CheckCanceller::new()).await;

    assert!(report.is_ok());
    assert_eq!(prober.calls(), 20);
    let peak = prober.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {} exceeded ceiling", peak);
    assert!(peak >= 2, "probes did not run in parallel");
}

#[tokio::test]
async fn test_default_width_is_twelve() {
    let prober = Arc::new(ScriptedProber::default().with_delay(Duration::from_millis(20)));
    let checker = ReachabilityChecker::new(prober.clone());

    let addrs: Vec<String> = (1..=30).map(|i| format!("10.0.3.{}", i)).collect();
    let refs: Vec<&str> = addrs.iter().map(String::as_str).collect();
    checker.check(&ssh_set(&refs), &CheckCanceller::new()).await;

    assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 12);
}

// ============== Failures ==============

#[tokio::test]
async fn test_probe_execution_failure_is_error_not_ng() {
    let prober = Arc::new(ScriptedProber {
        unreachable: [ip("10.0.0.1")].into_iter().collect(),
        broken: Some(ip("10.0.0.2")),
        ..Default::default()
    });
    let checker = ReachabilityChecker::new(prober);

    let report = checker
        .check(&ssh_set(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]), &CheckCanceller::new())
        .await;

    assert_eq!(report.status, ResultStatus::Error);
    assert!(report.unreachable.is_empty());
    assert!(report.message.contains("Operation not permitted"));
}

#[tokio::test]
async fn test_cancelled_check_reports_error() {
    let prober = Arc::new(ScriptedProber::default().with_delay(Duration::from_secs(5)));
    let checker = ReachabilityChecker::new(prober).with_parallelism(1);
    let canceller = CheckCanceller::new();

    let trigger = canceller.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        checker.check(&ssh_set(&["10.0.0.1", "10.0.0.2"]), &canceller),
    )
    .await
    .expect("cancelled check did not return promptly");

    assert_eq!(report.status, ResultStatus::Error);
    assert_eq!(report.message, "check cancelled");
    assert_eq!(report.probed, 0);
}

#[tokio::test]
async fn test_check_deadline() {
    let prober = Arc::new(ScriptedProber::default().with_delay(Duration::from_secs(5)));
    let checker = ReachabilityChecker::new(prober).with_check_timeout(Duration::from_millis(50));
    let canceller = CheckCanceller::new();

    let report = checker.check(&ssh_set(&["10.0.0.1"]), &canceller).await;

    assert_eq!(report.status, ResultStatus::Error);
    assert!(report.message.contains("timed out"));
    assert!(report.message.contains("50ms"), "unexpected message: {}", report.message);
    assert_eq!(report.probed, 0);
}

#[tokio::test]
async fn test_deadline_leaves_canceller_reusable() {
    let slow = ReachabilityChecker::new(Arc::new(
        ScriptedProber::default().with_delay(Duration::from_secs(5)),
    ))
    .with_check_timeout(Duration::from_millis(50));
    let canceller = CheckCanceller::new();

    let first = slow.check(&ssh_set(&["10.0.0.1"]), &canceller).await;
    assert_eq!(first.status, ResultStatus::Error);
    assert!(!canceller.is_cancelled());

    let fast = ReachabilityChecker::new(Arc::new(ScriptedProber::default()));
    let second = fast.check(&ssh_set(&["10.0.0.1", "10.0.0.2"]), &canceller).await;
    assert_eq!(second.status, ResultStatus::Ok);
    assert_eq!(second.probed, 2);
}

// ============== Topology Lookup ==============

fn topology() -> ClusterTopology {
    ClusterTopology {
        cluster_name: "gauss".to_string(),
        nodes: vec![DbNode {
            name: "db1".to_string(),
            node_id: 1,
            back_ips: vec![ip("10.0.0.1")],
            ssh_ips: vec![ip("10.0.0.1")],
            datanodes: vec![DataNodeInstance {
                instance_id: 6001,
                ha_ips: vec![ip("10.0.1.1")],
                listen_ips: vec![ip("10.0.0.1"), ip("10.0.1.2")],
            }],
        }],
    }
}

#[tokio::test]
async fn test_check_host_collects_all_roles() {
    let prober = Arc::new(ScriptedProber::down(&["10.0.1.2"]));
    let checker = ReachabilityChecker::new(prober.clone());

    let report = checker
        .check_host(&topology(), "db1", &CheckCanceller::new())
        .await
        .unwrap();

    assert_eq!(prober.calls(), 3);
    assert_eq!(report.status, ResultStatus::Ng);
    assert_eq!(report.unreachable, vec![ip("10.0.1.2")]);
}

#[tokio::test]
async fn test_check_unknown_host() {
    let checker = ReachabilityChecker::new(Arc::new(ScriptedProber::default()));
    let err = checker
        .check_host(&topology(), "db9", &CheckCanceller::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NodeNotFound(ref h) if h == "db9"));
}
