//! Reachability probes

use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use dbcm_common::{Error, Result};
use tokio::process::Command;
use tracing::{debug, trace};

/// Result of a probe that actually ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
}

/// Reachability probe for a single address
///
/// `Ok(Unreachable)` is a normal outcome. `Err` means the probe mechanism
/// itself could not run and the whole check must be aborted.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, addr: IpAddr) -> Result<ProbeOutcome>;
}

/// ICMP echo through the system `ping` tool
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    count: u32,
    timeout: Duration,
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new("ping", 1, Duration::from_secs(1))
    }
}

impl PingProber {
    pub fn new(program: impl Into<String>, count: u32, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            count: count.max(1),
            timeout,
        }
    }

    fn args(&self, addr: IpAddr) -> Vec<String> {
        let mut args = Vec::new();
        if addr.is_ipv6() {
            args.push("-6".to_string());
        }
        args.push("-c".to_string());
        args.push(self.count.to_string());
        args.push("-W".to_string());
        args.push(self.timeout.as_secs().max(1).to_string());
        args.push(addr.to_string());
        args
    }

    /// Upper bound for one ping run; ping's own `-W` normally ends it first
    fn deadline(&self) -> Duration {
        self.timeout.max(Duration::from_secs(1)) * self.count + Duration::from_secs(2)
    }
}

fn is_permission_failure(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("operation not permitted") || stderr.contains("permission denied")
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, addr: IpAddr) -> Result<ProbeOutcome> {
        trace!(addr = %addr, "Pinging");

        let child = Command::new(&self.program)
            .args(self.args(addr))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    Error::ProbeExecution(format!("{} not found: {}", self.program, e))
                }
                ErrorKind::PermissionDenied => {
                    Error::ProbeExecution(format!("not permitted to run {}: {}", self.program, e))
                }
                _ => Error::ProbeExecution(format!("failed to spawn {}: {}", self.program, e)),
            })?;

        let output = match tokio::time::timeout(self.deadline(), child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| Error::ProbeExecution(format!("failed to wait for {}: {}", self.program, e)))?,
            Err(_) => {
                debug!(addr = %addr, "Ping did not return in time");
                return Ok(ProbeOutcome::Unreachable);
            }
        };

        match output.status.code() {
            Some(0) => Ok(ProbeOutcome::Reachable),
            Some(1) => Ok(ProbeOutcome::Unreachable),
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if is_permission_failure(&stderr) {
                    return Err(Error::ProbeExecution(format!(
                        "{} is not permitted to send probes: {}",
                        self.program,
                        stderr.trim()
                    )));
                }
                debug!(addr = %addr, code = ?code, stderr = %stderr.trim(), "Ping failed");
                Ok(ProbeOutcome::Unreachable)
            }
        }
    }
}
