use crate::output::{self, OutputFormat};
use crate::InspectCommands;
use anyhow::{Context, Result};
use dbcm_core::inspection::{
    CheckCanceller, InspectionReport, PingProber, ReachabilityChecker, ResultStatus,
};
use dbcm_core::{load_topology, DbcmConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct ReportRow {
    item: String,
    host: String,
    status: String,
    probed: usize,
    unreachable: String,
    duration_ms: i64,
}

impl From<&InspectionReport> for ReportRow {
    fn from(r: &InspectionReport) -> Self {
        Self {
            item: r.item.clone(),
            host: r.host.clone(),
            status: r.status.to_string(),
            probed: r.probed,
            unreachable: r
                .unreachable
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            duration_ms: r.duration_ms(),
        }
    }
}

/// Run an inspection command; returns whether every check passed
pub async fn handle_inspect_command(
    command: InspectCommands,
    config: &DbcmConfig,
    output_format: &str,
) -> Result<bool> {
    match command {
        InspectCommands::Ping {
            host,
            topology,
            parallelism,
        } => {
            let host = match host {
                Some(h) => h,
                None => hostname::get()
                    .context("failed to read local host name")?
                    .to_string_lossy()
                    .to_string(),
            };
            let topology = load_topology(&topology)
                .with_context(|| format!("failed to load topology {}", topology.display()))?;

            let inspection = &config.inspection;
            let prober = PingProber::new(
                inspection.ping_program.clone(),
                inspection.probe_count,
                Duration::from_secs(inspection.probe_timeout_secs),
            );
            let mut checker = ReachabilityChecker::from_config(Arc::new(prober), inspection);
            if let Some(n) = parallelism {
                checker = checker.with_parallelism(n);
            }

            let canceller = CheckCanceller::new();
            let ctrl_c = canceller.cancel_on_ctrl_c();
            let report = checker.check_host(&topology, &host, &canceller).await;
            ctrl_c.abort();
            let report = report?;

            print_report(&report, OutputFormat::from_str(output_format))?;
            Ok(report.is_ok())
        }
    }
}

fn print_report(report: &InspectionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            output::print_table(vec![ReportRow::from(report)]);
            match report.status {
                ResultStatus::Ok => output::print_success(&report.message),
                ResultStatus::Ng => output::print_warning(&report.message),
                ResultStatus::Error => output::print_error(&report.message),
            }
        }
        OutputFormat::Json => output::print_json(report)?,
        OutputFormat::Yaml => output::print_yaml(report)?,
    }
    Ok(())
}
