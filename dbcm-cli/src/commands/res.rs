use crate::output::{self, OutputFormat};
use crate::ResCommands;
use anyhow::Result;
use dbcm_core::cm::{CmCtl, InstanceAttributes, ResourceAttributes, ResourceCommand, ResourceType};
use dbcm_core::DbcmConfig;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct RenderedCommand<'a> {
    action: String,
    name: &'a str,
    payload: &'a str,
    command_line: String,
}

fn build_command(command: &ResCommands) -> Result<ResourceCommand> {
    let cmd = match command {
        ResCommands::Add {
            name,
            script,
            res_type,
            check_interval,
            timeout,
            restart_times,
            restart_delay,
            restart_period,
            ..
        } => {
            let res_type: ResourceType = res_type.parse()?;
            let attrs = ResourceAttributes::new(script, res_type)
                .with_check_interval(*check_interval)
                .with_time_out(*timeout)
                .with_restart_times(*restart_times)
                .with_restart_delay(*restart_delay)
                .with_restart_period(*restart_period);
            ResourceCommand::add(name, &attrs)
        }
        ResCommands::Edit {
            name,
            node_id,
            instance_id,
            args,
            ..
        } => ResourceCommand::edit(name, &InstanceAttributes::new(*node_id, *instance_id, args)),
    };
    Ok(cmd)
}

pub async fn handle_res_command(
    command: ResCommands,
    config: &DbcmConfig,
    output_format: &str,
) -> Result<()> {
    let cmd = build_command(&command)?;
    let execute = match command {
        ResCommands::Add { execute, .. } | ResCommands::Edit { execute, .. } => execute,
    };

    match OutputFormat::from_str(output_format) {
        OutputFormat::Table => println!("{}", cmd),
        format => {
            let rendered = RenderedCommand {
                action: cmd.action().to_string(),
                name: cmd.name(),
                payload: cmd.payload(),
                command_line: cmd.to_command_line(),
            };
            if format == OutputFormat::Json {
                output::print_json(&rendered)?;
            } else {
                output::print_yaml(&rendered)?;
            }
        }
    }

    if execute {
        let ctl = CmCtl::new(
            config.cm.cm_ctl_path.clone(),
            Duration::from_secs(config.cm.command_timeout_secs),
        );
        match ctl.run(&cmd).await {
            Ok(out) => {
                if !out.stdout.trim().is_empty() {
                    output::print_info(out.stdout.trim());
                }
                output::print_success(&format!("Resource '{}' {} succeeded", cmd.name(), cmd.action()));
            }
            Err(e) => {
                output::print_error(&e.to_string());
                return Err(e.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_add_command() {
        let command = ResCommands::Add {
            name: "dn1".to_string(),
            script: PathBuf::from("/opt/dn_ctl.sh"),
            res_type: "DN".to_string(),
            check_interval: 1,
            timeout: 120,
            restart_times: 5,
            restart_delay: 1,
            restart_period: 1,
            execute: false,
        };
        let cmd = build_command(&command).unwrap();
        assert!(cmd
            .to_command_line()
            .starts_with("cm_ctl res --add --res_name dn1 --res_attr=\"resources_type=DN,"));
    }

    #[test]
    fn test_build_add_rejects_unknown_type() {
        let command = ResCommands::Add {
            name: "x".to_string(),
            script: PathBuf::from("/x.sh"),
            res_type: "CN".to_string(),
            check_interval: 1,
            timeout: 120,
            restart_times: 5,
            restart_delay: 1,
            restart_period: 1,
            execute: false,
        };
        assert!(build_command(&command).is_err());
    }

    #[test]
    fn test_build_edit_command() {
        let command = ResCommands::Edit {
            name: "dss".to_string(),
            node_id: 2,
            instance_id: 21,
            args: "/data/dss".to_string(),
            execute: false,
        };
        let cmd = build_command(&command).unwrap();
        assert_eq!(
            cmd.to_command_line(),
            "cm_ctl res --edit --res_name dss --add_inst=\"node_id=2,res_instance_id=21,res_args=/data/dss\""
        );
    }
}
