use crate::output::{self, OutputFormat};
use crate::ConfigCommands;
use anyhow::Result;
use dbcm_core::DbcmConfig;

pub fn handle_config_command(
    command: ConfigCommands,
    config: &DbcmConfig,
    output_format: &str,
) -> Result<()> {
    match command {
        ConfigCommands::Sample => {
            print!("{}", DbcmConfig::generate_sample());
        }
        ConfigCommands::Show => match OutputFormat::from_str(output_format) {
            OutputFormat::Yaml => output::print_yaml(config)?,
            _ => output::print_json(config)?,
        },
    }
    Ok(())
}
