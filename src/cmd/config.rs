//! Configuration view and validation commands: `manta-review config`.

use anyhow::{Context, Result};
use manta_review::review_config::{
    CONFIG_FILE, ENV_ADB_CMD, ENV_DEVICE_SERIAL, ENV_PANDOC_CMD, MANTA_DIR, ReviewConfig,
    ReviewToml,
};
use std::path::Path;

use super::super::ConfigCommands;

fn print_toml(toml: &ReviewToml) {
    println!("[device]");
    if let Some(serial) = &toml.device.serial {
        println!("  serial = \"{}\"", serial);
    }
    println!("  adb_cmd = \"{}\"", toml.device.adb_cmd);
    println!("  staging_dir = \"{}\"", toml.device.staging_dir);
    println!("  export_dir = \"{}\"", toml.device.export_dir);
    println!("  viewer_component = \"{}\"", toml.device.viewer_component);
    println!();
    println!("[render]");
    println!("  pandoc_cmd = \"{}\"", toml.render.pandoc_cmd);
    println!("  pdf_engine = \"{}\"", toml.render.pdf_engine);
    println!("  page_size = \"{}\"", toml.render.page_size);
    println!();
}

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let manta_dir = project_dir.join(MANTA_DIR);
    let config_path = manta_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Manta Review Configuration");
            println!("==========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                print_toml(&ReviewToml::load(&config_path)?);
            } else {
                println!("No manta.toml found at {}", config_path.display());
                println!();
                println!("Using default configuration:");
                print_toml(&ReviewToml::default());
                println!("Run 'manta-review config init' to create a manta.toml file.");
                println!();
            }

            let config = ReviewConfig::new(project_dir.to_path_buf())?;
            println!(
                "Effective values (with {}/{}/{} overrides):",
                ENV_ADB_CMD, ENV_PANDOC_CMD, ENV_DEVICE_SERIAL
            );
            println!("  adb_cmd = \"{}\"", config.adb_cmd());
            println!("  pandoc_cmd = \"{}\"", config.pandoc_cmd());
            match config.serial() {
                Some(serial) => println!("  serial = \"{}\"", serial),
                None => println!("  serial = (auto-select)"),
            }
            println!("  ledger = {}", config.state_file().display());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No manta.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = ReviewToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("manta.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&manta_dir)
                .with_context(|| format!("Failed to create {}", manta_dir.display()))?;
            ReviewToml::default().save(&config_path)?;

            println!("Created manta.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [device] serial, adb_cmd, staging_dir, export_dir");
            println!("  - [render] pandoc_cmd, pdf_engine, page_size");
            println!();
        }
    }

    Ok(())
}
