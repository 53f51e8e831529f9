// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use nrfdfu_common::config::parse_hex_u16;
use nrfdfu_common::{
    DevicePattern, UploadConfig, DEFAULT_APPLICATION_VERSION, DEFAULT_HW_VERSION, DEFAULT_TOOL,
};

use crate::commands;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "nrfdfu-upload")]
#[command(about = "Package firmware with nrfutil and flash it over USB CDC")]
pub struct Cli {
    /// Serial port of the device (e.g., /dev/ttyACM0). Discovered when omitted.
    #[arg(short, long, global = true, env = "NRFDFU_PORT")]
    pub port: Option<String>,

    /// Packaging tool executable
    #[arg(long, global = true, env = "NRFDFU_TOOL", default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// Device discovery pattern (e.g., "/dev/tty.usbmodem*")
    #[arg(long, global = true, env = "NRFDFU_DEVICE_PATTERN")]
    pub device_pattern: Option<DevicePattern>,

    /// Timeout for each tool run in seconds (0 = no timeout)
    #[arg(long, global = true, env = "NRFDFU_TIMEOUT", default_value = "120")]
    pub timeout: u64,

    /// Enable debug logging, including the tool's own output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Packaging parameters.
#[derive(Args)]
pub struct PackageArgs {
    /// Hardware version
    #[arg(long, env = "NRFDFU_HW_VERSION", default_value_t = DEFAULT_HW_VERSION)]
    pub hw_version: u32,

    /// SoftDevice requirement (hex or decimal)
    #[arg(long, env = "NRFDFU_SD_REQ", default_value = "0x00", value_parser = parse_hex_u16)]
    pub sd_req: u16,

    /// Application version number
    #[arg(long, env = "NRFDFU_APP_VERSION", default_value_t = DEFAULT_APPLICATION_VERSION)]
    pub application_version: u32,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Package firmware and flash it to the device
    Upload {
        /// Firmware binary file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        package: PackageArgs,

        /// Remove the package file after a successful upload
        #[arg(long)]
        clean: bool,
    },

    /// Generate the DFU package without flashing
    Package {
        /// Firmware binary file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        package: PackageArgs,
    },

    /// Flash a previously generated package
    Deploy,

    /// List serial ports and the device discovery would pick
    Ports,
}

impl Cli {
    /// Build the upload configuration from global options.
    fn config(&self) -> UploadConfig {
        let timeout = match self.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut config = UploadConfig::default()
            .with_tool(&self.tool)
            .with_device(self.port.clone())
            .with_step_timeout(timeout);
        if let Some(pattern) = &self.device_pattern {
            config = config.with_device_pattern(Some(pattern.clone()));
        }
        config
    }
}

impl PackageArgs {
    fn apply(&self, config: UploadConfig) -> UploadConfig {
        config
            .with_hardware_version(self.hw_version)
            .with_soft_core_requirement(self.sd_req)
            .with_application_version(self.application_version)
    }
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.config();

    match cli.command {
        Commands::Upload {
            file,
            package,
            clean,
        } => commands::upload(package.apply(config).with_keep_package(!clean), &file),
        Commands::Package { file, package } => commands::package(package.apply(config), &file),
        Commands::Deploy => commands::deploy(config),
        Commands::Ports => commands::ports(&config),
    }
}
