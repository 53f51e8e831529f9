// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crc::{Crc, CRC_32_ISO_HDLC};
use serialport::SerialPortType;

use nrfdfu_common::{select_device, Orchestrator, ProcessRunner, UploadConfig};

use crate::progress::ConsoleProgress;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Package the firmware and flash it to the device.
pub fn upload(config: UploadConfig, file: &Path) -> Result<()> {
    print_firmware_summary(&config, file);

    let mut orchestrator =
        Orchestrator::with_progress(config, ProcessRunner, ConsoleProgress::default());
    orchestrator
        .upload(file)
        .with_context(|| format!("Failed to upload {}", file.display()))?;

    Ok(())
}

/// Generate the DFU package only.
pub fn package(config: UploadConfig, file: &Path) -> Result<()> {
    print_firmware_summary(&config, file);

    let mut orchestrator =
        Orchestrator::with_progress(config, ProcessRunner, ConsoleProgress::default());
    let path = orchestrator
        .package(file)
        .with_context(|| format!("Failed to package {}", file.display()))?;

    println!();
    println!("Package written to {}", path.display());
    println!("Use 'nrfdfu-upload deploy' to flash it.");

    Ok(())
}

/// Flash a previously generated package.
pub fn deploy(config: UploadConfig) -> Result<()> {
    let package = config.package_path();
    println!("Package:  {}", package.display());
    println!();

    let mut orchestrator =
        Orchestrator::with_progress(config, ProcessRunner, ConsoleProgress::default());
    orchestrator
        .deploy()
        .with_context(|| format!("Failed to deploy {}", package.display()))?;

    Ok(())
}

/// List serial ports and show which device discovery selects.
pub fn ports(config: &UploadConfig) -> Result<()> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;

    println!("Serial ports:");
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in &ports {
        match &port.port_type {
            SerialPortType::UsbPort(usb) => println!(
                "  {:<24} USB {:04x}:{:04x} {}",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.product.as_deref().unwrap_or("")
            ),
            other => println!("  {:<24} {:?}", port.port_name, other),
        }
    }
    println!();

    if let Some(device) = &config.device {
        println!("Selected: {} (explicit)", device);
        return Ok(());
    }

    let Some(pattern) = &config.device_pattern else {
        println!("No discovery pattern for this platform; pass --port.");
        return Ok(());
    };

    let mut found = pattern
        .scan()
        .with_context(|| format!("Failed to list {}", pattern.dir().display()))?;
    found.sort();

    println!("Matching {}:", pattern);
    if found.is_empty() {
        println!("  (none)");
    }
    for device in &found {
        println!("  {}", device);
    }

    match select_device(None, found) {
        Some(device) => println!("Selected: {}", device),
        None => println!("Selected: (none)"),
    }

    Ok(())
}

/// Print what is about to be packaged.
///
/// An unreadable artifact is only a warning here; the tool reports the
/// actual failure.
fn print_firmware_summary(config: &UploadConfig, file: &Path) {
    match fs::read(file) {
        Ok(firmware) => println!(
            "Firmware: {} ({} bytes, CRC32: 0x{:08x})",
            file.display(),
            firmware.len(),
            CRC32.checksum(&firmware)
        ),
        Err(e) => tracing::warn!("cannot read {}: {}", file.display(), e),
    }
    println!(
        "Package:  hw {}, sd-req {}, application version {}",
        config.hardware_version,
        config.sd_req_arg(),
        config.application_version
    );
    println!();
}
