// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware upload tool: packages a firmware binary with `nrfutil` and
//! flashes it to an nRF52 bootloader over USB CDC.
//!
//! Usage:
//!   nrfdfu-upload upload .pio/build/nrf52/firmware.bin
//!   nrfdfu-upload --port /dev/ttyACM0 upload firmware.bin --application-version 3
//!   nrfdfu-upload package firmware.bin
//!   nrfdfu-upload deploy
//!   nrfdfu-upload ports

mod cli;
mod commands;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    cli::run(args)
}
