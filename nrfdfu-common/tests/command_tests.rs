// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for package and deploy command construction.

mod common;

use std::path::{Path, PathBuf};

use common::args;
use nrfdfu_common::config::parse_hex_u16;
use nrfdfu_common::{
    deploy_invocation, package_invocation, Invocation, UploadConfig, DEFAULT_APPLICATION_VERSION,
    DEFAULT_HW_VERSION, DEFAULT_PACKAGE_NAME, DEFAULT_SD_REQ, DEFAULT_TOOL,
};

// --- Defaults ---

#[test]
fn test_packaging_defaults() {
    assert_eq!(DEFAULT_TOOL, "nrfutil");
    assert_eq!(DEFAULT_HW_VERSION, 52);
    assert_eq!(DEFAULT_SD_REQ, 0x00);
    assert_eq!(DEFAULT_APPLICATION_VERSION, 1);
    assert_eq!(DEFAULT_PACKAGE_NAME, "firmware.zip");
}

#[test]
fn test_default_config_keeps_package() {
    let config = UploadConfig::default();
    assert!(config.keep_package);
    assert!(config.device.is_none());
    assert_eq!(config.package_path(), PathBuf::from("./firmware.zip"));
    assert_eq!(config.lock_path(), PathBuf::from("./firmware.zip.lock"));
}

// --- Package step ---

#[test]
fn test_package_invocation_matches_nrfutil_shape() {
    let config = UploadConfig::default();
    let invocation = package_invocation(&config, Path::new("build/firmware.bin"));

    assert_eq!(invocation.program, "nrfutil");
    assert_eq!(
        args(&invocation),
        [
            "pkg",
            "generate",
            "--hw-version",
            "52",
            "--sd-req=0x00",
            "--application",
            "build/firmware.bin",
            "--application-version",
            "1",
            "firmware.zip",
        ]
    );
}

#[test]
fn test_package_invocation_uses_configured_parameters() {
    let config = UploadConfig::default()
        .with_tool("/opt/nordic/nrfutil")
        .with_hardware_version(53)
        .with_soft_core_requirement(0xB6)
        .with_application_version(7)
        .with_package_name("app.zip");
    let invocation = package_invocation(&config, Path::new("out.bin"));

    assert_eq!(invocation.program, "/opt/nordic/nrfutil");
    assert_eq!(
        args(&invocation),
        [
            "pkg",
            "generate",
            "--hw-version",
            "53",
            "--sd-req=0xB6",
            "--application",
            "out.bin",
            "--application-version",
            "7",
            "app.zip",
        ]
    );
}

#[test]
fn test_package_invocation_keeps_artifact_path_as_one_argument() {
    let config = UploadConfig::default();
    let invocation = package_invocation(&config, Path::new("my build/fw; rm -rf x.bin"));

    let args = args(&invocation);
    assert_eq!(args[6], "my build/fw; rm -rf x.bin");
    assert_eq!(args.len(), 10);
}

#[test]
fn test_invocations_run_in_work_dir() {
    let config = UploadConfig::default().with_work_dir("/tmp/fw");
    let package = package_invocation(&config, Path::new("a.bin"));
    let deploy = deploy_invocation(&config, "/dev/ttyACM0");

    assert_eq!(package.current_dir, Some(PathBuf::from("/tmp/fw")));
    assert_eq!(deploy.current_dir, Some(PathBuf::from("/tmp/fw")));
}

// --- Deploy step ---

#[test]
fn test_deploy_invocation_matches_nrfutil_shape() {
    let config = UploadConfig::default();
    let invocation = deploy_invocation(&config, "/dev/tty.usbmodem1234");

    assert_eq!(invocation.program, "nrfutil");
    assert_eq!(
        args(&invocation),
        [
            "dfu",
            "usb-serial",
            "-pkg",
            "firmware.zip",
            "-p",
            "/dev/tty.usbmodem1234"
        ]
    );
}

#[test]
fn test_deploy_invocation_contains_device_verbatim() {
    let config = UploadConfig::default();
    let invocation = deploy_invocation(&config, "COM7");
    assert_eq!(args(&invocation).last().map(String::as_str), Some("COM7"));
}

// --- Display ---

#[test]
fn test_invocation_display() {
    let config = UploadConfig::default();
    let invocation = deploy_invocation(&config, "/dev/ttyACM0");
    assert_eq!(
        invocation.to_string(),
        "nrfutil dfu usb-serial -pkg firmware.zip -p /dev/ttyACM0"
    );
}

#[test]
fn test_invocation_display_quotes_whitespace() {
    let invocation = Invocation::new("tool")
        .arg("my file.bin")
        .arg("it's here")
        .arg("");
    assert_eq!(
        invocation.to_string(),
        "tool 'my file.bin' 'it'\\''s here' ''"
    );
}

// --- Hex parsing ---

#[test]
fn test_parse_hex_u16() {
    assert_eq!(parse_hex_u16("0x00"), Ok(0));
    assert_eq!(parse_hex_u16("0xB6"), Ok(0xB6));
    assert_eq!(parse_hex_u16("0X0101"), Ok(0x0101));
    assert_eq!(parse_hex_u16("182"), Ok(182));
    assert!(parse_hex_u16("0xZZ").is_err());
    assert!(parse_hex_u16("").is_err());
}
