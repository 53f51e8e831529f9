// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Upload configuration and its defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::device::DevicePattern;

/// Packaging tool looked up on `PATH`.
pub const DEFAULT_TOOL: &str = "nrfutil";

/// nRF52 family hardware version.
pub const DEFAULT_HW_VERSION: u32 = 52;

/// SoftDevice requirement: 0x00 means the application runs without one.
pub const DEFAULT_SD_REQ: u16 = 0x00;

pub const DEFAULT_APPLICATION_VERSION: u32 = 1;

/// Package file written into the working directory by the package step.
pub const DEFAULT_PACKAGE_NAME: &str = "firmware.zip";

/// Per-step limit. A disconnected device can stall `dfu usb-serial` forever.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything an upload run needs besides the artifact path.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub tool: String,
    pub hardware_version: u32,
    pub soft_core_requirement: u16,
    pub application_version: u32,
    /// Explicit device path. Skips discovery when set.
    pub device: Option<String>,
    /// Discovery pattern. `None` means discovery is unavailable.
    pub device_pattern: Option<DevicePattern>,
    pub package_name: String,
    pub work_dir: PathBuf,
    pub step_timeout: Option<Duration>,
    /// Leave the package file on disk after a successful upload.
    pub keep_package: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            hardware_version: DEFAULT_HW_VERSION,
            soft_core_requirement: DEFAULT_SD_REQ,
            application_version: DEFAULT_APPLICATION_VERSION,
            device: None,
            device_pattern: DevicePattern::platform_default(),
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            work_dir: PathBuf::from("."),
            step_timeout: Some(DEFAULT_STEP_TIMEOUT),
            keep_package: true,
        }
    }
}

impl UploadConfig {
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_hardware_version(mut self, version: u32) -> Self {
        self.hardware_version = version;
        self
    }

    pub fn with_soft_core_requirement(mut self, sd_req: u16) -> Self {
        self.soft_core_requirement = sd_req;
        self
    }

    pub fn with_application_version(mut self, version: u32) -> Self {
        self.application_version = version;
        self
    }

    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    pub fn with_device_pattern(mut self, pattern: Option<DevicePattern>) -> Self {
        self.device_pattern = pattern;
        self
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_keep_package(mut self, keep: bool) -> Self {
        self.keep_package = keep;
        self
    }

    /// Soft-core requirement as passed to `--sd-req=` (e.g. `0x00`, `0xB6`).
    pub fn sd_req_arg(&self) -> String {
        format!("0x{:02X}", self.soft_core_requirement)
    }

    /// Where the package step leaves the package file.
    pub fn package_path(&self) -> PathBuf {
        self.work_dir.join(&self.package_name)
    }

    /// Lock file guarding the package file against concurrent runs.
    pub fn lock_path(&self) -> PathBuf {
        self.work_dir.join(format!("{}.lock", self.package_name))
    }
}

/// Parse `0x`-prefixed hex or plain decimal.
pub fn parse_hex_u16(input: &str) -> Result<u16, std::num::ParseIntError> {
    match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => input.parse::<u16>(),
    }
}
