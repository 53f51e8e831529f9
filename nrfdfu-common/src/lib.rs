// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and logic for nrfdfu-upload.
//!
//! An upload is two invocations of an external packaging tool (`nrfutil`):
//! - `pkg generate` wraps the firmware binary into a DFU package
//! - `dfu usb-serial` sends that package to the device over USB CDC
//!
//! This crate resolves the target device, builds both invocations, runs them
//! in order under an exclusive lock, and reports progress through the
//! [`orchestrator::Progress`] trait. It never prints on its own.

pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod runner;

// Re-export commonly used types
pub use command::{deploy_invocation, package_invocation, Invocation};
pub use config::{UploadConfig, DEFAULT_PACKAGE_NAME, DEFAULT_STEP_TIMEOUT, DEFAULT_TOOL};
pub use config::{DEFAULT_APPLICATION_VERSION, DEFAULT_HW_VERSION, DEFAULT_SD_REQ};
pub use device::{resolve_device, select_device, DevicePattern};
pub use error::{CapturedOutput, StepFailure, UploadError};
pub use lock::PackageLock;
pub use orchestrator::{NoProgress, Orchestrator, Progress, Stage, Step, UploadReport};
pub use runner::{CommandRunner, ProcessRunner, RunError, StepOutput};
