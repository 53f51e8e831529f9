// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Upload error taxonomy.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::orchestrator::Step;

/// Output captured from an external tool run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, text) in [("stdout", &self.stdout), ("stderr", &self.stderr)] {
            let text = text.trim_end();
            if text.is_empty() {
                continue;
            }
            write!(f, "\n--- {} ---", label)?;
            for line in text.lines() {
                write!(f, "\n  {}", line)?;
            }
        }
        Ok(())
    }
}

/// A step whose tool ran but did not exit successfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    /// Exit code, `None` when the tool was killed by a signal.
    pub code: Option<i32>,
    pub output: CapturedOutput,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code)?,
            None => write!(f, "terminated by signal")?,
        }
        write!(f, "{}", self.output)
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("no device found ({searched}); specify the device explicitly")]
    DeviceNotFound { searched: String },

    #[error("invalid device pattern {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("{step} step failed: {program:?} not found on PATH")]
    ToolNotFound { step: Step, program: String },

    #[error("package step failed: {0}")]
    PackagingFailed(StepFailure),

    #[error("deploy step failed: {0}")]
    DeploymentFailed(StepFailure),

    #[error("{step} step timed out after {}s{output}", .timeout.as_secs())]
    TimedOut {
        step: Step,
        timeout: Duration,
        output: CapturedOutput,
    },

    #[error(
        "{} exists: another upload is running in this directory (remove it if stale)",
        .path.display()
    )]
    Locked { path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    /// The step this error aborted, when it came from one.
    pub fn step(&self) -> Option<Step> {
        match self {
            UploadError::DeviceNotFound { .. } | UploadError::InvalidPattern { .. } => {
                Some(Step::ResolveDevice)
            }
            UploadError::ToolNotFound { step, .. } | UploadError::TimedOut { step, .. } => {
                Some(*step)
            }
            UploadError::PackagingFailed(_) => Some(Step::Package),
            UploadError::DeploymentFailed(_) => Some(Step::Deploy),
            UploadError::Locked { .. } | UploadError::Io { .. } => None,
        }
    }

    /// Exit code of the failing tool, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            UploadError::PackagingFailed(failure) | UploadError::DeploymentFailed(failure) => {
                failure.code
            }
            _ => None,
        }
    }
}
