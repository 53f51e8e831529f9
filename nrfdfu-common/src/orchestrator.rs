// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Upload orchestration: resolve the device, package, deploy.
//!
//! The run is a linear state machine:
//!
//! ```text
//! Idle -> ResolvingDevice -> Packaging -> Deploying -> Done
//!               |                |            |
//!               +----------------+------------+--> Failed(step)
//! ```
//!
//! Steps run strictly one after the other: the deploy step reads the
//! package file the package step wrote, and the only synchronization
//! between them is that ordering.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::command::{deploy_invocation, package_invocation, Invocation};
use crate::config::UploadConfig;
use crate::device::resolve_device;
use crate::error::{StepFailure, UploadError};
use crate::lock::PackageLock;
use crate::runner::{CommandRunner, RunError};

/// A unit of work that can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    ResolveDevice,
    Package,
    Deploy,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::ResolveDevice => "device resolution",
            Step::Package => "package",
            Step::Deploy => "deploy",
        })
    }
}

/// Upload run state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ResolvingDevice,
    Packaging,
    Deploying,
    Done,
    Failed(Step),
}

impl Stage {
    /// Successor on success. Terminal stages have none.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::ResolvingDevice),
            Stage::ResolvingDevice => Some(Stage::Packaging),
            Stage::Packaging => Some(Stage::Deploying),
            Stage::Deploying => Some(Stage::Done),
            Stage::Done | Stage::Failed(_) => None,
        }
    }

    /// Failure transition. Only stages doing work can fail.
    pub fn fail(self) -> Option<Stage> {
        self.step().map(Stage::Failed)
    }

    /// Step performed while in this stage.
    pub fn step(self) -> Option<Step> {
        match self {
            Stage::ResolvingDevice => Some(Step::ResolveDevice),
            Stage::Packaging => Some(Step::Package),
            Stage::Deploying => Some(Step::Deploy),
            _ => None,
        }
    }
}

/// Progress hooks. All methods default to doing nothing.
pub trait Progress {
    fn stage_changed(&mut self, _stage: Stage) {}

    /// Called with each constructed command right before it runs.
    fn command(&mut self, _step: Step, _invocation: &Invocation) {}

    fn finished(&mut self, _report: &UploadReport) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Outcome of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReport {
    pub device: String,
    /// Package file location, `None` if it was removed after the upload.
    pub package: Option<PathBuf>,
}

/// Drives one upload from artifact to device.
pub struct Orchestrator<R, P = NoProgress> {
    config: UploadConfig,
    runner: R,
    progress: P,
    stage: Stage,
}

impl<R: CommandRunner> Orchestrator<R, NoProgress> {
    pub fn new(config: UploadConfig, runner: R) -> Self {
        Self::with_progress(config, runner, NoProgress)
    }
}

impl<R: CommandRunner, P: Progress> Orchestrator<R, P> {
    pub fn with_progress(config: UploadConfig, runner: R, progress: P) -> Self {
        Self {
            config,
            runner,
            progress,
            stage: Stage::Idle,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn into_parts(self) -> (R, P) {
        (self.runner, self.progress)
    }

    /// Package `artifact` and send it to the device.
    ///
    /// The deploy step only runs after the package step exited with status
    /// zero. Neither step is retried. On failure the package file, if any,
    /// is left in place. A held lock fails the run before it leaves `Idle`.
    pub fn upload(&mut self, artifact: &Path) -> Result<UploadReport, UploadError> {
        self.stage = Stage::Idle;
        let _lock = PackageLock::acquire(self.config.lock_path())?;

        self.advance();
        let device = self.attempt(|this| resolve_device(&this.config))?;
        tracing::info!(device = %device, "target device");

        self.advance();
        let invocation = package_invocation(&self.config, artifact);
        self.attempt(|this| this.run_step(Step::Package, &invocation))?;

        self.advance();
        let invocation = deploy_invocation(&self.config, &device);
        self.attempt(|this| this.run_step(Step::Deploy, &invocation))?;

        Ok(self.complete(device))
    }

    /// Run only the package step. Returns the package file location.
    pub fn package(&mut self, artifact: &Path) -> Result<PathBuf, UploadError> {
        self.stage = Stage::Idle;
        let _lock = PackageLock::acquire(self.config.lock_path())?;

        self.enter(Stage::Packaging);
        let invocation = package_invocation(&self.config, artifact);
        self.attempt(|this| this.run_step(Step::Package, &invocation))?;

        self.enter(Stage::Done);
        Ok(self.config.package_path())
    }

    /// Resolve the device and send an existing package to it.
    ///
    /// Used to retry a deploy without regenerating the package.
    pub fn deploy(&mut self) -> Result<UploadReport, UploadError> {
        self.stage = Stage::Idle;
        let _lock = PackageLock::acquire(self.config.lock_path())?;

        self.advance();
        let device = self.attempt(|this| resolve_device(&this.config))?;
        tracing::info!(device = %device, "target device");

        self.enter(Stage::Deploying);
        let invocation = deploy_invocation(&self.config, &device);
        self.attempt(|this| this.run_step(Step::Deploy, &invocation))?;

        Ok(self.complete(device))
    }

    /// Move to the successor of the current stage.
    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            self.enter(next);
        }
    }

    fn enter(&mut self, to: Stage) {
        self.stage = to;
        tracing::debug!(stage = ?to, "upload stage");
        self.progress.stage_changed(to);
    }

    fn complete(&mut self, device: String) -> UploadReport {
        let package = self.finish_package();
        self.advance();

        let report = UploadReport { device, package };
        self.progress.finished(&report);
        report
    }

    /// Run `f`; on error move to the failed state for the current stage.
    fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, UploadError>,
    ) -> Result<T, UploadError> {
        f(self).inspect_err(|e| {
            if let Some(failed) = self.stage.fail() {
                tracing::debug!(stage = ?self.stage, "upload failed: {}", e);
                self.stage = failed;
                self.progress.stage_changed(failed);
            }
        })
    }

    fn run_step(&mut self, step: Step, invocation: &Invocation) -> Result<(), UploadError> {
        self.progress.command(step, invocation);
        tracing::debug!(%step, command = %invocation, "running");

        let output = match self.runner.run(invocation, self.config.step_timeout) {
            Ok(output) => output,
            Err(RunError::NotFound) => {
                return Err(UploadError::ToolNotFound {
                    step,
                    program: invocation.program.to_string_lossy().into_owned(),
                });
            }
            Err(RunError::TimedOut(output)) => {
                return Err(UploadError::TimedOut {
                    step,
                    timeout: self.config.step_timeout.unwrap_or_default(),
                    output,
                });
            }
            Err(RunError::Io(source)) => {
                return Err(UploadError::Io {
                    context: format!("failed to run {} step", step),
                    source,
                });
            }
        };

        if output.success {
            return Ok(());
        }

        let failure = StepFailure {
            code: output.code,
            output: output.captured(),
        };
        Err(match step {
            Step::Deploy => UploadError::DeploymentFailed(failure),
            _ => UploadError::PackagingFailed(failure),
        })
    }

    /// Apply the package retention setting after a successful deploy.
    ///
    /// The device is already flashed at this point, so a failed removal is
    /// only logged.
    fn finish_package(&self) -> Option<PathBuf> {
        let path = self.config.package_path();
        if self.config.keep_package {
            return Some(path);
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "package removed");
                None
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to remove package: {}", e);
                Some(path)
            }
        }
    }
}
