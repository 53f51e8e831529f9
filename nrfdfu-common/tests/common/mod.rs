// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Shared test doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::time::Duration;

use nrfdfu_common::{
    CapturedOutput, CommandRunner, Invocation, Progress, RunError, Stage, Step, StepOutput,
    UploadReport,
};

/// Runner that replays scripted results and records every invocation.
///
/// A successful `pkg generate` writes the package file like the real tool.
#[derive(Default)]
pub struct ScriptedRunner {
    pub responses: VecDeque<Result<StepOutput, RunError>>,
    pub calls: Vec<Invocation>,
    pub timeouts: Vec<Option<Duration>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_exit(mut self, code: i32) -> Self {
        self.responses
            .push_back(Ok(StepOutput::exited(code, "", format!("exit {}", code))));
        self
    }

    pub fn then_output(mut self, output: StepOutput) -> Self {
        self.responses.push_back(Ok(output));
        self
    }

    pub fn then_not_found(mut self) -> Self {
        self.responses.push_back(Err(RunError::NotFound));
        self
    }

    pub fn then_timeout(mut self, stdout: &str) -> Self {
        self.responses.push_back(Err(RunError::TimedOut(CapturedOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        })));
        self
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<StepOutput, RunError> {
        self.calls.push(invocation.clone());
        self.timeouts.push(timeout);

        let response = self
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(StepOutput::exited(0, "", "")));

        let is_package = invocation.args.first().map(|a| a == "pkg").unwrap_or(false);
        if let (true, Ok(output)) = (is_package, &response) {
            if output.success {
                let dir = invocation.current_dir.clone().unwrap_or_default();
                let name = invocation.args.last().expect("package name");
                fs::write(dir.join(name), b"PK\x03\x04").expect("write package");
            }
        }

        response
    }
}

/// Progress sink recording every event.
#[derive(Default)]
pub struct RecordingProgress {
    pub stages: Vec<Stage>,
    pub commands: Vec<(Step, String)>,
    pub reports: Vec<UploadReport>,
}

impl Progress for RecordingProgress {
    fn stage_changed(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    fn command(&mut self, step: Step, invocation: &Invocation) {
        self.commands.push((step, invocation.to_string()));
    }

    fn finished(&mut self, report: &UploadReport) {
        self.reports.push(report.clone());
    }
}

/// Arguments as plain strings for comparison.
pub fn args(invocation: &Invocation) -> Vec<String> {
    invocation
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}
