// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Terminal progress output.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use nrfdfu_common::{Invocation, Progress, Stage, Step, UploadReport};

/// Prints each command and shows a spinner while it runs.
#[derive(Default)]
pub struct ConsoleProgress {
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    fn spinner(step: Step) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(match step {
            Step::Package => "Generating package...",
            Step::Deploy => "Flashing device...",
            Step::ResolveDevice => "Looking for device...",
        });
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Progress for ConsoleProgress {
    fn stage_changed(&mut self, stage: Stage) {
        let Some(pb) = self.spinner.take() else {
            return;
        };
        match stage {
            Stage::Failed(step) => pb.abandon_with_message(format!("{} step failed", step)),
            _ => pb.finish_with_message("OK"),
        }
    }

    fn command(&mut self, step: Step, invocation: &Invocation) {
        println!("{}", invocation);
        self.spinner = Some(Self::spinner(step));
    }

    fn finished(&mut self, report: &UploadReport) {
        println!();
        println!("Uploading done. Firmware sent to {}.", report.device);
        if let Some(package) = &report.package {
            println!("Package kept at {}.", package.display());
        }
    }
}
