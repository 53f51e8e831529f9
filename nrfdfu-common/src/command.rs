// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! External tool invocations.
//!
//! Argument lists go straight to the process API; nothing is ever passed
//! through a shell, so artifact paths and device names need no escaping.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;

/// A fully formed command line: program, arguments, working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_word(f, &self.program)?;
        for arg in &self.args {
            write!(f, " ")?;
            write_word(f, arg)?;
        }
        Ok(())
    }
}

// Display only: quote words with whitespace so the printed line reads right.
fn write_word(f: &mut fmt::Formatter<'_>, word: &OsStr) -> fmt::Result {
    let word = word.to_string_lossy();
    if word.is_empty() || word.contains(char::is_whitespace) {
        write!(f, "'{}'", word.replace('\'', "'\\''"))
    } else {
        write!(f, "{}", word)
    }
}

/// `<tool> pkg generate --hw-version <N> --sd-req=<hex> --application <artifact>
/// --application-version <N> <package>`
pub fn package_invocation(config: &UploadConfig, artifact: &Path) -> Invocation {
    Invocation::new(&config.tool)
        .args(["pkg", "generate", "--hw-version"])
        .arg(config.hardware_version.to_string())
        .arg(format!("--sd-req={}", config.sd_req_arg()))
        .arg("--application")
        .arg(artifact)
        .arg("--application-version")
        .arg(config.application_version.to_string())
        .arg(&config.package_name)
        .current_dir(&config.work_dir)
}

/// `<tool> dfu usb-serial -pkg <package> -p <device>`
pub fn deploy_invocation(config: &UploadConfig, device: &str) -> Invocation {
    Invocation::new(&config.tool)
        .args(["dfu", "usb-serial", "-pkg"])
        .arg(&config.package_name)
        .arg("-p")
        .arg(device)
        .current_dir(&config.work_dir)
}
