// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Exclusive lock around the package file.
//!
//! Two runs in the same directory would race on the package file, so each
//! run creates `<package>.lock` with create-new semantics and removes it on
//! drop. A lock left behind by a killed process has to be removed by hand.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::UploadError;

#[derive(Debug)]
pub struct PackageLock {
    path: PathBuf,
}

impl PackageLock {
    /// Take the lock, failing with [`UploadError::Locked`] if it is held.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(UploadError::Locked { path });
            }
            Err(source) => {
                return Err(UploadError::Io {
                    context: format!("failed to create {}", path.display()),
                    source,
                });
            }
        };

        // Owner pid, for whoever finds a stale lock.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            tracing::warn!(path = %path.display(), "failed to write lock owner: {}", e);
        }

        tracing::debug!(path = %path.display(), "lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PackageLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "lock released"),
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to remove lock: {}", e),
        }
    }
}
