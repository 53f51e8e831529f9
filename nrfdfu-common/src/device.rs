// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Target device resolution.
//!
//! Discovery lists one directory and keeps the entries whose file name
//! matches a small glob (`*` and `?`). Selection is a pure function over the
//! resulting snapshot so the chosen device does not depend on directory
//! enumeration order.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::UploadConfig;
use crate::error::UploadError;

/// Device naming pattern of the form `<dir>/<name-glob>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DevicePattern {
    dir: PathBuf,
    name: String,
}

impl DevicePattern {
    /// Parse a pattern. Wildcards are only allowed in the file name.
    pub fn new(pattern: &str) -> Result<Self, UploadError> {
        let invalid = |reason| UploadError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let (dir, name) = match pattern.rfind(['/', '\\']) {
            Some(0) => ("/", &pattern[1..]),
            Some(idx) => (&pattern[..idx], &pattern[idx + 1..]),
            None => (".", pattern),
        };

        if name.is_empty() {
            return Err(invalid("missing file name"));
        }
        if dir.contains(['*', '?']) {
            return Err(invalid("wildcards are only supported in the file name"));
        }

        Ok(Self {
            dir: PathBuf::from(dir),
            name: name.to_string(),
        })
    }

    /// Pattern matching the USB CDC ports nRF52 bootloaders enumerate as.
    pub fn platform_default() -> Option<Self> {
        let pattern = if cfg!(target_os = "macos") {
            "/dev/tty.usbmodem*"
        } else if cfg!(target_os = "linux") {
            "/dev/ttyACM*"
        } else {
            return None;
        };
        Self::new(pattern).ok()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check a file name (not a full path) against the pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        glob_match(self.name.as_bytes(), file_name.as_bytes())
    }

    /// List the pattern directory and return matching entries as full paths.
    ///
    /// A missing directory is an empty result. Order is whatever the
    /// filesystem yields; use [`select_device`] to pick one.
    pub fn scan(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            // Device names are ASCII; anything else cannot be a match.
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if self.matches(&name) {
                if let Some(path) = self.dir.join(&name).to_str() {
                    found.push(path.to_string());
                }
            }
        }

        tracing::debug!(pattern = %self, ?found, "scanned for devices");
        Ok(found)
    }
}

impl FromStr for DevicePattern {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for DevicePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir.join(&self.name).display())
    }
}

/// `*` matches any run of bytes, `?` exactly one.
fn glob_match(pattern: &[u8], name: &[u8]) -> bool {
    let (mut p, mut n) = (0, 0);
    // Position after the last `*` and the name index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p + 1, n));
                p += 1;
            }
            Some(&c) if c == b'?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star_p, star_n)) => {
                    p = star_p;
                    n = star_n + 1;
                    backtrack = Some((star_p, star_n + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

/// Pick the target device.
///
/// An explicit identifier is used verbatim. Otherwise the lexically
/// smallest candidate wins, so repeated runs against the same set of
/// devices always choose the same one.
pub fn select_device<I>(explicit: Option<&str>, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    match explicit {
        Some(device) => Some(device.to_string()),
        None => candidates.into_iter().min(),
    }
}

/// Resolve the device for `config`, scanning the filesystem if needed.
pub fn resolve_device(config: &UploadConfig) -> Result<String, UploadError> {
    if let Some(device) = &config.device {
        return Ok(device.clone());
    }

    let Some(pattern) = &config.device_pattern else {
        return Err(UploadError::DeviceNotFound {
            searched: "no discovery pattern for this platform".to_string(),
        });
    };

    let candidates = pattern.scan().map_err(|source| UploadError::Io {
        context: format!("failed to list {}", pattern.dir().display()),
        source,
    })?;

    select_device(None, candidates).ok_or_else(|| UploadError::DeviceNotFound {
        searched: pattern.to_string(),
    })
}
