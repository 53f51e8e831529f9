// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for the process runner against real processes.

#![cfg(unix)]

use std::time::{Duration, Instant};

use nrfdfu_common::{CommandRunner, Invocation, ProcessRunner, RunError};

fn sh(script: &str) -> Invocation {
    Invocation::new("sh").arg("-c").arg(script)
}

#[test]
fn test_captures_output_and_exit_code() {
    let output = ProcessRunner
        .run(&sh("echo packaging; echo broken >&2; exit 3"), None)
        .unwrap();

    assert_eq!(output.code, Some(3));
    assert!(!output.success);
    assert_eq!(output.stdout, "packaging\n");
    assert_eq!(output.stderr, "broken\n");
}

#[test]
fn test_success() {
    let output = ProcessRunner
        .run(&sh("true"), Some(Duration::from_secs(10)))
        .unwrap();
    assert_eq!(output.code, Some(0));
    assert!(output.success);
}

#[test]
fn test_arguments_are_not_shell_interpreted() {
    let invocation = Invocation::new("echo").arg("$HOME; echo injected");
    let output = ProcessRunner.run(&invocation, None).unwrap();
    assert_eq!(output.stdout, "$HOME; echo injected\n");
}

#[test]
fn test_missing_program() {
    let invocation = Invocation::new("nrfdfu-no-such-tool-on-path");
    assert!(matches!(
        ProcessRunner.run(&invocation, None),
        Err(RunError::NotFound)
    ));
}

#[test]
fn test_runs_in_current_dir() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = sh("echo PK > firmware.zip").current_dir(dir.path());

    let output = ProcessRunner.run(&invocation, None).unwrap();
    assert!(output.success);
    assert!(dir.path().join("firmware.zip").exists());
}

#[test]
fn test_timeout_kills_child() {
    let started = Instant::now();
    let result = ProcessRunner.run(
        &sh("echo waiting for device; exec sleep 30"),
        Some(Duration::from_millis(300)),
    );

    match result {
        Err(RunError::TimedOut(output)) => assert_eq!(output.stdout, "waiting for device\n"),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_timeout_kills_whole_process_group() {
    let started = Instant::now();
    // `sleep` runs as a grandchild here and holds both pipes open.
    let result = ProcessRunner.run(
        &sh("echo waiting for device; sleep 6; true"),
        Some(Duration::from_millis(300)),
    );

    match result {
        Err(RunError::TimedOut(output)) => assert_eq!(output.stdout, "waiting for device\n"),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "timeout did not bound the run: {:?}",
        started.elapsed()
    );
}

#[test]
fn test_leftover_background_process_does_not_block() {
    let started = Instant::now();
    let output = ProcessRunner
        .run(&sh("sleep 6 & echo done"), Some(Duration::from_secs(10)))
        .unwrap();

    assert!(output.success);
    assert_eq!(output.stdout, "done\n");
    assert!(started.elapsed() < Duration::from_secs(3));
}
