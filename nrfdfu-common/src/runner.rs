// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Process execution.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::Invocation;
use crate::error::CapturedOutput;

/// How often a running child is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading after the child is gone. Anything it left
/// behind may hold the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Result of a tool that ran to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    /// Output of a tool that exited with `code`.
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn captured(&self) -> CapturedOutput {
        CapturedOutput {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

#[derive(Debug)]
pub enum RunError {
    /// Program not found on `PATH`.
    NotFound,
    /// Still running when the timeout elapsed; the child was killed.
    TimedOut(CapturedOutput),
    Io(io::Error),
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        RunError::Io(e)
    }
}

/// Runs invocations. Implemented by [`ProcessRunner`] and by test doubles.
pub trait CommandRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<StepOutput, RunError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(
        &mut self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<StepOutput, RunError> {
        (**self).run(invocation, timeout)
    }
}

/// Spawns the program directly and captures its output.
///
/// On unix the program leads its own process group, so a timeout takes down
/// everything it started, not just the direct child.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<StepOutput, RunError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RunError::NotFound,
            _ => RunError::Io(e),
        })?;
        let _group = group::Foreground::enter(&child);

        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            capture(pipe, Stream::Stdout, tx.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            capture(pipe, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let mut output = CapturedOutput::default();
        let status = match wait(&mut child, timeout, &rx, &mut output) {
            Ok(status) => status,
            Err(e) => {
                kill_group(&mut child);
                return Err(RunError::Io(e));
            }
        };
        drain(&rx, &mut output);

        match status {
            Some(status) => Ok(StepOutput {
                code: status.code(),
                success: status.success(),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            None => Err(RunError::TimedOut(output)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

fn push_line(output: &mut CapturedOutput, (stream, line): (Stream, String)) {
    let buf = match stream {
        Stream::Stdout => &mut output.stdout,
        Stream::Stderr => &mut output.stderr,
    };
    buf.push_str(&line);
    buf.push('\n');
}

/// Wait for exit while collecting output. `Ok(None)` means the timeout
/// elapsed and the process group was killed.
fn wait(
    child: &mut Child,
    timeout: Option<Duration>,
    rx: &Receiver<(Stream, String)>,
    output: &mut CapturedOutput,
) -> io::Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                tracing::warn!(timeout_s = limit.as_secs(), "killing unresponsive tool");
                kill_group(child);
                return Ok(None);
            }
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => push_line(output, line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => thread::sleep(POLL_INTERVAL),
        }
    }
}

/// Read what is left, for at most [`DRAIN_GRACE`].
fn drain(rx: &Receiver<(Stream, String)>, output: &mut CapturedOutput) {
    let deadline = Instant::now() + DRAIN_GRACE;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => push_line(output, line),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!("tool output still open, not waiting for it");
                return;
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn capture<R: Read + Send + 'static>(pipe: R, stream: Stream, tx: Sender<(Stream, String)>) {
    thread::spawn(move || {
        for line in BufReader::new(pipe).lines() {
            let Ok(line) = line else { break };
            tracing::debug!(target: "nrfdfu::tool", stream = stream.name(), "{}", line);
            if tx.send((stream, line)).is_err() {
                break;
            }
        }
    });
}

#[cfg(unix)]
fn kill_group(child: &mut Child) {
    // The child leads its group, so its pid is the group id.
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) with a negative pid only signals that process group.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Termination forwarding for the running tool.
///
/// A tool in its own process group no longer receives the terminal's
/// SIGINT, so this process kills the group itself before exiting.
#[cfg(unix)]
mod group {
    use std::process::Child;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static ACTIVE_GROUP: AtomicI32 = AtomicI32::new(0);

    extern "C" fn forward_termination(signal: libc::c_int) {
        let pgid = ACTIVE_GROUP.load(Ordering::SeqCst);
        // SAFETY: kill(2) and _exit(2) are async-signal-safe.
        unsafe {
            if pgid > 0 {
                libc::kill(-pgid, libc::SIGKILL);
            }
            libc::_exit(128 + signal);
        }
    }

    fn install() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            let handler = forward_termination as extern "C" fn(libc::c_int) as libc::sighandler_t;
            for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
                // SAFETY: the handler only touches an atomic and calls
                // async-signal-safe functions.
                unsafe {
                    libc::signal(signal, handler);
                }
            }
        });
    }

    /// Marks the child's group as the one to kill on termination.
    pub struct Foreground;

    impl Foreground {
        pub fn enter(child: &Child) -> Self {
            install();
            ACTIVE_GROUP.store(child.id() as i32, Ordering::SeqCst);
            Foreground
        }
    }

    impl Drop for Foreground {
        fn drop(&mut self) {
            ACTIVE_GROUP.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(not(unix))]
mod group {
    use std::process::Child;

    pub struct Foreground;

    impl Foreground {
        pub fn enter(_child: &Child) -> Self {
            Foreground
        }
    }
}
