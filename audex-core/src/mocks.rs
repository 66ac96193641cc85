// audex-core/src/mocks.rs

// --- Mocking Infrastructure (for testing) ---
//
// This module is only compiled for tests or when the "test-mocks" feature
// is enabled.
//
// A scripted stand-in for ffmpeg. Each expected call names a matcher, the
// diagnostic lines to emit, the exit code, and any output files to write
// into the engine workspace, so probe and extraction can be exercised
// without an ffmpeg binary.

#![cfg(any(test, feature = "test-mocks"))]

use crate::config::EngineConfig;
use crate::engine::{FfmpegProcess, FfmpegSpawner, lock};
use crate::error::{CoreError, CoreResult, command_start_error};
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::io;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    lines: Vec<String>,
    exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for line in std::mem::take(&mut self.lines) {
            handler(FfmpegEvent::Log(LogLevel::Info, line))?;
        }
        handler(FfmpegEvent::Done)
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Which calls an expectation answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallMatcher {
    /// The info invocation: `-i <input>` with no stream mapping.
    Info,
    /// A transcode: any call containing `-map`.
    Transcode,
    /// Any call with an argument containing the given text.
    Contains(String),
}

impl CallMatcher {
    fn matches(&self, args: &[String]) -> bool {
        let has_map = args.iter().any(|a| a == "-map");
        match self {
            CallMatcher::Info => args.iter().any(|a| a == "-i") && !has_map,
            CallMatcher::Transcode => has_map,
            CallMatcher::Contains(text) => args.iter().any(|a| a.contains(text.as_str())),
        }
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub matcher: CallMatcher,
    pub lines: Vec<String>,
    pub exit_code: i32,
    /// Files (name relative to the workspace, contents) written when the call is spawned.
    pub outputs: Vec<(String, Vec<u8>)>,
    pub spawn_error: bool,
}

#[derive(Default)]
struct MockState {
    expectations: Vec<MockFfmpegExpectation>,
    received_calls: Vec<Vec<String>>,
    load_calls: usize,
    load_error: Option<String>,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    state: Arc<Mutex<MockState>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    /// Makes every `load` fail with the given message.
    pub fn fail_load(&self, message: &str) {
        lock(&self.state).load_error = Some(message.to_string());
    }

    pub fn add_expectation(&self, expectation: MockFfmpegExpectation) {
        lock(&self.state).expectations.push(expectation);
    }

    /// The info call: emits `lines` and exits 1, as ffmpeg does without an output.
    pub fn expect_info(&self, lines: &[&str]) {
        self.add_expectation(MockFfmpegExpectation {
            matcher: CallMatcher::Info,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            exit_code: 1,
            outputs: Vec::new(),
            spawn_error: false,
        });
    }

    /// A transcode that emits `lines`, writes `outputs` and exits with `exit_code`.
    pub fn expect_transcode(&self, lines: &[&str], exit_code: i32, outputs: &[(&str, &[u8])]) {
        self.add_expectation(MockFfmpegExpectation {
            matcher: CallMatcher::Transcode,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            exit_code,
            outputs: outputs
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
            spawn_error: false,
        });
    }

    /// A call matching `matcher` that cannot be started.
    pub fn expect_spawn_error(&self, matcher: CallMatcher) {
        self.add_expectation(MockFfmpegExpectation {
            matcher,
            lines: Vec::new(),
            exit_code: 0,
            outputs: Vec::new(),
            spawn_error: true,
        });
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        lock(&self.state).received_calls.clone()
    }

    pub fn load_count(&self) -> usize {
        lock(&self.state).load_calls
    }

    pub fn pending_expectations(&self) -> usize {
        lock(&self.state).expectations.len()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn load(&self, _config: &EngineConfig) -> CoreResult<()> {
        let mut state = lock(&self.state);
        state.load_calls += 1;
        match &state.load_error {
            Some(message) => Err(CoreError::EngineLoad(message.clone())),
            None => Ok(()),
        }
    }

    fn spawn(&self, args: &[String], working_dir: &Path) -> CoreResult<Self::Process> {
        let mut state = lock(&self.state);
        state.received_calls.push(args.to_vec());

        let Some(index) = state
            .expectations
            .iter()
            .position(|exp| exp.matcher.matches(args))
        else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
            return Err(command_start_error(
                "ffmpeg (mock)",
                io::Error::other("no expectation for this call"),
            ));
        };
        let expectation = state.expectations.remove(index);
        log::debug!("MockFfmpegSpawner: Matched expectation {:?}", expectation.matcher);

        if expectation.spawn_error {
            return Err(command_start_error(
                "ffmpeg (mock)",
                io::Error::new(io::ErrorKind::PermissionDenied, "simulated spawn failure"),
            ));
        }

        for (name, data) in &expectation.outputs {
            std::fs::write(working_dir.join(name), data)?;
        }

        Ok(MockFfmpegProcess {
            lines: expectation.lines,
            exit_status: exit_status(expectation.exit_code),
        })
    }
}
