//! [`MediaEngine`] backed by an external `mpv` process, driven over its JSON
//! IPC socket. mpv only answers property queries here, so engine events are
//! synthesised by comparing successive property snapshots.

use crate::engine::{EngineEvent, EngineState, MediaEngine};
use crate::error::{PreviewError, Result};
use cutlane_core::TimeMs;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Consecutive idle polls after a load before it counts as failed.
const IDLE_POLLS_BEFORE_FAILURE: u32 = 3;

/// mpv properties read in one poll.
#[derive(Debug, Clone, Default, PartialEq)]
struct Snapshot {
    idle: bool,
    /// File mpv currently has open.
    path: Option<PathBuf>,
    duration: Option<TimeMs>,
    paused: bool,
    position: Option<TimeMs>,
    eof: bool,
}

#[derive(Debug, Default)]
struct PollState {
    /// Last file handed to `loadfile`. Until mpv reports it as open, the
    /// properties still describe the previous file.
    expected: Option<PathBuf>,
    /// Set until the expected file has been seen open.
    loading: Option<PathBuf>,
    idle_polls: u32,
    duration_sent: bool,
    reported: Option<EngineState>,
    last_position: Option<TimeMs>,
    eof_sent: bool,
}

impl PollState {
    fn for_load(path: &Path) -> Self {
        Self {
            expected: Some(path.to_path_buf()),
            loading: Some(path.to_path_buf()),
            ..Self::default()
        }
    }

    fn events(&mut self, snap: &Snapshot) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if snap.idle {
            if self.loading.is_some() {
                self.idle_polls += 1;
                if self.idle_polls >= IDLE_POLLS_BEFORE_FAILURE {
                    if let Some(path) = self.loading.take() {
                        events.push(EngineEvent::LoadFailed(format!(
                            "mpv could not open {}",
                            path.display()
                        )));
                    }
                }
            }
            return events;
        }
        if let Some(expected) = &self.expected {
            if snap.path.as_ref() != Some(expected) {
                tracing::trace!(open = ?snap.path, expected = %expected.display(), "stale mpv properties");
                return events;
            }
        }
        self.loading = None;
        self.idle_polls = 0;

        if !self.duration_sent {
            if let Some(d) = snap.duration {
                self.duration_sent = true;
                events.push(EngineEvent::DurationKnown(d));
            }
        }

        let state = if snap.paused {
            EngineState::Paused
        } else {
            EngineState::Playing
        };
        if self.reported != Some(state) {
            self.reported = Some(state);
            events.push(EngineEvent::StateChanged(state));
        }

        if let Some(pos) = snap.position {
            if self.last_position != Some(pos) {
                self.last_position = Some(pos);
                events.push(EngineEvent::PositionChanged(pos));
            }
        }

        if snap.eof && !self.eof_sent {
            self.eof_sent = true;
            events.push(EngineEvent::EndOfMedia);
        }
        events
    }
}

pub struct MpvEngine {
    process: Option<Child>,
    socket_path: PathBuf,
    next_request: u64,
    poll: PollState,
}

impl MpvEngine {
    /// Start `mpv` in idle mode and wait for its IPC socket.
    pub fn spawn(binary: &str) -> Result<Self> {
        let socket_path = std::env::temp_dir().join(format!("cutlane-mpv-{}", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        tracing::info!(binary, socket = %socket_path.display(), "starting mpv");
        let child = Command::new(binary)
            .args([
                "--idle=yes",
                "--keep-open=yes",
                "--force-window=yes",
                "--osc=no",
                "--title=cutlane-preview",
                &format!("--input-ipc-server={}", socket_path.display()),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PreviewError::EngineUnavailable(format!("failed to start {binary}: {e}")))?;

        let mut engine = Self {
            process: Some(child),
            socket_path,
            next_request: 1,
            poll: PollState::default(),
        };

        for _ in 0..50 {
            if engine.socket_path.exists() {
                return Ok(engine);
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        engine.shutdown();
        Err(PreviewError::EngineUnavailable("mpv socket did not appear".into()))
    }

    fn send_command(&mut self, command: Value) -> Result<Value> {
        let request_id = self.next_request;
        self.next_request += 1;

        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|e| PreviewError::Ipc(format!("connect failed: {e}")))?;
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .map_err(|e| PreviewError::Ipc(e.to_string()))?;

        let mut message = command;
        message["request_id"] = json!(request_id);
        let line = format!("{message}\n");
        stream
            .write_all(line.as_bytes())
            .map_err(|e| PreviewError::Ipc(format!("write failed: {e}")))?;

        // Event lines may arrive before our reply; skip them.
        let mut reader = BufReader::new(stream);
        loop {
            let mut response = String::new();
            let n = reader
                .read_line(&mut response)
                .map_err(|e| PreviewError::Ipc(format!("read failed: {e}")))?;
            if n == 0 {
                return Err(PreviewError::Ipc("mpv closed the connection".into()));
            }
            let value: Value = serde_json::from_str(&response)
                .map_err(|e| PreviewError::Ipc(format!("bad reply: {e}")))?;
            if value.get("request_id").and_then(Value::as_u64) == Some(request_id) {
                return Ok(value);
            }
        }
    }

    fn command_ok(&mut self, command: Value) -> Result<()> {
        let reply = self.send_command(command)?;
        match reply.get("error").and_then(Value::as_str) {
            Some("success") | None => Ok(()),
            Some(err) => Err(PreviewError::Ipc(err.to_string())),
        }
    }

    /// `None` when the property is unavailable (no file loaded, for instance).
    fn get_property(&mut self, name: &str) -> Result<Option<Value>> {
        let reply = self.send_command(json!({ "command": ["get_property", name] }))?;
        if reply.get("error").and_then(Value::as_str) != Some("success") {
            return Ok(None);
        }
        Ok(reply.get("data").cloned())
    }

    fn seconds_property(&mut self, name: &str) -> Result<Option<TimeMs>> {
        Ok(self
            .get_property(name)?
            .and_then(|v| v.as_f64())
            .map(TimeMs::from_seconds))
    }

    fn bool_property(&mut self, name: &str) -> Result<Option<bool>> {
        Ok(self.get_property(name)?.and_then(|v| v.as_bool()))
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        let idle = self.bool_property("idle-active")?.unwrap_or(true);
        if idle {
            return Ok(Snapshot {
                idle,
                ..Snapshot::default()
            });
        }
        Ok(Snapshot {
            idle,
            path: self
                .get_property("path")?
                .and_then(|v| v.as_str().map(PathBuf::from)),
            duration: self.seconds_property("duration")?,
            paused: self.bool_property("pause")?.unwrap_or(false),
            position: self.seconds_property("time-pos")?,
            eof: self.bool_property("eof-reached")?.unwrap_or(false),
        })
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl MediaEngine for MpvEngine {
    fn load_source(&mut self, path: &Path, start: TimeMs) -> Result<()> {
        let path_str = path.to_string_lossy().into_owned();
        tracing::debug!(path = %path_str, start = start.0, "mpv loadfile");
        self.command_ok(json!({ "command": ["set_property", "start", format!("{}", start.as_seconds())] }))?;
        self.command_ok(json!({ "command": ["loadfile", path_str, "replace"] }))?;
        self.poll = PollState::for_load(path);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.command_ok(json!({ "command": ["set_property", "pause", false] }))
    }

    fn pause(&mut self) -> Result<()> {
        self.command_ok(json!({ "command": ["set_property", "pause", true] }))
    }

    fn stop(&mut self) -> Result<()> {
        self.poll = PollState::default();
        self.command_ok(json!({ "command": ["stop"] }))
    }

    fn seek(&mut self, position: TimeMs) -> Result<()> {
        self.command_ok(json!({ "command": ["seek", position.as_seconds(), "absolute"] }))
    }

    fn poll_events(&mut self) -> Result<Vec<EngineEvent>> {
        if let Some(child) = self.process.as_mut() {
            if let Ok(Some(status)) = child.try_wait() {
                self.process = None;
                return Err(PreviewError::EngineUnavailable(format!("mpv exited: {status}")));
            }
        }
        let snapshot = self.snapshot()?;
        Ok(self.poll.events(&snapshot))
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
