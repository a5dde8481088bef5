//! In-memory engine for controller and player tests.

use crate::engine::{EngineEvent, EngineState, MediaEngine};
use crate::error::{PreviewError, Result};
use cutlane_core::TimeMs;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

struct Loaded {
    path: PathBuf,
    position: TimeMs,
    announced: bool,
}

/// Records every call. Scripted events are returned first; with
/// `simulate` set, loaded media also plays itself one step per poll.
#[derive(Default)]
pub struct ScriptedEngine {
    pub calls: Vec<String>,
    scripted: VecDeque<EngineEvent>,
    failing: Vec<PathBuf>,
    step: Option<TimeMs>,
    durations: HashMap<PathBuf, TimeMs>,
    loaded: Option<Loaded>,
    playing: bool,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded media advances `step` per poll. Files without a duration last 1s.
    pub fn simulate(mut self, step: TimeMs) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_duration(mut self, path: &str, duration: TimeMs) -> Self {
        self.durations.insert(PathBuf::from(path), duration);
        self
    }

    pub fn fail_path(&mut self, path: &str) {
        self.failing.push(PathBuf::from(path));
    }

    pub fn script(&mut self, events: Vec<EngineEvent>) {
        self.scripted.extend(events);
    }

    pub fn loads(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("load "))
            .collect()
    }
}

impl MediaEngine for ScriptedEngine {
    fn load_source(&mut self, path: &Path, start: TimeMs) -> Result<()> {
        self.calls.push(format!("load {} @{}", path.display(), start.0));
        if self.failing.iter().any(|p| p == path) {
            return Err(PreviewError::Ipc(format!("cannot open {}", path.display())));
        }
        self.loaded = Some(Loaded {
            path: path.to_path_buf(),
            position: start,
            announced: false,
        });
        self.playing = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.calls.push("play".into());
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.calls.push("pause".into());
        self.playing = false;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.calls.push("stop".into());
        self.playing = false;
        self.loaded = None;
        Ok(())
    }

    fn seek(&mut self, position: TimeMs) -> Result<()> {
        self.calls.push(format!("seek {}", position.0));
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.position = position;
        }
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<EngineEvent>> {
        if !self.scripted.is_empty() {
            return Ok(self.scripted.drain(..).collect());
        }
        let (Some(step), Some(loaded)) = (self.step, self.loaded.as_mut()) else {
            return Ok(vec![]);
        };
        let duration = self.durations.get(&loaded.path).copied().unwrap_or(TimeMs(1_000));
        if !loaded.announced {
            loaded.announced = true;
            return Ok(vec![
                EngineEvent::DurationKnown(duration),
                EngineEvent::StateChanged(EngineState::Playing),
            ]);
        }
        if !self.playing {
            return Ok(vec![]);
        }
        loaded.position = (loaded.position + step).min(duration);
        let mut events = vec![EngineEvent::PositionChanged(loaded.position)];
        if loaded.position >= duration {
            events.push(EngineEvent::EndOfMedia);
            self.loaded = None;
            self.playing = false;
        }
        Ok(events)
    }
}
