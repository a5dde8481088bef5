//! Playback state machine. The controller never talks to a backend itself:
//! every transition returns the [`EngineCommand`]s the caller must apply.

use crate::engine::{EngineEvent, EngineState};
use crate::error::{PreviewError, Result};
use crate::queue::{PlayQueue, QueueEntry};
use cutlane_core::settings::PlaybackSettings;
use cutlane_core::{Clip, ClipId, CoreError, Sequence, TimeMs};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    LoadingClip,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    /// Media is loading or playing.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::LoadingClip | PlaybackState::Playing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Walk the play queue, advancing on end of clip.
    Queue,
    /// A single clip, no advance.
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Load {
        clip_id: ClipId,
        path: PathBuf,
        start: TimeMs,
    },
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    settings: PlaybackSettings,
    state: PlaybackState,
    mode: PlaybackMode,
    queue: Option<PlayQueue>,
    index: usize,
    preview: Option<QueueEntry>,
    preview_duration: Option<TimeMs>,
    playhead: TimeMs,
    /// Scrubbed since the last pause or end of playback.
    scrubbed: bool,
}

impl PlaybackController {
    pub fn new(settings: PlaybackSettings) -> Self {
        Self {
            settings,
            state: PlaybackState::Idle,
            mode: PlaybackMode::Queue,
            queue: None,
            index: 0,
            preview: None,
            preview_duration: None,
            playhead: TimeMs::ZERO,
            scrubbed: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn playhead(&self) -> TimeMs {
        self.playhead
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn queue(&self) -> Option<&PlayQueue> {
        self.queue.as_ref()
    }

    /// Entry currently loaded or playing.
    pub fn current(&self) -> Option<&QueueEntry> {
        match self.mode {
            PlaybackMode::Queue => self.queue.as_ref().and_then(|q| q.get(self.index)),
            PlaybackMode::Preview => self.preview.as_ref(),
        }
    }

    /// Length shown by the transport: the queue total, or the previewed clip.
    pub fn total(&self) -> TimeMs {
        match self.mode {
            PlaybackMode::Queue => self.queue.as_ref().map_or(TimeMs::ZERO, PlayQueue::total),
            PlaybackMode::Preview => self.preview_length(),
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, index = self.index, "playback state");
            self.state = state;
        }
    }

    // -- user actions ------------------------------------------------------

    /// Play the timeline from the playhead, or resume a pause in place.
    pub fn play(&mut self, sequence: &Sequence) -> Result<Vec<EngineCommand>> {
        if self.state.is_active() {
            tracing::debug!(state = ?self.state, "play ignored while active");
            return Ok(vec![]);
        }
        let candidate = PlayQueue::build(sequence, self.settings.queue_source);
        if candidate.is_empty() {
            return Err(PreviewError::EmptyQueue);
        }

        let unchanged = self.queue.as_ref() == Some(&candidate);
        if self.state == PlaybackState::Paused
            && self.mode == PlaybackMode::Queue
            && unchanged
            && !self.scrubbed
        {
            self.set_state(PlaybackState::Playing);
            return Ok(vec![EngineCommand::Play]);
        }

        // After the end the playhead sits at the queue total, which is not a
        // timeline position; replay from the top unless the user scrubbed.
        let from_top = self.state == PlaybackState::Ended && !self.scrubbed;
        self.replace_queue(candidate);
        let index = match self.queue.as_ref() {
            Some(q) if !from_top => q.start_index_for(self.playhead),
            _ => 0,
        };
        Ok(self.start_queue_at(index))
    }

    /// Queue playback beginning at a given clip. An id not in the queue
    /// starts from the first entry.
    pub fn play_from_clip(&mut self, sequence: &Sequence, id: ClipId) -> Result<Vec<EngineCommand>> {
        let candidate = PlayQueue::build(sequence, self.settings.queue_source);
        if candidate.is_empty() {
            return Err(PreviewError::EmptyQueue);
        }
        let index = candidate.position_of(id).unwrap_or_else(|| {
            tracing::warn!(clip = %id, "clip not in play queue, starting from the top");
            0
        });
        self.replace_queue(candidate);
        Ok(self.start_queue_at(index))
    }

    /// Play one clip on its own.
    pub fn preview_clip(&mut self, clip: &Clip) -> Result<Vec<EngineCommand>> {
        if !clip.is_playable() {
            return Err(CoreError::InvalidClip(format!("{} has an empty range", clip.display_name())).into());
        }
        let entry = QueueEntry::from(clip);
        let cmd = EngineCommand::Load {
            clip_id: entry.clip_id,
            path: entry.path.clone(),
            start: entry.in_ms,
        };
        tracing::info!(clip = %entry.clip_id, path = %entry.path.display(), "preview");
        self.mode = PlaybackMode::Preview;
        self.preview = Some(entry);
        self.preview_duration = None;
        self.playhead = TimeMs::ZERO;
        self.scrubbed = false;
        self.set_state(PlaybackState::LoadingClip);
        Ok(vec![cmd, EngineCommand::Play])
    }

    pub fn pause(&mut self) -> Vec<EngineCommand> {
        if self.state != PlaybackState::Playing {
            tracing::debug!(state = ?self.state, "pause ignored");
            return vec![];
        }
        self.scrubbed = false;
        self.set_state(PlaybackState::Paused);
        vec![EngineCommand::Pause]
    }

    pub fn stop(&mut self) -> Vec<EngineCommand> {
        self.queue = None;
        self.index = 0;
        self.preview = None;
        self.preview_duration = None;
        self.mode = PlaybackMode::Queue;
        self.scrubbed = false;
        self.set_state(PlaybackState::Idle);
        vec![EngineCommand::Stop]
    }

    /// Move the playhead without touching the media. The next `play` picks
    /// its start clip from here.
    pub fn scrub(&mut self, t: TimeMs) {
        self.playhead = t.non_negative();
        if matches!(self.state, PlaybackState::Paused | PlaybackState::Ended) {
            self.scrubbed = true;
        }
    }

    pub fn nudge(&mut self, delta: TimeMs) {
        self.scrub(self.playhead + delta);
    }

    pub fn nudge_step(&self) -> TimeMs {
        TimeMs(self.settings.nudge_step_ms)
    }

    // -- engine events -----------------------------------------------------

    pub fn handle_event(&mut self, event: EngineEvent) -> Result<Vec<EngineCommand>> {
        match event {
            EngineEvent::DurationKnown(d) => {
                self.learn_duration(d);
                self.mark_ready();
                Ok(vec![])
            }
            EngineEvent::StateChanged(EngineState::Playing) => {
                self.mark_ready();
                Ok(vec![])
            }
            EngineEvent::StateChanged(other) => {
                tracing::trace!(engine = ?other, "engine state");
                Ok(vec![])
            }
            EngineEvent::PositionChanged(pos) => Ok(self.on_position(pos)),
            EngineEvent::EndOfMedia => {
                if self.state == PlaybackState::Playing {
                    Ok(self.end_of_clip())
                } else {
                    Ok(vec![])
                }
            }
            EngineEvent::LoadFailed(reason) => Err(self.load_failed(reason)),
        }
    }

    /// The current clip could not be opened. Playback goes idle on that clip
    /// so the next `play` can retry.
    pub fn load_failed(&mut self, reason: impl Into<String>) -> PreviewError {
        let reason = reason.into();
        let (clip_id, path) = match self.current() {
            Some(e) => (e.clip_id, e.path.clone()),
            None => (ClipId::nil(), PathBuf::new()),
        };
        tracing::warn!(clip = %clip_id, path = %path.display(), "load failed: {reason}");
        self.set_state(PlaybackState::Idle);
        PreviewError::MediaLoad {
            clip_id,
            path,
            reason,
        }
    }

    fn learn_duration(&mut self, d: TimeMs) {
        match self.mode {
            PlaybackMode::Queue => {
                let index = self.index;
                if let Some(q) = self.queue.as_mut() {
                    if let Some(id) = q.get(index).map(|e| e.clip_id) {
                        q.learn_duration(id, d);
                    }
                }
            }
            PlaybackMode::Preview => self.preview_duration = Some(d),
        }
    }

    fn mark_ready(&mut self) {
        if self.state == PlaybackState::LoadingClip {
            self.set_state(PlaybackState::Playing);
        }
    }

    fn on_position(&mut self, pos: TimeMs) -> Vec<EngineCommand> {
        if self.state != PlaybackState::Playing {
            return vec![];
        }
        let Some(entry) = self.current() else {
            return vec![];
        };
        let local = (pos - entry.in_ms).non_negative();
        let end = entry.out_ms;
        let base = match self.mode {
            PlaybackMode::Queue => self.queue.as_ref().map_or(TimeMs::ZERO, |q| q.offset_before(self.index)),
            PlaybackMode::Preview => TimeMs::ZERO,
        };
        self.playhead = base + local;
        match end {
            Some(out) if pos >= out => self.end_of_clip(),
            _ => vec![],
        }
    }

    fn end_of_clip(&mut self) -> Vec<EngineCommand> {
        match self.mode {
            PlaybackMode::Preview => {
                self.playhead = self.preview_length();
                self.scrubbed = false;
                self.set_state(PlaybackState::Ended);
                vec![EngineCommand::Stop]
            }
            PlaybackMode::Queue => {
                let next = self.index + 1;
                let Some(queue) = self.queue.as_ref() else {
                    self.set_state(PlaybackState::Idle);
                    return vec![EngineCommand::Stop];
                };
                if next < queue.len() {
                    self.playhead = queue.offset_before(next);
                    self.load_index(next)
                } else {
                    self.playhead = queue.total();
                    self.index = next;
                    self.scrubbed = false;
                    tracing::info!("timeline playback finished");
                    self.set_state(PlaybackState::Ended);
                    vec![EngineCommand::Stop]
                }
            }
        }
    }

    // -- helpers -----------------------------------------------------------

    fn replace_queue(&mut self, mut candidate: PlayQueue) {
        if let Some(old) = self.queue.take() {
            if old != candidate {
                tracing::debug!(entries = candidate.len(), "play queue rebuilt");
            }
            candidate.inherit_durations(&old);
        }
        self.queue = Some(candidate);
    }

    fn start_queue_at(&mut self, index: usize) -> Vec<EngineCommand> {
        self.mode = PlaybackMode::Queue;
        self.preview = None;
        self.preview_duration = None;
        self.scrubbed = false;
        if let Some(q) = self.queue.as_ref() {
            self.playhead = q.offset_before(index);
        }
        self.load_index(index)
    }

    fn load_index(&mut self, index: usize) -> Vec<EngineCommand> {
        self.index = index;
        let Some(entry) = self.queue.as_ref().and_then(|q| q.get(index)) else {
            self.set_state(PlaybackState::Ended);
            return vec![EngineCommand::Stop];
        };
        let cmd = EngineCommand::Load {
            clip_id: entry.clip_id,
            path: entry.path.clone(),
            start: entry.in_ms,
        };
        tracing::info!(index, clip = %entry.clip_id, path = %entry.path.display(), "loading clip");
        self.set_state(PlaybackState::LoadingClip);
        vec![cmd, EngineCommand::Play]
    }

    fn preview_length(&self) -> TimeMs {
        let Some(entry) = self.preview.as_ref() else {
            return TimeMs::ZERO;
        };
        entry
            .out_ms
            .or(entry.source_duration)
            .or(self.preview_duration)
            .map_or(TimeMs::ZERO, |end| (end - entry.in_ms).non_negative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(path: &str, start: i64, len: i64) -> Clip {
        Clip::new(path, TimeMs(start)).with_range(TimeMs::ZERO, TimeMs(len))
    }

    /// Clips at 5000, 1000 and 3000 ms, each 1s long, spread over two tracks.
    fn sequence() -> (Sequence, [ClipId; 3]) {
        let mut seq = Sequence::default();
        let c = seq.append_clip(0, clip("/m/c.mp4", 5_000, 1_000)).unwrap();
        let a = seq.append_clip(0, clip("/m/a.mp4", 1_000, 1_000)).unwrap();
        let b = seq.append_clip(1, clip("/m/b.mp4", 3_000, 1_000)).unwrap();
        (seq, [a, b, c])
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(PlaybackSettings::default())
    }

    fn loaded(cmds: &[EngineCommand]) -> Option<ClipId> {
        cmds.iter().find_map(|c| match c {
            EngineCommand::Load { clip_id, .. } => Some(*clip_id),
            _ => None,
        })
    }

    fn ready(ctl: &mut PlaybackController) {
        ctl.handle_event(EngineEvent::StateChanged(EngineState::Playing)).unwrap();
        assert_eq!(ctl.state(), PlaybackState::Playing);
    }

    #[test]
    fn play_builds_sorted_queue() {
        let (seq, _) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        let starts: Vec<_> = ctl.queue().unwrap().entries().iter().map(|e| e.start.0).collect();
        assert_eq!(starts, vec![1_000, 3_000, 5_000]);
    }

    #[test]
    fn play_starts_at_first_clip_after_playhead() {
        let (seq, [_, b, _]) = sequence();
        let mut ctl = controller();
        ctl.scrub(TimeMs(2_000));
        let cmds = ctl.play(&seq).unwrap();
        assert_eq!(ctl.index(), 1);
        assert_eq!(loaded(&cmds), Some(b));
        assert_eq!(cmds.last(), Some(&EngineCommand::Play));
        assert_eq!(ctl.state(), PlaybackState::LoadingClip);
    }

    #[test]
    fn play_past_last_start_falls_back_to_first() {
        let (seq, [a, _, _]) = sequence();
        let mut ctl = controller();
        ctl.scrub(TimeMs(50_000));
        let cmds = ctl.play(&seq).unwrap();
        assert_eq!(ctl.index(), 0);
        assert_eq!(loaded(&cmds), Some(a));
    }

    #[test]
    fn empty_sequence_reports_empty_queue() {
        let mut ctl = controller();
        let err = ctl.play(&Sequence::default()).unwrap_err();
        assert!(matches!(err, PreviewError::EmptyQueue));
        assert!(err.is_recoverable());
        assert_eq!(ctl.state(), PlaybackState::Idle);
    }

    #[test]
    fn end_of_media_advances_then_ends() {
        let (seq, [_, b, c]) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        ready(&mut ctl);

        let cmds = ctl.handle_event(EngineEvent::EndOfMedia).unwrap();
        assert_eq!(loaded(&cmds), Some(b));
        assert_eq!(ctl.playhead(), TimeMs(1_000));
        ready(&mut ctl);

        let cmds = ctl.handle_event(EngineEvent::EndOfMedia).unwrap();
        assert_eq!(loaded(&cmds), Some(c));
        ready(&mut ctl);

        let cmds = ctl.handle_event(EngineEvent::EndOfMedia).unwrap();
        assert_eq!(loaded(&cmds), None);
        assert_eq!(cmds, vec![EngineCommand::Stop]);
        assert_eq!(ctl.state(), PlaybackState::Ended);
        assert_eq!(ctl.playhead(), TimeMs(3_000));
    }

    fn play_to_end(ctl: &mut PlaybackController, seq: &Sequence) {
        ctl.play(seq).unwrap();
        while ctl.state() != PlaybackState::Ended {
            ready(ctl);
            ctl.handle_event(EngineEvent::EndOfMedia).unwrap();
        }
    }

    #[test]
    fn replay_after_end_starts_from_first_clip() {
        let (seq, [a, _, _]) = sequence();
        let mut ctl = controller();
        play_to_end(&mut ctl, &seq);
        // collapsed total, which happens to equal b's timeline start
        assert_eq!(ctl.playhead(), TimeMs(3_000));

        let cmds = ctl.play(&seq).unwrap();
        assert_eq!(ctl.index(), 0);
        assert_eq!(loaded(&cmds), Some(a));
        assert_eq!(ctl.playhead(), TimeMs::ZERO);
    }

    #[test]
    fn scrub_after_end_picks_start_clip() {
        let (seq, [_, _, c]) = sequence();
        let mut ctl = controller();
        play_to_end(&mut ctl, &seq);
        ctl.scrub(TimeMs(4_000));
        let cmds = ctl.play(&seq).unwrap();
        assert_eq!(loaded(&cmds), Some(c));
    }

    #[test]
    fn end_of_media_while_loading_is_ignored() {
        let (seq, _) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        assert!(ctl.handle_event(EngineEvent::EndOfMedia).unwrap().is_empty());
        assert_eq!(ctl.index(), 0);
    }

    #[test]
    fn position_maps_to_queue_timeline() {
        let mut seq = Sequence::default();
        seq.append_clip(0, clip("/m/a.mp4", 0, 2_000)).unwrap();
        seq.append_clip(
            0,
            Clip::new("/m/b.mp4", TimeMs(2_000)).with_range(TimeMs(10_000), TimeMs(13_000)),
        )
        .unwrap();
        let mut ctl = controller();
        ctl.play_from_clip(&seq, seq.tracks[0].clips[1].id).unwrap();
        assert_eq!(ctl.playhead(), TimeMs(2_000));
        ready(&mut ctl);

        ctl.handle_event(EngineEvent::PositionChanged(TimeMs(10_500))).unwrap();
        assert_eq!(ctl.playhead(), TimeMs(2_500));
        assert_eq!(ctl.total(), TimeMs(5_000));

        // reaching the out point ends the clip without waiting for EOF
        let cmds = ctl.handle_event(EngineEvent::PositionChanged(TimeMs(13_000))).unwrap();
        assert_eq!(cmds, vec![EngineCommand::Stop]);
        assert_eq!(ctl.state(), PlaybackState::Ended);
    }

    #[test]
    fn idle_scrub_moves_playhead_only() {
        let mut ctl = controller();
        ctl.scrub(TimeMs(4_000));
        assert_eq!(ctl.playhead(), TimeMs(4_000));
        assert_eq!(ctl.state(), PlaybackState::Idle);
        ctl.nudge(TimeMs(-5_000));
        assert_eq!(ctl.playhead(), TimeMs::ZERO);
        ctl.nudge(ctl.nudge_step());
        assert_eq!(ctl.playhead(), TimeMs(1_000));
    }

    #[test]
    fn never_ready_clip_stays_loading() {
        let (seq, _) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        for t in [0, 100, 200] {
            assert!(ctl.handle_event(EngineEvent::PositionChanged(TimeMs(t))).unwrap().is_empty());
        }
        ctl.handle_event(EngineEvent::StateChanged(EngineState::Paused)).unwrap();
        assert_eq!(ctl.state(), PlaybackState::LoadingClip);
        assert_eq!(ctl.playhead(), TimeMs::ZERO);
    }

    #[test]
    fn pause_then_play_resumes_in_place() {
        let (seq, _) = sequence();
        let mut ctl = controller();
        ctl.scrub(TimeMs(2_000));
        ctl.play(&seq).unwrap();
        ready(&mut ctl);
        assert_eq!(ctl.pause(), vec![EngineCommand::Pause]);
        assert_eq!(ctl.state(), PlaybackState::Paused);

        assert_eq!(ctl.play(&seq).unwrap(), vec![EngineCommand::Play]);
        assert_eq!(ctl.state(), PlaybackState::Playing);
        assert_eq!(ctl.index(), 1);
    }

    #[test]
    fn edit_while_paused_rebuilds_queue() {
        let (mut seq, [a, _, _]) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        ready(&mut ctl);
        ctl.pause();

        seq.remove_clip(a).unwrap();
        let cmds = ctl.play(&seq).unwrap();
        assert!(loaded(&cmds).is_some());
        assert_eq!(ctl.queue().unwrap().len(), 2);
        assert_eq!(ctl.state(), PlaybackState::LoadingClip);
    }

    #[test]
    fn scrub_while_paused_restarts_from_playhead() {
        let (seq, [_, _, c]) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        ready(&mut ctl);
        ctl.pause();
        ctl.scrub(TimeMs(4_500));
        let cmds = ctl.play(&seq).unwrap();
        assert_eq!(loaded(&cmds), Some(c));
    }

    #[test]
    fn pause_outside_playing_is_noop() {
        let mut ctl = controller();
        assert!(ctl.pause().is_empty());
        assert_eq!(ctl.state(), PlaybackState::Idle);
    }

    #[test]
    fn stop_discards_queue() {
        let (seq, _) = sequence();
        let mut ctl = controller();
        ctl.scrub(TimeMs(2_000));
        ctl.play(&seq).unwrap();
        assert_eq!(ctl.stop(), vec![EngineCommand::Stop]);
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(ctl.index(), 0);
        assert!(ctl.queue().is_none());
    }

    #[test]
    fn load_failure_goes_idle_without_advancing() {
        let (seq, [a, _, _]) = sequence();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        let err = ctl
            .handle_event(EngineEvent::LoadFailed("no such file".into()))
            .unwrap_err();
        match err {
            PreviewError::MediaLoad { clip_id, path, .. } => {
                assert_eq!(clip_id, a);
                assert_eq!(path, PathBuf::from("/m/a.mp4"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctl.state(), PlaybackState::Idle);
        assert_eq!(ctl.index(), 0);

        // resumable
        let cmds = ctl.play(&seq).unwrap();
        assert_eq!(loaded(&cmds), Some(a));
    }

    #[test]
    fn preview_plays_single_clip_without_advance() {
        let (seq, [a, _, _]) = sequence();
        let mut ctl = controller();
        let cmds = ctl.preview_clip(seq.find_clip(a).unwrap()).unwrap();
        assert_eq!(loaded(&cmds), Some(a));
        assert_eq!(ctl.mode(), PlaybackMode::Preview);
        ready(&mut ctl);
        ctl.handle_event(EngineEvent::PositionChanged(TimeMs(400))).unwrap();
        assert_eq!(ctl.playhead(), TimeMs(400));

        let cmds = ctl.handle_event(EngineEvent::EndOfMedia).unwrap();
        assert_eq!(cmds, vec![EngineCommand::Stop]);
        assert_eq!(ctl.state(), PlaybackState::Ended);
        assert_eq!(ctl.total(), TimeMs(1_000));
    }

    #[test]
    fn learned_duration_feeds_offsets() {
        let mut seq = Sequence::default();
        seq.append_clip(0, Clip::new("/m/a.mp4", TimeMs::ZERO)).unwrap();
        let b = seq.append_clip(0, Clip::new("/m/b.mp4", TimeMs(10))).unwrap();
        let mut ctl = controller();
        ctl.play(&seq).unwrap();
        ctl.handle_event(EngineEvent::DurationKnown(TimeMs(2_500))).unwrap();
        assert_eq!(ctl.state(), PlaybackState::Playing);
        let cmds = ctl.handle_event(EngineEvent::EndOfMedia).unwrap();
        assert_eq!(loaded(&cmds), Some(b));
        assert_eq!(ctl.playhead(), TimeMs(2_500));
    }
}
