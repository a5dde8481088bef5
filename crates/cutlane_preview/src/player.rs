use crate::controller::{EngineCommand, PlaybackController, PlaybackState};
use crate::engine::MediaEngine;
use crate::error::{PreviewError, Result};
use crate::transport::Transport;
use cutlane_core::settings::{PlaybackSettings, ViewSettings};
use cutlane_core::{Clip, ClipId, Sequence, TimeMs};
use cutlane_view::TimelineView;

/// Wires a [`PlaybackController`] to a media engine and keeps the timeline
/// view and transport in step with it.
pub struct Player<E> {
    engine: E,
    controller: PlaybackController,
    view: TimelineView,
    transport: Transport,
}

impl<E: MediaEngine> Player<E> {
    pub fn new(engine: E, playback: &PlaybackSettings, view: &ViewSettings) -> Self {
        Self {
            engine,
            controller: PlaybackController::new(playback.clone()),
            view: TimelineView::new(view),
            transport: Transport::new(playback.min_sequence_duration()),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn view(&self) -> &TimelineView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut TimelineView {
        &mut self.view
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn play(&mut self, sequence: &Sequence) -> Result<()> {
        let cmds = self.controller.play(sequence)?;
        self.apply(cmds)
    }

    pub fn play_from_clip(&mut self, sequence: &Sequence, id: ClipId) -> Result<()> {
        let cmds = self.controller.play_from_clip(sequence, id)?;
        self.apply(cmds)
    }

    pub fn preview_clip(&mut self, clip: &Clip) -> Result<()> {
        let cmds = self.controller.preview_clip(clip)?;
        self.apply(cmds)
    }

    pub fn pause(&mut self) -> Result<()> {
        let cmds = self.controller.pause();
        self.apply(cmds)
    }

    pub fn stop(&mut self) -> Result<()> {
        let cmds = self.controller.stop();
        self.apply(cmds)
    }

    pub fn scrub(&mut self, t: TimeMs) {
        self.controller.scrub(t);
        self.sync();
    }

    /// Step the playhead by whole nudge steps; negative moves back.
    pub fn nudge(&mut self, steps: i64) {
        let delta = self.controller.nudge_step() * steps;
        self.controller.nudge(delta);
        self.sync();
    }

    /// The user dragged the transport slider.
    pub fn slider_moved(&mut self, value: TimeMs) {
        if let Some(t) = self.transport.user_set_value(value) {
            self.scrub(t);
        }
    }

    pub fn slider_pressed(&mut self) {
        self.transport.press();
    }

    pub fn slider_released(&mut self) {
        self.transport.release();
    }

    /// Drain engine events through the controller.
    pub fn pump(&mut self) -> Result<()> {
        let events = self.engine.poll_events()?;
        for event in events {
            let cmds = match self.controller.handle_event(event) {
                Ok(cmds) => cmds,
                Err(e) => {
                    self.sync();
                    return Err(e);
                }
            };
            self.apply(cmds)?;
        }
        self.sync();
        Ok(())
    }

    fn apply(&mut self, cmds: Vec<EngineCommand>) -> Result<()> {
        for cmd in cmds {
            let result = match cmd {
                EngineCommand::Load { path, start, .. } => match self.engine.load_source(&path, start) {
                    Err(e @ (PreviewError::Ipc(_) | PreviewError::MediaLoad { .. })) => {
                        let err = self.controller.load_failed(e.to_string());
                        self.sync();
                        return Err(err);
                    }
                    other => other,
                },
                EngineCommand::Play => self.engine.play(),
                EngineCommand::Pause => self.engine.pause(),
                EngineCommand::Stop => self.engine.stop(),
            };
            result?;
        }
        self.sync();
        Ok(())
    }

    fn sync(&mut self) {
        let playhead = self.controller.playhead();
        let total = self.controller.total();
        self.view.set_playhead(playhead);
        self.transport.set_range(total);
        self.transport.sync_value(playhead);
        self.transport.set_label(playhead, total);
    }
}
