use crate::error::{CoreError, Result};
use crate::types::*;

/// An edit that can be applied to a sequence and reverted.
pub trait EditCommand: std::fmt::Debug {
    fn execute(&mut self, sequence: &mut Sequence) -> Result<()>;
    fn undo(&mut self, sequence: &mut Sequence) -> Result<()>;
    fn description(&self) -> &str;
}

/// Undo/redo history with a bounded undo depth.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Box<dyn EditCommand>>,
    redo_stack: Vec<Box<dyn EditCommand>>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Execute a command and push it onto the undo stack. Clears the redo stack.
    pub fn execute(&mut self, mut cmd: Box<dyn EditCommand>, sequence: &mut Sequence) -> Result<()> {
        cmd.execute(sequence)?;
        self.redo_stack.clear();
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        Ok(())
    }

    pub fn undo(&mut self, sequence: &mut Sequence) -> Result<()> {
        let mut cmd = self.undo_stack.pop().ok_or(CoreError::NothingToUndo)?;
        cmd.undo(sequence)?;
        self.redo_stack.push(cmd);
        Ok(())
    }

    pub fn redo(&mut self, sequence: &mut Sequence) -> Result<()> {
        let mut cmd = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        cmd.execute(sequence)?;
        self.undo_stack.push(cmd);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|cmd| cmd.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|cmd| cmd.description())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

// ---------------------------------------------------------------------------
// AddClip
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AddClip {
    track_index: usize,
    clip: Clip,
}

impl AddClip {
    pub fn new(track_index: usize, clip: Clip) -> Self {
        Self { track_index, clip }
    }
}

impl EditCommand for AddClip {
    fn execute(&mut self, sequence: &mut Sequence) -> Result<()> {
        sequence.append_clip(self.track_index, self.clip.clone()).map(|_| ())
    }

    fn undo(&mut self, sequence: &mut Sequence) -> Result<()> {
        sequence.remove_clip(self.clip.id).map(|_| ())
    }

    fn description(&self) -> &str {
        "Add clip"
    }
}

// ---------------------------------------------------------------------------
// RemoveClip
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RemoveClip {
    clip_id: ClipId,
    // (track, list index, clip) captured on execute
    removed: Option<(usize, usize, Clip)>,
}

impl RemoveClip {
    pub fn new(clip_id: ClipId) -> Self {
        Self {
            clip_id,
            removed: None,
        }
    }
}

impl EditCommand for RemoveClip {
    fn execute(&mut self, sequence: &mut Sequence) -> Result<()> {
        let (ti, ci) = sequence
            .find_clip_location(self.clip_id)
            .ok_or(CoreError::NotFound(self.clip_id))?;
        let clip = sequence.remove_clip(self.clip_id)?;
        self.removed = Some((ti, ci, clip));
        Ok(())
    }

    fn undo(&mut self, sequence: &mut Sequence) -> Result<()> {
        let (ti, ci, clip) = self
            .removed
            .take()
            .ok_or(CoreError::NotExecuted("remove clip"))?;
        sequence.insert_clip(ti, ci, clip)
    }

    fn description(&self) -> &str {
        "Remove clip"
    }
}

// ---------------------------------------------------------------------------
// MoveClip
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MoveClip {
    clip_id: ClipId,
    new_start: TimeMs,
    new_track: usize,
    previous: Option<(usize, usize, TimeMs)>,
}

impl MoveClip {
    pub fn new(clip_id: ClipId, new_start: TimeMs, new_track: usize) -> Self {
        Self {
            clip_id,
            new_start,
            new_track,
            previous: None,
        }
    }
}

impl EditCommand for MoveClip {
    fn execute(&mut self, sequence: &mut Sequence) -> Result<()> {
        let (ti, ci) = sequence
            .find_clip_location(self.clip_id)
            .ok_or(CoreError::NotFound(self.clip_id))?;
        let old_start = sequence.tracks[ti].clips[ci].start_ms_on_timeline;
        sequence.move_clip(self.clip_id, self.new_start, self.new_track)?;
        self.previous = Some((ti, ci, old_start));
        Ok(())
    }

    fn undo(&mut self, sequence: &mut Sequence) -> Result<()> {
        let (ti, ci, old_start) = self
            .previous
            .take()
            .ok_or(CoreError::NotExecuted("move clip"))?;
        let mut clip = sequence.remove_clip(self.clip_id)?;
        clip.start_ms_on_timeline = old_start;
        sequence.insert_clip(ti, ci, clip)
    }

    fn description(&self) -> &str {
        "Move clip"
    }
}

// ---------------------------------------------------------------------------
// ReorderTrack
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ReorderTrack {
    track_index: usize,
    ordered_ids: Vec<ClipId>,
    previous: Option<Vec<Clip>>,
}

impl ReorderTrack {
    pub fn new(track_index: usize, ordered_ids: Vec<ClipId>) -> Self {
        Self {
            track_index,
            ordered_ids,
            previous: None,
        }
    }
}

impl EditCommand for ReorderTrack {
    fn execute(&mut self, sequence: &mut Sequence) -> Result<()> {
        let snapshot = sequence
            .tracks
            .get(self.track_index)
            .ok_or(CoreError::TrackNotFound(self.track_index))?
            .clips
            .clone();
        sequence.reorder_track(self.track_index, &self.ordered_ids)?;
        self.previous = Some(snapshot);
        Ok(())
    }

    fn undo(&mut self, sequence: &mut Sequence) -> Result<()> {
        let clips = self
            .previous
            .take()
            .ok_or(CoreError::NotExecuted("reorder track"))?;
        let track = sequence
            .tracks
            .get_mut(self.track_index)
            .ok_or(CoreError::TrackNotFound(self.track_index))?;
        track.clips = clips;
        Ok(())
    }

    fn description(&self) -> &str {
        "Reorder clips"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
