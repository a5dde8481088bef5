use crate::error::{CoreError, Result};
use crate::types::*;

impl Sequence {
    pub fn add_track(&mut self, name: impl Into<String>) -> usize {
        self.tracks.push(Track::new(name));
        self.tracks.len() - 1
    }

    /// Append a clip to a track. The clip's `track_index` is overwritten.
    pub fn append_clip(&mut self, track_index: usize, mut clip: Clip) -> Result<ClipId> {
        validate_clip(&clip)?;
        let track = self
            .tracks
            .get_mut(track_index)
            .ok_or(CoreError::TrackNotFound(track_index))?;
        clip.track_index = track_index;
        let id = clip.id;
        track.clips.push(clip);
        Ok(id)
    }

    /// Insert a clip at a list position inside a track (used by undo).
    pub fn insert_clip(&mut self, track_index: usize, index: usize, mut clip: Clip) -> Result<()> {
        validate_clip(&clip)?;
        let track = self
            .tracks
            .get_mut(track_index)
            .ok_or(CoreError::TrackNotFound(track_index))?;
        clip.track_index = track_index;
        let index = index.min(track.clips.len());
        track.clips.insert(index, clip);
        Ok(())
    }

    /// Remove a clip by id. Returns the removed clip.
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        let (track_idx, clip_idx) = self.find_clip_location(id).ok_or(CoreError::NotFound(id))?;
        Ok(self.tracks[track_idx].clips.remove(clip_idx))
    }

    pub fn find_clip(&self, id: ClipId) -> Result<&Clip> {
        let (track_idx, clip_idx) = self.find_clip_location(id).ok_or(CoreError::NotFound(id))?;
        Ok(&self.tracks[track_idx].clips[clip_idx])
    }

    /// All clips, in track order then list order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clip_count() == 0
    }

    /// Ids of a track's clips in list order.
    pub fn track_order(&self, track_index: usize) -> Result<Vec<ClipId>> {
        let track = self
            .tracks
            .get(track_index)
            .ok_or(CoreError::TrackNotFound(track_index))?;
        Ok(track.clips.iter().map(|c| c.id).collect())
    }

    /// Reorder a track's clips to follow `ordered_ids`.
    ///
    /// Clips not named keep their relative order and go after the named ones.
    /// Every id must belong to the track.
    pub fn reorder_track(&mut self, track_index: usize, ordered_ids: &[ClipId]) -> Result<()> {
        let track = self
            .tracks
            .get_mut(track_index)
            .ok_or(CoreError::TrackNotFound(track_index))?;

        if let Some(missing) = ordered_ids
            .iter()
            .find(|id| !track.clips.iter().any(|c| c.id == **id))
        {
            return Err(CoreError::NotFound(*missing));
        }

        let mut remaining = std::mem::take(&mut track.clips);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ordered_ids {
            if let Some(pos) = remaining.iter().position(|c| c.id == *id) {
                reordered.push(remaining.remove(pos));
            }
        }
        reordered.extend(remaining);
        track.clips = reordered;
        Ok(())
    }

    /// Move a clip to another list position within its track.
    pub fn move_clip_to_index(&mut self, id: ClipId, new_index: usize) -> Result<()> {
        let (track_idx, clip_idx) = self.find_clip_location(id).ok_or(CoreError::NotFound(id))?;
        let track = &mut self.tracks[track_idx];
        if new_index >= track.clips.len() {
            return Err(CoreError::InvalidClip(format!(
                "index {} out of bounds (track has {} clips)",
                new_index,
                track.clips.len()
            )));
        }
        let clip = track.clips.remove(clip_idx);
        track.clips.insert(new_index, clip);
        Ok(())
    }

    /// Commit a new timeline position (and possibly track) for a clip.
    /// A clip changing track is appended to the end of the target track.
    pub fn move_clip(&mut self, id: ClipId, new_start: TimeMs, new_track: usize) -> Result<()> {
        if new_start < TimeMs::ZERO {
            return Err(CoreError::InvalidClip(format!(
                "start {} is before the timeline origin",
                new_start.0
            )));
        }
        if new_track >= self.tracks.len() {
            return Err(CoreError::TrackNotFound(new_track));
        }
        let (track_idx, clip_idx) = self.find_clip_location(id).ok_or(CoreError::NotFound(id))?;

        if track_idx == new_track {
            self.tracks[track_idx].clips[clip_idx].start_ms_on_timeline = new_start;
        } else {
            let mut clip = self.tracks[track_idx].clips.remove(clip_idx);
            clip.start_ms_on_timeline = new_start;
            clip.track_index = new_track;
            self.tracks[new_track].clips.push(clip);
        }
        Ok(())
    }

    /// Lay a track's clips out back to back in list order, starting at zero.
    pub fn pack_track(&mut self, track_index: usize) -> Result<()> {
        let track = self
            .tracks
            .get_mut(track_index)
            .ok_or(CoreError::TrackNotFound(track_index))?;
        let mut cursor = TimeMs::ZERO;
        for clip in &mut track.clips {
            clip.start_ms_on_timeline = cursor;
            cursor = cursor + clip.layout_duration();
        }
        Ok(())
    }

    /// End of the last clip, but never less than `min`.
    pub fn total_duration(&self, min: TimeMs) -> TimeMs {
        self.clips()
            .map(Clip::timeline_end)
            .max()
            .unwrap_or(TimeMs::ZERO)
            .max(min)
    }

    /// Make every clip's `track_index` agree with the track holding it.
    pub fn normalize_track_indices(&mut self) {
        for (ti, track) in self.tracks.iter_mut().enumerate() {
            for clip in &mut track.clips {
                clip.track_index = ti;
            }
        }
    }

    /// (track index, list index) of a clip.
    pub fn find_clip_location(&self, id: ClipId) -> Option<(usize, usize)> {
        for (ti, track) in self.tracks.iter().enumerate() {
            if let Some(ci) = track.clips.iter().position(|c| c.id == id) {
                return Some((ti, ci));
            }
        }
        None
    }
}

fn validate_clip(clip: &Clip) -> Result<()> {
    if clip.start_ms_on_timeline < TimeMs::ZERO {
        return Err(CoreError::InvalidClip(format!(
            "start {} is before the timeline origin",
            clip.start_ms_on_timeline.0
        )));
    }
    if clip.in_ms < TimeMs::ZERO {
        return Err(CoreError::InvalidClip("in point must not be negative".into()));
    }
    if let Some(out) = clip.out_ms {
        if out <= clip.in_ms {
            return Err(CoreError::InvalidClip(
                "out point must be greater than in point".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_at(start_ms: i64, len_ms: i64) -> Clip {
        Clip::new(format!("/media/clip_{start_ms}.mp4"), TimeMs(start_ms))
            .with_range(TimeMs::ZERO, TimeMs(len_ms))
    }

    fn sequence_with_clips() -> (Sequence, Vec<ClipId>) {
        let mut seq = Sequence::default();
        let a = seq.append_clip(0, clip_at(0, 2_000)).unwrap();
        let b = seq.append_clip(0, clip_at(2_000, 3_000)).unwrap();
        let c = seq.append_clip(1, clip_at(1_000, 1_000)).unwrap();
        (seq, vec![a, b, c])
    }

    // -----------------------------------------------------------------------
    // append / remove
    // -----------------------------------------------------------------------

    #[test]
    fn append_sets_track_index() {
        let mut seq = Sequence::default();
        let mut clip = clip_at(0, 1_000);
        clip.track_index = 7;
        let id = seq.append_clip(1, clip).unwrap();
        assert_eq!(seq.find_clip(id).unwrap().track_index, 1);
        assert_eq!(seq.tracks[1].clips.len(), 1);
    }

    #[test]
    fn append_to_unknown_track_fails() {
        let mut seq = Sequence::default();
        let err = seq.append_clip(5, clip_at(0, 1_000)).unwrap_err();
        assert!(matches!(err, CoreError::TrackNotFound(5)));
        assert!(err.is_not_found());
    }

    #[test]
    fn append_rejects_inverted_range() {
        let mut seq = Sequence::default();
        let clip = Clip::new("/media/a.mp4", TimeMs::ZERO).with_range(TimeMs(3_000), TimeMs(1_000));
        assert!(matches!(
            seq.append_clip(0, clip),
            Err(CoreError::InvalidClip(_))
        ));
    }

    #[test]
    fn append_rejects_negative_start() {
        let mut seq = Sequence::default();
        let clip = Clip::new("/media/a.mp4", TimeMs(-1));
        assert!(seq.append_clip(0, clip).is_err());
        assert!(seq.is_empty());
    }

    #[test]
    fn overlapping_clips_are_accepted() {
        let mut seq = Sequence::default();
        seq.append_clip(0, clip_at(0, 5_000)).unwrap();
        seq.append_clip(0, clip_at(1_000, 5_000)).unwrap();
        assert_eq!(seq.tracks[0].clips.len(), 2);
    }

    #[test]
    fn remove_clip_returns_it() {
        let (mut seq, ids) = sequence_with_clips();
        let removed = seq.remove_clip(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert_eq!(seq.clip_count(), 2);
    }

    #[test]
    fn remove_unknown_clip_fails() {
        let (mut seq, _) = sequence_with_clips();
        let bogus = uuid::Uuid::new_v4();
        assert!(matches!(seq.remove_clip(bogus), Err(CoreError::NotFound(id)) if id == bogus));
    }

    // -----------------------------------------------------------------------
    // reorder
    // -----------------------------------------------------------------------

    #[test]
    fn reorder_track_follows_given_ids() {
        let mut seq = Sequence::default();
        let a = seq.append_clip(0, clip_at(0, 1_000)).unwrap();
        let b = seq.append_clip(0, clip_at(1_000, 1_000)).unwrap();
        let c = seq.append_clip(0, clip_at(2_000, 1_000)).unwrap();

        seq.reorder_track(0, &[c, a, b]).unwrap();
        assert_eq!(seq.track_order(0).unwrap(), vec![c, a, b]);
    }

    #[test]
    fn reorder_track_appends_unlisted_clips() {
        let mut seq = Sequence::default();
        let a = seq.append_clip(0, clip_at(0, 1_000)).unwrap();
        let b = seq.append_clip(0, clip_at(1_000, 1_000)).unwrap();
        let c = seq.append_clip(0, clip_at(2_000, 1_000)).unwrap();

        seq.reorder_track(0, &[c]).unwrap();
        assert_eq!(seq.track_order(0).unwrap(), vec![c, a, b]);
    }

    #[test]
    fn reorder_track_rejects_foreign_id() {
        let (mut seq, ids) = sequence_with_clips();
        // ids[2] lives on track 1
        let err = seq.reorder_track(0, &[ids[2], ids[0]]).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(id) if id == ids[2]));
        assert_eq!(seq.track_order(0).unwrap(), vec![ids[0], ids[1]]);
    }

    #[test]
    fn move_clip_to_index_works() {
        let (mut seq, ids) = sequence_with_clips();
        seq.move_clip_to_index(ids[1], 0).unwrap();
        assert_eq!(seq.track_order(0).unwrap(), vec![ids[1], ids[0]]);
        assert!(seq.move_clip_to_index(ids[1], 9).is_err());
    }

    // -----------------------------------------------------------------------
    // move / pack
    // -----------------------------------------------------------------------

    #[test]
    fn move_clip_within_track() {
        let (mut seq, ids) = sequence_with_clips();
        seq.move_clip(ids[0], TimeMs(9_000), 0).unwrap();
        let clip = seq.find_clip(ids[0]).unwrap();
        assert_eq!(clip.start_ms_on_timeline, TimeMs(9_000));
        assert_eq!(clip.track_index, 0);
    }

    #[test]
    fn move_clip_across_tracks() {
        let (mut seq, ids) = sequence_with_clips();
        seq.move_clip(ids[0], TimeMs(500), 1).unwrap();
        let clip = seq.find_clip(ids[0]).unwrap();
        assert_eq!(clip.track_index, 1);
        assert_eq!(seq.tracks[0].clips.len(), 1);
        assert_eq!(seq.tracks[1].clips.len(), 2);
    }

    #[test]
    fn move_clip_to_missing_track_fails() {
        let (mut seq, ids) = sequence_with_clips();
        assert!(matches!(
            seq.move_clip(ids[0], TimeMs(0), 4),
            Err(CoreError::TrackNotFound(4))
        ));
        assert!(seq.move_clip(ids[0], TimeMs(-5), 0).is_err());
    }

    #[test]
    fn pack_track_lays_clips_back_to_back() {
        let mut seq = Sequence::default();
        let a = seq.append_clip(0, clip_at(7_000, 1_000)).unwrap();
        let b = seq.append_clip(0, clip_at(0, 2_500)).unwrap();
        let c = seq.append_clip(0, Clip::new("/media/unknown.mp4", TimeMs(100))).unwrap();

        seq.pack_track(0).unwrap();
        assert_eq!(seq.find_clip(a).unwrap().start_ms_on_timeline, TimeMs(0));
        assert_eq!(seq.find_clip(b).unwrap().start_ms_on_timeline, TimeMs(1_000));
        assert_eq!(seq.find_clip(c).unwrap().start_ms_on_timeline, TimeMs(3_500));
    }

    // -----------------------------------------------------------------------
    // total duration
    // -----------------------------------------------------------------------

    #[test]
    fn total_duration_is_latest_clip_end() {
        let (seq, _) = sequence_with_clips();
        assert_eq!(seq.total_duration(TimeMs::ZERO), TimeMs(5_000));
    }

    #[test]
    fn total_duration_floors_to_minimum() {
        let (seq, _) = sequence_with_clips();
        assert_eq!(seq.total_duration(TimeMs(60_000)), TimeMs(60_000));
        assert_eq!(Sequence::default().total_duration(TimeMs(1_000)), TimeMs(1_000));
    }

    #[test]
    fn normalize_fixes_stale_track_indices() {
        let (mut seq, ids) = sequence_with_clips();
        seq.tracks[1].clips[0].track_index = 0;
        seq.normalize_track_indices();
        assert_eq!(seq.find_clip(ids[2]).unwrap().track_index, 1);
    }
}
