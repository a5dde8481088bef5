use cutlane_core::{Clip, ClipId, QueueSource, Sequence, TimeMs};
use std::collections::HashMap;
use std::path::PathBuf;

/// One clip as the player sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub clip_id: ClipId,
    pub path: PathBuf,
    pub in_ms: TimeMs,
    pub out_ms: Option<TimeMs>,
    pub start: TimeMs,
    pub source_duration: Option<TimeMs>,
}

impl From<&Clip> for QueueEntry {
    fn from(clip: &Clip) -> Self {
        Self {
            clip_id: clip.id,
            path: clip.path.clone(),
            in_ms: clip.in_ms,
            out_ms: clip.out_ms,
            start: clip.start_ms_on_timeline,
            source_duration: clip.source_duration_ms,
        }
    }
}

/// Clips in play order, captured when playback starts.
///
/// Equality looks only at the entries, so a rebuilt queue compares equal to
/// the current one exactly when the sequence has not changed in a way that
/// matters to playback.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    entries: Vec<QueueEntry>,
    learned: HashMap<ClipId, TimeMs>,
}

impl PartialEq for PlayQueue {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl PlayQueue {
    /// Sorted by timeline start. The sort is stable, so equal starts keep
    /// track order and then list order.
    pub fn build(sequence: &Sequence, source: QueueSource) -> Self {
        let mut entries: Vec<QueueEntry> = match source {
            QueueSource::AllTracks => sequence.clips().map(QueueEntry::from).collect(),
            QueueSource::PrimaryTrack => sequence
                .tracks
                .first()
                .map(|t| t.clips.iter().map(QueueEntry::from).collect())
                .unwrap_or_default(),
        };
        entries.sort_by_key(|e| e.start);
        Self {
            entries,
            learned: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn position_of(&self, id: ClipId) -> Option<usize> {
        self.entries.iter().position(|e| e.clip_id == id)
    }

    /// First entry starting at or after the playhead, else the first entry.
    pub fn start_index_for(&self, playhead: TimeMs) -> usize {
        self.entries
            .iter()
            .position(|e| e.start >= playhead)
            .unwrap_or(0)
    }

    /// Record a source length reported by the engine.
    pub fn learn_duration(&mut self, id: ClipId, source_duration: TimeMs) {
        self.learned.insert(id, source_duration);
    }

    /// Keep durations already learned for clips that are still queued.
    pub fn inherit_durations(&mut self, previous: &PlayQueue) {
        for entry in &self.entries {
            if let Some(d) = previous.learned.get(&entry.clip_id) {
                self.learned.entry(entry.clip_id).or_insert(*d);
            }
        }
    }

    /// Source position where an entry stops playing, if known.
    pub fn end_of(&self, index: usize) -> Option<TimeMs> {
        let entry = self.entries.get(index)?;
        entry
            .out_ms
            .or(entry.source_duration)
            .or_else(|| self.learned.get(&entry.clip_id).copied())
    }

    /// Played length of an entry. Unknown lengths count as zero.
    pub fn duration_of(&self, index: usize) -> TimeMs {
        match (self.entries.get(index), self.end_of(index)) {
            (Some(entry), Some(end)) => (end - entry.in_ms).non_negative(),
            _ => TimeMs::ZERO,
        }
    }

    /// Timeline position where an entry begins during queue playback.
    pub fn offset_before(&self, index: usize) -> TimeMs {
        (0..index.min(self.entries.len()))
            .map(|i| self.duration_of(i))
            .fold(TimeMs::ZERO, |acc, d| acc + d)
    }

    pub fn total(&self) -> TimeMs {
        self.offset_before(self.entries.len())
    }
}
