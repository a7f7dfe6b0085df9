// Segments and stacks - The data a practice routine is made of

use super::timeline::{Tempo, TimeSignature};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Validation failures for segments and stacks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("BPM must be greater than 0")]
    ZeroBpm,

    #[error("BPM {0} is outside the practice range {min}-{max}", min = TempoSegment::MIN_BPM, max = TempoSegment::MAX_BPM)]
    BpmOutOfRange(u32),

    #[error("Beat count must be greater than 0")]
    ZeroBeats,

    #[error("Stack name cannot be empty")]
    EmptyName,

    #[error("Stack name cannot exceed {max} characters", max = TempoStack::MAX_NAME_LEN)]
    NameTooLong,

    #[error("Segment {index}: {source}")]
    Segment {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

/// One practice phase: a fixed tempo held for a fixed number of beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoSegment {
    pub bpm: u32,
    pub total_beats: u32,
    #[serde(default)]
    pub time_signature: TimeSignature,
}

impl TempoSegment {
    pub const MIN_BPM: u32 = 30;
    pub const MAX_BPM: u32 = 300;

    pub fn new(bpm: u32, total_beats: u32, time_signature: TimeSignature) -> Self {
        Self {
            bpm,
            total_beats,
            time_signature,
        }
    }

    /// Segment in common time (4/4)
    pub fn common_time(bpm: u32, total_beats: u32) -> Self {
        Self::new(bpm, total_beats, TimeSignature::default())
    }

    /// Whether the engine can schedule this segment at all
    pub fn is_playable(&self) -> bool {
        self.bpm > 0 && self.total_beats > 0
    }

    /// `None` when the BPM is 0
    pub fn tempo(&self) -> Option<Tempo> {
        Tempo::new(self.bpm)
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.time_signature.beats_per_measure()
    }

    pub fn beat_interval_seconds(&self) -> Option<f64> {
        self.tempo().map(|t| t.beat_duration_seconds())
    }

    pub fn beat_interval(&self) -> Option<Duration> {
        self.tempo().map(|t| t.beat_interval())
    }

    /// Playing time of the whole segment: beats / (BPM / 60). A segment at
    /// 0 BPM never plays and lasts 0 seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.beat_interval_seconds()
            .map_or(0.0, |interval| self.total_beats as f64 * interval)
    }

    /// Complete measures only; a trailing partial measure is not counted
    pub fn measure_count(&self) -> u32 {
        self.total_beats / self.beats_per_measure()
    }

    pub fn is_accent(&self, beat_in_segment: u32) -> bool {
        self.time_signature.is_downbeat(beat_in_segment)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bpm == 0 {
            return Err(ValidationError::ZeroBpm);
        }
        if !(Self::MIN_BPM..=Self::MAX_BPM).contains(&self.bpm) {
            return Err(ValidationError::BpmOutOfRange(self.bpm));
        }
        if self.total_beats == 0 {
            return Err(ValidationError::ZeroBeats);
        }
        Ok(())
    }
}

impl fmt::Display for TempoSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} BPM x {} beats ({})",
            self.bpm, self.total_beats, self.time_signature
        )
    }
}

/// Stable identity of a stored stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(Uuid);

impl StackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named, ordered list of segments - the unit of playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoStack {
    pub id: StackId,
    pub name: String,
    pub items: Vec<TempoSegment>,
}

impl TempoStack {
    pub const MAX_NAME_LEN: usize = 255;

    pub fn new(name: impl Into<String>, items: Vec<TempoSegment>) -> Self {
        Self {
            id: StackId::new(),
            name: name.into(),
            items,
        }
    }

    /// Built-in ladder seeded on first run: 100 to 160 BPM, 16 beats per rung
    pub fn sample() -> Self {
        let items = (0..7)
            .map(|step| TempoSegment::common_time(100 + step * 10, 16))
            .collect();
        Self::new("Sample Stack", items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn segment(&self, index: usize) -> Option<&TempoSegment> {
        self.items.get(index)
    }

    pub fn total_beats(&self) -> u64 {
        self.items.iter().map(|s| s.total_beats as u64).sum()
    }

    pub fn total_measures(&self) -> u64 {
        self.items.iter().map(|s| s.measure_count() as u64).sum()
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.items.iter().map(TempoSegment::duration_seconds).sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.name.chars().count() > Self::MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong);
        }
        for (index, segment) in self.items.iter().enumerate() {
            segment
                .validate()
                .map_err(|e| ValidationError::Segment {
                    index,
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }
}
