// Timeline - Musical time primitives
// Time signatures and tempo to beat interval conversions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Time signature from the fixed practice set
/// Serialized with its label ("4/4") so stored stacks stay readable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeSignature {
    #[serde(rename = "2/4")]
    TwoFour,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "5/4")]
    FiveFour,
    #[serde(rename = "6/8")]
    SixEight,
}

impl TimeSignature {
    /// Every supported signature, in menu order
    pub const ALL: [TimeSignature; 5] = [
        TimeSignature::TwoFour,
        TimeSignature::ThreeFour,
        TimeSignature::FourFour,
        TimeSignature::FiveFour,
        TimeSignature::SixEight,
    ];

    /// Number of beats grouped into one measure
    pub fn beats_per_measure(&self) -> u32 {
        match self {
            TimeSignature::TwoFour => 2,
            TimeSignature::ThreeFour => 3,
            TimeSignature::FourFour => 4,
            TimeSignature::FiveFour => 5,
            TimeSignature::SixEight => 6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeSignature::TwoFour => "2/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::FourFour => "4/4",
            TimeSignature::FiveFour => "5/4",
            TimeSignature::SixEight => "6/8",
        }
    }

    /// First beat of every measure is the downbeat
    pub fn is_downbeat(&self, beat_in_segment: u32) -> bool {
        beat_in_segment % self.beats_per_measure() == 0
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported time signature: {0}")]
pub struct ParseTimeSignatureError(pub String);

impl FromStr for TimeSignature {
    type Err = ParseTimeSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        TimeSignature::ALL
            .into_iter()
            .find(|ts| ts.label() == label)
            .ok_or_else(|| ParseTimeSignatureError(label.to_string()))
    }
}

/// Tempo in whole BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    /// Creates a new tempo, or `None` for 0 BPM
    pub fn new(bpm: u32) -> Option<Self> {
        (bpm > 0).then_some(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Duration of one beat in seconds (60 / BPM)
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Beat duration as a timer interval
    pub fn beat_interval(&self) -> Duration {
        Duration::from_secs_f64(self.beat_duration_seconds())
    }

}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
