// Click voice - Pre-rendered metronome clicks
// Accent and regular clicks are rendered once, then replayed from memory

use crate::sequencer::TimeSignature;
use std::f32::consts::PI;

/// Which click a beat produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// First beat of a measure
    Accent,
    /// Any other beat
    Regular,
}

impl ClickType {
    pub fn from_accent(is_accent: bool) -> Self {
        if is_accent {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }

    /// Click for a 0-based beat position inside a segment
    pub fn for_beat(beat_in_segment: u32, time_signature: TimeSignature) -> Self {
        Self::from_accent(time_signature.is_downbeat(beat_in_segment))
    }

    pub fn is_accent(&self) -> bool {
        matches!(self, ClickType::Accent)
    }
}

/// Rendered click buffers
#[derive(Debug, Clone)]
pub struct ClickSound {
    accent: Vec<f32>,
    regular: Vec<f32>,
}

impl ClickSound {
    const LENGTH_MS: f32 = 15.0;
    const ACCENT_HZ: f32 = 1500.0;
    const REGULAR_HZ: f32 = 1000.0;

    pub fn new(sample_rate: f32) -> Self {
        let length = ((Self::LENGTH_MS / 1000.0) * sample_rate) as usize;
        Self {
            accent: render_click(sample_rate, length, Self::ACCENT_HZ, 0.7),
            regular: render_click(sample_rate, length, Self::REGULAR_HZ, 0.45),
        }
    }

    pub fn samples(&self, click: ClickType) -> &[f32] {
        match click {
            ClickType::Accent => &self.accent,
            ClickType::Regular => &self.regular,
        }
    }

    pub fn len(&self) -> usize {
        self.accent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accent.is_empty()
    }
}

// Sine burst with an exponential decay
fn render_click(sample_rate: f32, length: usize, frequency: f32, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency / sample_rate;
    (0..length)
        .map(|i| {
            let t = i as f32 / length as f32;
            (i as f32 * step).sin() * (-t * 6.0).exp() * amplitude
        })
        .collect()
}

/// Monophonic click player driven from the audio callback
/// A new click cuts off the one still ringing
#[derive(Debug, Clone)]
pub struct ClickVoice {
    sound: ClickSound,
    volume: f32,
    playing: Option<(ClickType, usize)>,
}

impl ClickVoice {
    pub fn new(sample_rate: f32, volume: f32) -> Self {
        Self {
            sound: ClickSound::new(sample_rate),
            volume: volume.clamp(0.0, 1.0),
            playing: None,
        }
    }

    pub fn trigger(&mut self, click: ClickType) {
        self.playing = Some((click, 0));
    }

    pub fn is_active(&self) -> bool {
        self.playing.is_some()
    }

    pub fn next_sample(&mut self) -> f32 {
        let Some((click, position)) = self.playing.as_mut() else {
            return 0.0;
        };
        match self.sound.samples(*click).get(*position) {
            Some(sample) => {
                *position += 1;
                sample * self.volume
            }
            None => {
                self.playing = None;
                0.0
            }
        }
    }

    /// Fill a mono buffer
    pub fn render(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
