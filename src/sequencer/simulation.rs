// Offline simulation - Run a stack through the engine without waiting

use super::engine::{PlaybackStatus, SequencerError, SequencingEngine};
use super::observer::{PlaybackObserver, PlaybackSnapshot};
use super::segment::TempoStack;
use super::timer::ManualTimer;
use crate::audio::{ClickType, SoundEmitter, SoundPlaybackError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One beat as the engine played it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    pub segment_index: usize,
    pub beat_in_segment: u32,
    pub bpm: u32,
    pub click: ClickType,
    /// Time since `start`
    pub offset: Duration,
}

struct ClickRecorder {
    timer: ManualTimer,
    clicks: Arc<Mutex<Vec<(ClickType, Duration)>>>,
}

impl SoundEmitter for ClickRecorder {
    fn play(&mut self, click: ClickType) -> Result<(), SoundPlaybackError> {
        let offset = self.timer.elapsed();
        if let Ok(mut clicks) = self.clicks.lock() {
            clicks.push((click, offset));
        }
        Ok(())
    }
}

struct BeatRecorder {
    beats: Arc<Mutex<Vec<PlaybackSnapshot>>>,
}

impl PlaybackObserver for BeatRecorder {
    fn on_playback(&mut self, snapshot: &PlaybackSnapshot) {
        // Beat reports are the only Playing snapshots past beat 0
        if snapshot.status == PlaybackStatus::Playing
            && snapshot.current_beat > 0
            && let Ok(mut beats) = self.beats.lock()
        {
            beats.push(snapshot.clone());
        }
    }
}

/// Play `stack` to completion on a manual timer and return every beat
pub fn simulate(stack: &TempoStack) -> Result<Vec<BeatEvent>, SequencerError> {
    let timer = ManualTimer::new();
    let clicks = Arc::new(Mutex::new(Vec::new()));
    let beats = Arc::new(Mutex::new(Vec::new()));

    let engine = SequencingEngine::new(
        timer.clone(),
        ClickRecorder {
            timer: timer.clone(),
            clicks: Arc::clone(&clicks),
        },
    );
    engine.subscribe(BeatRecorder {
        beats: Arc::clone(&beats),
    });

    engine.start(stack)?;
    let limit = usize::try_from(stack.total_beats()).unwrap_or(usize::MAX);
    timer.run_until_idle(limit.saturating_add(1));
    engine.stop();

    let clicks = clicks.lock().map(|c| c.clone()).unwrap_or_default();
    let beats = beats.lock().map(|b| b.clone()).unwrap_or_default();

    Ok(clicks
        .into_iter()
        .zip(beats)
        .map(|((click, offset), snapshot)| BeatEvent {
            segment_index: snapshot.segment_index,
            beat_in_segment: snapshot.current_beat - 1,
            bpm: snapshot.bpm.unwrap_or_default(),
            click,
            offset,
        })
        .collect())
}
