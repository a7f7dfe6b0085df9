// Sequencing engine - Plays a tempo stack beat by beat
//
// All state sits behind one mutex. Beat tasks hold a weak reference to it and
// the generation number of the schedule that created them; a task whose
// generation is stale is discarded under the lock, so a cancelled schedule
// can never produce a beat.

use super::observer::{ObserverId, ObserverRegistry, PlaybackObserver, PlaybackSnapshot};
use super::segment::{TempoSegment, TempoStack};
use super::timer::{RepeatingTimer, ThreadTimer, TimerError};
use crate::audio::{ClickType, SoundEmitter, SoundPlaybackError};
use crate::messaging::notification::{Notification, NotificationCategory, Notifier};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Engine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackStatus::Stopped => "stopped",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("Cannot start an empty tempo stack")]
    EmptyStack,

    #[error("Segment {index} cannot be played: BPM and beat count must be greater than 0")]
    UnplayableSegment { index: usize },

    #[error("Cannot {operation} while {status}")]
    InvalidState {
        operation: &'static str,
        status: PlaybackStatus,
    },

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Position counters of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub current_segment_index: usize,
    pub current_beat_in_segment: u32,
    pub remaining_beats_in_segment: u32,
}

struct EngineCore {
    state: PlaybackState,
    active_stack: Option<TempoStack>,
    beat_interval: Option<Duration>,
    generation: u64,
    timer: Box<dyn RepeatingTimer>,
    emitter: Box<dyn SoundEmitter>,
    observers: ObserverRegistry,
    notifier: Notifier,
    this: Weak<Mutex<EngineCore>>,
}

impl EngineCore {
    fn current_segment(&self) -> Option<TempoSegment> {
        self.active_stack
            .as_ref()
            .and_then(|stack| stack.segment(self.state.current_segment_index))
            .copied()
    }

    fn start(&mut self, stack: &TempoStack) -> Result<(), SequencerError> {
        if stack.is_empty() {
            return Err(SequencerError::EmptyStack);
        }
        if let Some(index) = stack.items.iter().position(|s| !s.is_playable()) {
            return Err(SequencerError::UnplayableSegment { index });
        }

        self.active_stack = Some(stack.clone());
        self.state = PlaybackState {
            status: PlaybackStatus::Playing,
            current_segment_index: 0,
            current_beat_in_segment: 0,
            remaining_beats_in_segment: 0,
        };
        self.arm_or_stop()?;
        self.notify();
        Ok(())
    }

    /// Restart the beat schedule for the segment at the current index
    fn arm_segment(&mut self) -> Result<(), SequencerError> {
        let index = self.state.current_segment_index;
        let Some(segment) = self.current_segment() else {
            return Ok(());
        };
        let interval = segment
            .beat_interval()
            .ok_or(SequencerError::UnplayableSegment { index })?;

        self.state.current_beat_in_segment = 0;
        self.state.remaining_beats_in_segment = segment.total_beats;
        self.cancel_schedule();

        let generation = self.generation;
        let core = self.this.clone();
        self.timer.schedule_repeating(
            interval,
            Box::new(move || {
                if let Some(core) = core.upgrade() {
                    let mut core = core.lock().unwrap_or_else(PoisonError::into_inner);
                    core.on_beat(generation);
                }
            }),
        )?;
        self.beat_interval = Some(interval);
        Ok(())
    }

    /// Arm the current segment; a session that cannot be scheduled is stopped
    fn arm_or_stop(&mut self) -> Result<(), SequencerError> {
        if let Err(e) = self.arm_segment() {
            eprintln!("Failed to schedule beats: {}", e);
            self.notifier.send(Notification::error(
                NotificationCategory::Playback,
                format!("Playback stopped: {}", e),
            ));
            self.stop();
            return Err(e);
        }
        Ok(())
    }

    fn cancel_schedule(&mut self) {
        self.timer.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.beat_interval = None;
    }

    fn on_beat(&mut self, generation: u64) {
        if generation != self.generation || self.state.status != PlaybackStatus::Playing {
            return;
        }
        let Some(segment) = self.current_segment() else {
            self.stop();
            return;
        };

        let click = ClickType::for_beat(self.state.current_beat_in_segment, segment.time_signature);
        if let Err(e) = self.emitter.play(click) {
            self.report_sound_error(e);
        }

        self.state.current_beat_in_segment += 1;
        self.state.remaining_beats_in_segment =
            self.state.remaining_beats_in_segment.saturating_sub(1);
        self.notify();

        if self.state.remaining_beats_in_segment == 0 {
            self.state.current_segment_index += 1;
            self.state.current_beat_in_segment = 0;
            if self.current_segment().is_some() {
                if self.arm_or_stop().is_ok() {
                    self.notify();
                }
            } else {
                self.stop();
            }
        }
    }

    fn pause(&mut self) -> Result<(), SequencerError> {
        if self.state.status != PlaybackStatus::Playing {
            return Err(SequencerError::InvalidState {
                operation: "pause",
                status: self.state.status,
            });
        }
        self.cancel_schedule();
        self.state.status = PlaybackStatus::Paused;
        self.notify();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SequencerError> {
        if self.state.status != PlaybackStatus::Paused || self.current_segment().is_none() {
            return Err(SequencerError::InvalidState {
                operation: "resume",
                status: self.state.status,
            });
        }
        self.state.status = PlaybackStatus::Playing;
        // Resuming restarts the paused segment from its first beat
        self.arm_or_stop()?;
        self.notify();
        Ok(())
    }

    fn stop(&mut self) {
        let was_idle = self.state.status == PlaybackStatus::Stopped && self.active_stack.is_none();
        self.cancel_schedule();
        self.active_stack = None;
        self.state = PlaybackState::default();
        if !was_idle {
            self.notify();
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        let Some(stack) = &self.active_stack else {
            return PlaybackSnapshot {
                status: self.state.status,
                ..PlaybackSnapshot::stopped()
            };
        };

        let segment = self.current_segment();
        let beats_per_measure = segment.map(|s| s.beats_per_measure()).unwrap_or(1);

        PlaybackSnapshot {
            status: self.state.status,
            stack_name: Some(stack.name.clone()),
            segment_index: self.state.current_segment_index,
            segment_count: stack.len(),
            bpm: segment.map(|s| s.bpm),
            current_beat: self.state.current_beat_in_segment,
            remaining_beats: self.state.remaining_beats_in_segment,
            current_measure: self.state.current_beat_in_segment / beats_per_measure,
            remaining_measures: self.state.remaining_beats_in_segment / beats_per_measure,
        }
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        self.observers.notify(&snapshot);
    }

    fn report_sound_error(&self, error: SoundPlaybackError) {
        eprintln!("Click playback failed: {}", error);
        self.notifier.send(Notification::error(
            NotificationCategory::Sound,
            format!("Click playback failed: {}", error),
        ));
    }
}

/// Handle to a sequencing engine
///
/// Cloning yields another handle to the same engine. The engine stops
/// scheduling once the last handle is dropped.
#[derive(Clone)]
pub struct SequencingEngine {
    core: Arc<Mutex<EngineCore>>,
}

impl SequencingEngine {
    pub fn new(
        timer: impl RepeatingTimer + 'static,
        emitter: impl SoundEmitter + 'static,
    ) -> Self {
        let core = Arc::new_cyclic(|this| {
            Mutex::new(EngineCore {
                state: PlaybackState::default(),
                active_stack: None,
                beat_interval: None,
                generation: 0,
                timer: Box::new(timer),
                emitter: Box::new(emitter),
                observers: ObserverRegistry::default(),
                notifier: Notifier::disabled(),
                this: this.clone(),
            })
        });
        Self { core }
    }

    /// Engine on a wall-clock timer thread
    pub fn with_emitter(emitter: impl SoundEmitter + 'static) -> Self {
        Self::new(ThreadTimer::new(), emitter)
    }

    fn lock(&self) -> MutexGuard<'_, EngineCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route sound failures to a notification channel
    pub fn set_notifier(&self, notifier: Notifier) {
        self.lock().notifier = notifier;
    }

    /// Start playing a copy of `stack` from its first segment
    ///
    /// Replaces any session in progress.
    pub fn start(&self, stack: &TempoStack) -> Result<(), SequencerError> {
        self.lock().start(stack)
    }

    /// Hold the current position; only valid while playing
    pub fn pause(&self) -> Result<(), SequencerError> {
        self.lock().pause()
    }

    /// Continue after a pause; the current segment restarts at its first beat
    pub fn resume(&self) -> Result<(), SequencerError> {
        self.lock().resume()
    }

    /// Stop and clear the session. Safe to call in any state.
    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().state.status
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.lock().snapshot()
    }

    /// Copy of the stack being played
    pub fn active_stack(&self) -> Option<TempoStack> {
        self.lock().active_stack.clone()
    }

    pub fn current_segment(&self) -> Option<TempoSegment> {
        self.lock().current_segment()
    }

    /// Interval of the pending beat schedule, if any
    pub fn beat_interval(&self) -> Option<Duration> {
        self.lock().beat_interval
    }

    pub fn current_measure(&self) -> u32 {
        self.lock().snapshot().current_measure
    }

    pub fn remaining_measures(&self) -> u32 {
        self.lock().snapshot().remaining_measures
    }

    pub fn subscribe(&self, observer: impl PlaybackObserver + 'static) -> ObserverId {
        self.lock().observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.lock().observers.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_notification_channel;
    use crate::messaging::notification::NotificationLevel;
    use crate::sequencer::timeline::TimeSignature;
    use crate::sequencer::timer::{BeatTask, ManualTimer};
    use ringbuf::traits::Consumer;

    #[derive(Clone, Default)]
    struct RecordingEmitter {
        clicks: Arc<Mutex<Vec<ClickType>>>,
    }

    impl SoundEmitter for RecordingEmitter {
        fn play(&mut self, click: ClickType) -> Result<(), SoundPlaybackError> {
            self.clicks.lock().unwrap().push(click);
            Ok(())
        }
    }

    struct FailingEmitter;

    impl SoundEmitter for FailingEmitter {
        fn play(&mut self, _click: ClickType) -> Result<(), SoundPlaybackError> {
            Err(SoundPlaybackError::NoDevice)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        snapshots: Arc<Mutex<Vec<PlaybackSnapshot>>>,
    }

    impl PlaybackObserver for RecordingObserver {
        fn on_playback(&mut self, snapshot: &PlaybackSnapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }
    }

    fn two_segment_stack() -> TempoStack {
        TempoStack::new(
            "Two step",
            vec![
                TempoSegment::common_time(100, 4),
                TempoSegment::common_time(120, 4),
            ],
        )
    }

    fn engine() -> (SequencingEngine, ManualTimer, RecordingEmitter) {
        let timer = ManualTimer::new();
        let emitter = RecordingEmitter::default();
        let engine = SequencingEngine::new(timer.clone(), emitter.clone());
        (engine, timer, emitter)
    }

    #[test]
    fn test_start_arms_first_segment() {
        let (engine, timer, emitter) = engine();
        engine.start(&two_segment_stack()).unwrap();

        let state = engine.state();
        assert_eq!(state.status, PlaybackStatus::Playing);
        assert_eq!(state.current_segment_index, 0);
        assert_eq!(state.current_beat_in_segment, 0);
        assert_eq!(state.remaining_beats_in_segment, 4);
        assert_eq!(timer.interval(), Some(Duration::from_secs_f64(0.6)));
        // Nothing plays until the first interval elapses
        assert!(emitter.clicks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_stack_is_rejected() {
        let (engine, timer, _) = engine();
        let empty = TempoStack::new("Empty", vec![]);

        assert_eq!(engine.start(&empty), Err(SequencerError::EmptyStack));
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert!(timer.history().is_empty());
        assert!(engine.active_stack().is_none());
    }

    #[test]
    fn test_unplayable_segment_is_rejected() {
        let (engine, timer, _) = engine();
        let stack = TempoStack::new(
            "Broken",
            vec![
                TempoSegment::common_time(100, 4),
                TempoSegment::common_time(0, 4),
            ],
        );
        assert_eq!(
            engine.start(&stack),
            Err(SequencerError::UnplayableSegment { index: 1 })
        );
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert!(timer.history().is_empty());
    }

    #[test]
    fn test_segment_transition() {
        let (engine, timer, _) = engine();
        engine.start(&two_segment_stack()).unwrap();

        assert_eq!(timer.fire_times(4), 4);

        let state = engine.state();
        assert_eq!(state.current_segment_index, 1);
        assert_eq!(state.current_beat_in_segment, 0);
        assert_eq!(state.remaining_beats_in_segment, 4);
        // Fifth beat runs on the 120 BPM schedule
        assert_eq!(timer.interval(), Some(Duration::from_millis(500)));
        assert_eq!(engine.beat_interval(), Some(Duration::from_millis(500)));
        assert_eq!(timer.history().len(), 2);
    }

    #[test]
    fn test_completion_stops_engine() {
        let (engine, timer, emitter) = engine();
        engine.start(&two_segment_stack()).unwrap();

        assert_eq!(timer.run_until_idle(100), 8);
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert!(engine.active_stack().is_none());
        assert_eq!(engine.state(), PlaybackState::default());
        assert!(!timer.is_scheduled());
        assert_eq!(emitter.clicks.lock().unwrap().len(), 8);
    }

    #[test]
    fn test_accents_follow_time_signature() {
        let (engine, timer, emitter) = engine();
        let stack = TempoStack::new(
            "Waltz then short",
            vec![
                TempoSegment::new(90, 7, TimeSignature::ThreeFour),
                TempoSegment::new(90, 1, TimeSignature::FourFour),
            ],
        );
        engine.start(&stack).unwrap();
        timer.run_until_idle(100);

        let accents: Vec<bool> = emitter
            .clicks
            .lock()
            .unwrap()
            .iter()
            .map(ClickType::is_accent)
            .collect();
        assert_eq!(
            accents,
            vec![true, false, false, true, false, false, true, true]
        );
    }

    #[test]
    fn test_pause_keeps_position_and_cancels_schedule() {
        let (engine, timer, emitter) = engine();
        engine.start(&two_segment_stack()).unwrap();
        timer.fire_times(2);

        engine.pause().unwrap();
        let state = engine.state();
        assert_eq!(state.status, PlaybackStatus::Paused);
        assert_eq!(state.current_beat_in_segment, 2);
        assert_eq!(state.remaining_beats_in_segment, 2);
        assert!(!timer.is_scheduled());
        assert!(!timer.fire());
        assert_eq!(emitter.clicks.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_resume_restarts_current_segment() {
        let (engine, timer, _) = engine();
        engine.start(&two_segment_stack()).unwrap();
        timer.fire_times(5);
        assert_eq!(engine.state().current_segment_index, 1);
        assert_eq!(engine.state().current_beat_in_segment, 1);

        engine.pause().unwrap();
        engine.resume().unwrap();

        let state = engine.state();
        assert_eq!(state.status, PlaybackStatus::Playing);
        assert_eq!(state.current_segment_index, 1);
        assert_eq!(state.current_beat_in_segment, 0);
        assert_eq!(state.remaining_beats_in_segment, 4);
        assert_eq!(timer.interval(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_pause_and_resume_in_wrong_state_are_noops() {
        let (engine, timer, _) = engine();

        assert_eq!(
            engine.pause(),
            Err(SequencerError::InvalidState {
                operation: "pause",
                status: PlaybackStatus::Stopped
            })
        );
        assert!(engine.resume().is_err());
        assert_eq!(engine.status(), PlaybackStatus::Stopped);

        engine.start(&two_segment_stack()).unwrap();
        timer.fire();
        let before = engine.state();
        assert!(engine.resume().is_err());
        assert_eq!(engine.state(), before);

        engine.pause().unwrap();
        let paused = engine.state();
        assert!(engine.pause().is_err());
        assert_eq!(engine.state(), paused);
    }

    #[test]
    fn test_stop_from_every_state() {
        let (engine, timer, _) = engine();

        engine.stop();
        assert_eq!(engine.state(), PlaybackState::default());

        engine.start(&two_segment_stack()).unwrap();
        timer.fire_times(3);
        engine.stop();
        assert_eq!(engine.state(), PlaybackState::default());
        assert!(engine.active_stack().is_none());
        assert!(!timer.is_scheduled());

        engine.start(&two_segment_stack()).unwrap();
        engine.pause().unwrap();
        engine.stop();
        engine.stop();
        assert_eq!(engine.state(), PlaybackState::default());
        assert_eq!(engine.beat_interval(), None);
    }

    #[test]
    fn test_active_stack_is_a_copy() {
        let (engine, timer, _) = engine();
        let mut stack = two_segment_stack();
        engine.start(&stack).unwrap();

        stack.items.clear();
        stack.name = "Edited".to_string();

        timer.fire_times(4);
        let active = engine.active_stack().unwrap();
        assert_eq!(active.name, "Two step");
        assert_eq!(active.len(), 2);
        assert_eq!(engine.state().current_segment_index, 1);
    }

    #[test]
    fn test_restart_replaces_running_session() {
        let (engine, timer, emitter) = engine();
        engine.start(&two_segment_stack()).unwrap();
        timer.fire_times(3);

        let single = TempoStack::new("Single", vec![TempoSegment::common_time(60, 2)]);
        engine.start(&single).unwrap();
        assert_eq!(engine.state().remaining_beats_in_segment, 2);
        assert_eq!(timer.interval(), Some(Duration::from_secs(1)));

        assert_eq!(timer.run_until_idle(100), 2);
        assert_eq!(emitter.clicks.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_stale_schedule_never_fires() {
        let timer = ManualTimer::new();
        let mut stale = timer.clone();
        let emitter = RecordingEmitter::default();
        let engine = SequencingEngine::new(timer.clone(), emitter.clone());

        engine.start(&two_segment_stack()).unwrap();
        // Capture the first schedule's task by hand, then replace it
        let captured = Arc::new(Mutex::new(None));
        {
            let captured = Arc::clone(&captured);
            let core = Arc::downgrade(&engine.core);
            let generation = engine.lock().generation;
            *captured.lock().unwrap() = Some(Box::new(move || {
                if let Some(core) = core.upgrade() {
                    core.lock().unwrap().on_beat(generation);
                }
            }) as Box<dyn FnMut() + Send>);
        }
        engine.stop();
        engine.start(&two_segment_stack()).unwrap();

        if let Some(mut task) = captured.lock().unwrap().take() {
            task();
        }
        assert!(emitter.clicks.lock().unwrap().is_empty());
        assert_eq!(engine.state().remaining_beats_in_segment, 4);

        stale.cancel();
        assert!(!timer.fire());
    }

    #[test]
    fn test_sound_failure_does_not_stop_playback() {
        let timer = ManualTimer::new();
        let engine = SequencingEngine::new(timer.clone(), FailingEmitter);
        let (tx, mut rx) = create_notification_channel(16);
        engine.set_notifier(Notifier::new(Arc::new(Mutex::new(tx))));
        engine.start(&two_segment_stack()).unwrap();

        assert_eq!(timer.fire_times(3), 3);
        assert_eq!(engine.status(), PlaybackStatus::Playing);
        assert_eq!(engine.state().current_beat_in_segment, 3);

        let reported: Vec<Notification> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(reported.len(), 3);
        for notification in &reported {
            assert_eq!(notification.level, NotificationLevel::Error);
            assert_eq!(notification.category, NotificationCategory::Sound);
            assert_eq!(
                notification.message,
                "Click playback failed: No audio output device found"
            );
        }

        assert_eq!(timer.run_until_idle(100), 5);
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
    }

    struct BrokenTimer;

    impl RepeatingTimer for BrokenTimer {
        fn schedule_repeating(
            &mut self,
            _interval: Duration,
            _task: BeatTask,
        ) -> Result<(), TimerError> {
            Err(TimerError::Spawn("no threads left".to_string()))
        }

        fn cancel(&mut self) {}

        fn is_scheduled(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_unschedulable_session_stops() {
        let engine = SequencingEngine::new(BrokenTimer, RecordingEmitter::default());
        let (tx, mut rx) = create_notification_channel(16);
        engine.set_notifier(Notifier::new(Arc::new(Mutex::new(tx))));
        let observer = RecordingObserver::default();
        engine.subscribe(observer.clone());

        let err = engine.start(&two_segment_stack()).unwrap_err();
        assert!(matches!(err, SequencerError::Timer(TimerError::Spawn(_))));
        assert_eq!(engine.state(), PlaybackState::default());
        assert!(engine.active_stack().is_none());
        assert_eq!(engine.beat_interval(), None);

        let notification = rx.try_pop().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.category, NotificationCategory::Playback);
        assert!(notification.message.contains("no threads left"));

        // Observers only see the session end
        let snapshots = observer.snapshots.lock().unwrap();
        assert_eq!(snapshots.as_slice(), &[PlaybackSnapshot::stopped()]);
    }

    #[test]
    fn test_observers_receive_snapshots() {
        let (engine, timer, _) = engine();
        let observer = RecordingObserver::default();
        let id = engine.subscribe(observer.clone());

        engine.start(&two_segment_stack()).unwrap();
        timer.fire();

        {
            let snapshots = observer.snapshots.lock().unwrap();
            assert_eq!(snapshots.len(), 2);
            let started = &snapshots[0];
            assert_eq!(started.status, PlaybackStatus::Playing);
            assert_eq!(started.stack_name.as_deref(), Some("Two step"));
            assert_eq!(started.segment_count, 2);
            assert_eq!(started.bpm, Some(100));
            assert_eq!(started.remaining_beats, 4);
            assert_eq!(started.remaining_measures, 1);

            let first_beat = &snapshots[1];
            assert_eq!(first_beat.current_beat, 1);
            assert_eq!(first_beat.remaining_beats, 3);
            assert_eq!(first_beat.current_measure, 0);
            assert_eq!(first_beat.remaining_measures, 0);
        }

        timer.run_until_idle(100);
        {
            let snapshots = observer.snapshots.lock().unwrap();
            // start + 8 beats + segment change + stop
            assert_eq!(snapshots.len(), 11);
            let last = snapshots.last().unwrap();
            assert_eq!(last, &PlaybackSnapshot::stopped());
        }

        assert!(engine.unsubscribe(id));
        engine.start(&two_segment_stack()).unwrap();
        assert_eq!(observer.snapshots.lock().unwrap().len(), 11);
    }

    #[test]
    fn test_measure_queries() {
        let (engine, timer, _) = engine();
        let stack = TempoStack::new("Long", vec![TempoSegment::common_time(100, 10)]);
        engine.start(&stack).unwrap();
        assert_eq!(engine.current_measure(), 0);
        assert_eq!(engine.remaining_measures(), 2);

        timer.fire_times(5);
        assert_eq!(engine.current_measure(), 1);
        assert_eq!(engine.remaining_measures(), 1);
        assert_eq!(engine.current_segment(), Some(stack.items[0]));
    }
}
