// Playback observers - Push notifications from the engine to its consumers

use super::engine::PlaybackStatus;

/// Position report sent after every beat and every state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub stack_name: Option<String>,
    pub segment_index: usize,
    pub segment_count: usize,
    pub bpm: Option<u32>,
    pub current_beat: u32,
    pub remaining_beats: u32,
    pub current_measure: u32,
    pub remaining_measures: u32,
}

impl PlaybackSnapshot {
    /// Snapshot of an idle engine
    pub fn stopped() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            stack_name: None,
            segment_index: 0,
            segment_count: 0,
            bpm: None,
            current_beat: 0,
            remaining_beats: 0,
            current_measure: 0,
            remaining_measures: 0,
        }
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Receives engine snapshots synchronously
///
/// Called with the engine locked: implementations must not call back into
/// the engine, and should return quickly.
pub trait PlaybackObserver: Send {
    fn on_playback(&mut self, snapshot: &PlaybackSnapshot);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn PlaybackObserver>)>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn PlaybackObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub(crate) fn notify(&mut self, snapshot: &PlaybackSnapshot) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_playback(snapshot);
        }
    }
}
