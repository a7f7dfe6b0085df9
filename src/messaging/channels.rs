// Lock-free communication channels

use crate::audio::ClickType;
use crate::messaging::notification::Notification;
use crate::sequencer::observer::{PlaybackObserver, PlaybackSnapshot};
use ringbuf::{HeapRb, traits::Split};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Beat timer -> audio callback
pub type ClickProducer = ringbuf::HeapProd<ClickType>;
pub type ClickConsumer = ringbuf::HeapCons<ClickType>;

pub fn create_click_channel(capacity: usize) -> (ClickProducer, ClickConsumer) {
    let rb = HeapRb::<ClickType>::new(capacity);
    rb.split()
}

/// Engine -> presentation layer
pub type SnapshotProducer = ringbuf::HeapProd<PlaybackSnapshot>;
pub type SnapshotConsumer = ringbuf::HeapCons<PlaybackSnapshot>;

pub fn create_snapshot_channel(capacity: usize) -> (SnapshotProducer, SnapshotConsumer) {
    let rb = HeapRb::<PlaybackSnapshot>::new(capacity);
    rb.split()
}

// A reader that falls behind loses snapshots instead of stalling the beat
impl PlaybackObserver for SnapshotProducer {
    fn on_playback(&mut self, snapshot: &PlaybackSnapshot) {
        let _ = ringbuf::traits::Producer::try_push(self, snapshot.clone());
    }
}
