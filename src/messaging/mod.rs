// Messaging - Lock-free channels between the engine, audio and UI threads

pub mod channels;
pub mod notification;

pub use channels::{
    ClickConsumer, ClickProducer, NotificationConsumer, NotificationProducer, SnapshotConsumer,
    SnapshotProducer, create_click_channel, create_notification_channel, create_snapshot_channel,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel, Notifier};
