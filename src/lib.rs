// Tempo Stack - Library exports for the CLI, tests and benchmarks

pub mod audio;
pub mod config;
pub mod library;
pub mod messaging;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::{AudioClickEmitter, ClickType, SilentEmitter, SoundEmitter, SoundPlaybackError};
pub use config::{AppConfig, ConfigError};
pub use library::{FileStackRepository, PersistenceError, RepositoryError, StackRepository};
pub use messaging::{Notification, Notifier, create_notification_channel, create_snapshot_channel};
pub use sequencer::{
    BeatEvent, ManualTimer, PlaybackObserver, PlaybackSnapshot, PlaybackState, PlaybackStatus,
    RepeatingTimer, SequencerError, SequencingEngine, StackId, Tempo, TempoSegment, TempoStack,
    ThreadTimer, TimeSignature, TimerError, simulate,
};
