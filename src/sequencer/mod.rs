// Sequencer module
// Tempo stacks and the engine that plays them

pub mod engine;
pub mod observer;
pub mod segment;
pub mod simulation;
pub mod timeline;
pub mod timer;

pub use engine::{PlaybackState, PlaybackStatus, SequencerError, SequencingEngine};
pub use observer::{ObserverId, PlaybackObserver, PlaybackSnapshot};
pub use segment::{StackId, TempoSegment, TempoStack, ValidationError};
pub use simulation::{BeatEvent, simulate};
pub use timeline::{Tempo, TimeSignature};
pub use timer::{BeatTask, ManualTimer, RepeatingTimer, ThreadTimer, TimerError};
