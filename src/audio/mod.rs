// Audio module - Click sounds and the cpal output they play through

pub mod click;
pub mod emitter;
pub mod output;

pub use click::{ClickSound, ClickType, ClickVoice};
pub use emitter::{SilentEmitter, SoundEmitter, SoundPlaybackError};
pub use output::{AudioClickEmitter, OutputInfo};
