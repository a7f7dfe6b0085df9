// Sound emitter - The engine's only window onto audio output

use super::click::ClickType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SoundPlaybackError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio configuration error: {0}")]
    Config(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Click queue full, click dropped")]
    QueueFull,

    #[error("Audio output is no longer running")]
    Disconnected,
}

/// Plays one tick or accent per call
///
/// Must return quickly: it is called from the beat timer while the engine is
/// locked. Errors are reported back so the engine can log them; they never
/// stop playback.
pub trait SoundEmitter: Send {
    fn play(&mut self, click: ClickType) -> Result<(), SoundPlaybackError>;
}

impl<E: SoundEmitter + ?Sized> SoundEmitter for Box<E> {
    fn play(&mut self, click: ClickType) -> Result<(), SoundPlaybackError> {
        (**self).play(click)
    }
}

/// Emitter used when audio is disabled or no device is available
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentEmitter;

impl SoundEmitter for SilentEmitter {
    fn play(&mut self, _click: ClickType) -> Result<(), SoundPlaybackError> {
        Ok(())
    }
}
