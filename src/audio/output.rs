// Audio output - Click playback on the default cpal device
//
// cpal streams are not Send on every backend, so the stream lives on its own
// thread for its whole life. The emitter only holds the producer side of a
// lock-free click queue that the audio callback drains.

use super::click::{ClickType, ClickVoice};
use super::emitter::{SoundEmitter, SoundPlaybackError};
use crate::messaging::channels::{ClickConsumer, ClickProducer, create_click_channel};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// A beat never produces more than one click, so a handful of slots is plenty
const CLICK_QUEUE_CAPACITY: usize = 16;

/// Description of the opened output
#[derive(Debug, Clone)]
pub struct OutputInfo {
    pub device_name: String,
    pub sample_rate: f32,
    pub channels: usize,
}

/// Sound emitter backed by a real audio device
pub struct AudioClickEmitter {
    click_tx: ClickProducer,
    running: Arc<AtomicBool>,
    info: OutputInfo,
    stream_thread: Option<thread::JoinHandle<()>>,
}

impl AudioClickEmitter {
    /// Open the default output device and start the click stream
    pub fn open(volume: f32) -> Result<Self, SoundPlaybackError> {
        let (click_tx, click_rx) = create_click_channel(CLICK_QUEUE_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let running_thread = Arc::clone(&running);
        let (ready_tx, ready_rx) = mpsc::channel();

        let stream_thread = thread::Builder::new()
            .name("click-output".to_string())
            .spawn(move || {
                let stream =
                    match open_stream(click_rx, volume.clamp(0.0, 1.0), Arc::clone(&running_thread))
                    {
                        Ok((stream, info)) => {
                            let _ = ready_tx.send(Ok(info));
                            stream
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };

                while running_thread.load(Ordering::Acquire) {
                    thread::park_timeout(Duration::from_millis(250));
                }
                drop(stream);
            })
            .map_err(|e| SoundPlaybackError::Stream(e.to_string()))?;

        let info = ready_rx
            .recv()
            .map_err(|_| SoundPlaybackError::Disconnected)??;

        Ok(Self {
            click_tx,
            running,
            info,
            stream_thread: Some(stream_thread),
        })
    }

    pub fn info(&self) -> &OutputInfo {
        &self.info
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl SoundEmitter for AudioClickEmitter {
    fn play(&mut self, click: ClickType) -> Result<(), SoundPlaybackError> {
        if !self.is_running() {
            return Err(SoundPlaybackError::Disconnected);
        }
        self.click_tx
            .try_push(click)
            .map_err(|_| SoundPlaybackError::QueueFull)
    }
}

impl Drop for AudioClickEmitter {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.stream_thread.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

fn open_stream(
    click_rx: ClickConsumer,
    volume: f32,
    running: Arc<AtomicBool>,
) -> Result<(Stream, OutputInfo), SoundPlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(SoundPlaybackError::NoDevice)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported_config = device
        .default_output_config()
        .map_err(|e| SoundPlaybackError::Config(e.to_string()))?;

    let sample_format = supported_config.sample_format();
    let sample_rate = supported_config.sample_rate().0 as f32;
    let channels = supported_config.channels() as usize;
    let config: StreamConfig = supported_config.into();

    let voice = ClickVoice::new(sample_rate, volume);

    let stream = match sample_format {
        SampleFormat::F32 => {
            build_stream::<f32>(&device, &config, channels, voice, click_rx, running)
        }
        SampleFormat::I16 => {
            build_stream::<i16>(&device, &config, channels, voice, click_rx, running)
        }
        SampleFormat::U16 => {
            build_stream::<u16>(&device, &config, channels, voice, click_rx, running)
        }
        other => Err(SoundPlaybackError::Config(format!(
            "Unsupported sample format: {:?}. Supported formats: F32, I16, U16",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| SoundPlaybackError::Stream(e.to_string()))?;

    Ok((
        stream,
        OutputInfo {
            device_name,
            sample_rate,
            channels,
        },
    ))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    channels: usize,
    mut voice: ClickVoice,
    mut click_rx: ClickConsumer,
    running: Arc<AtomicBool>,
) -> Result<Stream, SoundPlaybackError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no locks
                fill_frames(data, channels, &mut voice, &mut click_rx);
            },
            move |err| {
                eprintln!("Audio stream error: {}", err);
                running.store(false, Ordering::Release);
            },
            None,
        )
        .map_err(|e| SoundPlaybackError::Stream(e.to_string()))
}

/// Drain pending clicks, then write the voice into every channel of each frame
fn fill_frames<T>(
    data: &mut [T],
    channels: usize,
    voice: &mut ClickVoice,
    clicks: &mut ClickConsumer,
) where
    T: SizedSample + FromSample<f32>,
{
    while let Some(click) = clicks.try_pop() {
        voice.trigger(click);
    }

    if !voice.is_active() {
        let silence = <T as Sample>::EQUILIBRIUM;
        data.iter_mut().for_each(|sample| *sample = silence);
        return;
    }

    for frame in data.chunks_mut(channels.max(1)) {
        let value = <T as Sample>::from_sample(voice.next_sample());
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
