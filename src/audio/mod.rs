/// Audio output using cpal
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// A single monophonic sound source driven by pad presses
pub trait Voice {
    fn set_frequency(&mut self, hz: f64);

    /// Amplitude in 0..=1
    fn set_amplitude(&mut self, amplitude: f64);

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;
}

impl<V: Voice + ?Sized> Voice for Box<V> {
    fn set_frequency(&mut self, hz: f64) {
        (**self).set_frequency(hz)
    }

    fn set_amplitude(&mut self, amplitude: f64) {
        (**self).set_amplitude(amplitude)
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorState {
    pub frequency: f32,
    pub amplitude: f32,
    pub running: bool,
}

impl Default for OscillatorState {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            amplitude: 0.0,
            running: false,
        }
    }
}

/// Sine oscillator on the default output device
pub struct OscillatorVoice {
    _stream: Option<cpal::Stream>,
    state: Arc<Mutex<OscillatorState>>,
}

impl OscillatorVoice {
    pub fn new() -> Result<Self> {
        let state = Arc::new(Mutex::new(OscillatorState::default()));
        let phase = Arc::new(Mutex::new(0.0));

        let stream = Self::setup_audio_stream(Arc::clone(&state), phase)?;

        Ok(Self {
            _stream: Some(stream),
            state,
        })
    }

    /// A voice with no device behind it; `start` reports it as unavailable
    pub fn silent() -> Self {
        Self {
            _stream: None,
            state: Arc::new(Mutex::new(OscillatorState::default())),
        }
    }

    pub fn is_available(&self) -> bool {
        self._stream.is_some()
    }

    pub fn state(&self) -> OscillatorState {
        *lock(&self.state)
    }

    fn setup_audio_stream(
        state: Arc<Mutex<OscillatorState>>,
        phase: Arc<Mutex<f32>>,
    ) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::VoiceUnavailable("no output device".into()))?;
        let config = device
            .default_output_config()
            .map_err(|e| Error::VoiceUnavailable(e.to_string()))?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let current = *lock(&state);
                    let mut phase_lock = lock(&phase);

                    for frame in data.chunks_mut(channels) {
                        let value = if current.running {
                            let value = (*phase_lock * 2.0 * std::f32::consts::PI).sin()
                                * current.amplitude;
                            *phase_lock += current.frequency / sample_rate;
                            if *phase_lock >= 1.0 {
                                *phase_lock -= 1.0;
                            }
                            value
                        } else {
                            *phase_lock = 0.0;
                            0.0
                        };
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                },
                |err| tracing::error!("Audio stream error: {}", err),
                None,
            ),
            format => {
                return Err(Error::VoiceUnavailable(format!(
                    "unsupported sample format {:?}",
                    format
                )))
            }
        }
        .map_err(|e| Error::VoiceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::VoiceUnavailable(e.to_string()))?;
        Ok(stream)
    }
}

impl Default for OscillatorVoice {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::warn!("audio output disabled: {}", e);
            Self::silent()
        })
    }
}

impl Voice for OscillatorVoice {
    fn set_frequency(&mut self, hz: f64) {
        lock(&self.state).frequency = hz as f32;
    }

    fn set_amplitude(&mut self, amplitude: f64) {
        lock(&self.state).amplitude = amplitude.clamp(0.0, 1.0) as f32;
    }

    fn start(&mut self) -> Result<()> {
        if !self.is_available() {
            return Err(Error::VoiceUnavailable("no audio stream".into()));
        }
        lock(&self.state).running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        lock(&self.state).running = false;
        Ok(())
    }
}

// Poisoned locks still hold valid oscillator state
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
