//! A stand-in for a real two-microphone rig. Each capture is a short,
//! decaying noise burst (think hand clap) that reaches the two microphones
//! with the integer-sample delay a far-field source at the configured
//! bearing would produce, buried in independent background noise on each
//! channel.

use crate::audio_buffer::{AudioBuffer, Sample};
use crate::config::{DEFAULT_MIC_DISTANCE, DEFAULT_SPEED_OF_SOUND};
use crate::error::DoaError;
use crate::source::{AudioSource, Capture};

use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Sample rate of a typical sound card, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Length of one capture, in seconds.
pub const DEFAULT_DURATION: f64 = 1.0;

/// Length of the clap, in seconds.
const BURST_SECS: f64 = 0.03;

/// Time constant of the clap's exponential decay, in seconds.
const BURST_DECAY_SECS: f64 = 0.008;

/// Where the clap starts, as a fraction of the capture.
const BURST_OFFSET: f64 = 0.25;

/// Synthesizes two-channel captures of a source at a chosen bearing.
/// Construct with [SimulatedSource::builder].
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    sample_rate: u32,
    duration: f64,
    mic_distance: f64,
    speed_of_sound: f64,
    bearing_degrees: f64,
    noise: f32,
    rng: StdRng,
}

/// Builder for [SimulatedSource].
#[derive(Debug, Clone)]
pub struct SimulatedSourceBuilder {
    sample_rate: u32,
    duration: f64,
    mic_distance: f64,
    speed_of_sound: f64,
    bearing_degrees: f64,
    noise: f32,
    seed: Option<u64>,
}

impl Default for SimulatedSourceBuilder {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration: DEFAULT_DURATION,
            mic_distance: DEFAULT_MIC_DISTANCE,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            bearing_degrees: 0.0,
            noise: 0.0,
            seed: None,
        }
    }
}

impl SimulatedSourceBuilder {
    /// Samples per second.
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Capture length in seconds.
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Microphone spacing in meters.
    pub fn mic_distance(mut self, mic_distance: f64) -> Self {
        self.mic_distance = mic_distance;
        self
    }

    /// Propagation speed in m/s.
    pub fn speed_of_sound(mut self, speed_of_sound: f64) -> Self {
        self.speed_of_sound = speed_of_sound;
        self
    }

    /// True bearing of the source, degrees from broadside, positive to the
    /// right.
    pub fn bearing(mut self, degrees: f64) -> Self {
        self.bearing_degrees = degrees;
        self
    }

    /// Peak amplitude of the background noise. The clap peaks at 1.0.
    pub fn noise(mut self, noise: f32) -> Self {
        self.noise = noise;
        self
    }

    /// Fixes the random stream so captures are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Finishes the source.
    pub fn build(self) -> SimulatedSource {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SimulatedSource {
            sample_rate: self.sample_rate,
            duration: self.duration,
            mic_distance: self.mic_distance,
            speed_of_sound: self.speed_of_sound,
            bearing_degrees: self.bearing_degrees,
            noise: self.noise,
            rng,
        }
    }
}

impl SimulatedSource {
    /// Starts a builder with a 0.2 m rig at 44.1 kHz, source straight ahead
    /// and no noise.
    pub fn builder() -> SimulatedSourceBuilder {
        SimulatedSourceBuilder::default()
    }

    /// Moves the source. Bearings are clamped to ±90°.
    pub fn set_bearing(&mut self, degrees: f64) {
        self.bearing_degrees = degrees.clamp(-90.0, 90.0);
    }

    /// Current true bearing in degrees.
    pub fn bearing(&self) -> f64 {
        self.bearing_degrees
    }

    /// Changes the background noise level.
    pub fn set_noise(&mut self, noise: f32) {
        self.noise = noise.max(0.0);
    }

    /// Current background noise level.
    pub fn noise(&self) -> f32 {
        self.noise
    }

    /// The lag, in samples, that channel 1 trails channel 0 by for the
    /// current bearing.
    pub fn expected_lag(&self) -> i64 {
        let tdoa = self.mic_distance * self.bearing_degrees.to_radians().sin() / self.speed_of_sound;
        (tdoa * self.sample_rate as f64).round() as i64
    }

    fn validate(&self) -> Result<(), DoaError> {
        if self.sample_rate == 0 {
            return Err(DoaError::InvalidSampleRate(self.sample_rate));
        }
        if !(self.mic_distance > 0.0) {
            return Err(DoaError::InvalidMicDistance(self.mic_distance));
        }
        if !(self.speed_of_sound > 0.0) {
            return Err(DoaError::InvalidSpeedOfSound(self.speed_of_sound));
        }
        Ok(())
    }

    fn clap(&mut self, len: usize) -> Vec<Sample> {
        let decay = BURST_DECAY_SECS * self.sample_rate as f64;
        (0..len)
            .map(|i| {
                let envelope = (-(i as f64) / decay).exp() as f32;
                self.rng.gen_range(-1.0f32..=1.0) * envelope
            })
            .collect()
    }

    fn background(&mut self, len: usize) -> Vec<Sample> {
        if self.noise <= 0.0 {
            return vec![0.0; len];
        }
        let noise = self.noise;
        (0..len).map(|_| self.rng.gen_range(-noise..=noise)).collect()
    }
}

impl AudioSource for SimulatedSource {
    fn capture(&mut self) -> Result<Capture, DoaError> {
        self.validate()?;

        let frames = (self.duration * self.sample_rate as f64).round() as usize;
        if frames == 0 {
            return Err(DoaError::EmptyBuffer);
        }
        let burst_len = ((BURST_SECS * self.sample_rate as f64) as usize).clamp(1, frames);
        let start = (frames as f64 * BURST_OFFSET) as usize;
        let clap = self.clap(burst_len);

        let lag = self.expected_lag();
        let (delay_0, delay_1) = if lag >= 0 {
            (0, lag as usize)
        } else {
            ((-lag) as usize, 0)
        };

        let mut channels = [self.background(frames), self.background(frames)];
        for (channel, delay) in channels.iter_mut().zip([delay_0, delay_1]) {
            for (i, &s) in clap.iter().enumerate() {
                if let Some(slot) = channel.get_mut(start + delay + i) {
                    *slot += s;
                }
            }
        }
        debug!(
            "simulated {} frames, bearing {:.1}° (lag {}), noise {}",
            frames, self.bearing_degrees, lag, self.noise
        );

        let [left, right] = channels;
        Ok(Capture {
            buffer: AudioBuffer::stereo(left, right)?,
            sample_rate: self.sample_rate,
        })
    }
}
