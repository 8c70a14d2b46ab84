//! Where audio comes from. The estimator only ever sees a [Capture]; anything
//! that can produce one (a WAV file, a simulated rig, a sound card) can sit
//! in front of it by implementing [AudioSource].

use crate::audio_buffer::AudioBuffer;
use crate::error::DoaError;
use crate::wav_io;

use log::info;
use std::path::{Path, PathBuf};

/// A block of audio together with the rate it was sampled at.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// The recorded frames.
    pub buffer: AudioBuffer,
    /// Samples per second, per channel.
    pub sample_rate: u32,
}

impl Capture {
    /// Length of the capture in seconds, zero if the sample rate is zero.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.buffer.num_frames() as f64 / self.sample_rate as f64
    }
}

/// Anything that can hand the estimator a fresh two-channel recording.
pub trait AudioSource {
    /// Produces the next capture.
    fn capture(&mut self) -> Result<Capture, DoaError>;
}

/// An [AudioSource] that reads the same WAV file on every capture.
#[derive(Debug, Clone)]
pub struct WavSource {
    path: PathBuf,
}

impl WavSource {
    /// A source backed by the WAV file at `path`. The file is not opened
    /// until the first capture.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AudioSource for WavSource {
    fn capture(&mut self) -> Result<Capture, DoaError> {
        let capture = wav_io::read_wav(&self.path)?;
        info!(
            "read {:.2} s of {}-channel audio at {} Hz from {}",
            capture.duration_secs(),
            capture.buffer.num_channels(),
            capture.sample_rate,
            self.path.display()
        );
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn duration_follows_sample_rate() {
        let capture = Capture {
            buffer: AudioBuffer::stereo(vec![0.0; 441], vec![0.0; 441]).unwrap(),
            sample_rate: 44100,
        };
        assert!((capture.duration_secs() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn wav_source_reads_its_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clap.wav");
        let capture = Capture {
            buffer: AudioBuffer::stereo(vec![0.5, -0.25, 0.0], vec![0.0, 0.5, -0.25]).unwrap(),
            sample_rate: 8000,
        };
        wav_io::write_wav(&path, &capture).unwrap();

        let mut source = WavSource::new(&path);
        assert_eq!(source.capture().unwrap(), capture);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut source = WavSource::new(dir.path().join("nope.wav"));
        assert!(source.capture().is_err());
    }
}
