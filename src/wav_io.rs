//! A wrapper for the hound library that reads recordings into [Capture]s and
//! writes them back out, either all at once or appended capture by capture
//! through [WavRecorder].

use crate::audio_buffer::{AudioBuffer, Sample};
use crate::component::{Component, ComponentResult};
use crate::error::DoaError;
use crate::source::Capture;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const BITS_PER_FLOAT_SAMPLE: u16 = 32;

/// Reads a whole WAV file. Integer samples are scaled to `[-1, 1)`, float
/// samples are taken as they are.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Capture, DoaError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    debug!("opened wav: {:?}", spec);

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<Sample>, hound::Error>>()?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / full_scale))
                .collect::<Result<Vec<Sample>, hound::Error>>()?
        }
    };

    Ok(Capture {
        buffer: AudioBuffer::from_interleaved(samples, spec.channels as usize)?,
        sample_rate: spec.sample_rate,
    })
}

/// Writes a capture as a 32-bit float WAV file, replacing anything at `path`.
pub fn write_wav<P: AsRef<Path>>(path: P, capture: &Capture) -> Result<(), DoaError> {
    let mut recorder = WavRecorder::create(
        path,
        capture.buffer.num_channels() as u16,
        capture.sample_rate,
    )?;
    recorder.append(capture)?;
    recorder.finalize()
}

fn float_spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_FLOAT_SAMPLE,
        sample_format: SampleFormat::Float,
    }
}

/// Appends every capture it is given to one WAV file.
pub struct WavRecorder {
    writer: Option<WavWriter<BufWriter<File>>>,
    spec: WavSpec,
}

impl WavRecorder {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, DoaError> {
        let spec = float_spec(channels, sample_rate);
        let writer = WavWriter::create(path, spec)?;
        Ok(Self {
            writer: Some(writer),
            spec,
        })
    }

    /// Writes the frames of `capture` and flushes, so the header stays valid
    /// even if the recorder is never finalized.
    pub fn append(&mut self, capture: &Capture) -> Result<(), DoaError> {
        if capture.buffer.num_channels() != self.spec.channels as usize
            || capture.sample_rate != self.spec.sample_rate
        {
            return Err(DoaError::WavFormatMismatch);
        }
        let writer = self.writer.as_mut().ok_or(DoaError::WavFormatMismatch)?;

        for &sample in capture.buffer.interleaved() {
            writer.write_sample(sample)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Component for WavRecorder {
    type InData = Capture;
    type OutData = ComponentResult<Capture>;

    /// Records the capture and passes it on unchanged.
    fn convert(&mut self, input: Capture) -> ComponentResult<Capture> {
        self.append(&input)?;
        Ok(input)
    }

    /// Rewrites the header with the final length. Dropping the writer does
    /// this too, but silently.
    fn finalize(&mut self) -> Result<(), DoaError> {
        match self.writer.take() {
            Some(writer) => Ok(writer.finalize()?),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for WavRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WavRecorder")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::run_component;
    use std::f32::consts::PI;
    use std::sync::mpsc::channel;
    use tempfile::tempdir;

    const SAMP_RATE: u32 = 44100;
    const C: f32 = 261.61;

    fn create_sine_wave(frames: usize, note: f32) -> Vec<f32> {
        (0..frames)
            .map(|x| x as f32 / SAMP_RATE as f32)
            .map(|t| (t * note * 2.0 * PI).sin() * 0.8)
            .collect()
    }

    fn stereo_capture(frames: usize) -> Capture {
        let left = create_sine_wave(frames, C);
        let right = create_sine_wave(frames, 2.0 * C);
        Capture {
            buffer: AudioBuffer::stereo(left, right).unwrap(),
            sample_rate: SAMP_RATE,
        }
    }

    #[test]
    fn test_float_wav_write_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sine.wav");
        let capture = stereo_capture(100);

        write_wav(&path, &capture).unwrap();
        assert_eq!(read_wav(&path).unwrap(), capture);
    }

    /// 16-bit files written by other tools come back scaled to [-1, 1).
    #[test]
    fn test_int_wav_is_scaled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [i16::MIN, 0, 16384, -16384] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let capture = read_wav(&path).unwrap();
        assert_eq!(capture.sample_rate, 8000);
        assert_eq!(capture.buffer.channel(0), Some(vec![-1.0, 0.5]));
        assert_eq!(capture.buffer.channel(1), Some(vec![0.0, -0.5]));
    }

    /// Runs a WavRecorder as a Component thread, sends it two captures, and
    /// reads back one file holding both.
    #[test]
    fn test_recorder_component_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.wav");
        let recorder = WavRecorder::create(&path, 2, SAMP_RATE).unwrap();

        let (capture_tx, capture_rx) = channel::<Capture>();
        let (passed_tx, passed_rx) = channel();
        let handle = run_component(Box::new(recorder), capture_rx, passed_tx);

        let first = stereo_capture(50);
        let second = stereo_capture(30);
        capture_tx.send(first.clone()).unwrap();
        capture_tx.send(second.clone()).unwrap();
        assert_eq!(passed_rx.recv().unwrap().unwrap(), first);
        assert_eq!(passed_rx.recv().unwrap().unwrap(), second);

        drop(capture_tx);
        handle.join().unwrap();

        let all = read_wav(&path).unwrap();
        assert_eq!(all.buffer.num_frames(), 80);
        let mut expected = first.buffer.interleaved().to_vec();
        expected.extend_from_slice(second.buffer.interleaved());
        assert_eq!(all.buffer.interleaved(), expected.as_slice());
    }

    #[test]
    fn test_mismatched_capture_is_rejected() {
        let dir = tempdir().unwrap();
        let mut recorder = WavRecorder::create(dir.path().join("x.wav"), 2, 8000).unwrap();
        assert!(matches!(
            recorder.append(&stereo_capture(10)),
            Err(DoaError::WavFormatMismatch)
        ));
    }
}
