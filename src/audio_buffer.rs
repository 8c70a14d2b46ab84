//! A captured block of multichannel audio, stored as interleaved frames.

use crate::error::DoaError;
use crate::TransposableIter;

/// A single audio sample.
pub type Sample = f32;

/// An immutable, frame-ordered block of audio. Every frame carries exactly
/// one sample per channel, so the channels are always the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<Sample>,
    channels: usize,
}

impl AudioBuffer {
    /// Wraps interleaved samples (`L R L R ...` for stereo).
    pub fn from_interleaved(samples: Vec<Sample>, channels: usize) -> Result<Self, DoaError> {
        if channels == 0 {
            return Err(DoaError::TooFewChannels(0));
        }
        if samples.len() % channels != 0 {
            return Err(DoaError::RaggedFrames);
        }
        Ok(Self { samples, channels })
    }

    /// Interleaves one vector per channel into frames.
    pub fn from_channels(channels: Vec<Vec<Sample>>) -> Result<Self, DoaError> {
        let n_channels = channels.len();
        if n_channels == 0 {
            return Err(DoaError::TooFewChannels(0));
        }
        let n_frames = channels[0].len();
        if channels.iter().any(|c| c.len() != n_frames) {
            return Err(DoaError::RaggedFrames);
        }

        let samples = channels.transpose().flatten().collect();
        Ok(Self {
            samples,
            channels: n_channels,
        })
    }

    /// Convenience constructor for the common two-microphone case.
    pub fn stereo(left: Vec<Sample>, right: Vec<Sample>) -> Result<Self, DoaError> {
        Self::from_channels(vec![left, right])
    }

    /// Number of channels per frame.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Number of frames, i.e. samples per channel.
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// True when the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The raw interleaved samples.
    pub fn interleaved(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates over frames, each a slice of `num_channels()` samples.
    pub fn frames(&self) -> impl Iterator<Item = &[Sample]> {
        self.samples.chunks_exact(self.channels)
    }

    /// Copies one channel out of the interleaved storage. Returns `None` if
    /// the channel does not exist.
    pub fn channel(&self, index: usize) -> Option<Vec<Sample>> {
        if index >= self.channels {
            return None;
        }
        Some(
            self.samples
                .iter()
                .skip(index)
                .step_by(self.channels)
                .copied()
                .collect(),
        )
    }

    /// Checks that the buffer can be handed to the estimator: at least one
    /// frame, at least two channels, and only finite samples.
    pub fn validate_for_estimation(&self) -> Result<(), DoaError> {
        if self.channels < 2 {
            return Err(DoaError::TooFewChannels(self.channels));
        }
        if self.is_empty() {
            return Err(DoaError::EmptyBuffer);
        }
        if self.samples.iter().any(|s| !s.is_finite()) {
            return Err(DoaError::NonFiniteSample);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_interleaves_frames() {
        let buf = AudioBuffer::stereo(vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]).unwrap();
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.num_frames(), 3);
        assert_eq!(buf.interleaved(), &[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert_eq!(buf.channel(1), Some(vec![-1.0, -2.0, -3.0]));
        assert_eq!(buf.channel(2), None);

        let frames: Vec<&[Sample]> = buf.frames().collect();
        assert_eq!(frames[1], &[2.0, -2.0]);
    }

    #[test]
    fn ragged_input_is_rejected() {
        assert!(matches!(
            AudioBuffer::stereo(vec![1.0, 2.0], vec![1.0]),
            Err(DoaError::RaggedFrames)
        ));
        assert!(matches!(
            AudioBuffer::from_interleaved(vec![1.0, 2.0, 3.0], 2),
            Err(DoaError::RaggedFrames)
        ));
        assert!(matches!(
            AudioBuffer::from_interleaved(vec![], 0),
            Err(DoaError::TooFewChannels(0))
        ));
    }

    #[test]
    fn empty_channels_make_an_empty_buffer() {
        let buf = AudioBuffer::stereo(vec![], vec![]).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.num_frames(), 0);
        assert!(matches!(
            buf.validate_for_estimation(),
            Err(DoaError::EmptyBuffer)
        ));
    }

    #[test]
    fn estimation_needs_two_finite_channels() {
        let mono = AudioBuffer::from_interleaved(vec![0.1, 0.2, 0.3], 1).unwrap();
        assert!(matches!(
            mono.validate_for_estimation(),
            Err(DoaError::TooFewChannels(1))
        ));

        let nan = AudioBuffer::stereo(vec![0.0, f32::NAN], vec![0.0, 0.0]).unwrap();
        assert!(matches!(
            nan.validate_for_estimation(),
            Err(DoaError::NonFiniteSample)
        ));

        let quad = AudioBuffer::from_interleaved(vec![0.0; 8], 4).unwrap();
        assert!(quad.validate_for_estimation().is_ok());
    }
}
