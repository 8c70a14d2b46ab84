//! The error type shared by the estimator, its audio sources and its config
//! files.
//!
//! Note that a physically impossible delay is _not_ an error: it comes back as
//! an [EstimationResult](crate::estimator::EstimationResult) without an angle.
//! Everything in here means the input itself was unusable.

use std::{borrow::Cow, fmt};

/// Everything that can go wrong before an estimate can be computed.
#[derive(Debug)]
pub enum DoaError {
    /// The buffer holds no frames.
    EmptyBuffer,

    /// The buffer has fewer than the two channels the estimator needs.
    TooFewChannels(usize),

    /// Interleaved samples do not divide evenly into frames, or per-channel
    /// vectors have different lengths.
    RaggedFrames,

    /// A sample was NaN or infinite.
    NonFiniteSample,

    /// Two signals handed to the correlation had different lengths.
    ChannelLengthMismatch(usize, usize),

    /// The sample rate was zero.
    InvalidSampleRate(u32),

    /// The microphone spacing was zero, negative or not a number.
    InvalidMicDistance(f64),

    /// The speed of sound was zero, negative or not a number.
    InvalidSpeedOfSound(f64),

    /// The TDOA handed to the angle computation was not finite.
    InvalidTdoa(f64),

    /// A capture did not match the channel count or sample rate of the WAV
    /// file it was appended to.
    WavFormatMismatch,

    /// Returned when io fails when reading or writing files.
    IoError(std::io::Error),

    /// Returned when a WAV file cannot be read or written.
    HoundError(hound::Error),

    /// Returned when serialization of a config fails.
    RonError(ron::Error),

    /// Returned when deserialization of a config fails.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for DoaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use DoaError as DE;
        let msg = match self {
            DE::EmptyBuffer => Cow::from("audio buffer is empty"),
            DE::TooFewChannels(n) => {
                Cow::from(format!("need 2 audio channels, buffer has {}", n))
            }
            DE::RaggedFrames => Cow::from("samples do not form whole frames"),
            DE::NonFiniteSample => Cow::from("audio buffer contains a non-finite sample"),
            DE::ChannelLengthMismatch(a, b) => Cow::from(format!(
                "correlated signals differ in length: {} vs {} samples",
                a, b
            )),
            DE::InvalidSampleRate(rate) => Cow::from(format!("invalid sample rate: {} Hz", rate)),
            DE::InvalidMicDistance(d) => {
                Cow::from(format!("microphone distance must be positive, got {} m", d))
            }
            DE::InvalidSpeedOfSound(c) => {
                Cow::from(format!("speed of sound must be positive, got {} m/s", c))
            }
            DE::InvalidTdoa(t) => Cow::from(format!("TDOA is not finite: {}", t)),
            DE::WavFormatMismatch => {
                Cow::from("capture format does not match the open wav file")
            }
            DE::IoError(error) => Cow::from(format!("io error: {}", error)),
            DE::HoundError(error) => Cow::from(format!("wav error: {}", error)),
            DE::RonError(error) => Cow::from(format!("ron error: {}", error)),
            DE::RonSpannedError(error) => Cow::from(format!("ron spanning error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for DoaError {}

impl From<std::io::Error> for DoaError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<hound::Error> for DoaError {
    fn from(value: hound::Error) -> Self {
        Self::HoundError(value)
    }
}

impl From<ron::Error> for DoaError {
    fn from(value: ron::Error) -> Self {
        Self::RonError(value)
    }
}

impl From<ron::de::SpannedError> for DoaError {
    fn from(value: ron::de::SpannedError) -> Self {
        Self::RonSpannedError(value)
    }
}
