//! Direction-of-arrival estimation from the time difference of arrival
//! (TDOA) between two microphones.
//!
//! The model is the usual far-field, two-sensor one. A plane wave arriving at
//! angle `theta` from broadside reaches one microphone `d * sin(theta) / c`
//! seconds before the other, where `d` is the spacing and `c` the speed of
//! sound. We find the delay as the arg-max of the full cross-correlation
//! between channel 0 and channel 1 and invert the relation:
//!
//! ```text
//! theta = asin(tdoa * c / d)
//! ```
//!
//! A delay longer than `d / c` cannot come from a single direct path (echoes,
//! clock skew and multipath all cause it), so such estimates come back
//! without an angle instead of with a clamped one.
//!
//! Signs: a positive lag means channel 1 trails channel 0, which we call
//! [Direction::Right] and report as a positive angle.

use crate::audio_buffer::{AudioBuffer, Sample};
use crate::config::{check_geometry, EstimatorConfig};
use crate::correlation::{peak_index, CorrelationMethod};
use crate::error::DoaError;

use log::{debug, warn};
use std::fmt;

/// Which side of broadside the source is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Channel 1 heard it first (negative lag).
    Left,
    /// Channel 0 heard it first (positive lag).
    Right,
    /// Both channels heard it at the same sample.
    Center,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
            Direction::Center => "CENTER",
        };
        write!(f, "{}", label)
    }
}

/// The outcome of one estimation. `angle_degrees` is `None` when the measured
/// delay is longer than the microphone geometry allows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationResult {
    /// Lag of the correlation peak, positive when channel 1 trails.
    pub lag_samples: i64,
    /// `lag_samples` divided by the sample rate.
    pub tdoa_seconds: f64,
    /// Side of the array, from the sign of the lag.
    pub direction: Direction,
    /// Bearing from broadside in `[-90, 90]`, if the delay was possible.
    pub angle_degrees: Option<f64>,
}

impl EstimationResult {
    /// Whether an angle could be computed.
    pub fn is_valid(&self) -> bool {
        self.angle_degrees.is_some()
    }

    /// The bearing in radians, for polar plots.
    pub fn angle_radians(&self) -> Option<f64> {
        self.angle_degrees.map(f64::to_radians)
    }
}

impl fmt::Display for EstimationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.angle_degrees {
            Some(angle) => write!(
                f,
                "Estimated Angle: {:.2}° ({}), TDOA {:.3} µs",
                angle,
                self.direction,
                self.tdoa_seconds * 1e6
            ),
            None => write!(f, "Invalid TDOA. Try again with cleaner input."),
        }
    }
}

/// Sign of the lag, as a side of the array. Independent of whether an angle
/// could be computed.
pub fn classify_direction(lag: i64) -> Direction {
    match lag.signum() {
        1 => Direction::Right,
        -1 => Direction::Left,
        _ => Direction::Center,
    }
}

/// Integer lag, in samples, at which channel 1 best matches channel 0.
/// Positive means channel 1 arrives later. Channels past the first two are
/// ignored.
pub fn compute_lag(
    buffer: &AudioBuffer,
    method: CorrelationMethod,
    normalize: bool,
) -> Result<i64, DoaError> {
    buffer.validate_for_estimation()?;

    let (mut first, mut second) = match (buffer.channel(0), buffer.channel(1)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(DoaError::TooFewChannels(buffer.num_channels())),
    };
    if normalize {
        normalize_peak(&mut first);
        normalize_peak(&mut second);
    }

    let n = buffer.num_frames();
    // never None here, validation rejected empty buffers
    let peak = peak_index(&first, &second, method)?.unwrap_or(0);
    let lag = peak as i64 - (n as i64 - 1);
    debug!("correlated {} frames, peak at index {} (lag {})", n, peak, lag);
    Ok(lag)
}

/// The TDOA between channel 0 and channel 1, in seconds.
pub fn compute_tdoa(buffer: &AudioBuffer, sample_rate: u32) -> Result<f64, DoaError> {
    if sample_rate == 0 {
        return Err(DoaError::InvalidSampleRate(sample_rate));
    }
    let lag = compute_lag(buffer, CorrelationMethod::default(), false)?;
    Ok(lag as f64 / sample_rate as f64)
}

/// The arrival angle in degrees for a given TDOA, or `None` if the delay is
/// impossible for this spacing. A delay of exactly `d / c` is accepted and
/// gives ±90°.
pub fn compute_angle(
    tdoa_seconds: f64,
    mic_distance: f64,
    speed_of_sound: f64,
) -> Result<Option<f64>, DoaError> {
    check_geometry(mic_distance, speed_of_sound)?;
    if !tdoa_seconds.is_finite() {
        return Err(DoaError::InvalidTdoa(tdoa_seconds));
    }

    let max_tdoa = mic_distance / speed_of_sound;
    if tdoa_seconds.abs() > max_tdoa {
        debug!(
            "tdoa {:e} s exceeds the {:e} s the geometry allows",
            tdoa_seconds, max_tdoa
        );
        return Ok(None);
    }

    // only rounding can push this past ±1 now
    let sin_theta = (tdoa_seconds * speed_of_sound / mic_distance).clamp(-1.0, 1.0);
    Ok(Some(sin_theta.asin().to_degrees()))
}

/// Runs the whole estimation on one buffer.
pub fn estimate(
    buffer: &AudioBuffer,
    sample_rate: u32,
    config: &EstimatorConfig,
) -> Result<EstimationResult, DoaError> {
    if sample_rate == 0 {
        return Err(DoaError::InvalidSampleRate(sample_rate));
    }
    config.validate()?;

    let lag_samples = compute_lag(buffer, config.method, config.normalize)?;
    let tdoa_seconds = lag_samples as f64 / sample_rate as f64;
    let angle_degrees = compute_angle(tdoa_seconds, config.mic_distance, config.speed_of_sound)?;
    if angle_degrees.is_none() {
        warn!(
            "lag of {} samples at {} Hz is too long for {} m spacing",
            lag_samples, sample_rate, config.mic_distance
        );
    }

    Ok(EstimationResult {
        lag_samples,
        tdoa_seconds,
        direction: classify_direction(lag_samples),
        angle_degrees,
    })
}

/// An estimator bound to one microphone geometry.
#[derive(Debug, Clone, Default)]
pub struct DoaEstimator {
    config: EstimatorConfig,
}

impl DoaEstimator {
    /// Checks the geometry once, up front.
    pub fn new(config: EstimatorConfig) -> Result<Self, DoaError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The geometry this estimator was built with.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// See [estimate].
    pub fn estimate(
        &self,
        buffer: &AudioBuffer,
        sample_rate: u32,
    ) -> Result<EstimationResult, DoaError> {
        estimate(buffer, sample_rate, &self.config)
    }
}

fn normalize_peak(samples: &mut [Sample]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        samples.iter_mut().for_each(|s| *s /= peak);
    } else {
        warn!("channel is silent, correlation peak is meaningless");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::AUTO_FFT_THRESHOLD;

    const FS: u32 = 44100;

    /// A sparse mix of click trains whose autocorrelation has one clear peak
    /// at lag zero.
    fn pulse_signal(len: usize) -> Vec<Sample> {
        (0..len)
            .map(|i| match i {
                i if i % 37 == 0 => 1.0,
                i if i % 11 == 0 => -0.5,
                i if i % 5 == 0 => 0.25,
                _ => 0.0,
            })
            .collect()
    }

    /// `signal` delayed by `k` samples (negative: advanced), zero filled.
    fn delayed(signal: &[Sample], k: i64) -> Vec<Sample> {
        let n = signal.len() as i64;
        (0..n)
            .map(|i| {
                let src = i - k;
                if (0..n).contains(&src) {
                    signal[src as usize]
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn identical_channels_are_centered() {
        let sig = pulse_signal(400);
        let buf = AudioBuffer::stereo(sig.clone(), sig).unwrap();
        assert_eq!(compute_tdoa(&buf, FS).unwrap(), 0.0);

        let res = estimate(&buf, FS, &EstimatorConfig::default()).unwrap();
        assert_eq!(res.lag_samples, 0);
        assert_eq!(res.direction, Direction::Center);
        assert_eq!(res.angle_degrees, Some(0.0));
    }

    #[test]
    fn recovers_integer_delays() {
        let sig = pulse_signal(500);
        for k in [-40, -7, -1, 1, 5, 23, 90] {
            let buf = AudioBuffer::stereo(sig.clone(), delayed(&sig, k)).unwrap();
            for method in [CorrelationMethod::Direct, CorrelationMethod::Fft] {
                assert_eq!(compute_lag(&buf, method, false).unwrap(), k, "{:?}", method);
            }
            let tdoa = compute_tdoa(&buf, FS).unwrap();
            assert!(close(tdoa, k as f64 / FS as f64, 1e-15));
        }
    }

    #[test]
    fn normalization_does_not_move_the_peak() {
        let sig = pulse_signal(300);
        let quiet: Vec<Sample> = delayed(&sig, 4).iter().map(|s| s * 0.001).collect();
        let buf = AudioBuffer::stereo(sig, quiet).unwrap();
        assert_eq!(compute_lag(&buf, CorrelationMethod::Direct, true).unwrap(), 4);
        assert_eq!(compute_lag(&buf, CorrelationMethod::Direct, false).unwrap(), 4);
    }

    #[test]
    fn ties_resolve_to_most_negative_lag() {
        // silence correlates to zero everywhere
        let buf = AudioBuffer::stereo(vec![0.0; 8], vec![0.0; 8]).unwrap();
        assert_eq!(compute_lag(&buf, CorrelationMethod::Direct, false).unwrap(), -7);

        // an impulse against a pair of impulses ties lags -1 and +1
        let buf = AudioBuffer::stereo(vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]).unwrap();
        assert_eq!(compute_lag(&buf, CorrelationMethod::Direct, false).unwrap(), -1);
    }

    #[test]
    fn long_buffer_ties_resolve_to_most_negative_lag() {
        // clicks at p and p + 2m against one at p + m tie lags -m and +m
        for (n, p, m) in [(3000, 100, 7), (8192, 4000, 250), (44100, 20000, 1000)] {
            assert!(n > AUTO_FFT_THRESHOLD);
            let mut left = vec![0.0; n];
            let mut right = vec![0.0; n];
            left[p] = 1.0;
            left[p + 2 * m] = 1.0;
            right[p + m] = 1.0;
            let buf = AudioBuffer::stereo(left, right).unwrap();

            let tdoa = compute_tdoa(&buf, FS).unwrap();
            assert_eq!(tdoa, -(m as f64) / FS as f64, "n={} m={}", n, m);
            let res = estimate(&buf, FS, &EstimatorConfig::default()).unwrap();
            assert_eq!(res.lag_samples, -(m as i64));
            assert_eq!(res.direction, Direction::Left);
        }
    }

    #[test]
    fn reference_scenario_right_and_left() {
        let tdoa = 5.0 / FS as f64;
        assert!(close(tdoa, 1.1338e-4, 1e-8));

        let right = compute_angle(tdoa, 0.2, 343.0).unwrap().unwrap();
        assert!(close(right, 11.2, 0.05), "{}", right);
        assert!(close((tdoa * 343.0 / 0.2), 0.1943, 1e-3));
        assert_eq!(classify_direction(5), Direction::Right);

        let left = compute_angle(-tdoa, 0.2, 343.0).unwrap().unwrap();
        assert!(close(left, -11.2, 0.05), "{}", left);
        assert_eq!(classify_direction(-5), Direction::Left);
    }

    #[test]
    fn end_to_end_scenario() {
        let sig = pulse_signal(600);
        let config = EstimatorConfig::default();

        let buf = AudioBuffer::stereo(sig.clone(), delayed(&sig, 5)).unwrap();
        let res = estimate(&buf, FS, &config).unwrap();
        assert_eq!(res.lag_samples, 5);
        assert_eq!(res.direction, Direction::Right);
        assert!(close(res.angle_degrees.unwrap(), 11.2, 0.05));
        assert!(close(
            res.angle_radians().unwrap(),
            res.angle_degrees.unwrap().to_radians(),
            1e-12
        ));

        let buf = AudioBuffer::stereo(sig.clone(), delayed(&sig, -5)).unwrap();
        let res = DoaEstimator::new(config).unwrap().estimate(&buf, FS).unwrap();
        assert_eq!(res.direction, Direction::Left);
        assert!(close(res.angle_degrees.unwrap(), -11.2, 0.05));
    }

    #[test]
    fn angle_is_odd_in_tdoa() {
        for t in [0.0, 1e-5, 7.3e-5, 2.2e-4, 5.8e-4] {
            let pos = compute_angle(t, 0.2, 343.0).unwrap().unwrap();
            let neg = compute_angle(-t, 0.2, 343.0).unwrap().unwrap();
            assert!(close(pos, -neg, 1e-12), "{} vs {}", pos, neg);
        }
    }

    #[test]
    fn boundary_delay_gives_ninety_degrees() {
        let (d, c) = (0.2, 343.0);
        let max_tdoa = d / c;
        // d / c * c / d may round to just under one, which is still ~90°
        assert!(close(compute_angle(max_tdoa, d, c).unwrap().unwrap(), 90.0, 1e-5));
        assert!(close(compute_angle(-max_tdoa, d, c).unwrap().unwrap(), -90.0, 1e-5));
    }

    #[test]
    fn impossible_delay_is_invalid_not_clamped() {
        let (d, c) = (0.2, 343.0);
        assert_eq!(compute_angle(2.0 * d / c, d, c).unwrap(), None);
        assert_eq!(compute_angle(-2.0 * d / c, d, c).unwrap(), None);
    }

    #[test]
    fn narrow_spacing_limits_the_usable_lag() {
        let config = EstimatorConfig::with_mic_distance(0.05);
        let sig = pulse_signal(600);

        // 5 samples is still within 0.05 / 343 s at 44.1 kHz
        let buf = AudioBuffer::stereo(sig.clone(), delayed(&sig, 5)).unwrap();
        let res = estimate(&buf, FS, &config).unwrap();
        assert!(close(res.angle_degrees.unwrap(), 51.1, 0.1));

        // 7 samples is not
        let buf = AudioBuffer::stereo(sig.clone(), delayed(&sig, 7)).unwrap();
        let res = estimate(&buf, FS, &config).unwrap();
        assert!(!res.is_valid());
        assert_eq!(res.direction, Direction::Right);
        assert_eq!(res.lag_samples, 7);
        assert_eq!(
            res.to_string(),
            "Invalid TDOA. Try again with cleaner input."
        );

        let res = estimate(&buf, FS, &EstimatorConfig::with_mic_distance(0.02)).unwrap();
        assert_eq!(res.angle_degrees, None);
    }

    #[test]
    fn bad_inputs_are_errors() {
        let sig = pulse_signal(16);
        let buf = AudioBuffer::stereo(sig.clone(), sig).unwrap();
        let config = EstimatorConfig::default();

        assert!(matches!(
            estimate(&buf, 0, &config),
            Err(DoaError::InvalidSampleRate(0))
        ));
        assert!(matches!(
            compute_tdoa(&buf, 0),
            Err(DoaError::InvalidSampleRate(0))
        ));
        assert!(matches!(
            estimate(&buf, FS, &EstimatorConfig::with_mic_distance(0.0)),
            Err(DoaError::InvalidMicDistance(_))
        ));
        assert!(matches!(
            compute_angle(1e-4, -1.0, 343.0),
            Err(DoaError::InvalidMicDistance(_))
        ));
        assert!(matches!(
            compute_angle(f64::NAN, 0.2, 343.0),
            Err(DoaError::InvalidTdoa(_))
        ));
        assert!(DoaEstimator::new(EstimatorConfig::with_mic_distance(-0.1)).is_err());

        let mono = AudioBuffer::from_interleaved(vec![0.5; 16], 1).unwrap();
        assert!(matches!(
            compute_tdoa(&mono, FS),
            Err(DoaError::TooFewChannels(1))
        ));

        let empty = AudioBuffer::stereo(vec![], vec![]).unwrap();
        assert!(matches!(
            estimate(&empty, FS, &config),
            Err(DoaError::EmptyBuffer)
        ));
    }

    #[test]
    fn display_reports_angle_and_side() {
        let res = EstimationResult {
            lag_samples: 5,
            tdoa_seconds: 5.0 / FS as f64,
            direction: Direction::Right,
            angle_degrees: Some(11.2117),
        };
        assert_eq!(
            res.to_string(),
            "Estimated Angle: 11.21° (RIGHT), TDOA 113.379 µs"
        );
    }
}
