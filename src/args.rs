//! Commandline argument parser using clap for the DoA estimator

use crate::config::EstimatorConfig;
use crate::error::DoaError;
use crate::simulator::{DEFAULT_DURATION, DEFAULT_SAMPLE_RATE};

use clap::{Args, Parser, Subcommand};
use log::warn;
use std::path::PathBuf;

/// The recording lengths a single clap-and-estimate round is meant for.
pub const DURATION_RANGE: (f64, f64) = (0.5, 3.0);

/// Arguments of the one-shot `doa` binary.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct DoaArgs {
    #[command(subcommand)]
    /// Where the audio comes from
    pub command: CommandTask,

    /// Microphone geometry
    #[command(flatten)]
    pub geometry: GeometryArgs,
}

/// Microphone geometry, shared by both binaries. Flags override the config
/// file, which overrides the defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct GeometryArgs {
    /// RON file holding an estimator config
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Distance between the microphones, in meters
    #[arg(short = 'd', long = "distance", global = true)]
    pub mic_distance: Option<f64>,

    /// Speed of sound, in m/s
    #[arg(short = 'c', long = "speed", global = true)]
    pub speed_of_sound: Option<f64>,

    /// Normalize each channel to unit peak before correlating
    #[arg(long, global = true)]
    pub normalize: bool,
}

impl GeometryArgs {
    /// Layers the flags over the config file (or the defaults).
    pub fn resolve(&self) -> Result<EstimatorConfig, DoaError> {
        let mut config = match &self.config {
            Some(path) => EstimatorConfig::load(path)?,
            None => EstimatorConfig::default(),
        };
        if let Some(d) = self.mic_distance {
            config.mic_distance = d;
        }
        if let Some(c) = self.speed_of_sound {
            config.speed_of_sound = c;
        }
        config.normalize |= self.normalize;
        config.validate()?;
        Ok(config)
    }
}

/// What the `doa` binary should do.
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Estimate the bearing of the sound in a stereo WAV file
    #[command(about)]
    File(FileCommand),

    /// Estimate the bearing of a simulated clap
    #[command(about)]
    Simulate(SimulateCommand),

    /// Write the effective config to a RON file
    #[command(about)]
    InitConfig(InitConfigCommand),
}

/// Arguments of `doa file`.
#[derive(Debug, Args, Clone)]
pub struct FileCommand {
    /// Stereo WAV recording, channel 0 and channel 1 are the two microphones
    pub path: PathBuf,
}

/// Arguments of `doa simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateCommand {
    /// True bearing of the simulated source, degrees from broadside
    #[arg(short = 'a', long = "angle", allow_hyphen_values = true)]
    pub angle: f64,

    /// How the recording is made
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Save the simulated recording as a WAV file
    #[arg(short = 'o', long = "out")]
    pub outfile: Option<PathBuf>,
}

/// How each simulated recording is made.
#[derive(Debug, Args, Clone)]
pub struct CaptureArgs {
    /// Sample rate, in Hz
    #[arg(short = 's', long = "samp", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Recording length, in seconds
    #[arg(short = 't', long = "duration", default_value_t = DEFAULT_DURATION)]
    pub duration: f64,

    /// Peak amplitude of background noise; the clap peaks at 1.0
    #[arg(short = 'n', long = "noise", default_value_t = 0.05)]
    pub noise: f32,

    /// Seed for reproducible recordings
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CaptureArgs {
    /// Warns about recording lengths outside what one clap needs.
    pub fn check_duration(&self) {
        let (lo, hi) = DURATION_RANGE;
        if self.duration < lo || self.duration > hi {
            warn!(
                "recording duration {} s is outside the usual {}..{} s range",
                self.duration, lo, hi
            );
        }
    }
}

/// Arguments of `doa init-config`.
#[derive(Debug, Args, Clone)]
pub struct InitConfigCommand {
    /// Filename for the config to be written to
    pub path: PathBuf,
}

/// Arguments of the live polar monitor.
#[derive(Debug, Parser, Clone)]
#[clap(version, about = "Live polar view of simulated direction-of-arrival estimates")]
pub struct MonitorArgs {
    /// Microphone geometry
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// How each recording is made
    #[command(flatten)]
    pub capture: CaptureArgs,

    /// Starting bearing of the simulated source, degrees from broadside
    #[arg(short = 'a', long = "angle", default_value_t = 0.0, allow_hyphen_values = true)]
    pub angle: f64,

    /// Append every simulated recording to this WAV file
    #[arg(long = "record")]
    pub record: Option<PathBuf>,
}
