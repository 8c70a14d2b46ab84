//! Estimates the direction of a sound from a stereo recording, or from a
//! simulated one, and prints the bearing.

use clap::Parser;
use doa::{
    args::{CommandTask, DoaArgs},
    error::DoaError,
    estimator::{DoaEstimator, EstimationResult},
    simulator::SimulatedSource,
    source::{AudioSource, Capture, WavSource},
    wav_io,
};

use log::info;
use std::process::ExitCode;

// Example:
// cargo run --bin doa -- --distance 0.2 file clap.wav
// cargo run --bin doa -- --distance 0.2 simulate --angle -30 --out clap.wav

fn main() -> ExitCode {
    env_logger::init();
    let args = DoaArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error during recording or processing: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: DoaArgs) -> Result<(), DoaError> {
    let config = args.geometry.resolve()?;
    info!("using {:?}", config);

    let capture = match args.command {
        CommandTask::File(cmd) => WavSource::new(cmd.path).capture()?,
        CommandTask::Simulate(cmd) => {
            cmd.capture.check_duration();
            let builder = SimulatedSource::builder()
                .sample_rate(cmd.capture.sample_rate)
                .duration(cmd.capture.duration)
                .mic_distance(config.mic_distance)
                .speed_of_sound(config.speed_of_sound)
                .bearing(cmd.angle)
                .noise(cmd.capture.noise);
            let mut source = match cmd.capture.seed {
                Some(seed) => builder.seed(seed).build(),
                None => builder.build(),
            };
            println!(
                "Simulated source at {:.2}° (expected lag {} samples)",
                source.bearing(),
                source.expected_lag()
            );
            let capture = source.capture()?;
            if let Some(path) = cmd.outfile {
                wav_io::write_wav(&path, &capture)?;
                info!("saved simulated recording to {}", path.display());
            }
            capture
        }
        CommandTask::InitConfig(cmd) => {
            config.save(&cmd.path)?;
            println!("Wrote config to {}", cmd.path.display());
            return Ok(());
        }
    };

    let estimator = DoaEstimator::new(config)?;
    let result = estimator.estimate(&capture.buffer, capture.sample_rate)?;
    report(&capture, &result);
    Ok(())
}

fn report(capture: &Capture, result: &EstimationResult) {
    println!("{}", result);
    println!(
        "Lag: {} samples at {} Hz ({:.2} s recorded)",
        result.lag_samples,
        capture.sample_rate,
        capture.duration_secs()
    );
    match result.angle_radians() {
        Some(theta) => println!("Direction: {}, polar angle {:.4} rad", result.direction, theta),
        None => println!("Direction: {} (no angle available)", result.direction),
    }
}
