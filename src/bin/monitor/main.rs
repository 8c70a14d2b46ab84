mod gui;

use clap::Parser;
use doa::{
    args::MonitorArgs,
    component::{run_component, EstimatorComponent},
    gui::DoaGuiError,
    simulator::SimulatedSource,
    wav_io::WavRecorder,
};
use gui::{engage_gui, Pipeline};
use std::{process::ExitCode, sync::mpsc::channel};

fn main() -> ExitCode {
    env_logger::init();
    let args = MonitorArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("monitor stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: MonitorArgs) -> Result<(), DoaGuiError> {
    let config = args.geometry.resolve()?;
    args.capture.check_duration();

    let builder = SimulatedSource::builder()
        .sample_rate(args.capture.sample_rate)
        .duration(args.capture.duration)
        .mic_distance(config.mic_distance)
        .speed_of_sound(config.speed_of_sound)
        .bearing(args.angle)
        .noise(args.capture.noise);
    let source = match args.capture.seed {
        Some(seed) => builder.seed(seed).build(),
        None => builder.build(),
    };

    let (capture_tx, capture_rx) = channel();
    let (result_tx, result_rx) = channel();
    let estimator = run_component(
        Box::new(EstimatorComponent::new(config)?),
        capture_rx,
        result_tx,
    );

    let mut recorder_thread = None;
    let recorder = match &args.record {
        Some(path) => {
            let recorder = WavRecorder::create(path, 2, args.capture.sample_rate)?;
            let (record_tx, record_rx) = channel();
            let (recorded_tx, recorded_rx) = channel();
            recorder_thread = Some(run_component(Box::new(recorder), record_rx, recorded_tx));
            Some((record_tx, recorded_rx))
        }
        None => None,
    };

    let pipeline = Pipeline {
        capture_tx,
        result_rx,
        recorder,
    };
    // dropping the pipeline inside engage_gui closes the channels, which
    // lets the component threads finalize and exit
    let res = engage_gui(source, pipeline);

    estimator.join().map_err(|_| DoaGuiError::JoinError)?;
    if let Some(th) = recorder_thread {
        th.join().map_err(|_| DoaGuiError::JoinError)?;
    }
    res
}
