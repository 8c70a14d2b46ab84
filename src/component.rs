//! Defines the Component trait, a stage that consumes data from the stage
//! before it, processes it, and hands the result to the stage after it. The
//! monitor uses this to run estimation (and optionally recording) off the
//! UI thread.

use crate::config::EstimatorConfig;
use crate::error::DoaError;
use crate::estimator::{DoaEstimator, EstimationResult};
use crate::source::Capture;

use log::{info, warn};
use std::fmt::Display;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// What most stages send downstream: their output, or why they could not
/// produce one.
pub type ComponentResult<T> = Result<T, DoaError>;

///
/// A processing stage. Every stage converts one `InData` into one `OutData`
/// and gets a chance to clean up when its input channel closes.
///
pub trait Component: Display {
    /// What the stage receives.
    type InData;
    /// What the stage sends on.
    type OutData;

    /// Converts an input of type A into an output of type B
    fn convert(&mut self, input: Self::InData) -> Self::OutData;

    /// Cleans up at termination of pipeline
    fn finalize(&mut self) -> Result<(), DoaError>;
}

/// Runs the given Component on its own thread. On receiving data of type
/// InData on the input channel, the Component converts them to data of type
/// OutData and sends it to the output channel. The thread ends when the
/// input channel is closed.
pub fn run_component<C: Component + Send + 'static>(
    mut component: Box<C>,
    input: Receiver<<C as Component>::InData>,
    output: Sender<<C as Component>::OutData>,
) -> JoinHandle<()>
where
    <C as Component>::InData: Send + 'static,
    <C as Component>::OutData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            let out_data = component.convert(data);
            if let Err(error) = output.send(out_data) {
                warn!("{} : received error {}.", component, error);
            }
        }

        if let Err(component_error) = component.finalize() {
            warn!("{} : error during terminating : {}.", component, component_error);
        }
        info!("{} : terminated.", component);
    })
}

/// Estimates a bearing for every [Capture] it receives.
#[derive(Debug, Clone)]
pub struct EstimatorComponent {
    estimator: DoaEstimator,
}

impl EstimatorComponent {
    /// Builds the stage, rejecting an unusable geometry up front.
    pub fn new(config: EstimatorConfig) -> Result<Self, DoaError> {
        Ok(Self {
            estimator: DoaEstimator::new(config)?,
        })
    }
}

impl Component for EstimatorComponent {
    type InData = Capture;
    type OutData = ComponentResult<EstimationResult>;

    fn convert(&mut self, input: Capture) -> Self::OutData {
        self.estimator.estimate(&input.buffer, input.sample_rate)
    }

    fn finalize(&mut self) -> Result<(), DoaError> {
        Ok(())
    }
}

impl Display for EstimatorComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EstimatorComponent")
    }
}
