use crate::error::DoaError;

use std::{error::Error, fmt::Display, sync::mpsc};

/// Things that can stop the terminal front end.
#[derive(Debug)]
pub enum DoaGuiError {
    /// Drawing to or reading from the terminal failed.
    IOError(std::io::Error),
    /// A pipeline stage hung up while we were still sending to it.
    MPSCSendError,
    /// A pipeline stage hung up while we were waiting on it.
    MPSCRecvError(mpsc::RecvError),
    /// The estimator or the audio source rejected its input.
    Estimator(DoaError),
    /// A pipeline thread panicked.
    JoinError,
}

impl Display for DoaGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#?}", self)
    }
}

impl Error for DoaGuiError {}

impl From<std::io::Error> for DoaGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl<T> From<mpsc::SendError<T>> for DoaGuiError {
    fn from(_: mpsc::SendError<T>) -> Self {
        Self::MPSCSendError
    }
}

impl From<mpsc::RecvError> for DoaGuiError {
    fn from(value: mpsc::RecvError) -> Self {
        Self::MPSCRecvError(value)
    }
}

impl From<DoaError> for DoaGuiError {
    fn from(value: DoaError) -> Self {
        Self::Estimator(value)
    }
}
