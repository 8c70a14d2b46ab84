//! Estimates the direction a sound came from using two microphones.
//!
//! Two synchronized channels are cross-correlated, the lag of the
//! correlation peak gives the time difference of arrival (TDOA) between the
//! microphones, and under a far-field model that delay maps to a bearing
//! relative to broadside:
//!
//! ```text
//!         source
//!            \  theta
//!             \ |
//!              \|
//!   mic 0 ------+------ mic 1
//!          <--- d --->
//! ```
//!
//! The core lives in [estimator]; [source], [simulator] and [wav_io] supply
//! audio to it, and the `doa` and `monitor` binaries are thin front ends that
//! print or plot the [EstimationResult](estimator::EstimationResult).

#![warn(missing_docs)]
pub mod args;
pub mod audio_buffer;
pub mod component;
pub mod config;
pub mod correlation;
pub mod error;
pub mod estimator;
pub mod gui;
pub mod simulator;
pub mod source;
pub mod wav_io;

/// An iterator that walks several iterators in lockstep, yielding one `Vec`
/// per step, based on
/// [this StackOverflow answer](https://stackoverflow.com/a/75477884/17443903).
/// Stops as soon as any of the inner iterators runs out, and yields nothing
/// at all when there are no inner iterators.
pub struct TransposeIter<I, T>
where
    I: IntoIterator<Item = T>,
{
    iterators: Vec<I::IntoIter>,
}

/// Adds [TransposableIter::transpose] to anything that iterates over
/// iterables.
pub trait TransposableIter<I, T>
where
    Self: Sized,
    Self: IntoIterator<Item = I>,
    I: IntoIterator<Item = T>,
{
    /// Turns an iterator of rows into an iterator of columns.
    fn transpose(self) -> TransposeIter<I, T> {
        let iterators: Vec<_> = self.into_iter().map(|i| i.into_iter()).collect();
        TransposeIter { iterators }
    }
}

impl<I, T> Iterator for TransposeIter<I, T>
where
    I: IntoIterator<Item = T>,
{
    type Item = Vec<T>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.iterators.is_empty() {
            return None;
        }
        self.iterators.iter_mut().map(|iter| iter.next()).collect()
    }
}

impl<I, T, Any> TransposableIter<I, T> for Any
where
    Any: IntoIterator<Item = I>,
    I: IntoIterator<Item = T>,
{
}
