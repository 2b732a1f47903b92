//! Collaborator traits shared by the scale workspace.
//!
//! The engine never talks to hardware directly: raw ADC samples come through
//! [`Sensor`], operator gestures through [`OperatorInput`], and time through
//! [`Clock`].
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Source of raw load-cell ADC samples.
pub trait Sensor {
    /// Read one raw sample, waiting at most `timeout`.
    ///
    /// Failures are expected to be transient; callers decide the retry policy.
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError>;
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        (**self).read(timeout)
    }
}

/// A single operator gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Rotary encoder moved by `delta` detents; `at_ms` is a monotonic timestamp.
    Encoder { delta: i32, at_ms: u64 },
    /// Button press confirming the current step.
    Commit,
}

/// Stream of operator gestures.
///
/// `Ok(None)` means nothing happened since the last poll. An error means the
/// input source is gone for good (e.g. stdin closed).
pub trait OperatorInput {
    fn poll_event(&mut self) -> Result<Option<InputEvent>, BoxError>;
}

impl<I: OperatorInput + ?Sized> OperatorInput for Box<I> {
    fn poll_event(&mut self) -> Result<Option<InputEvent>, BoxError> {
        (**self).poll_event()
    }
}
