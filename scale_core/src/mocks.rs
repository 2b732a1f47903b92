//! Test and helper doubles for scale_core.

use std::collections::VecDeque;
use std::time::Duration;

use scale_traits::{BoxError, InputEvent, OperatorInput, Sensor};

use crate::calibration::CalibrationTable;
use crate::error::{Report, Result, ScaleError, SensorFault};
use crate::persistence::CalibrationStore;

/// A sensor that always errors on read.
pub struct NoopSensor;

impl Sensor for NoopSensor {
    fn read(&mut self, _timeout: Duration) -> std::result::Result<i32, BoxError> {
        Err(Box::new(std::io::Error::other("noop sensor")))
    }
}

/// Replays a fixed script of readings; `None` entries fail with a timeout.
///
/// When the script runs out, returns the fallback value, or keeps failing if
/// there is none.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    script: VecDeque<Option<i32>>,
    fallback: Option<i32>,
    reads: u64,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Option<i32>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: None,
            reads: 0,
        }
    }

    pub fn constant(value: i32) -> Self {
        Self::failing().then_constant(value)
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn then_constant(mut self, value: i32) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Replace what the sensor returns once the script is exhausted.
    pub fn set_constant(&mut self, value: Option<i32>) {
        self.fallback = value;
    }

    /// Number of read attempts so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl Sensor for ScriptedSensor {
    fn read(&mut self, _timeout: Duration) -> std::result::Result<i32, BoxError> {
        self.reads += 1;
        let next = match self.script.pop_front() {
            Some(entry) => entry,
            None => self.fallback,
        };
        next.ok_or_else(|| Box::new(ScaleError::SampleUnavailable(SensorFault::Timeout)) as BoxError)
    }
}

/// Replays operator events; `None` entries are idle polls. Reports the
/// source as closed once the script is exhausted, unless kept open.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    script: VecDeque<Option<InputEvent>>,
    keep_open: bool,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = Option<InputEvent>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            keep_open: false,
        }
    }

    /// Idle forever after the script instead of closing.
    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }
}

impl OperatorInput for ScriptedInput {
    fn poll_event(&mut self) -> std::result::Result<Option<InputEvent>, BoxError> {
        match self.script.pop_front() {
            Some(ev) => Ok(ev),
            None if self.keep_open => Ok(None),
            None => Err("input closed".into()),
        }
    }
}

/// In-memory `CalibrationStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub table: Option<CalibrationTable>,
    pub saves: u32,
    pub fail_saves: bool,
}

impl MemoryStore {
    pub fn with_table(table: CalibrationTable) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self) -> Result<CalibrationTable> {
        self.table
            .clone()
            .ok_or_else(|| Report::new(ScaleError::InsufficientCalibrationData { found: 0 }))
    }

    fn save(&mut self, table: &CalibrationTable) -> Result<()> {
        if self.fail_saves {
            return Err(Report::new(ScaleError::PersistenceFailure {
                stage: "saving",
                reason: "memory store rejects writes".into(),
            }));
        }
        self.table = Some(table.clone());
        self.saves += 1;
        Ok(())
    }
}
