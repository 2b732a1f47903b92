#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Load-cell weight measurement and calibration (hardware-agnostic).
//!
//! All hardware goes through `scale_traits::Sensor`; operator gestures
//! through `scale_traits::OperatorInput`; time through `scale_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Smoothing**: sliding-window average over raw ADC samples (`sample_buffer`)
//! - **Calibration**: piecewise-linear table and converter (`calibration`)
//! - **Tare**: zero offset applied after conversion (`tare`)
//! - **Readout**: `ScaleReader` composes the three (`reader`, `builder`)
//! - **Encoder**: accelerating target adjustment (`momentum`)
//! - **Capture**: multi-point calibration state machine (`capture`, `status`)
//! - **Persistence**: JSON calibration store (`persistence`)
//! - **Loops**: live readout and interactive calibration (`runner`)

pub mod builder;
pub mod calibration;
pub mod capture;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod momentum;
pub mod persistence;
pub mod reader;
pub mod runner;
pub mod sample_buffer;
pub mod sampler;
pub mod status;
pub mod tare;
pub mod util;

pub use builder::ScaleReaderBuilder;
pub use calibration::{CalibrationPoint, CalibrationTable, WeightConverter};
pub use capture::CalibrationProcedure;
pub use config::{CaptureCfg, FilterCfg, LiveCfg, MomentumCfg, TareCfg, Timeouts};
pub use error::{BuildError, Report, Result, ScaleError, SensorFault, scale_error};
pub use momentum::{Adjustment, MomentumController, MomentumState};
pub use persistence::{CalibrationStore, JsonFileStore};
pub use reader::ScaleReader;
pub use runner::{LiveReport, Reading, initial_tare, run_calibration, run_live};
pub use sample_buffer::SampleBuffer;
pub use sampler::Sampler;
pub use status::{CaptureProgress, CaptureStatus, StepView};
pub use tare::TareState;
pub use util::format_weight;
