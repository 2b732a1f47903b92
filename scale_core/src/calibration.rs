//! Piecewise-linear calibration model.
//!
//! A `CalibrationTable` is a validated set of (weight, ADC average) points.
//! `WeightConverter` orders the points by ADC value and maps a smoothed ADC
//! reading to grams using the segment that brackets it, or the nearest end
//! segment when the reading falls outside the calibrated range.

use crate::error::{Report, Result, ScaleError};

/// One captured (weight, ADC) correspondence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Capture step this point came from.
    pub ordinal: usize,
    /// Nominal weight the step was meant for (grams).
    pub nominal_g: i32,
    /// Weight actually on the platform at commit time (grams).
    pub target_g: i32,
    /// Mean raw ADC value over the capture window.
    pub adc_average: f64,
    /// Samples behind `adc_average`; 0 for points loaded from disk.
    pub samples: u32,
}

/// At least two calibration points, in the order they were captured or loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
}

impl CalibrationTable {
    pub const MIN_POINTS: usize = 2;

    pub fn new(points: Vec<CalibrationPoint>) -> Result<Self> {
        if points.len() < Self::MIN_POINTS {
            return Err(Report::new(ScaleError::InsufficientCalibrationData {
                found: points.len(),
            }));
        }
        if let Some(p) = points.iter().find(|p| !p.adc_average.is_finite()) {
            return Err(Report::new(ScaleError::Config(format!(
                "calibration point {} has a non-finite ADC average",
                p.ordinal
            ))));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points ordered by committed weight, the order used on disk.
    pub fn storage_order(&self) -> Vec<CalibrationPoint> {
        let mut pts = self.points.clone();
        pts.sort_by_key(|p| p.target_g);
        pts
    }
}

/// Applies a calibration table to smoothed ADC readings.
#[derive(Debug, Clone)]
pub struct WeightConverter {
    /// Sorted ascending by `adc_average`; always at least two entries.
    points: Vec<CalibrationPoint>,
}

impl WeightConverter {
    pub fn new(table: &CalibrationTable) -> Self {
        let mut points = table.points().to_vec();
        // Stable: points with equal ADC keep their table order.
        points.sort_by(|a, b| a.adc_average.total_cmp(&b.adc_average));
        Self { points }
    }

    /// Points in ADC order.
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Calibrated ADC range `(lowest, highest)`.
    pub fn adc_range(&self) -> (f64, f64) {
        let n = self.points.len();
        (self.points[0].adc_average, self.points[n - 1].adc_average)
    }

    /// The adjacent pair whose line is used for `adc`.
    pub fn segment_for(&self, adc: f64) -> (&CalibrationPoint, &CalibrationPoint) {
        let pts = &self.points;
        let n = pts.len();
        if adc < pts[0].adc_average {
            return (&pts[0], &pts[1]);
        }
        if adc > pts[n - 1].adc_average {
            return (&pts[n - 2], &pts[n - 1]);
        }
        pts.windows(2)
            .find(|w| w[0].adc_average <= adc && adc <= w[1].adc_average)
            .map_or((&pts[0], &pts[1]), |w| (&w[0], &w[1]))
    }

    /// Convert a smoothed ADC value to grams.
    pub fn convert(&self, adc: f64) -> f64 {
        let (p1, p2) = self.segment_for(adc);
        let (a1, a2) = (p1.adc_average, p2.adc_average);
        let (w1, w2) = (f64::from(p1.target_g), f64::from(p2.target_g));
        if a1 == a2 {
            return w1;
        }
        w1 + (w2 - w1) * (adc - a1) / (a2 - a1)
    }
}
