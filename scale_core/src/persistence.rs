//! Calibration persistence.

use std::path::{Path, PathBuf};

use crate::calibration::CalibrationTable;
use crate::error::{Report, Result, ScaleError};

/// Where finished calibration tables go and where they come back from.
pub trait CalibrationStore {
    fn load(&self) -> Result<CalibrationTable>;
    fn save(&mut self, table: &CalibrationTable) -> Result<()>;
}

impl<T: CalibrationStore + ?Sized> CalibrationStore for Box<T> {
    fn load(&self) -> Result<CalibrationTable> {
        (**self).load()
    }
    fn save(&mut self, table: &CalibrationTable) -> Result<()> {
        (**self).save(table)
    }
}

/// The per-device JSON calibration file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn persistence(stage: &'static str, e: &eyre::Report) -> Report {
    Report::new(ScaleError::PersistenceFailure {
        stage,
        reason: e.to_string(),
    })
}

impl CalibrationStore for JsonFileStore {
    fn load(&self) -> Result<CalibrationTable> {
        let file = scale_config::load_calibration_json(&self.path)
            .map_err(|e| persistence("loading", &e))?;
        let table = CalibrationTable::try_from(&file)?;
        tracing::info!(path = %self.path.display(), points = table.len(), "calibration loaded");
        Ok(table)
    }

    fn save(&mut self, table: &CalibrationTable) -> Result<()> {
        let file = scale_config::CalibrationFile::from(table);
        scale_config::save_calibration_json(&self.path, &file)
            .map_err(|e| persistence("saving", &e))?;
        tracing::info!(path = %self.path.display(), points = table.len(), "calibration saved");
        Ok(())
    }
}
