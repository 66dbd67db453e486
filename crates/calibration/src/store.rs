//! Persistence boundary for confirmed calibrations.

use contracts::StoredCalibration;

use crate::Result;

/// Last persisted calibration for one tracking device
pub trait CalibrationStore: Send {
    fn load(&self) -> Result<StoredCalibration>;

    fn save(&mut self, calibration: &StoredCalibration) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: StoredCalibration,
    save_count: usize,
}

impl MemoryStore {
    pub fn new(saved: StoredCalibration) -> Self {
        Self {
            saved,
            save_count: 0,
        }
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self) -> Result<StoredCalibration> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, calibration: &StoredCalibration) -> Result<()> {
        self.saved = calibration.clone();
        self.save_count += 1;
        Ok(())
    }
}
