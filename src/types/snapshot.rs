use super::{MomentumScanRow, PatternAlert, SectorMomentumRow, SmartMover};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Read-only view of everything stored for one date.
///
/// Pick selection and insight synthesis only ever see one of these, never
/// the store itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub movers: Vec<SmartMover>,
    pub patterns: Vec<PatternAlert>,
    pub sectors: Vec<SectorMomentumRow>,
    /// Sorted by score descending.
    pub momentum: Vec<MomentumScanRow>,
}

impl DailySnapshot {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            movers: Vec::new(),
            patterns: Vec::new(),
            sectors: Vec::new(),
            momentum: Vec::new(),
        }
    }
}
