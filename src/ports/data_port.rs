//! Read-only access to the daily bar store.

use crate::domain::bar::DailyBar;
use crate::domain::error::ScanError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Distinct instrument identifiers, in a stable order.
    fn list_codes(&self) -> Result<Vec<String>, ScanError>;

    /// Full history for one instrument, ascending by trade date.
    fn fetch_bars(&self, code: &str) -> Result<Vec<DailyBar>, ScanError>;

    /// First date, last date and bar count, or `None` when the code has no rows.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScanError>;
}
