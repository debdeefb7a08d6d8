//! Daily bar representation and trade-date canonicalisation.

use chrono::NaiveDate;

/// Canonical textual form of a trade date, used for every comparison and emission.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One instrument-day observation as read from the data source.
///
/// Auxiliary columns are optional: sources leave moving averages empty for the
/// first bars of a listing, and the previous close is absent on the listing day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub code: String,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub pre_close: Option<f64>,
    pub pct_chg: Option<f64>,
    pub vol: Option<f64>,
    pub ma120: Option<f64>,
    pub ma250: Option<f64>,
    pub name: String,
}

/// Parse a trade date stored as either `YYYYMMDD` or `YYYY-MM-DD`.
///
/// Adapters call this at the data boundary so that nothing downstream ever sees
/// the source's textual format.
pub fn parse_trade_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
    } else {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
    }
}

pub fn format_trade_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Sort ascending by trade date and reject duplicate dates.
///
/// Returns the offending date when two bars share one.
pub fn sort_and_check(bars: &mut [DailyBar]) -> Result<(), NaiveDate> {
    bars.sort_by_key(|b| b.trade_date);
    match bars.windows(2).find(|w| w[0].trade_date == w[1].trade_date) {
        Some(w) => Err(w[0].trade_date),
        None => Ok(()),
    }
}
