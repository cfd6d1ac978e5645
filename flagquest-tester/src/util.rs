use anyhow::{Context, Result};
use chrono::NaiveDate;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a `YYYY-MM-DD` calendar date from the command line.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.trim()
        .parse::<NaiveDate>()
        .with_context(|| format!("expected a YYYY-MM-DD date, got '{raw}'"))
}
