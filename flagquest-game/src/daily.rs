//! Date-seeded daily challenge.
//!
//! Every player sees the same questions on the same calendar day: the seed is
//! derived from the date alone, never from an RNG.
use chrono::NaiveDate;

use crate::catalog::{Country, CountryCatalog};
use crate::constants::{DAILY_DATE_FORMAT, DAILY_ORDINAL_MODULUS};

/// Sum of the character codes of the date's display string.
#[must_use]
pub fn date_seed(date: NaiveDate) -> u32 {
    date.format(DAILY_DATE_FORMAT)
        .to_string()
        .chars()
        .map(u32::from)
        .sum()
}

/// Sort key of a catalog entry for the given seed.
#[must_use]
pub fn daily_ordinal(country: &Country, seed: u32) -> u32 {
    let lead = country.id.chars().next().map_or(0, u32::from);
    (lead + seed) % DAILY_ORDINAL_MODULUS
}

/// The first `count` catalog entries ordered by [`daily_ordinal`].
///
/// Ties keep catalog order.
#[must_use]
pub fn daily_challenge(catalog: &CountryCatalog, date: NaiveDate, count: usize) -> Vec<Country> {
    let seed = date_seed(date);
    let mut ordered: Vec<&Country> = catalog.iter().collect();
    ordered.sort_by_key(|country| daily_ordinal(country, seed));
    ordered.into_iter().take(count).cloned().collect()
}
