use anyhow::{Result, bail};
use chrono::NaiveDate;

use flagquest_game::date_seed;

/// Resolve CLI seed arguments into numeric seeds.
///
/// Accepts literal integers (negative values use their magnitude) and the
/// keyword `today`, which expands to the daily-challenge seed of `today`.
/// Duplicates are dropped; an empty list falls back to `1337`.
pub fn resolve_seed_inputs(tokens: &[String], today: NaiveDate) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("today") || token.eq_ignore_ascii_case("daily")
        {
            u64::from(date_seed(today))
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(1337);
    }

    Ok(seeds)
}
