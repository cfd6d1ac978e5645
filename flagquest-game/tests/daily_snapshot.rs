use std::hash::Hasher;

use chrono::{Days, NaiveDate};
use flagquest_game::{CountryCatalog, daily_challenge, date_seed};
use twox_hash::XxHash64;

const SNAPSHOT_HASH: u64 = 0x59c0_89e7_38ff_4af8;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn render(catalog: &CountryCatalog, from: NaiveDate, days: u64) -> String {
    let mut out = String::new();
    for offset in 0..days {
        let day = from + Days::new(offset);
        let ids: Vec<String> = daily_challenge(catalog, day, 5)
            .into_iter()
            .map(|country| country.id)
            .collect();
        out.push_str(&format!("{day} {}\n", ids.join(",")));
    }
    out
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

#[test]
fn two_weeks_of_daily_challenges_are_stable() {
    let rendered = render(CountryCatalog::builtin(), start(), 14);
    assert_eq!(
        snapshot_hash(rendered.as_bytes()),
        SNAPSHOT_HASH,
        "daily challenge ordering changed\n{rendered}"
    );
}

#[test]
fn duplicate_catalog_entries_can_both_appear() {
    let day = NaiveDate::from_ymd_opt(2026, 10, 27).unwrap();
    let ids: Vec<String> = daily_challenge(CountryCatalog::builtin(), day, 5)
        .into_iter()
        .map(|country| country.id)
        .collect();
    assert_eq!(ids, ["es", "eg", "eg", "fr", "gr"]);
}

#[test]
fn seed_depends_only_on_the_date() {
    let day = start();
    assert_eq!(date_seed(day), date_seed(day));
    assert_eq!(day.format("%a %b %d %Y").to_string(), "Fri Oct 16 2026");
    let catalog = CountryCatalog::builtin().clone();
    assert_eq!(
        render(&catalog, day, 3),
        render(CountryCatalog::builtin(), day, 3)
    );
}
