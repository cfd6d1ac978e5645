//! Question sampling and multiple-choice option generation.
use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;

use crate::catalog::{Continent, Country, CountryCatalog};
use crate::constants::DISTRACTORS_PER_ROUND;

/// Options presented for one round: the correct country plus its distractors.
pub type OptionSet = SmallVec<[Country; 4]>;

/// Draw up to `count` countries uniformly at random, without replacement.
///
/// The pool is the catalog filtered by `continent` (when given) and then by
/// `id != exclude_id` (when given). Duplicate catalog ids are sampled
/// independently; only `exclude_id` removes entries by id.
pub fn sample<R: Rng + ?Sized>(
    catalog: &CountryCatalog,
    count: usize,
    exclude_id: Option<&str>,
    continent: Option<Continent>,
    rng: &mut R,
) -> Vec<Country> {
    let mut pool: Vec<&Country> = catalog
        .iter()
        .filter(|c| continent.is_none_or(|wanted| c.continent == wanted))
        .filter(|c| exclude_id.is_none_or(|excluded| c.id != excluded))
        .collect();
    let take = count.min(pool.len());
    let (picked, _) = pool.partial_shuffle(rng, take);
    picked.iter().map(|c| (*c).clone()).collect()
}

/// Build the option set for `correct`: three distractors that never share its
/// id, plus the correct country, shuffled so every slot is equally likely.
///
/// A fresh shuffle is drawn on every call.
pub fn round_options<R: Rng + ?Sized>(
    catalog: &CountryCatalog,
    correct: &Country,
    continent: Option<Continent>,
    rng: &mut R,
) -> OptionSet {
    let mut options: OptionSet = sample(
        catalog,
        DISTRACTORS_PER_ROUND,
        Some(&correct.id),
        continent,
        rng,
    )
    .into_iter()
    .collect();
    options.push(correct.clone());
    options.shuffle(rng);
    options
}

/// Pick up to `amount` option ids to disable, never touching the correct one
/// or an option that is already disabled.
pub fn pick_removals<R: Rng + ?Sized>(
    options: &[Country],
    correct_id: &str,
    already_disabled: &[String],
    amount: usize,
    rng: &mut R,
) -> SmallVec<[String; 2]> {
    let mut wrong: SmallVec<[&Country; 4]> = options
        .iter()
        .filter(|c| c.id != correct_id && !already_disabled.contains(&c.id))
        .collect();
    let take = amount.min(wrong.len());
    let (picked, _) = wrong.partial_shuffle(rng, take);
    picked.iter().map(|c| c.id.clone()).collect()
}
