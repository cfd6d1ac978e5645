//! Country catalog: static reference data the question sampler draws from.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const BUILTIN_CATALOG_JSON: &str = include_str!("../assets/countries.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    Europe,
    Asia,
    Africa,
    Americas,
    Oceania,
}

impl Continent {
    /// Adventure map order.
    pub const ALL: [Self; 5] = [
        Self::Europe,
        Self::Americas,
        Self::Asia,
        Self::Africa,
        Self::Oceania,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Europe => "Europe",
            Self::Asia => "Asia",
            Self::Africa => "Africa",
            Self::Americas => "Americas",
            Self::Oceania => "Oceania",
        }
    }

    /// Player level needed before the continent opens on the adventure map.
    #[must_use]
    pub const fn required_level(self) -> u32 {
        match self {
            Self::Europe => 1,
            Self::Americas => 2,
            Self::Asia => 3,
            Self::Africa => 4,
            Self::Oceania => 5,
        }
    }

    #[must_use]
    pub const fn is_unlocked_at(self, level: u32) -> bool {
        level >= self.required_level()
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Continent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "europe" => Ok(Self::Europe),
            "asia" => Ok(Self::Asia),
            "africa" => Ok(Self::Africa),
            "americas" => Ok(Self::Americas),
            "oceania" => Ok(Self::Oceania),
            _ => Err(()),
        }
    }
}

/// A single catalog entry.
///
/// `id` is the uniqueness key for exclusion, but the catalog itself may carry
/// duplicates; both copies stay eligible everywhere except where excluded by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub continent: Continent,
    pub fact: String,
    /// Ordinal 1..=3.
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
}

const fn default_difficulty() -> u8 {
    1
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog contains no countries")]
    Empty,
    #[error("country {id} has difficulty {difficulty}, expected 1..=3")]
    Difficulty { id: String, difficulty: u8 },
}

/// Read-only list of countries; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CountryCatalog {
    pub countries: Vec<Country>,
}

impl CountryCatalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the catalog is empty, or an
    /// entry's difficulty falls outside 1..=3.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Build a catalog from pre-parsed entries without validation (useful for tests).
    #[must_use]
    pub const fn from_countries(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    /// Shared instance of the catalog bundled with the crate.
    ///
    /// # Panics
    ///
    /// Panics if the bundled asset is invalid, which the crate's own tests rule out.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static CATALOG: OnceLock<CountryCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::from_json(BUILTIN_CATALOG_JSON).expect("bundled country catalog is valid")
        })
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid entry.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.countries.is_empty() {
            return Err(CatalogError::Empty);
        }
        if let Some(bad) = self
            .countries
            .iter()
            .find(|c| !(1..=3).contains(&c.difficulty))
        {
            return Err(CatalogError::Difficulty {
                id: bad.id.clone(),
                difficulty: bad.difficulty,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Country> {
        self.countries.iter()
    }

    /// First entry carrying the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == id)
    }

    /// Entries on the given continent, in catalog order.
    pub fn on_continent(&self, continent: Continent) -> impl Iterator<Item = &Country> {
        self.countries
            .iter()
            .filter(move |c| c.continent == continent)
    }
}

impl<'a> IntoIterator for &'a CountryCatalog {
    type Item = &'a Country;
    type IntoIter = std::slice::Iter<'a, Country>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_covers_every_continent() {
        let catalog = CountryCatalog::builtin();
        assert_eq!(catalog.len(), 29);
        for continent in Continent::ALL {
            assert!(catalog.on_continent(continent).count() >= 3, "{continent}");
        }
        assert_eq!(catalog.on_continent(Continent::Oceania).count(), 3);
    }

    #[test]
    fn builtin_catalog_keeps_duplicate_ids() {
        let egypt = CountryCatalog::builtin()
            .iter()
            .filter(|c| c.id == "eg")
            .count();
        assert_eq!(egypt, 2);
    }

    #[test]
    fn rejects_out_of_range_difficulty() {
        let json = r#"{"countries":[{"id":"xx","name":"X","continent":"Asia","fact":"f","difficulty":4}]}"#;
        let err = CountryCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::Difficulty { difficulty: 4, .. }));
        assert!(matches!(
            CountryCatalog::from_json(r#"{"countries":[]}"#),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn continent_gating_follows_level() {
        assert!(Continent::Europe.is_unlocked_at(1));
        assert!(!Continent::Oceania.is_unlocked_at(4));
        assert!(Continent::Oceania.is_unlocked_at(5));
        assert_eq!("americas".parse::<Continent>(), Ok(Continent::Americas));
        assert!("atlantis".parse::<Continent>().is_err());
    }
}
