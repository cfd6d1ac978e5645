use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use flagquest_game::constants::PLAYER_RECORD_KEY;
use flagquest_game::{
    Continent, CountryCatalog, DataLoader, GameEngine, GameMode, PlayerRecord, PlayerStorage,
};
use serde::de::DeserializeOwned;

struct Loader {
    rules: &'static str,
}

impl DataLoader for Loader {
    type Error = serde_json::Error;

    fn load_catalog(&self) -> Result<CountryCatalog, Self::Error> {
        Ok(CountryCatalog::builtin().clone())
    }

    fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(self.rules)
    }
}

#[derive(Clone, Default)]
struct SlotStorage {
    slot: Rc<RefCell<Option<(String, String)>>>,
    broken: bool,
}

impl SlotStorage {
    fn holding(raw: &str) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some((
                PLAYER_RECORD_KEY.to_string(),
                raw.to_string(),
            )))),
            broken: false,
        }
    }

    fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn raw(&self) -> Option<String> {
        self.slot.borrow().as_ref().map(|(_, raw)| raw.clone())
    }

    fn check(&self) -> Result<(), io::Error> {
        if self.broken {
            return Err(io::Error::other("disk unavailable"));
        }
        Ok(())
    }
}

impl PlayerStorage for SlotStorage {
    type Error = io::Error;

    fn save_record(&self, key: &str, raw: &str) -> Result<(), Self::Error> {
        self.check()?;
        *self.slot.borrow_mut() = Some((key.to_string(), raw.to_string()));
        Ok(())
    }

    fn load_record(&self, key: &str) -> Result<Option<String>, Self::Error> {
        self.check()?;
        Ok(self
            .slot
            .borrow()
            .as_ref()
            .filter(|(stored, _)| stored == key)
            .map(|(_, raw)| raw.clone()))
    }

    fn delete_record(&self, _key: &str) -> Result<(), Self::Error> {
        self.check()?;
        self.slot.borrow_mut().take();
        Ok(())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn open(storage: &SlotStorage) -> GameEngine<Loader, SlotStorage> {
    GameEngine::new(Loader { rules: "{}" }, storage.clone(), today(), 1).unwrap()
}

#[test]
fn corrupt_record_starts_from_template() {
    let storage = SlotStorage::holding("{{{ definitely not json");
    let engine = open(&storage);
    assert_eq!(engine.record(), &PlayerRecord::initial(today()));
    let rewritten: PlayerRecord = serde_json::from_str(&storage.raw().unwrap()).unwrap();
    assert_eq!(rewritten, PlayerRecord::initial(today()));
}

#[test]
fn repaired_totals_are_written_back() {
    let storage = SlotStorage::holding(r#"{"coins":700,"totalCoins":300,"lastLogin":"2026-10-16"}"#);
    let engine = open(&storage);
    assert_eq!(engine.ledger().total_coins, 700);

    let rewritten: serde_json::Value = serde_json::from_str(&storage.raw().unwrap()).unwrap();
    assert_eq!(rewritten["coins"], 700);
    assert_eq!(rewritten["totalCoins"], 700);
}

#[test]
fn clean_record_from_today_is_left_alone() {
    let raw = r#"{"coins":700,"totalCoins":900,"lastLogin":"2026-10-16"}"#;
    let storage = SlotStorage::holding(raw);
    let engine = open(&storage);
    assert_eq!(engine.ledger().total_coins, 900);
    assert_eq!(storage.raw().unwrap(), raw);
}

#[test]
fn partial_record_is_merged_and_rewritten() {
    let storage = SlotStorage::holding(
        r#"{"xp": 1200, "coins": 40, "lastLogin": "2026-10-13T08:00:00.000Z",
            "streak": 9, "avatar": {"accessory": "role-2"}, "unlockedContinents": ["Europe"]}"#,
    );
    let engine = open(&storage);
    let ledger = engine.ledger();
    assert_eq!(ledger.xp, 1_200);
    assert_eq!(ledger.level(), 3);
    assert_eq!(ledger.coins, 40);
    assert_eq!(ledger.total_coins, 100);
    assert_eq!(ledger.streak, 1);
    assert_eq!(engine.record().avatar.base, "char-1");
    assert_eq!(engine.record().avatar.accessory, "role-2");
    assert_eq!(
        engine.unlocked_continents(),
        [Continent::Europe, Continent::Americas, Continent::Asia]
    );

    let rewritten: serde_json::Value = serde_json::from_str(&storage.raw().unwrap()).unwrap();
    assert_eq!(rewritten["lastLogin"], "2026-10-16");
    assert_eq!(rewritten["streak"], 1);
    assert!(rewritten.get("unlockedContinents").is_none());
}

#[test]
fn unavailable_storage_is_not_fatal() {
    let storage = SlotStorage::broken();
    let mut engine = open(&storage);
    engine.start_session(GameMode::Survival, None).unwrap();
    let flag = engine.snapshot().unwrap().flag_id.unwrap();
    engine.submit_answer(&flag);
    engine.elapse(Duration::from_millis(500));
    engine.acknowledge_fact();
    engine.abandon_session();
    assert!(engine.toggle_dark_mode());
    assert!(storage.raw().is_none());
}

#[test]
fn invalid_rules_fail_construction() {
    let result = GameEngine::new(
        Loader {
            rules: r#"{"starting_lives": 0}"#,
        },
        SlotStorage::default(),
        today(),
        1,
    );
    let err = result.err().unwrap();
    assert!(
        format!("{err:#}").contains("starting_lives must be at least 1"),
        "{err:#}"
    );

    let result = GameEngine::new(
        Loader {
            rules: "not json",
        },
        SlotStorage::default(),
        today(),
        1,
    );
    assert!(result.is_err());
}
