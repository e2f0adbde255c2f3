//! Shared test fixtures

use crate::{HeroLedger, LedgerConfig};
use chrono::{DateTime, TimeZone, Utc};
use valor_core::{Hero, HeroId, ManualClock};
use valor_db::{PendingWrite, Store, WriteSet};
use valor_script::ProgressionDefs;

pub(crate) const TABLES: &str = r#"
(
    attributes: [
        (code: "STR", name: "Strength"),
        (code: "AGI", name: "Agility"),
    ],
    attribute_costs: [
        (point: 2, xp: 40),
        (point: 3, xp: 40),
        (point: 4, xp: 60),
        (point: 5, xp: 60),
    ],
    skills: [
        (id: "slash", name: "Slash", max_level: 10),
        (id: "shield_bash", name: "Shield Bash", max_level: 2),
        (id: "fireball", name: "Fireball", max_level: 5),
    ],
    skill_costs: [
        (level: 1, xp: 50),
        (level: 2, xp: 100, gold: 10, materials: [(item_id: "iron_ore", quantity: 2)]),
        (level: 3, xp: 150, gold: 20),
        (level: 4, xp: 200, gold: 40),
    ],
    classes: [
        (
            id: "warrior",
            name: "Warrior",
            skills: [
                (skill: "slash", max_learnable_level: 5, initial: true),
                (skill: "shield_bash", max_learnable_level: 3),
            ],
        ),
        (
            id: "mage",
            name: "Mage",
            skills: [(skill: "fireball", max_learnable_level: 5, initial: true)],
        ),
    ],
    levels: [
        (level: 1, cumulative_xp: 0),
        (level: 2, cumulative_xp: 100),
        (level: 3, cumulative_xp: 400),
        (level: 4, cumulative_xp: 1000),
    ],
)
"#;

pub(crate) struct Fixture {
    pub ledger: HeroLedger,
    pub clock: ManualClock,
}

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub(crate) fn fixture() -> Fixture {
    fixture_with_config(LedgerConfig::default())
}

pub(crate) fn fixture_with_config(config: LedgerConfig) -> Fixture {
    let clock = ManualClock::new(t0());
    let defs = ProgressionDefs::from_ron_str(TABLES).unwrap();
    let ledger = HeroLedger::new(Store::in_memory().unwrap(), defs, config).with_clock(clock.clone());
    Fixture { ledger, clock }
}

/// A warrior with `xp` freshly granted experience
pub(crate) fn warrior(ledger: &HeroLedger, xp: i64) -> Hero {
    let hero = ledger.create_hero(&"warrior".into(), "Aria").unwrap();
    if xp > 0 {
        ledger.add_experience(hero.id, xp).unwrap();
    }
    ledger.hero(hero.id).unwrap()
}

/// Overwrite the hero row, bypassing the ledger's rules
pub(crate) fn force_hero(ledger: &HeroLedger, hero_id: HeroId, edit: impl FnOnce(&mut Hero)) -> Hero {
    let mut hero = ledger.hero(hero_id).unwrap();
    edit(&mut hero);
    let mut writes = WriteSet::for_hero(&hero);
    writes.push(PendingWrite::PutHero(hero));
    ledger.store().commit(writes).unwrap().hero
}
