//! HeroLedger - owner of hero progression state
//!
//! The ledger holds the store, the loaded progression tables, a clock and
//! the runtime configuration. Heroes are created and credited here; the
//! spending engines [`AttributeAllocation`] and [`SkillProgression`] borrow it.

use crate::attributes::AttributeAllocation;
use crate::config::LedgerConfig;
use crate::error::store_error;
use crate::skills::SkillProgression;
use std::sync::Arc;
use tracing::info;
use valor_core::{
    time, AllocatedAttribute, AttributeCode, AttributeOperation, Clock, ClassId, Error, Hero,
    HeroId, HeroSkill, HeroSkillId, LevelUp, OperationId, Result, SkillOperation, SystemClock,
};
use valor_db::{NewHero, Store};
use valor_script::ProgressionDefs;

/// Outcome of a committed ledger operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// The hero row as committed
    pub hero: Hero,
    /// The operation recorded, or the one rolled back
    pub operation_id: Option<OperationId>,
    /// The skill row the operation touched
    pub hero_skill_id: Option<HeroSkillId>,
    /// Level advance applied in the same commit
    pub level_up: Option<LevelUp>,
}

/// Transactional owner of every hero's progression
///
/// ```
/// use valor_db::Store;
/// use valor_ledger::{HeroLedger, LedgerConfig};
/// use valor_script::ProgressionDefs;
///
/// let defs = ProgressionDefs::from_ron_str(r#"(
///     classes: [(id: "warrior", name: "Warrior")],
///     levels: [(level: 1, cumulative_xp: 0), (level: 2, cumulative_xp: 100)],
/// )"#).unwrap();
/// let ledger = HeroLedger::new(Store::in_memory().unwrap(), defs, LedgerConfig::default());
///
/// let hero = ledger.create_hero(&"warrior".into(), "Aria").unwrap();
/// let receipt = ledger.add_experience(hero.id, 150).unwrap();
/// assert_eq!(receipt.hero.current_level, 2);
/// ```
pub struct HeroLedger {
    store: Store,
    defs: Arc<ProgressionDefs>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl HeroLedger {
    /// Create a ledger on the system clock
    pub fn new(store: Store, defs: impl Into<Arc<ProgressionDefs>>, config: LedgerConfig) -> Self {
        Self {
            store,
            defs: defs.into(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock used to stamp operations
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn defs(&self) -> &ProgressionDefs {
        &self.defs
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Attribute spending and its rollback
    pub fn allocation(&self) -> AttributeAllocation<'_> {
        AttributeAllocation::new(self)
    }

    /// Skill learning, upgrading and their rollback
    pub fn progression(&self) -> SkillProgression<'_> {
        SkillProgression::new(self)
    }

    /// Create a level 1 hero of `class_id`
    ///
    /// Every recognized attribute starts at its initial value and the
    /// class's initial skills are granted at level 1. Nothing about the new
    /// hero is rollback-eligible.
    pub fn create_hero(&self, class_id: &ClassId, name: &str) -> Result<Hero> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidParams("hero name must not be empty".to_string()));
        }
        let class = self
            .defs
            .get_class(class_id)
            .ok_or_else(|| Error::ResourceNotFound(format!("class {}", class_id)))?;

        let new = NewHero {
            class_id: class_id.clone(),
            name: name.to_string(),
            created_at: time::truncate(self.clock.now()),
            attributes: self.defs.attributes.keys().cloned().collect(),
            initial_skills: class.initial_skills().map(|entry| entry.skill.clone()).collect(),
        };
        let hero = self.store.create_hero(new).map_err(store_error)?;
        info!(hero_id = %hero.id, class = %class_id, "hero created");
        Ok(hero)
    }

    /// Grant lifetime experience and re-derive the hero's level
    pub fn add_experience(&self, hero_id: HeroId, amount: i64) -> Result<Receipt> {
        let amount = positive(amount, "experience")?;
        let receipt = self.transact(hero_id, "add_experience", |txn| {
            txn.hero.grant_experience(amount)?;
            txn.auto_level();
            Ok(())
        })?;
        info!(
            hero_id = %hero_id,
            amount,
            total = receipt.hero.experience_total,
            "experience granted"
        );
        Ok(receipt)
    }

    /// Grant gold; the hero's level is not affected
    pub fn add_gold(&self, hero_id: HeroId, amount: i64) -> Result<Receipt> {
        let amount = positive(amount, "gold")?;
        let receipt = self.transact(hero_id, "add_gold", |txn| txn.hero.grant_gold(amount))?;
        info!(hero_id = %hero_id, amount, gold = receipt.hero.gold, "gold granted");
        Ok(receipt)
    }

    pub fn hero(&self, hero_id: HeroId) -> Result<Hero> {
        self.store
            .hero(hero_id)
            .map_err(store_error)?
            .ok_or(Error::HeroNotFound(hero_id))
    }

    /// Every attribute of the hero, in code order
    pub fn attributes(&self, hero_id: HeroId) -> Result<Vec<AllocatedAttribute>> {
        self.hero(hero_id)?;
        self.store.attributes(hero_id).map_err(store_error)
    }

    pub fn attribute(&self, hero_id: HeroId, code: &AttributeCode) -> Result<AllocatedAttribute> {
        self.hero(hero_id)?;
        self.store
            .attribute(hero_id, code)
            .map_err(store_error)?
            .ok_or_else(|| Error::ResourceNotFound(format!("attribute {} of {}", code, hero_id)))
    }

    /// Allocation history of one attribute, oldest first
    pub fn attribute_operations(
        &self,
        hero_id: HeroId,
        code: &AttributeCode,
    ) -> Result<Vec<AttributeOperation>> {
        self.hero(hero_id)?;
        let mut log = self
            .store
            .attribute_operations(hero_id, code)
            .map_err(store_error)?;
        log.sort_by_key(|op| (op.created_at, op.id));
        Ok(log)
    }

    pub fn hero_skills(&self, hero_id: HeroId) -> Result<Vec<HeroSkill>> {
        self.hero(hero_id)?;
        self.store.hero_skills(hero_id).map_err(store_error)
    }

    pub fn hero_skill(&self, id: HeroSkillId) -> Result<HeroSkill> {
        self.store
            .hero_skill(id)
            .map_err(store_error)?
            .ok_or_else(|| Error::SkillNotFound(id.to_string()))
    }

    /// Learn and upgrade history of one skill row, oldest first
    ///
    /// The history outlives the row when its learn is rolled back.
    pub fn skill_operations(&self, id: HeroSkillId) -> Result<Vec<SkillOperation>> {
        let mut log = self.store.skill_operations(id).map_err(store_error)?;
        log.sort_by_key(|op| (op.created_at, op.id));
        Ok(log)
    }
}

/// Accept a strictly positive amount
pub(crate) fn positive(amount: i64, what: &str) -> Result<u64> {
    if amount <= 0 {
        return Err(Error::InvalidParams(format!(
            "{} amount must be positive, got {}",
            what, amount
        )));
    }
    Ok(amount as u64)
}
