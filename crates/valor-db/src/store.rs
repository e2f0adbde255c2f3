//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use crate::write_set::{CommitResult, PendingWrite, SkillRowRef, WriteSet};
use chrono::{DateTime, Utc};
use native_db::transaction::RwTransaction;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;
use valor_core::time::to_micros;
use valor_core::{
    AllocatedAttribute, AttributeCode, AttributeOperation, ClassId, Hero, HeroId, HeroSkill,
    HeroSkillId, LearnedMethod, OperationId, SkillId, SkillOperation,
};

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredHero>().unwrap();
    models.define::<StoredAttribute>().unwrap();
    models.define::<StoredHeroSkill>().unwrap();
    models.define::<StoredAttributeOperation>().unwrap();
    models.define::<StoredSkillOperation>().unwrap();
    models.define::<StoredSequence>().unwrap();
    models
});

const HERO_SEQ: &str = "hero";
const HERO_SKILL_SEQ: &str = "hero_skill";
const ATTRIBUTE_OP_SEQ: &str = "attribute_operation";
const SKILL_OP_SEQ: &str = "skill_operation";

/// Everything needed to create a hero in one transaction.
#[derive(Debug, Clone)]
pub struct NewHero {
    pub class_id: ClassId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Every recognized attribute; each starts at its initial value.
    pub attributes: Vec<AttributeCode>,
    /// Skills granted by the class, learned at level 1.
    pub initial_skills: Vec<SkillId>,
}

/// Database store for hero progression state.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create a hero with its attributes and class skills.
    pub fn create_hero(&self, new: NewHero) -> Result<Hero> {
        let rw = self.db.rw_transaction()?;

        let id = HeroId::new(next_id(&rw, HERO_SEQ)?);
        let hero = Hero::new(id, new.class_id, new.name, new.created_at);
        rw.insert(StoredHero::from_hero(&hero))?;

        for code in new.attributes {
            let attribute = AllocatedAttribute::initial(id, code);
            rw.insert(StoredAttribute::from_attribute(&attribute))?;
        }

        for skill_id in new.initial_skills {
            let skill = HeroSkill {
                id: HeroSkillId::new(next_id(&rw, HERO_SKILL_SEQ)?),
                hero_id: id,
                skill_id,
                level: 1,
                learned_method: LearnedMethod::ClassUnlock,
                learned_at: new.created_at,
                updated_at: new.created_at,
            };
            rw.insert(StoredHeroSkill::from_hero_skill(&skill))?;
        }

        rw.commit()?;
        Ok(hero)
    }

    /// Load a hero by ID.
    pub fn hero(&self, id: HeroId) -> Result<Option<Hero>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredHero> = r.get().primary(id.raw())?;
        Ok(stored.map(|s| s.to_hero()))
    }

    /// Apply a write set if the hero is still at the expected version.
    ///
    /// Fails with [`Error::Conflict`] and writes nothing if another commit
    /// for the same hero landed first.
    pub fn commit(&self, write_set: WriteSet) -> Result<CommitResult> {
        let hero_id = write_set.hero_id();
        let rw = self.db.rw_transaction()?;

        let current: StoredHero = rw
            .get()
            .primary(hero_id.raw())?
            .ok_or(Error::HeroNotFound(hero_id))?;
        if current.version != write_set.expected_version() {
            return Err(Error::Conflict {
                hero_id,
                expected: write_set.expected_version(),
                found: current.version,
            });
        }

        let mut hero = current.to_hero();
        let mut operations = Vec::new();
        let mut hero_skills = Vec::new();

        for write in write_set.iter() {
            match write {
                PendingWrite::PutHero(next) => {
                    hero = next.clone();
                }

                PendingWrite::PutAttribute(attribute) => {
                    ensure_owner(hero_id, attribute.hero_id)?;
                    rw.upsert(StoredAttribute::from_attribute(attribute))?;
                }

                PendingWrite::AppendAttributeOperation(new) => {
                    let op = AttributeOperation {
                        id: OperationId::new(next_id(&rw, ATTRIBUTE_OP_SEQ)?),
                        hero_id,
                        code: new.code.clone(),
                        points_added: new.points_added,
                        xp_spent: new.xp_spent,
                        value_before: new.value_before,
                        value_after: new.value_after,
                        created_at: new.created_at,
                        rollback_deadline: new.rollback_deadline,
                        rolled_back_at: None,
                    };
                    rw.insert(StoredAttributeOperation::from_operation(&op))?;
                    operations.push(op.id);
                }

                PendingWrite::MarkAttributeOperationRolledBack { id, at } => {
                    let mut stored: StoredAttributeOperation = rw
                        .get()
                        .primary(id.raw())?
                        .ok_or_else(|| Error::NotFound(id.to_string()))?;
                    ensure_owner(hero_id, HeroId::new(stored.hero_id))?;
                    stored.rolled_back_at_us = Some(to_micros(*at));
                    rw.upsert(stored)?;
                }

                PendingWrite::InsertHeroSkill(new) => {
                    let skill = HeroSkill {
                        id: HeroSkillId::new(next_id(&rw, HERO_SKILL_SEQ)?),
                        hero_id,
                        skill_id: new.skill_id.clone(),
                        level: new.level,
                        learned_method: new.learned_method,
                        learned_at: new.learned_at,
                        updated_at: new.learned_at,
                    };
                    rw.insert(StoredHeroSkill::from_hero_skill(&skill))?;
                    hero_skills.push(skill.id);
                }

                PendingWrite::PutHeroSkill(skill) => {
                    ensure_owner(hero_id, skill.hero_id)?;
                    rw.upsert(StoredHeroSkill::from_hero_skill(skill))?;
                }

                PendingWrite::DeleteHeroSkill(id) => {
                    let stored: StoredHeroSkill = rw
                        .get()
                        .primary(id.raw())?
                        .ok_or_else(|| Error::NotFound(id.to_string()))?;
                    ensure_owner(hero_id, HeroId::new(stored.hero_id))?;
                    rw.remove(stored)?;
                }

                PendingWrite::AppendSkillOperation(new) => {
                    let hero_skill_id = match new.hero_skill {
                        SkillRowRef::Existing(id) => id,
                        SkillRowRef::Inserted => *hero_skills.last().ok_or_else(|| {
                            Error::NotFound("skill row inserted by this write set".to_string())
                        })?,
                    };
                    let op = SkillOperation {
                        id: OperationId::new(next_id(&rw, SKILL_OP_SEQ)?),
                        hero_id,
                        hero_skill_id,
                        skill_id: new.skill_id.clone(),
                        xp_spent: new.xp_spent,
                        gold_spent: new.gold_spent,
                        materials: new.materials.clone(),
                        level_before: new.level_before,
                        level_after: new.level_after,
                        created_at: new.created_at,
                        rollback_deadline: new.rollback_deadline,
                        rolled_back_at: None,
                    };
                    rw.insert(StoredSkillOperation::from_operation(&op)?)?;
                    operations.push(op.id);
                }

                PendingWrite::MarkSkillOperationRolledBack { id, at } => {
                    let mut stored: StoredSkillOperation = rw
                        .get()
                        .primary(id.raw())?
                        .ok_or_else(|| Error::NotFound(id.to_string()))?;
                    ensure_owner(hero_id, HeroId::new(stored.hero_id))?;
                    stored.rolled_back_at_us = Some(to_micros(*at));
                    rw.upsert(stored)?;
                }
            }
        }

        hero.id = hero_id;
        hero.version = current.version + 1;
        rw.upsert(StoredHero::from_hero(&hero))?;
        rw.commit()?;

        Ok(CommitResult {
            hero,
            operations,
            hero_skills,
        })
    }
}

/// Hand out the next id of a named sequence, starting at 1.
fn next_id(rw: &RwTransaction, name: &str) -> Result<u64> {
    let current: Option<StoredSequence> = rw.get().primary(name.to_string())?;
    let id = current.map(|s| s.next).unwrap_or(1);
    rw.upsert(StoredSequence {
        name: name.to_string(),
        next: id + 1,
    })?;
    Ok(id)
}

fn ensure_owner(hero_id: HeroId, owner: HeroId) -> Result<()> {
    if owner != hero_id {
        return Err(Error::NotFound(format!(
            "row owned by {} in a write set for {}",
            owner, hero_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write_set::{NewAttributeOperation, NewHeroSkill, NewSkillOperation};
    use chrono::{Duration, TimeZone};
    use valor_core::{Cost, MaterialCost};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn new_hero(store: &Store) -> Hero {
        store
            .create_hero(NewHero {
                class_id: ClassId::new("mage"),
                name: "Iris".to_string(),
                created_at: now(),
                attributes: vec![AttributeCode::new("STR"), AttributeCode::new("INT")],
                initial_skills: vec![SkillId::new("arcane_bolt")],
            })
            .unwrap()
    }

    #[test]
    fn test_create_hero_initializes_rows() {
        let store = Store::in_memory().unwrap();
        let hero = new_hero(&store);

        let loaded = store.hero(hero.id).unwrap().unwrap();
        assert_eq!(loaded, hero);
        assert_eq!(loaded.version, 0);

        let attributes = store.attributes(hero.id).unwrap();
        assert_eq!(attributes.len(), 2);
        assert!(attributes.iter().all(|a| a.value == 1 && a.spent_xp == 0));

        let skills = store.hero_skills(hero.id).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].learned_method, LearnedMethod::ClassUnlock);
    }

    #[test]
    fn test_heroes_get_distinct_ids() {
        let store = Store::in_memory().unwrap();
        let a = new_hero(&store);
        let b = new_hero(&store);
        assert_ne!(a.id, b.id);
        assert_eq!(store.attributes(a.id).unwrap().len(), 2);
        assert_eq!(store.attributes(b.id).unwrap().len(), 2);
    }

    #[test]
    fn test_commit_bumps_version_and_assigns_ids() {
        let store = Store::in_memory().unwrap();
        let mut hero = new_hero(&store);
        hero.grant_experience(100).unwrap();
        hero.debit(Cost::xp(40)).unwrap();

        let code = AttributeCode::new("STR");
        let mut attribute = store.attribute(hero.id, &code).unwrap().unwrap();
        attribute.value = 2;
        attribute.spent_xp = 40;

        let mut ws = WriteSet::for_hero(&hero);
        ws.push(PendingWrite::PutHero(hero.clone()));
        ws.push(PendingWrite::PutAttribute(attribute.clone()));
        ws.push(PendingWrite::AppendAttributeOperation(NewAttributeOperation {
            code: code.clone(),
            points_added: 1,
            xp_spent: 40,
            value_before: 1,
            value_after: 2,
            created_at: now(),
            rollback_deadline: now() + Duration::hours(1),
        }));

        let result = store.commit(ws).unwrap();
        assert_eq!(result.hero.version, 1);
        assert_eq!(result.hero.experience_available, 60);
        assert_eq!(result.operations.len(), 1);

        assert_eq!(store.attribute(hero.id, &code).unwrap(), Some(attribute));
        let log = store.attribute_operations(hero.id, &code).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, result.operations[0]);
        assert_eq!(log[0].rollback_deadline, now() + Duration::hours(1));
        assert!(store
            .attribute_operations(hero.id, &AttributeCode::new("INT"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_stale_write_set_conflicts_and_writes_nothing() {
        let store = Store::in_memory().unwrap();
        let hero = new_hero(&store);

        let first = WriteSet::for_hero(&hero);
        let mut stale = WriteSet::for_hero(&hero);
        let mut richer = hero.clone();
        richer.grant_gold(500).unwrap();
        stale.push(PendingWrite::PutHero(richer));

        store.commit(first).unwrap();
        let err = store.commit(stale).unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
        assert_eq!(store.hero(hero.id).unwrap().unwrap().gold, 0);
    }

    #[test]
    fn test_commit_for_missing_hero() {
        let store = Store::in_memory().unwrap();
        let ghost = Hero::new(HeroId(99), ClassId::new("mage"), "Ghost", now());
        let err = store.commit(WriteSet::for_hero(&ghost)).unwrap_err();
        assert!(matches!(err, Error::HeroNotFound(HeroId(99))));
    }

    #[test]
    fn test_inserted_skill_and_operation_roundtrip() {
        let store = Store::in_memory().unwrap();
        let hero = new_hero(&store);
        let fireball = SkillId::new("fireball");

        let mut ws = WriteSet::for_hero(&hero);
        ws.push(PendingWrite::InsertHeroSkill(NewHeroSkill {
            skill_id: fireball.clone(),
            level: 1,
            learned_method: LearnedMethod::Manual,
            learned_at: now(),
        }));
        ws.push(PendingWrite::AppendSkillOperation(NewSkillOperation {
            hero_skill: SkillRowRef::Inserted,
            skill_id: fireball.clone(),
            xp_spent: 50,
            gold_spent: 5,
            materials: vec![MaterialCost {
                item_id: "ember".to_string(),
                quantity: 2,
            }],
            level_before: 0,
            level_after: 1,
            created_at: now(),
            rollback_deadline: now() + Duration::hours(1),
        }));
        let result = store.commit(ws).unwrap();
        let skill_row = result.hero_skills[0];

        let skill = store.hero_skill_by_skill(hero.id, &fireball).unwrap().unwrap();
        assert_eq!(skill.id, skill_row);

        let ops = store.skill_operations(skill_row).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].materials[0].quantity, 2);
        assert!(ops[0].is_learn());

        let mut ws = WriteSet::for_hero(&result.hero);
        ws.push(PendingWrite::DeleteHeroSkill(skill_row));
        ws.push(PendingWrite::MarkSkillOperationRolledBack {
            id: ops[0].id,
            at: now(),
        });
        store.commit(ws).unwrap();

        assert!(store.hero_skill(skill_row).unwrap().is_none());
        let ops = store.skill_operations(skill_row).unwrap();
        assert_eq!(ops[0].rolled_back_at, Some(now()));
    }

    #[test]
    fn test_foreign_rows_rejected() {
        let store = Store::in_memory().unwrap();
        let a = new_hero(&store);
        let b = new_hero(&store);

        let foreign = AllocatedAttribute {
            hero_id: b.id,
            code: AttributeCode::new("STR"),
            value: 9,
            spent_xp: 0,
        };
        let mut ws = WriteSet::for_hero(&a);
        ws.push(PendingWrite::PutAttribute(foreign));
        assert!(matches!(store.commit(ws), Err(Error::NotFound(_))));
        assert_eq!(store.hero(a.id).unwrap().unwrap().version, 0);
    }
}
