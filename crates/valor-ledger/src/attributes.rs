//! Attribute allocation engine
//!
//! Spends experience on attribute points and undoes the most recent
//! allocation of an attribute while its rollback window is open.

use crate::error::store_error;
use crate::ledger::{HeroLedger, Receipt};
use tracing::info;
use valor_core::{AttributeCode, Cost, Error, HeroId, Result};
use valor_db::{NewAttributeOperation, PendingWrite};

/// Attribute spending on behalf of a [`HeroLedger`]
pub struct AttributeAllocation<'a> {
    ledger: &'a HeroLedger,
}

impl<'a> AttributeAllocation<'a> {
    pub(crate) fn new(ledger: &'a HeroLedger) -> Self {
        Self { ledger }
    }

    /// Raise `code` by `points`, paying the configured experience cost
    pub fn allocate(&self, hero_id: HeroId, code: &AttributeCode, points: i64) -> Result<Receipt> {
        let mut spent = 0;
        let receipt = self.ledger.transact(hero_id, "allocate_attribute", |txn| {
            if points <= 0 {
                return Err(Error::InvalidParams(format!(
                    "points to add must be positive, got {}",
                    points
                )));
            }
            let points = u32::try_from(points)
                .map_err(|_| Error::InvalidParams(format!("{} points is too many", points)))?;
            if txn.defs.get_attribute(code).is_none() {
                return Err(Error::ResourceNotFound(format!("attribute {}", code)));
            }

            let mut attribute = txn
                .store
                .attribute(hero_id, code)
                .map_err(store_error)?
                .ok_or_else(|| {
                    Error::InvalidParams(format!("attribute {} of {} is not initialized", code, hero_id))
                })?;

            let value_before = attribute.value;
            let value_after = value_before
                .checked_add(points)
                .ok_or_else(|| Error::InvalidParams(format!("{} points overflow {}", points, code)))?;
            let xp = txn
                .defs
                .attribute_costs
                .calculate_cost(value_before, value_after)?;

            txn.hero.debit(Cost::xp(xp))?;
            spent = xp;

            attribute.value = value_after;
            attribute.spent_xp += xp;
            txn.push(PendingWrite::PutAttribute(attribute));
            txn.push(PendingWrite::AppendAttributeOperation(NewAttributeOperation {
                code: code.clone(),
                points_added: points,
                xp_spent: xp,
                value_before,
                value_after,
                created_at: txn.now,
                rollback_deadline: txn.rollback_deadline(),
            }));

            txn.auto_level();
            Ok(())
        })?;

        info!(
            hero_id = %hero_id,
            attribute = %code,
            points,
            xp = spent,
            "attribute allocated"
        );
        Ok(receipt)
    }

    /// Undo the most recent live allocation of `code`
    ///
    /// Only that allocation is considered: once it has expired, older ones
    /// stay locked behind it. The hero's level is left as it is.
    pub fn rollback(&self, hero_id: HeroId, code: &AttributeCode) -> Result<Receipt> {
        let receipt = self.ledger.transact(hero_id, "rollback_attribute", |txn| {
            let log = txn
                .store
                .attribute_operations(hero_id, code)
                .map_err(store_error)?;
            let op = txn.reverse(log)?;

            let mut attribute = txn
                .store
                .attribute(hero_id, code)
                .map_err(store_error)?
                .ok_or_else(|| Error::internal(format!("attribute {} of {} vanished", code, hero_id)))?;
            attribute.spent_xp = attribute.spent_xp.checked_sub(op.xp_spent).ok_or_else(|| {
                Error::internal(format!("{} refund exceeds xp invested in {}", op.id, code))
            })?;
            attribute.value = op.value_before;

            txn.push(PendingWrite::PutAttribute(attribute));
            txn.push(PendingWrite::MarkAttributeOperationRolledBack {
                id: op.id,
                at: txn.now,
            });
            Ok(())
        })?;

        info!(
            hero_id = %hero_id,
            attribute = %code,
            operation = ?receipt.operation_id,
            "attribute allocation rolled back"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, force_hero, t0, warrior, Fixture};
    use chrono::Duration;
    use valor_core::{AllocatedAttribute, ErrorCode, LevelUp, Reversible};
    use valor_db::NewHero;

    fn str_code() -> AttributeCode {
        AttributeCode::new("STR")
    }

    /// spent_xp matches the live operations of the attribute
    fn assert_attribute_consistent(ledger: &HeroLedger, hero_id: HeroId, code: &AttributeCode) {
        let attribute = ledger.attribute(hero_id, code).unwrap();
        let live: u64 = ledger
            .attribute_operations(hero_id, code)
            .unwrap()
            .iter()
            .filter(|op| !op.is_rolled_back())
            .map(|op| op.xp_spent)
            .sum();
        assert_eq!(attribute.spent_xp, live);
        assert!(ledger.hero(hero_id).unwrap().is_balanced());
    }

    #[test]
    fn test_allocate_debits_experience() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 100);

        let receipt = ledger.allocation().allocate(hero.id, &str_code(), 2).unwrap();
        assert_eq!(receipt.hero.experience_available, 20);
        assert_eq!(receipt.hero.experience_spent, 80);
        assert_eq!(receipt.hero.experience_total, 100);
        assert!(receipt.operation_id.is_some());

        let attribute = ledger.attribute(hero.id, &str_code()).unwrap();
        assert_eq!(attribute.value, 3);
        assert_eq!(attribute.spent_xp, 80);

        let log = ledger.attribute_operations(hero.id, &str_code()).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].value_before, 1);
        assert_eq!(log[0].value_after, 3);
        assert_eq!(log[0].points_added, 2);
        assert_eq!(log[0].rollback_deadline, t0() + Duration::hours(1));
        assert_attribute_consistent(&ledger, hero.id, &str_code());
    }

    #[test]
    fn test_allocate_then_rollback_restores_everything() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 100);
        let before = ledger.attribute(hero.id, &str_code()).unwrap();

        ledger.allocation().allocate(hero.id, &str_code(), 2).unwrap();
        let receipt = ledger.allocation().rollback(hero.id, &str_code()).unwrap();

        assert_eq!(receipt.hero.experience_available, 100);
        assert_eq!(receipt.hero.experience_spent, 0);
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap(), before);

        let log = ledger.attribute_operations(hero.id, &str_code()).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].rolled_back_at, Some(t0()));
        assert_eq!(receipt.operation_id, Some(log[0].id));
        assert_attribute_consistent(&ledger, hero.id, &str_code());
    }

    #[test]
    fn test_rollback_is_lifo() {
        let Fixture { ledger, clock } = fixture();
        let hero = warrior(&ledger, 300);

        ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();
        clock.advance(Duration::seconds(1));
        ledger.allocation().allocate(hero.id, &str_code(), 2).unwrap();
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap().value, 4);

        ledger.allocation().rollback(hero.id, &str_code()).unwrap();
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap().value, 2);
        assert_attribute_consistent(&ledger, hero.id, &str_code());

        ledger.allocation().rollback(hero.id, &str_code()).unwrap();
        let attribute = ledger.attribute(hero.id, &str_code()).unwrap();
        assert_eq!(attribute, AllocatedAttribute::initial(hero.id, str_code()));

        let err = ledger.allocation().rollback(hero.id, &str_code()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
        assert_eq!(ledger.hero(hero.id).unwrap().experience_available, 300);
    }

    #[test]
    fn test_rollback_is_scoped_to_the_attribute() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 200);
        ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();

        let err = ledger.allocation().rollback(hero.id, &"AGI".into()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap().value, 2);
    }

    #[test]
    fn test_rollback_deadline_boundary() {
        let Fixture { ledger, clock } = fixture();
        let hero = warrior(&ledger, 100);
        ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();

        clock.set(t0() + Duration::hours(1));
        ledger.allocation().rollback(hero.id, &str_code()).unwrap();

        clock.set(t0());
        ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();
        clock.set(t0() + Duration::hours(1) + Duration::microseconds(1));
        let err = ledger.allocation().rollback(hero.id, &str_code()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OperationExpired);
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap().value, 2);
    }

    #[test]
    fn test_expired_top_blocks_older_entries() {
        let Fixture { ledger, clock } = fixture();
        let hero = warrior(&ledger, 300);
        ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();
        clock.advance(Duration::minutes(30));
        ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();

        clock.advance(Duration::minutes(61));
        let err = ledger.allocation().rollback(hero.id, &str_code()).unwrap_err();
        let top = ledger.attribute_operations(hero.id, &str_code()).unwrap()[1].clone();
        assert_eq!(
            err,
            Error::OperationExpired {
                deadline: top.rollback_deadline,
                now: t0() + Duration::minutes(91),
            }
        );
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap().value, 3);
    }

    #[test]
    fn test_insufficient_experience_changes_nothing() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 79);

        let err = ledger.allocation().allocate(hero.id, &str_code(), 2).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientExperience {
                required: 80,
                available: 79
            }
        );
        assert_eq!(ledger.hero(hero.id).unwrap(), hero);
        assert_eq!(ledger.attribute(hero.id, &str_code()).unwrap().value, 1);
        assert!(ledger
            .attribute_operations(hero.id, &str_code())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_allocate_rejects_bad_input() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 100);

        for points in [0, -1] {
            let err = ledger.allocation().allocate(hero.id, &str_code(), points).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidParams);
        }
        let err = ledger.allocation().allocate(hero.id, &"LUK".into(), 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);

        let err = ledger
            .allocation()
            .allocate(HeroId::new(99), &str_code(), 1)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::HeroNotFound);
    }

    #[test]
    fn test_allocate_uninitialized_attribute() {
        let Fixture { ledger, .. } = fixture();
        let hero = ledger
            .store()
            .create_hero(NewHero {
                class_id: "warrior".into(),
                name: "Brann".to_string(),
                created_at: t0(),
                attributes: vec!["AGI".into()],
                initial_skills: Vec::new(),
            })
            .unwrap();
        ledger.add_experience(hero.id, 100).unwrap();
        let before = ledger.hero(hero.id).unwrap();

        let err = ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
        assert_eq!(ledger.hero(hero.id).unwrap(), before);
        assert!(ledger.attribute_operations(hero.id, &str_code()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_cost_row_is_internal() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 1000);
        let err = ledger.allocation().allocate(hero.id, &str_code(), 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(ledger.hero(hero.id).unwrap().experience_spent, 0);
    }

    #[test]
    fn test_rollback_never_demotes() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 100);
        assert_eq!(hero.current_level, 2);

        ledger.allocation().allocate(hero.id, &str_code(), 2).unwrap();
        let receipt = ledger.allocation().rollback(hero.id, &str_code()).unwrap();
        assert_eq!(receipt.hero.current_level, 2);
        assert_eq!(receipt.level_up, None);
    }

    #[test]
    fn test_allocate_runs_auto_level() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 100);
        // level table was extended after the grant
        force_hero(&ledger, hero.id, |h| h.current_level = 1);

        let receipt = ledger.allocation().allocate(hero.id, &str_code(), 1).unwrap();
        assert_eq!(receipt.level_up, Some(LevelUp { from: 1, to: 2 }));
        assert_eq!(receipt.hero.current_level, 2);
    }

    #[test]
    fn test_concurrent_allocations_never_double_spend() {
        let Fixture { ledger, .. } = fixture();
        let hero = warrior(&ledger, 100);
        let barrier = std::sync::Barrier::new(2);

        let results: Vec<Result<Receipt>> = std::thread::scope(|s| {
            let handles: Vec<_> = ["STR", "AGI"]
                .into_iter()
                .map(|code| {
                    let ledger = &ledger;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        ledger.allocation().allocate(hero.id, &code.into(), 2)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        let failed = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(failed.code(), ErrorCode::InsufficientExperience);

        let hero = ledger.hero(hero.id).unwrap();
        assert_eq!(hero.experience_available, 20);
        assert_eq!(hero.experience_spent, 80);
        assert_attribute_consistent(&ledger, hero.id, &str_code());
        assert_attribute_consistent(&ledger, hero.id, &"AGI".into());
    }
}
