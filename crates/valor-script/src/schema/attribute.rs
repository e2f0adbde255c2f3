//! Attribute catalog and point cost table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use valor_core::{AttributeCode, Error, Result};

/// Definition of a recognized attribute (e.g., STR, AGI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Unique code
    pub code: AttributeCode,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// XP price of raising an attribute to `point`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttributeCostRow {
    pub point: u32,
    pub xp: u64,
}

/// Per-point price list
///
/// The price of a range is the sum of its points, so costs are additive:
/// `cost(a, c) == cost(a, b) + cost(b, c)` for `a <= b <= c`.
#[derive(Debug, Clone, Default)]
pub struct AttributeCostTable {
    points: BTreeMap<u32, u64>,
}

impl AttributeCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning false if the point was already priced
    pub fn insert(&mut self, row: AttributeCostRow) -> bool {
        if self.points.contains_key(&row.point) {
            return false;
        }
        self.points.insert(row.point, row.xp);
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// XP needed to go from `from` points to `to` points
    ///
    /// Sums the price of points `from + 1 ..= to`. An empty or inverted
    /// range is free. A point without a row means the table is incomplete.
    pub fn calculate_cost(&self, from: u32, to: u32) -> Result<u64> {
        if from >= to {
            return Ok(0);
        }
        let mut total: u64 = 0;
        for point in (from + 1)..=to {
            let xp = self.points.get(&point).ok_or_else(|| {
                Error::Internal(format!("attribute cost table has no row for point {}", point))
            })?;
            total = total
                .checked_add(*xp)
                .ok_or_else(|| Error::internal("attribute cost overflow"))?;
        }
        Ok(total)
    }
}
