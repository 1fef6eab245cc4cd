//! Per-identity daily quota enforcement.
//!
//! [`QuotaStore`] counts admitted requests per `(identity, category, day)`
//! and refuses once a category's ceiling is reached.  Counters are never
//! reset in place: a new UTC day produces a new key, and [`QuotaStore::sweep`]
//! drops keys from earlier days.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use fg_domain::config::QuotaConfig;
use fg_domain::Category;

use crate::clock::{DayKey, SharedClock};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QuotaKey {
    identity: String,
    category: Category,
    day: DayKey,
}

/// Outcome of a single [`QuotaStore::check_and_consume`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDecision {
    pub admitted: bool,
    /// Count after this call (unchanged on rejection).
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    /// Next UTC midnight, when today's counters stop applying.
    pub reset_at: DateTime<Utc>,
}

/// Today's usage for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    pub used: u32,
    pub limit: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// QuotaStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-memory daily counter store.
///
/// Backed by a sharded `DashMap`: the check and the increment for one key
/// happen under that key's shard lock, so two requests racing at
/// `ceiling - 1` cannot both be admitted.
pub struct QuotaStore {
    limits: QuotaConfig,
    clock: SharedClock,
    counts: DashMap<QuotaKey, u32>,
}

impl QuotaStore {
    pub fn new(limits: QuotaConfig, clock: SharedClock) -> Self {
        Self {
            limits,
            clock,
            counts: DashMap::new(),
        }
    }

    pub fn limit_for(&self, category: Category) -> u32 {
        self.limits.limit_for(category)
    }

    /// Admit one request for `identity` in `category` if today's count is
    /// below the ceiling, incrementing the count on success.
    ///
    /// Rejections leave the store untouched.
    pub fn check_and_consume(&self, identity: &str, category: Category) -> QuotaDecision {
        let limit = self.limit_for(category);
        let day = DayKey::of(self.clock.now());
        let reset_at = day.next_midnight();
        let key = QuotaKey {
            identity: identity.to_owned(),
            category,
            day,
        };

        let rejected = |used: u32| QuotaDecision {
            admitted: false,
            used,
            limit,
            remaining: 0,
            reset_at,
        };

        let used = match self.counts.entry(key) {
            Entry::Occupied(mut e) => {
                let current = *e.get();
                if current >= limit {
                    return rejected(current);
                }
                *e.get_mut() = current + 1;
                current + 1
            }
            Entry::Vacant(e) => {
                if limit == 0 {
                    return rejected(0);
                }
                e.insert(1);
                1
            }
        };

        QuotaDecision {
            admitted: true,
            used,
            limit,
            remaining: limit - used,
            reset_at,
        }
    }

    /// Today's usage for every category, `used = 0` where nothing was
    /// recorded yet.
    pub fn usage_snapshot(&self, identity: &str) -> BTreeMap<Category, CategoryUsage> {
        let day = DayKey::of(self.clock.now());
        Category::ALL
            .iter()
            .map(|&category| {
                let key = QuotaKey {
                    identity: identity.to_owned(),
                    category,
                    day,
                };
                let used = self.counts.get(&key).map(|v| *v).unwrap_or(0);
                (
                    category,
                    CategoryUsage {
                        used,
                        limit: self.limit_for(category),
                    },
                )
            })
            .collect()
    }

    /// Drop every record from a day before today and return how many were
    /// removed.
    ///
    /// Shards are locked one at a time, so request-path calls on other
    /// shards proceed during the sweep.  Today's keys (and any from a later
    /// day, should the clock step back) are always kept.
    pub fn sweep(&self) -> usize {
        let today = DayKey::of(self.clock.now());
        let mut removed = 0;
        self.counts.retain(|key, _| {
            let keep = key.day >= today;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of live records (all days).
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
