use std::sync::RwLock;

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::Result;
use crate::game_store::GameSource;

struct CacheEntry<T> {
    value: T,
    computed_at: NaiveDateTime,
    ttl: ChronoDuration,
}

/// A single memoized value with a time-to-live. Recomputation runs outside
/// the lock; two callers may both recompute after expiry and the last write
/// wins.
pub struct ExpiringCache<T> {
    slot: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Clone> ExpiringCache<T> {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn get_or_refresh<E>(
        &self,
        now: NaiveDateTime,
        ttl_for: impl FnOnce(NaiveDateTime) -> ChronoDuration,
        compute: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        if let Some(value) = self.fresh(now) {
            return Ok(value);
        }
        let value = compute()?;
        let entry = CacheEntry {
            value: value.clone(),
            computed_at: now,
            ttl: ttl_for(now),
        };
        let mut guard = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(entry);
        Ok(value)
    }

    pub fn fresh(&self, now: NaiveDateTime) -> Option<T> {
        let guard = self
            .slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = guard.as_ref()?;
        if now.signed_duration_since(entry.computed_at) > entry.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn invalidate(&self) {
        let mut guard = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }
}

impl<T: Clone> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Midnight of the first May 1st strictly after `now`.
pub fn next_may_first(now: NaiveDateTime) -> NaiveDateTime {
    let this_year = may_first(now.year());
    match this_year {
        Some(at) if now < at => at,
        _ => may_first(now.year() + 1).unwrap_or(now + ChronoDuration::days(365)),
    }
}

pub fn until_next_may_first(now: NaiveDateTime) -> ChronoDuration {
    next_may_first(now).signed_duration_since(now)
}

fn may_first(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 5, 1)?.and_hms_opt(0, 0, 0)
}

pub struct PlayerIdCache {
    inner: ExpiringCache<Vec<String>>,
}

impl PlayerIdCache {
    pub const fn new() -> Self {
        Self {
            inner: ExpiringCache::new(),
        }
    }

    pub fn player_ids_at(&self, source: &dyn GameSource, now: NaiveDateTime) -> Result<Vec<String>> {
        self.inner.get_or_refresh(now, until_next_may_first, || {
            let ids = source.distinct_player_ids()?;
            debug!(count = ids.len(), "refreshed player id list");
            Ok(ids)
        })
    }

    pub fn player_ids(&self, source: &dyn GameSource) -> Result<Vec<String>> {
        self.player_ids_at(source, Local::now().naive_local())
    }

    pub fn invalidate(&self) {
        self.inner.invalidate();
    }
}

impl Default for PlayerIdCache {
    fn default() -> Self {
        Self::new()
    }
}

pub static PLAYER_IDS: Lazy<PlayerIdCache> = Lazy::new(PlayerIdCache::new);

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn next_may_first_rolls_over_on_the_day() {
        assert_eq!(next_may_first(at(2025, 3, 10, 12)), at(2025, 5, 1, 0));
        assert_eq!(next_may_first(at(2025, 5, 1, 0)), at(2026, 5, 1, 0));
        assert_eq!(next_may_first(at(2025, 9, 1, 8)), at(2026, 5, 1, 0));
    }

    #[test]
    fn recomputes_once_after_expiry() {
        let cache: ExpiringCache<u32> = ExpiringCache::new();
        let calls = Cell::new(0);
        let load = || -> std::result::Result<u32, ()> {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };

        let first = cache.get_or_refresh(at(2025, 4, 1, 0), until_next_may_first, load);
        assert_eq!(first, Ok(1));
        let cached = cache.get_or_refresh(at(2025, 4, 30, 23), until_next_may_first, load);
        assert_eq!(cached, Ok(1));
        // Exactly at expiry the entry is still served.
        let boundary = cache.get_or_refresh(at(2025, 5, 1, 0), until_next_may_first, load);
        assert_eq!(boundary, Ok(1));
        let refreshed = cache.get_or_refresh(at(2025, 5, 1, 1), until_next_may_first, load);
        assert_eq!(refreshed, Ok(2));
        let again = cache.get_or_refresh(at(2025, 5, 2, 0), until_next_may_first, load);
        assert_eq!(again, Ok(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_refresh_keeps_nothing() {
        let cache: ExpiringCache<u32> = ExpiringCache::new();
        let out = cache.get_or_refresh(at(2025, 1, 1, 0), until_next_may_first, || Err("down"));
        assert_eq!(out, Err("down"));
        assert!(cache.fresh(at(2025, 1, 1, 0)).is_none());
    }
}
