//! Abstractions for time and client-side state to enable testing.
//!
//! This module provides traits for:
//! - `Clock`: Abstracting time access for deterministic testing
//! - `SessionStorage`: The small key/value bag that survives between
//!   requests (pending role, post-logout cleanup)

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};

// ==================== Clock Trait ====================

/// Trait for abstracting time access.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get the current time in the local timezone.
    fn now_local(&self) -> DateTime<Local>;

    /// Today's local calendar date, time truncated.
    fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Mock clock for testing with controllable time.
#[derive(Debug, Clone)]
pub struct MockClock {
    utc_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a new mock clock set to the given UTC time.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            utc_time: Arc::new(Mutex::new(time)),
        }
    }

    /// Set the mock clock to a new time.
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.utc_time.lock().unwrap() = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.utc_time.lock().unwrap();
        *time += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.utc_time.lock().unwrap()
    }

    fn now_local(&self) -> DateTime<Local> {
        self.now_utc().with_timezone(&Local)
    }
}

// ==================== SessionStorage Trait ====================

/// Key under which a role picked before sign-in is remembered.
pub const PENDING_ROLE_KEY: &str = "pendingRole";

/// Client-side flags that outlive a single request.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Drop every stored flag. Called on logout and account deletion.
    fn clear(&self) -> Result<()>;
}

/// In-memory storage; lives as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = Utc::now();
        let clock_time = clock.now_utc();
        let after = Utc::now();

        assert!(clock_time >= before);
        assert!(clock_time <= after);
    }

    #[test]
    fn test_mock_clock_returns_set_time() {
        let fixed_time = Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap();
        let clock = MockClock::new(fixed_time);

        assert_eq!(clock.now_utc(), fixed_time);
    }

    #[test]
    fn test_mock_clock_advance_changes_today() {
        let start = Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap();
        let clock = MockClock::new(start);
        let first = clock.today();

        clock.advance(chrono::Duration::days(1));

        assert_eq!(clock.today(), first.succ_opt().unwrap());
    }

    #[test]
    fn test_memory_storage_round_trip_and_clear() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set(PENDING_ROLE_KEY, "2").unwrap();
        storage.set("theme", "dark").unwrap();
        assert_eq!(storage.get(PENDING_ROLE_KEY).as_deref(), Some("2"));

        storage.remove("theme").unwrap();
        assert_eq!(storage.len(), 1);

        storage.clear().unwrap();
        assert!(storage.get(PENDING_ROLE_KEY).is_none());
    }

    #[test]
    fn test_memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        other.set("k", "v").unwrap();

        assert_eq!(storage.get("k").as_deref(), Some("v"));
    }
}
