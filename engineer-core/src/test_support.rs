//! In-memory store for tests
//!
//! Mirrors the table semantics the dispatcher depends on: primary key on
//! `user_id`, zero-row updates for unknown ids, LEFT JOIN display fields.
//! Every trait call is counted so tests can assert that nothing reached the
//! store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DbError, DbResult};
use crate::model::{Engineer, EngineerRecord};
use crate::store::EngineerStore;

type FailureFn = fn() -> DbError;

/// Ada Lovelace at site 2 (London), status 1 (Active).
pub fn ada() -> Engineer {
    Engineer {
        user_id: 1,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        title: "Engineer II".to_string(),
        status_id: 1,
        site_id: 2,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<i32, Engineer>>,
    sites: HashMap<i32, String>,
    statuses: HashMap<i32, String>,
    calls: AtomicUsize,
    fail_next: Mutex<Option<FailureFn>>,
}

impl MemoryStore {
    /// Empty store with no lookup rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with sites 2 (London), 3 (Berlin) and statuses 1 (Active), 2 (On Leave).
    pub fn with_lookups() -> Self {
        Self {
            sites: HashMap::from([(2, "London".to_string()), (3, "Berlin".to_string())]),
            statuses: HashMap::from([(1, "Active".to_string()), (2, "On Leave".to_string())]),
            ..Self::default()
        }
    }

    /// Make the next store call fail with the given error.
    pub fn fail_next(&self, failure: FailureFn) {
        *self.fail_next.lock().unwrap() = Some(failure);
    }

    /// Number of trait calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }

    fn enter(&self) -> DbResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().unwrap().take() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }

    fn record(&self, engineer: &Engineer) -> EngineerRecord {
        EngineerRecord {
            engineer: engineer.clone(),
            site_name: self.sites.get(&engineer.site_id).cloned(),
            status: self.statuses.get(&engineer.status_id).cloned(),
        }
    }
}

fn duplicate_key() -> DbError {
    DbError::ConstraintViolation {
        constraint: Some("engineers_pkey".to_string()),
        source: sqlx::Error::Protocol("duplicate key value violates unique constraint".to_string()),
    }
}

#[async_trait]
impl EngineerStore for MemoryStore {
    async fn create(&self, engineer: &Engineer) -> DbResult<()> {
        self.enter()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&engineer.user_id) {
            return Err(duplicate_key());
        }
        rows.insert(engineer.user_id, engineer.clone());
        Ok(())
    }

    async fn update(&self, engineer: &Engineer) -> DbResult<u64> {
        self.enter()?;
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&engineer.user_id) {
            Some(row) => {
                *row = engineer.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn get_by_id(&self, user_id: i32) -> DbResult<Option<EngineerRecord>> {
        self.enter()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&user_id).map(|e| self.record(e)))
    }

    async fn get_all(&self) -> DbResult<Vec<EngineerRecord>> {
        self.enter()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().map(|e| self.record(e)).collect())
    }
}
