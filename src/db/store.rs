use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::db::migrations::run_migrations;
use crate::db::repository::{HabitRepo, RecordRepo};
use crate::db::{HabitStore, RecordStore, StoreError, StoreResult};
use crate::models::{CompletionRecord, DateRange, Habit, HabitDraft, HabitUpdate};
use crate::utils::time;

/// Tuning for the data-access context. Built from `[store]` in config.toml.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    /// How long a loaded habit list is served without going back to disk
    pub stale_after: Duration,
    /// Extra attempts for reads that hit a locked database
    pub read_retries: u32,
    pub retry_backoff: Duration,
    pub max_backoff: Duration,
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(5 * 60),
            read_retries: 3,
            retry_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            busy_timeout: Duration::from_millis(250),
        }
    }
}

impl StoreOptions {
    /// Delay before retry number `attempt` (0-based): doubles each time, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.retry_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

struct HabitCache {
    loaded_at: Instant,
    habits: Vec<Habit>,
}

/// SQLite-backed habit and record store.
///
/// Owns the connection and a short-lived copy of the habit list. Construct
/// one per process and hand it to whatever needs store access.
pub struct SqliteStore {
    conn: Connection,
    options: StoreOptions,
    habits: RefCell<Option<HabitCache>>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        // WAL lets a dashboard and a CLI invocation share the file
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!("Opened store at {:?}", path.as_ref());
        Self::from_connection(conn, options)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory(options: StoreOptions) -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, options)
    }

    fn from_connection(conn: Connection, options: StoreOptions) -> StoreResult<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn,
            options,
            habits: RefCell::new(None),
        })
    }

    /// Run a read, retrying with backoff while the database is locked.
    fn read<T>(&self, op: impl Fn(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let mut attempt = 0;
        loop {
            match op(&self.conn) {
                Err(e) if e.is_busy() && attempt < self.options.read_retries => {
                    let delay = self.options.backoff_for(attempt);
                    warn!("Store busy, retrying read in {:?} (attempt {})", delay, attempt + 1);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn cached_habits(&self) -> Option<Vec<Habit>> {
        let cache = self.habits.borrow();
        cache
            .as_ref()
            .filter(|c| c.loaded_at.elapsed() < self.options.stale_after)
            .map(|c| c.habits.clone())
    }

    fn remember(&self, habits: Vec<Habit>) {
        *self.habits.borrow_mut() = Some(HabitCache {
            loaded_at: Instant::now(),
            habits,
        });
    }

    /// Create a habit with an explicit creation time (imports, tests).
    pub fn create_habit_at(
        &self,
        draft: HabitDraft,
        created_at: NaiveDateTime,
    ) -> StoreResult<Habit> {
        draft.validate()?;
        let habit = draft.into_habit(uuid::Uuid::new_v4().to_string(), created_at);

        let tx = self.conn.unchecked_transaction()?;
        let mut habits = HabitRepo::load(&tx)?;
        habits.push(habit.clone());
        HabitRepo::save(&tx, &habits)?;
        tx.commit()?;

        info!("Created habit {} ({})", habit.name, habit.id);
        self.remember(habits);
        Ok(habit)
    }

    pub fn list_all_records(&self) -> StoreResult<Vec<CompletionRecord>> {
        self.read(RecordRepo::get_all)
    }

    fn check_values(record: &CompletionRecord) -> StoreResult<()> {
        if !record.actual_value.is_finite() || record.actual_value <= 0.0 {
            return Err(StoreError::Invalid(format!(
                "logged value must be a positive number, got {}",
                record.actual_value
            )));
        }
        if !record.required_value.is_finite() || record.required_value <= 0.0 {
            return Err(StoreError::Invalid(format!(
                "required value must be a positive number, got {}",
                record.required_value
            )));
        }
        Ok(())
    }

    /// Write a record under an immediate transaction, re-reading the habit
    /// list from disk so a delete made through another connection is seen.
    fn write_record(
        &self,
        record: &CompletionRecord,
        write: impl FnOnce(&Connection, &CompletionRecord) -> StoreResult<()>,
    ) -> StoreResult<()> {
        Self::check_values(record)?;

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let habits = HabitRepo::load(&tx)?;
        let exists = habits.iter().any(|h| h.id == record.habit_id);
        if exists {
            write(&tx, record)?;
            tx.commit()?;
        }
        self.remember(habits);

        if !exists {
            return Err(StoreError::not_found(format!("habit {}", record.habit_id)));
        }
        Ok(())
    }
}

impl HabitStore for SqliteStore {
    fn list_habits(&self) -> StoreResult<Vec<Habit>> {
        if let Some(habits) = self.cached_habits() {
            return Ok(habits);
        }
        let habits = self.read(HabitRepo::load)?;
        debug!("Loaded {} habits from store", habits.len());
        self.remember(habits.clone());
        Ok(habits)
    }

    fn find_habit(&self, id: &str) -> StoreResult<Option<Habit>> {
        Ok(self.list_habits()?.into_iter().find(|h| h.id == id))
    }

    fn create_habit(&self, draft: HabitDraft) -> StoreResult<Habit> {
        self.create_habit_at(draft, time::now())
    }

    fn update_habit(&self, id: &str, update: &HabitUpdate) -> StoreResult<Habit> {
        update.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let mut habits = HabitRepo::load(&tx)?;
        let habit = habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::not_found(format!("habit {}", id)))?;
        update.apply(habit);
        let updated = habit.clone();
        HabitRepo::save(&tx, &habits)?;
        tx.commit()?;

        info!("Updated habit {}", id);
        self.remember(habits);
        Ok(updated)
    }

    fn delete_habit(&self, id: &str) -> StoreResult<Habit> {
        let tx = self.conn.unchecked_transaction()?;
        let mut habits = HabitRepo::load(&tx)?;
        let idx = habits
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| StoreError::not_found(format!("habit {}", id)))?;
        let removed = habits.remove(idx);
        HabitRepo::save(&tx, &habits)?;
        let records = RecordRepo::delete_by_habit_id(&tx, id)?;
        tx.commit()?;

        info!("Deleted habit {} and {} records", removed.name, records);
        self.remember(habits);
        Ok(removed)
    }
}

impl RecordStore for SqliteStore {
    fn create_record(&self, record: CompletionRecord) -> StoreResult<CompletionRecord> {
        self.write_record(&record, RecordRepo::insert)?;
        debug!("Logged {} for habit {}", record.actual_value, record.habit_id);
        Ok(record)
    }

    fn update_record(&self, record: CompletionRecord) -> StoreResult<CompletionRecord> {
        self.write_record(&record, |conn, r| {
            if RecordRepo::update(conn, r)? == 0 {
                return Err(StoreError::not_found(format!("record {}", r.id)));
            }
            Ok(())
        })?;
        Ok(record)
    }

    fn delete_record(&self, id: &str) -> StoreResult<CompletionRecord> {
        let record = RecordRepo::get(&self.conn, id)?
            .ok_or_else(|| StoreError::not_found(format!("record {}", id)))?;
        RecordRepo::delete(&self.conn, id)?;
        debug!("Deleted record {} of habit {}", id, record.habit_id);
        Ok(record)
    }

    fn get_record(&self, id: &str) -> StoreResult<Option<CompletionRecord>> {
        self.read(|conn| RecordRepo::get(conn, id))
    }

    fn list_by_habit_id(&self, habit_id: &str) -> StoreResult<Vec<CompletionRecord>> {
        self.read(|conn| RecordRepo::get_by_habit_id(conn, habit_id))
    }

    fn list_by_habit_ids(
        &self,
        habit_ids: &[&str],
        range: DateRange,
    ) -> StoreResult<Vec<CompletionRecord>> {
        self.read(|conn| RecordRepo::get_by_habit_ids_in_range(conn, habit_ids, range))
    }

    fn delete_by_habit_id(&self, habit_id: &str) -> StoreResult<usize> {
        let removed = RecordRepo::delete_by_habit_id(&self.conn, habit_id)?;
        debug!("Deleted {} records of habit {}", removed, habit_id);
        Ok(removed)
    }

    fn latest_on(&self, habit_id: &str, date: NaiveDate) -> StoreResult<Option<CompletionRecord>> {
        self.read(|conn| RecordRepo::latest_in_range(conn, habit_id, DateRange::day(date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequiredType, WeekdaySet};
    use crate::stats;

    fn store() -> SqliteStore {
        SqliteStore::in_memory(StoreOptions::default()).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate, h: u32) -> NaiveDateTime {
        day.and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn create_returns_habit_and_lists_it() {
        let store = store();
        let habit = store
            .create_habit(HabitDraft::new("Meditate").goal(10.0, RequiredType::Minutes))
            .unwrap();
        assert!(!habit.id.is_empty());
        assert_eq!(store.list_habits().unwrap(), vec![habit.clone()]);
        assert_eq!(store.find_habit(&habit.id).unwrap(), Some(habit));
        assert_eq!(store.find_habit("nope").unwrap(), None);
    }

    #[test]
    fn invalid_drafts_are_rejected() {
        let store = store();
        let err = store
            .create_habit(HabitDraft::new("Read").on_days(WeekdaySet::EMPTY))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(store.list_habits().unwrap().is_empty());
    }

    #[test]
    fn update_changes_goal_but_not_history() {
        let store = store();
        let habit = store
            .create_habit_at(HabitDraft::new("Run").goal(20.0, RequiredType::Minutes), at(date(2024, 1, 1), 7))
            .unwrap();
        let record = store
            .create_record(CompletionRecord::for_habit(&habit, 20.0, at(date(2024, 1, 2), 7)))
            .unwrap();

        let updated = store
            .update_habit(
                &habit.id,
                &HabitUpdate {
                    name: Some("Morning run".to_string()),
                    required_value: Some(40.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Morning run");
        assert_eq!(updated.required_value, 40.0);
        assert_eq!(updated.created_at, habit.created_at);
        assert_eq!(updated.frequency, habit.frequency);

        let stored = store.get_record(&record.id).unwrap().unwrap();
        assert_eq!(stored.required_value, 20.0);

        let records = store.list_by_habit_id(&habit.id).unwrap();
        assert_eq!(
            stats::aggregate::classify_day(&updated, &records, date(2024, 1, 2), date(2024, 1, 3)),
            crate::models::DayStatus::Completed
        );
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let store = store();
        assert!(store.update_habit("x", &HabitUpdate::default()).unwrap_err().is_not_found());
        assert!(store.delete_habit("x").unwrap_err().is_not_found());
        assert!(store.delete_record("x").unwrap_err().is_not_found());

        let orphan = CompletionRecord {
            id: "r".to_string(),
            habit_id: "missing".to_string(),
            required_value: 1.0,
            required_type: RequiredType::Times,
            actual_value: 1.0,
            completed_at: at(date(2024, 1, 1), 9),
        };
        assert!(store.create_record(orphan).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_cascades_to_records() {
        let store = store();
        let keep = store.create_habit(HabitDraft::new("Keep")).unwrap();
        let gone = store.create_habit(HabitDraft::new("Drop")).unwrap();
        for h in [&keep, &gone] {
            store
                .create_record(CompletionRecord::for_habit(h, 1.0, time::now()))
                .unwrap();
        }

        let removed = store.delete_habit(&gone.id).unwrap();
        assert_eq!(removed.id, gone.id);
        assert!(store.list_by_habit_id(&gone.id).unwrap().is_empty());
        assert_eq!(store.list_by_habit_id(&keep.id).unwrap().len(), 1);
        assert_eq!(store.list_habits().unwrap(), vec![keep]);
    }

    #[test]
    fn delete_by_habit_id_leaves_other_habits_alone() {
        let store = store();
        let water = store.create_habit(HabitDraft::new("Water")).unwrap();
        let walk = store.create_habit(HabitDraft::new("Walk")).unwrap();
        for value in [0.5, 0.25] {
            store
                .create_record(CompletionRecord::for_habit(&water, value, time::now()))
                .unwrap();
        }
        store
            .create_record(CompletionRecord::for_habit(&walk, 1.0, time::now()))
            .unwrap();

        assert_eq!(store.delete_by_habit_id(&water.id).unwrap(), 2);
        assert!(store.list_by_habit_id(&water.id).unwrap().is_empty());
        assert_eq!(store.list_by_habit_id(&walk.id).unwrap().len(), 1);
        assert_eq!(store.delete_by_habit_id(&water.id).unwrap(), 0);
        assert_eq!(store.list_habits().unwrap().len(), 2);
    }

    #[test]
    fn writes_see_a_habit_deleted_through_another_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let dashboard = SqliteStore::open(&path, StoreOptions::default()).unwrap();
        let cli = SqliteStore::open(&path, StoreOptions::default()).unwrap();

        let habit = dashboard.create_habit(HabitDraft::new("Stretch")).unwrap();
        let logged = dashboard
            .create_record(CompletionRecord::for_habit(&habit, 1.0, time::now()))
            .unwrap();

        cli.delete_habit(&habit.id).unwrap();
        // Still within the dashboard's cache window
        assert_eq!(dashboard.list_habits().unwrap().len(), 1);

        let err = dashboard
            .create_record(CompletionRecord::for_habit(&habit, 1.0, time::now()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(cli.list_by_habit_id(&habit.id).unwrap().is_empty());

        let mut edited = logged;
        edited.actual_value = 2.0;
        assert!(dashboard.update_record(edited).unwrap_err().is_not_found());
        assert!(cli.list_by_habit_id(&habit.id).unwrap().is_empty());

        // The failed write refreshed the cache from disk
        assert!(dashboard.list_habits().unwrap().is_empty());
    }

    #[test]
    fn undo_removes_only_the_latest_record_of_the_day() {
        let store = store();
        let habit = store
            .create_habit_at(HabitDraft::new("Pushups").goal(3.0, RequiredType::Times), at(date(2024, 1, 1), 6))
            .unwrap();
        let day = date(2024, 1, 4);
        let first = store
            .create_record(CompletionRecord::for_habit(&habit, 1.0, at(day, 8)))
            .unwrap();
        let second = store
            .create_record(CompletionRecord::for_habit(&habit, 1.0, at(day, 12)))
            .unwrap();
        let other_day = store
            .create_record(CompletionRecord::for_habit(&habit, 1.0, at(date(2024, 1, 5), 9)))
            .unwrap();

        assert_eq!(store.undo_last(&habit.id, day).unwrap(), Some(second));
        let left: Vec<_> = store
            .list_by_habit_id(&habit.id)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(left, vec![other_day.id, first.id]);
        assert_eq!(store.undo_last(&habit.id, date(2024, 1, 6)).unwrap(), None);
    }

    #[test]
    fn rejects_non_positive_log_values() {
        let store = store();
        let habit = store.create_habit(HabitDraft::new("Water")).unwrap();
        let record = CompletionRecord::for_habit(&habit, 0.0, time::now());
        assert!(matches!(store.create_record(record), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn update_record_requires_existing_row() {
        let store = store();
        let habit = store.create_habit(HabitDraft::new("Water")).unwrap();
        let mut record = store
            .create_record(CompletionRecord::for_habit(&habit, 0.5, time::now()))
            .unwrap();
        record.actual_value = 0.75;
        assert_eq!(store.update_record(record.clone()).unwrap().actual_value, 0.75);

        record.id = "unknown".to_string();
        assert!(store.update_record(record).unwrap_err().is_not_found());
    }

    #[test]
    fn fresh_cache_hides_outside_writes_until_stale() {
        let store = store();
        store.create_habit(HabitDraft::new("Cached")).unwrap();
        HabitRepo::save(&store.conn, &[]).unwrap();
        assert_eq!(store.list_habits().unwrap().len(), 1);

        let store = SqliteStore::in_memory(StoreOptions {
            stale_after: Duration::ZERO,
            ..StoreOptions::default()
        })
        .unwrap();
        store.create_habit(HabitDraft::new("Uncached")).unwrap();
        HabitRepo::save(&store.conn, &[]).unwrap();
        assert!(store.list_habits().unwrap().is_empty());
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let options = StoreOptions::default();
        assert_eq!(options.backoff_for(0), Duration::from_secs(1));
        assert_eq!(options.backoff_for(1), Duration::from_secs(2));
        assert_eq!(options.backoff_for(3), Duration::from_secs(8));
        assert_eq!(options.backoff_for(5), Duration::from_secs(30));
        assert_eq!(options.backoff_for(40), Duration::from_secs(30));
    }

    #[test]
    fn busy_errors_are_detected() {
        let busy = StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(busy.is_busy());
        assert!(!StoreError::not_found("x").is_busy());
    }

    #[test]
    fn data_survives_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.db");
        let habit = {
            let store = SqliteStore::open(&path, StoreOptions::default()).unwrap();
            let habit = store.create_habit(HabitDraft::new("Journal")).unwrap();
            store
                .create_record(CompletionRecord::for_habit(&habit, 1.0, time::now()))
                .unwrap();
            habit
        };

        let store = SqliteStore::open(&path, StoreOptions::default()).unwrap();
        assert_eq!(store.list_habits().unwrap(), vec![habit.clone()]);
        assert_eq!(store.list_by_habit_id(&habit.id).unwrap().len(), 1);
        assert_eq!(store.list_all_records().unwrap().len(), 1);
    }

    #[test]
    fn range_listing_feeds_statistics() {
        let store = store();
        let created = date(2024, 1, 1);
        let habit = store
            .create_habit_at(HabitDraft::new("Read").goal(1.0, RequiredType::Times), at(created, 9))
            .unwrap();
        for d in [1, 2, 3, 4, 5, 7] {
            store
                .create_record(CompletionRecord::for_habit(&habit, 1.0, at(date(2024, 1, d), 20)))
                .unwrap();
        }
        let today = date(2024, 1, 7);
        let records = store
            .list_by_habit_ids(&[habit.id.as_str()], DateRange::trailing(today, 30))
            .unwrap();
        let stats = stats::compute_stats(&habit, &records, today, 30);
        assert_eq!((stats.streak, stats.success_days, stats.skipped_days), (1, 6, 1));
    }
}
