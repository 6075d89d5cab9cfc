//! Store trait definitions

use chrono::NaiveDate;

use crate::db::StoreResult;
use crate::models::{CompletionRecord, DateRange, Habit, HabitDraft, HabitUpdate};

/// Habit definitions. Every mutation returns the state it produced, so
/// callers never need to re-query to see their own write.
pub trait HabitStore {
    /// All habits in creation order
    fn list_habits(&self) -> StoreResult<Vec<Habit>>;

    fn find_habit(&self, id: &str) -> StoreResult<Option<Habit>>;

    /// Assigns id and creation time
    fn create_habit(&self, draft: HabitDraft) -> StoreResult<Habit>;

    fn update_habit(&self, id: &str, update: &HabitUpdate) -> StoreResult<Habit>;

    /// Removes the habit and every record logged against it
    fn delete_habit(&self, id: &str) -> StoreResult<Habit>;
}

/// Completion records. Lists are always newest first.
pub trait RecordStore {
    fn create_record(&self, record: CompletionRecord) -> StoreResult<CompletionRecord>;

    fn update_record(&self, record: CompletionRecord) -> StoreResult<CompletionRecord>;

    fn delete_record(&self, id: &str) -> StoreResult<CompletionRecord>;

    fn get_record(&self, id: &str) -> StoreResult<Option<CompletionRecord>>;

    fn list_by_habit_id(&self, habit_id: &str) -> StoreResult<Vec<CompletionRecord>>;

    fn list_by_habit_ids(
        &self,
        habit_ids: &[&str],
        range: DateRange,
    ) -> StoreResult<Vec<CompletionRecord>>;

    fn delete_by_habit_id(&self, habit_id: &str) -> StoreResult<usize>;

    /// Most recent record of the habit on `date`
    fn latest_on(&self, habit_id: &str, date: NaiveDate) -> StoreResult<Option<CompletionRecord>>;

    /// Delete the most recent record of the habit on `date`, if any
    fn undo_last(&self, habit_id: &str, date: NaiveDate) -> StoreResult<Option<CompletionRecord>> {
        match self.latest_on(habit_id, date)? {
            Some(record) => self.delete_record(&record.id).map(Some),
            None => Ok(None),
        }
    }
}
