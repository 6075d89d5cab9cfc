use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::str::FromStr;

use crate::db::{StoreError, StoreResult};
use crate::models::{CompletionRecord, DateRange, Habit, RequiredType};
use crate::utils::time::{format_timestamp, parse_timestamp};

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

// ─── Habit list ──────────────────────────────────────────────────────────────

/// Key under which the whole habit list is stored as one JSON array
pub const HABITS_KEY: &str = "habits";

pub struct HabitRepo;

impl HabitRepo {
    pub fn load(conn: &Connection) -> StoreResult<Vec<Habit>> {
        match MetaRepo::get(conn, HABITS_KEY)? {
            None => Ok(Vec::new()),
            Some(blob) if blob.trim().is_empty() => Ok(Vec::new()),
            Some(blob) => Ok(serde_json::from_str(&blob)?),
        }
    }

    pub fn save(conn: &Connection, habits: &[Habit]) -> StoreResult<()> {
        let blob = serde_json::to_string(habits)?;
        MetaRepo::set(conn, HABITS_KEY, &blob)
    }
}

// ─── Completion records ──────────────────────────────────────────────────────

const RECORD_COLUMNS: &str =
    "id, habbitId, requiredValue, requiredType, actualValue, completedAt";

type RawRecord = (String, String, f64, String, f64, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, f64>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, f64>(4)?,
        row.get::<_, String>(5)?,
    ))
}

fn into_record(raw: RawRecord) -> StoreResult<CompletionRecord> {
    let (id, habit_id, required_value, required_type, actual_value, completed_at) = raw;
    let required_type = RequiredType::from_str(&required_type)
        .map_err(|e| StoreError::Corrupt(format!("record {}: {}", id, e)))?;
    let completed_at = parse_timestamp(&completed_at).ok_or_else(|| {
        StoreError::Corrupt(format!("record {}: bad timestamp '{}'", id, completed_at))
    })?;
    Ok(CompletionRecord {
        id,
        habit_id,
        required_value,
        required_type,
        actual_value,
        completed_at,
    })
}

fn collect_records<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<CompletionRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_row)?;

    let mut result = Vec::new();
    for r in rows {
        result.push(into_record(r?)?);
    }
    Ok(result)
}

pub struct RecordRepo;

impl RecordRepo {
    pub fn insert(conn: &Connection, record: &CompletionRecord) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO habbit_records (id, habbitId, requiredValue, requiredType, actualValue, completedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.habit_id,
                record.required_value,
                record.required_type.as_str(),
                record.actual_value,
                format_timestamp(record.completed_at),
            ],
        )?;
        Ok(())
    }

    /// Returns the number of rows changed (0 when the id is unknown)
    pub fn update(conn: &Connection, record: &CompletionRecord) -> StoreResult<usize> {
        let changed = conn.execute(
            "UPDATE habbit_records
             SET habbitId = ?1, requiredValue = ?2, requiredType = ?3, actualValue = ?4, completedAt = ?5
             WHERE id = ?6",
            params![
                record.habit_id,
                record.required_value,
                record.required_type.as_str(),
                record.actual_value,
                format_timestamp(record.completed_at),
                record.id,
            ],
        )?;
        Ok(changed)
    }

    pub fn delete(conn: &Connection, id: &str) -> StoreResult<usize> {
        Ok(conn.execute("DELETE FROM habbit_records WHERE id = ?1", params![id])?)
    }

    pub fn delete_by_habit_id(conn: &Connection, habit_id: &str) -> StoreResult<usize> {
        Ok(conn.execute(
            "DELETE FROM habbit_records WHERE habbitId = ?1",
            params![habit_id],
        )?)
    }

    pub fn get(conn: &Connection, id: &str) -> StoreResult<Option<CompletionRecord>> {
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM habbit_records WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                read_row,
            )
            .optional()?;
        raw.map(into_record).transpose()
    }

    pub fn get_all(conn: &Connection) -> StoreResult<Vec<CompletionRecord>> {
        collect_records(
            conn,
            &format!(
                "SELECT {} FROM habbit_records ORDER BY completedAt DESC",
                RECORD_COLUMNS
            ),
            params![],
        )
    }

    pub fn get_by_habit_id(conn: &Connection, habit_id: &str) -> StoreResult<Vec<CompletionRecord>> {
        collect_records(
            conn,
            &format!(
                "SELECT {} FROM habbit_records WHERE habbitId = ?1 ORDER BY completedAt DESC",
                RECORD_COLUMNS
            ),
            params![habit_id],
        )
    }

    /// Records of any of `habit_ids` whose timestamp falls inside the range
    /// (both ends inclusive), newest first.
    pub fn get_by_habit_ids_in_range(
        conn: &Connection,
        habit_ids: &[&str],
        range: DateRange,
    ) -> StoreResult<Vec<CompletionRecord>> {
        if habit_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; habit_ids.len()].join(",");
        let sql = format!(
            "SELECT {} FROM habbit_records
             WHERE habbitId IN ({}) AND completedAt >= ? AND completedAt <= ?
             ORDER BY completedAt DESC",
            RECORD_COLUMNS, placeholders
        );

        let mut values: Vec<String> = habit_ids.iter().map(|id| id.to_string()).collect();
        values.push(format_timestamp(range.first_instant()));
        values.push(format_timestamp(range.last_instant()));

        collect_records(conn, &sql, params_from_iter(values.iter()))
    }

    pub fn latest_in_range(
        conn: &Connection,
        habit_id: &str,
        range: DateRange,
    ) -> StoreResult<Option<CompletionRecord>> {
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM habbit_records
                     WHERE habbitId = ?1 AND completedAt >= ?2 AND completedAt <= ?3
                     ORDER BY completedAt DESC, rowid DESC LIMIT 1",
                    RECORD_COLUMNS
                ),
                params![
                    habit_id,
                    format_timestamp(range.first_instant()),
                    format_timestamp(range.last_instant()),
                ],
                read_row,
            )
            .optional()?;
        raw.map(into_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::HabitDraft;
    use chrono::{NaiveDate, NaiveDateTime};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn habit(id: &str) -> Habit {
        HabitDraft::new("Walk")
            .goal(30.0, RequiredType::Minutes)
            .into_habit(id.to_string(), ts(1, 8, 0))
    }

    #[test]
    fn habit_list_is_one_blob() {
        let conn = conn();
        assert!(HabitRepo::load(&conn).unwrap().is_empty());

        HabitRepo::save(&conn, &[habit("a"), habit("b")]).unwrap();
        let loaded = HabitRepo::load(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].id, "b");

        let blob = MetaRepo::get(&conn, HABITS_KEY).unwrap().unwrap();
        assert!(blob.contains("\"requiredType\":\"minutes\""));
    }

    #[test]
    fn corrupt_blob_is_a_serialization_error() {
        let conn = conn();
        MetaRepo::set(&conn, HABITS_KEY, "{not json").unwrap();
        assert!(matches!(
            HabitRepo::load(&conn),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn records_sorted_newest_first() {
        let conn = conn();
        let h = habit("a");
        for (d, hour) in [(2, 9), (3, 7), (2, 20)] {
            RecordRepo::insert(&conn, &CompletionRecord::for_habit(&h, 10.0, ts(d, hour, 0))).unwrap();
        }
        let records = RecordRepo::get_by_habit_id(&conn, "a").unwrap();
        let times: Vec<_> = records.iter().map(|r| r.completed_at).collect();
        assert_eq!(times, vec![ts(3, 7, 0), ts(2, 20, 0), ts(2, 9, 0)]);
        assert_eq!(records[0].required_type, RequiredType::Minutes);
    }

    #[test]
    fn range_query_is_inclusive_and_filters_ids() {
        let conn = conn();
        let a = habit("a");
        let b = habit("b");
        let c = habit("c");
        RecordRepo::insert(&conn, &CompletionRecord::for_habit(&a, 1.0, ts(4, 23, 59))).unwrap();
        RecordRepo::insert(&conn, &CompletionRecord::for_habit(&a, 1.0, ts(5, 0, 0))).unwrap();
        RecordRepo::insert(&conn, &CompletionRecord::for_habit(&a, 1.0, ts(5, 23, 59))).unwrap();
        RecordRepo::insert(&conn, &CompletionRecord::for_habit(&a, 1.0, ts(6, 0, 0))).unwrap();
        RecordRepo::insert(&conn, &CompletionRecord::for_habit(&b, 2.0, ts(5, 12, 0))).unwrap();
        RecordRepo::insert(&conn, &CompletionRecord::for_habit(&c, 3.0, ts(5, 12, 0))).unwrap();

        let day = DateRange::day(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        let found = RecordRepo::get_by_habit_ids_in_range(&conn, &["a", "b"], day).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|r| r.habit_id != "c"));
        assert!(found.iter().all(|r| r.date() == day.start));

        assert!(RecordRepo::get_by_habit_ids_in_range(&conn, &[], day).unwrap().is_empty());
    }

    #[test]
    fn latest_in_range_picks_most_recent_of_the_day() {
        let conn = conn();
        let h = habit("a");
        let early = CompletionRecord::for_habit(&h, 1.0, ts(5, 8, 0));
        let late = CompletionRecord::for_habit(&h, 1.0, ts(5, 18, 0));
        let next_day = CompletionRecord::for_habit(&h, 1.0, ts(6, 8, 0));
        for r in [&early, &late, &next_day] {
            RecordRepo::insert(&conn, r).unwrap();
        }
        let day = DateRange::day(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(RecordRepo::latest_in_range(&conn, "a", day).unwrap(), Some(late));
        let empty = DateRange::day(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(RecordRepo::latest_in_range(&conn, "a", empty).unwrap(), None);
    }

    #[test]
    fn update_and_delete_report_changes() {
        let conn = conn();
        let h = habit("a");
        let mut record = CompletionRecord::for_habit(&h, 5.0, ts(2, 9, 0));
        RecordRepo::insert(&conn, &record).unwrap();

        record.actual_value = 12.5;
        assert_eq!(RecordRepo::update(&conn, &record).unwrap(), 1);
        assert_eq!(RecordRepo::get(&conn, &record.id).unwrap().unwrap().actual_value, 12.5);

        assert_eq!(RecordRepo::delete(&conn, &record.id).unwrap(), 1);
        assert_eq!(RecordRepo::delete(&conn, &record.id).unwrap(), 0);
        assert_eq!(RecordRepo::update(&conn, &record).unwrap(), 0);
        assert!(RecordRepo::get(&conn, &record.id).unwrap().is_none());
    }

    #[test]
    fn unparseable_row_is_reported_as_corrupt() {
        let conn = conn();
        conn.execute(
            "INSERT INTO habbit_records (id, habbitId, requiredValue, requiredType, actualValue, completedAt)
             VALUES ('r1', 'a', 1, 'times', 1, 'last tuesday')",
            [],
        )
        .unwrap();
        assert!(matches!(RecordRepo::get(&conn, "r1"), Err(StoreError::Corrupt(_))));
    }
}
