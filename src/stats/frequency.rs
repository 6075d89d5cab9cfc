use chrono::{Datelike, NaiveDate};

use crate::models::Habit;

/// Whether `date` is one of the habit's active days. Nothing before the
/// creation date is ever scheduled, and an empty weekday set schedules
/// nothing at all.
pub fn is_scheduled(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.created_at.date() {
        return false;
    }
    habit.days().contains(date.weekday())
}

/// Habits that show up on the given calendar date, in their stored order.
pub fn scheduled_habits(habits: &[Habit], date: NaiveDate) -> Vec<&Habit> {
    habits.iter().filter(|h| is_scheduled(h, date)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HabitDraft, WeekdaySet};
    use chrono::{Duration, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_from(created: NaiveDate, days: WeekdaySet) -> Habit {
        let mut habit = HabitDraft::new("Stretch")
            .into_habit("h".to_string(), created.and_hms_opt(18, 30, 0).unwrap());
        habit.frequency = crate::models::Frequency::on_days(days);
        habit
    }

    #[test]
    fn daily_habit_is_scheduled_from_creation_day_on() {
        let created = date(2024, 1, 1);
        let habit = habit_from(created, WeekdaySet::ALL);
        for offset in 0..60 {
            assert!(is_scheduled(&habit, created + Duration::days(offset)));
        }
        for offset in 1..30 {
            assert!(!is_scheduled(&habit, created - Duration::days(offset)));
        }
    }

    #[test]
    fn creation_day_counts_regardless_of_time_of_day() {
        let habit = habit_from(date(2024, 1, 3), WeekdaySet::ALL);
        assert!(is_scheduled(&habit, date(2024, 1, 3)));
    }

    #[test]
    fn only_selected_weekdays_are_scheduled() {
        let mwf = WeekdaySet::from_days(&[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        // 2024-01-01 is a Monday
        let habit = habit_from(date(2024, 1, 1), mwf);
        assert!(is_scheduled(&habit, date(2024, 1, 1)));
        assert!(!is_scheduled(&habit, date(2024, 1, 2)));
        assert!(is_scheduled(&habit, date(2024, 1, 3)));
        assert!(!is_scheduled(&habit, date(2024, 1, 7)));
        let first_two_weeks = date(2024, 1, 1)
            .iter_days()
            .take(14)
            .filter(|d| is_scheduled(&habit, *d))
            .count();
        assert_eq!(first_two_weeks, 6);
    }

    #[test]
    fn empty_schedule_is_never_scheduled() {
        let habit = habit_from(date(2024, 1, 1), WeekdaySet::EMPTY);
        assert!(!is_scheduled(&habit, date(2024, 1, 1)));
        assert!(!is_scheduled(&habit, date(2024, 6, 1)));
    }

    #[test]
    fn filters_habits_for_a_date() {
        let daily = habit_from(date(2024, 1, 1), WeekdaySet::ALL);
        let weekend = habit_from(date(2024, 1, 1), WeekdaySet::weekends());
        let later = habit_from(date(2024, 2, 1), WeekdaySet::ALL);
        let habits = vec![daily.clone(), weekend.clone(), later];
        let tuesday = date(2024, 1, 9);
        let saturday = date(2024, 1, 13);
        assert_eq!(scheduled_habits(&habits, tuesday), vec![&habits[0]]);
        assert_eq!(scheduled_habits(&habits, saturday), vec![&habits[0], &habits[1]]);
    }
}
