pub mod frequency;
pub mod habit;
pub mod record;
pub mod stats;

pub use frequency::{Frequency, WeekdaySet};
pub use habit::{Habit, HabitDraft, HabitUpdate, RequiredType};
pub use record::{CompletionRecord, DateRange};
pub use stats::{DayProgress, DayReport, DayStatus, HabitStats, WeekDay};
