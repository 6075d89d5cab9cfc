use crate::models::RequiredType;

/// Format a logged value as a decimal string, trimming trailing zeros
pub fn format_value(value: f64) -> String {
    if value == value.floor() {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// "3/5 times", "0.5/2 l"
pub fn progress_text(actual: f64, required: f64, unit: RequiredType) -> String {
    format!(
        "{}/{} {}",
        format_value(actual),
        format_value(required),
        unit.short_label()
    )
}

/// Create a simple ASCII progress bar
pub fn progress_bar(value: f64, goal: f64, width: usize) -> String {
    if goal <= 0.0 {
        return "░".repeat(width);
    }
    let ratio = (value / goal).clamp(0.0, 1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}
