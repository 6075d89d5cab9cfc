use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::{Habit, HabitStats, WeekDay};
use crate::tui::theme;
use crate::utils::format::progress_bar;

/// Streak bar plus the last seven days for one habit. `lookback` scales
/// the bar.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    habit: Option<&Habit>,
    stats: &HabitStats,
    week: &[WeekDay],
    lookback: u32,
) {
    let title = match habit {
        Some(h) => format!(" Streak · {} ", h.name),
        None => " Streak ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(title, theme::accent()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(false))
        .style(theme::surface());

    if habit.is_none() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("  No habit selected", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let streak_line = Line::from(vec![
        Span::raw("  "),
        Span::styled(
            progress_bar(stats.streak as f64, lookback.max(1) as f64, 12),
            theme::green(),
        ),
        Span::styled(
            format!("  {} days", stats.streak),
            theme::green().add_modifier(Modifier::BOLD),
        ),
    ]);

    let mut label_spans = vec![Span::raw("  ")];
    let mut dot_spans = vec![Span::raw("  ")];
    for day in week {
        label_spans.push(Span::styled(format!("{:<4}", day.label), theme::dim()));
        let (dot, style) = if day.completed {
            ("●", theme::green().add_modifier(Modifier::BOLD))
        } else {
            ("○", theme::dim())
        };
        dot_spans.push(Span::styled(dot, style));
        dot_spans.push(Span::raw("   "));
    }

    let completed_this_week = week.iter().filter(|d| d.completed).count();
    let meta_line = Line::from(Span::styled(
        format!(
            "  Week: {}/{}  ·  Last {} days: {}/{}",
            completed_this_week,
            week.len(),
            lookback,
            stats.success_days,
            stats.scheduled_days()
        ),
        theme::dim(),
    ));

    let text = vec![
        Line::from(""),
        streak_line,
        Line::from(""),
        Line::from(label_spans),
        Line::from(dot_spans),
        Line::from(""),
        meta_line,
    ];
    let paragraph = Paragraph::new(text).block(block);
    frame.render_widget(paragraph, area);
}
