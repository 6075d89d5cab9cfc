use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::{DayProgress, Habit};
use crate::tui::theme;
use crate::utils::format::{progress_bar, progress_text};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    habits: &[Habit],
    progress: &[DayProgress],
    focused_idx: usize,
) {
    let done = progress.iter().filter(|p| p.completed).count();
    let block = Block::default()
        .title(Span::styled(
            format!(" Habits {}/{} ", done, habits.len()),
            theme::accent(),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(true))
        .style(theme::surface());

    if habits.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("  Nothing scheduled for this day", theme::dim())),
            Line::from(Span::styled("  Add a habit with `habitlog add <name>`", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let items: Vec<ListItem> = habits
        .iter()
        .zip(progress)
        .enumerate()
        .map(|(i, (habit, p))| {
            let (icon, style) = if p.completed {
                ("●", theme::green())
            } else if p.records > 0 {
                ("◑", theme::amber())
            } else {
                ("○", theme::dim())
            };

            let name_style = if i == focused_idx {
                theme::accent().add_modifier(Modifier::BOLD)
            } else {
                theme::bold()
            };
            let marker = if i == focused_idx { "▸ " } else { "  " };

            let line = Line::from(vec![
                Span::styled(marker, theme::accent()),
                Span::styled(icon, style),
                Span::styled(format!(" {:<22}", habit.name), name_style),
                Span::styled(progress_bar(p.total, p.goal, 10), style),
                Span::styled(
                    format!("  {}", progress_text(p.total, p.goal, p.unit)),
                    theme::dim(),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}
