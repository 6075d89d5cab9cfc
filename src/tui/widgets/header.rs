use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::tui::theme;

/// Title, the selected date, and the strip of recent days to pick from.
pub fn render(frame: &mut Frame, area: Rect, selected: NaiveDate, today: NaiveDate, strip: &[NaiveDate]) {
    let title_line = Line::from(vec![
        Span::styled("habitlog", theme::accent().add_modifier(Modifier::BOLD)),
    ]);

    let mut date_spans = vec![Span::styled(
        selected.format("%A, %b %d, %Y").to_string(),
        theme::bold(),
    )];
    if selected == today {
        date_spans.push(Span::styled("  ·  today", theme::dim()));
    }

    let mut strip_spans = Vec::with_capacity(strip.len() * 2);
    for (i, day) in strip.iter().enumerate() {
        if i > 0 {
            strip_spans.push(Span::raw(" "));
        }
        let style = if *day == selected {
            theme::accent().add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else if *day == today {
            theme::accent()
        } else {
            theme::dim()
        };
        strip_spans.push(Span::styled(day.format("%d").to_string(), style));
    }

    let text = vec![title_line, Line::from(date_spans), Line::from(strip_spans)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::accent())
        .style(theme::base());

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
