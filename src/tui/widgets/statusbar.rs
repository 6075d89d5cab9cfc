use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;

const HINTS: [(&str, &str); 8] = [
    ("[← →]", " day  "),
    ("[↑ ↓]", " habit  "),
    ("[m]", " log  "),
    ("[u]", " undo  "),
    ("[x]", " delete  "),
    ("[s]", " stats  "),
    ("[?]", " help  "),
    ("[Esc]", " quit"),
];

/// Key hints, or the last action's outcome when there is one.
pub fn render(frame: &mut Frame, area: Rect, message: Option<&str>) {
    let line = match message {
        Some(msg) => Line::from(Span::styled(msg, theme::amber())),
        None => {
            let mut spans = Vec::new();
            for (key, label) in &HINTS {
                spans.push(Span::styled(*key, theme::accent()));
                spans.push(Span::styled(*label, theme::dim()));
            }
            Line::from(spans)
        }
    };

    let paragraph = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
