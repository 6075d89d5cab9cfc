use ratatui::style::{Color, Modifier, Style};

use crate::models::DayStatus;

pub const BG: Color = Color::Rgb(14, 18, 20);
pub const SURFACE: Color = Color::Rgb(22, 28, 31);
pub const BORDER: Color = Color::Rgb(44, 58, 62);
pub const TEXT: Color = Color::Rgb(214, 226, 224);
pub const TEXT_DIM: Color = Color::Rgb(108, 128, 130);
pub const TEAL: Color = Color::Rgb(64, 170, 160);
pub const GREEN: Color = Color::Rgb(96, 168, 96);
pub const AMBER: Color = Color::Rgb(214, 150, 64);
pub const RED: Color = Color::Rgb(190, 86, 72);

pub fn base() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn surface() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(TEAL)
    } else {
        Style::default().fg(BORDER)
    }
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn accent() -> Style {
    Style::default().fg(TEAL)
}

pub fn green() -> Style {
    Style::default().fg(GREEN)
}

pub fn amber() -> Style {
    Style::default().fg(AMBER)
}

pub fn red() -> Style {
    Style::default().fg(RED)
}

pub fn bold() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}

/// Icon and color for a classified day
pub fn day_status(status: DayStatus) -> (&'static str, Style) {
    match status {
        DayStatus::Completed => ("●", green()),
        DayStatus::Missed => ("◑", amber()),
        DayStatus::Skipped => ("○", red()),
        DayStatus::NotApplicable => ("·", dim()),
    }
}
