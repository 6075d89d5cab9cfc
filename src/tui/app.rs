use anyhow::Result;
use chrono::{Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    DefaultTerminal, Frame,
};

use crate::config::AppConfig;
use crate::db::{HabitStore, RecordStore, StoreResult};
use crate::models::{CompletionRecord, DateRange, DayProgress, Habit, HabitStats, WeekDay};
use crate::stats;
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::{habits, header, statusbar, streak};
use crate::utils::format::format_value;
use crate::utils::time;

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Stats,
    Help,
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub should_quit: bool,
    pub today: NaiveDate,
    pub selected: NaiveDate,
    pub focus_idx: usize,
    /// Habit awaiting a y/n answer before deletion
    pub pending_delete: Option<Habit>,
    pub message: Option<String>,

    // Refreshed from the store after every action
    pub habits: Vec<Habit>,
    pub records: Vec<CompletionRecord>,
}

impl App {
    pub fn new(config: AppConfig, today: NaiveDate) -> Self {
        App {
            view: View::Dashboard,
            config,
            should_quit: false,
            today,
            selected: today,
            focus_idx: 0,
            pending_delete: None,
            message: None,
            habits: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Oldest day reachable in the date strip
    pub fn earliest(&self) -> NaiveDate {
        let days = self.config.dashboard.date_strip_days.max(1);
        time::days_before(self.today, u64::from(days) - 1)
    }

    pub fn strip(&self) -> Vec<NaiveDate> {
        self.earliest()
            .iter_days()
            .take_while(|d| *d <= self.today)
            .collect()
    }

    pub fn focused(&self) -> Option<&Habit> {
        self.habits.get(self.focus_idx)
    }

    pub fn progress(&self) -> Vec<DayProgress> {
        self.habits
            .iter()
            .map(|h| stats::day_progress(h, &self.records, self.selected))
            .collect()
    }

    pub fn focused_stats(&self) -> Option<(HabitStats, Vec<WeekDay>)> {
        let habit = self.focused()?;
        Some((
            stats::compute_stats(habit, &self.records, self.today, self.config.stats.lookback_days),
            stats::weekly_grid(habit, &self.records, self.today),
        ))
    }

    pub fn load<S: HabitStore + RecordStore>(&mut self, store: &S) -> StoreResult<()> {
        let all = store.list_habits()?;
        self.habits = stats::scheduled_habits(&all, self.selected)
            .into_iter()
            .cloned()
            .collect();

        let ids: Vec<&str> = self.habits.iter().map(|h| h.id.as_str()).collect();
        let lookback = self.config.stats.lookback_days.max(stats::WEEK_DAYS);
        let stats_start = time::days_before(self.today, u64::from(lookback) - 1);
        let window = DateRange::new(self.earliest().min(stats_start), self.today);
        self.records = store.list_by_habit_ids(&ids, window)?;

        if self.focus_idx >= self.habits.len() {
            self.focus_idx = self.habits.len().saturating_sub(1);
        }
        if self.view == View::Stats && self.habits.is_empty() {
            self.view = View::Dashboard;
        }
        Ok(())
    }

    /// Follow the calendar across midnight.
    pub fn tick<S: HabitStore + RecordStore>(&mut self, store: &S, today: NaiveDate) {
        if today == self.today {
            return;
        }
        log::info!("day rolled over to {}", today);
        let was_today = self.selected == self.today;
        self.today = today;
        if was_today || self.selected < self.earliest() {
            self.selected = today;
        }
        self.reload(store);
    }

    fn reload<S: HabitStore + RecordStore>(&mut self, store: &S) {
        if let Err(err) = self.load(store) {
            log::warn!("reload failed: {}", err);
            self.message = Some(format!("✗ {}", err));
        }
    }

    fn report<T>(&mut self, result: StoreResult<T>, ok: impl FnOnce(T) -> String) {
        self.message = Some(match result {
            Ok(value) => ok(value),
            Err(err) if err.is_not_found() => {
                log::debug!("dashboard action on a missing row: {}", err);
                "✗ Already gone, refreshing".to_string()
            }
            Err(err) => {
                log::warn!("dashboard action failed: {}", err);
                format!("✗ {}", err)
            }
        });
    }

    pub fn handle_key<S: HabitStore + RecordStore>(&mut self, key: KeyEvent, store: &S) {
        // Some terminals also report release/repeat
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.pending_delete.is_some() {
            self.handle_confirm_key(key, store);
            return;
        }
        match self.view {
            View::Dashboard => self.handle_dashboard_key(key, store),
            View::Stats => self.handle_stats_key(key),
            View::Help => self.handle_help_key(key),
        }
    }

    fn handle_dashboard_key<S: HabitStore + RecordStore>(&mut self, key: KeyEvent, store: &S) {
        self.message = None;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.view = View::Help;
            }
            KeyCode::Char('s') => {
                if self.focused().is_some() {
                    self.view = View::Stats;
                }
            }
            KeyCode::Left => self.select_day(self.selected - Duration::days(1), store),
            KeyCode::Right => self.select_day(self.selected + Duration::days(1), store),
            KeyCode::Up => {
                self.focus_idx = self.focus_idx.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.focus_idx + 1 < self.habits.len() {
                    self.focus_idx += 1;
                }
            }
            KeyCode::Char('m') | KeyCode::Enter => self.log_focused(store),
            KeyCode::Char('u') => self.undo_focused(store),
            KeyCode::Char('x') => {
                self.pending_delete = self.focused().cloned();
            }
            _ => {}
        }
    }

    fn handle_confirm_key<S: HabitStore + RecordStore>(&mut self, key: KeyEvent, store: &S) {
        let Some(habit) = self.pending_delete.take() else {
            return;
        };
        if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            let result = store.delete_habit(&habit.id);
            self.report(result, |h| format!("✗ Deleted {}", h.name));
            self.reload(store);
        } else {
            self.message = Some("Delete cancelled".to_string());
        }
    }

    fn handle_stats_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('s')) {
            self.view = View::Dashboard;
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            self.view = View::Dashboard;
        }
    }

    fn select_day<S: HabitStore + RecordStore>(&mut self, day: NaiveDate, store: &S) {
        if !DateRange::new(self.earliest(), self.today).contains(day) {
            return;
        }
        let focused_id = self.focused().map(|h| h.id.clone());
        self.selected = day;
        self.reload(store);
        // Keep the same habit under the cursor when it is scheduled on both days
        if let Some(id) = focused_id {
            if let Some(idx) = self.habits.iter().position(|h| h.id == id) {
                self.focus_idx = idx;
            }
        }
    }

    fn log_focused<S: HabitStore + RecordStore>(&mut self, store: &S) {
        let Some(habit) = self.focused().cloned() else {
            return;
        };
        let completed_at = if self.selected == self.today {
            time::now()
        } else {
            time::timestamp_on(self.selected)
        };
        let amount = self.config.dashboard.log_amount;
        let result = store.create_record(CompletionRecord::for_habit(&habit, amount, completed_at));
        self.report(result, |r| {
            format!(
                "✓ {} +{} {}",
                habit.name,
                format_value(r.actual_value),
                r.required_type.short_label()
            )
        });
        self.reload(store);
    }

    fn undo_focused<S: HabitStore + RecordStore>(&mut self, store: &S) {
        let Some(habit) = self.focused().cloned() else {
            return;
        };
        let result = store.undo_last(&habit.id, self.selected);
        self.report(result, |removed| match removed {
            Some(r) => format!(
                "↶ {} -{} {}",
                habit.name,
                format_value(r.actual_value),
                r.required_type.short_label()
            ),
            None => format!("Nothing logged for {} on this day", habit.name),
        });
        self.reload(store);
    }

    pub fn draw(&self, frame: &mut Frame) {
        match self.view {
            View::Dashboard => self.draw_dashboard(frame),
            View::Stats => self.draw_stats(frame),
            View::Help => {
                self.draw_dashboard(frame);
                self.draw_help_overlay(frame);
            }
        }

        if let Some(habit) = &self.pending_delete {
            self.draw_confirm(frame, habit);
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // header
                Constraint::Min(0),    // body
                Constraint::Length(1), // status bar
            ])
            .split(area);

        header::render(frame, outer_chunks[0], self.selected, self.today, &self.strip());
        statusbar::render(frame, outer_chunks[2], self.message.as_deref());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(outer_chunks[1]);

        habits::render(
            frame,
            columns[0],
            &self.habits,
            &self.progress(),
            self.focus_idx,
        );

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(0)])
            .split(columns[1]);

        let (summary, week) = self.focused_stats().unwrap_or_default();
        streak::render(
            frame,
            right_chunks[0],
            self.focused(),
            &summary,
            &week,
            self.config.stats.lookback_days,
        );
    }

    fn draw_stats(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(9),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        let Some(habit) = self.focused() else {
            return;
        };
        let (summary, week) = self.focused_stats().unwrap_or_default();

        let title = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(format!("  {}  ", habit.name), theme::accent().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(
                        "{} {} · {}",
                        format_value(habit.required_value),
                        habit.required_type,
                        habit.frequency
                    ),
                    theme::dim(),
                ),
                Span::styled("   [Esc] back", theme::dim()),
            ]),
        ]);
        frame.render_widget(title, chunks[0]);

        let lookback = self.config.stats.lookback_days;
        streak::render(frame, chunks[1], Some(habit), &summary, &week, lookback);

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!("  Last {} days", lookback), theme::accent())),
            Line::from(""),
            Line::from(vec![
                Span::styled("  Success:        ", theme::dim()),
                Span::styled(format!("{} days", summary.success_days), theme::green()),
            ]),
            Line::from(vec![
                Span::styled("  Not completed:  ", theme::dim()),
                Span::styled(format!("{} days", summary.not_completed_days), theme::amber()),
            ]),
            Line::from(vec![
                Span::styled("  Skipped:        ", theme::dim()),
                Span::styled(format!("{} days", summary.skipped_days), theme::red()),
            ]),
            Line::from(vec![
                Span::styled("  Total:          ", theme::dim()),
                Span::styled(
                    format!("{} {}", format_value(summary.total_value), habit.required_type),
                    theme::bold(),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Completion:     ", theme::dim()),
                Span::styled(
                    format!("{:.0}%", summary.completion_ratio() * 100.0),
                    theme::bold(),
                ),
            ]),
            Line::from(""),
        ];

        for report in summary.days.iter().filter(|d| d.status.is_scheduled()) {
            let (icon, style) = theme::day_status(report.status);
            lines.push(Line::from(vec![
                Span::styled(format!("  {}  ", report.date.format("%a %b %d")), theme::dim()),
                Span::styled(icon, style),
                Span::styled(
                    format!(
                        "  {}/{}  {}",
                        format_value(report.total),
                        format_value(report.goal),
                        report.status.as_str()
                    ),
                    theme::dim(),
                ),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), chunks[2]);
        statusbar::render(frame, chunks[3], Some("[Esc] back"));
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();

        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: (area.height / 2).max(14).min(area.height),
        };

        frame.render_widget(Clear, popup_area);

        let bindings = [
            ("[← →]        ", "Previous / next day"),
            ("[↑ ↓]        ", "Move between habits"),
            ("[m] / Enter  ", "Log progress"),
            ("[u]          ", "Undo last entry of the day"),
            ("[x]          ", "Delete habit"),
            ("[s]          ", "Statistics for habit"),
            ("[?]          ", "Toggle help"),
            ("[Esc]        ", "Quit"),
        ];

        let mut help_text = vec![
            Line::from(Span::styled(
                "  Keybindings",
                theme::accent().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (key, label) in bindings {
            help_text.push(Line::from(vec![
                Span::styled(format!("  {}", key), theme::accent()),
                Span::styled(label, theme::dim()),
            ]));
        }
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            format!(
                "  Each log adds {}",
                format_value(self.config.dashboard.log_amount)
            ),
            theme::dim(),
        )));

        let block = Block::default()
            .title(Span::styled(" Help ", theme::accent()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::accent())
            .style(theme::surface());

        frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
    }

    fn draw_confirm(&self, frame: &mut Frame, habit: &Habit) {
        let area = frame.area();
        let popup_area = Rect {
            x: area.width / 4,
            y: (area.height / 2).saturating_sub(3),
            width: area.width / 2,
            height: 6.min(area.height),
        };

        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Delete ", theme::dim()),
                Span::styled(habit.name.as_str(), theme::bold()),
                Span::styled(" and all of its records?", theme::dim()),
            ]),
            Line::from(""),
            Line::from(Span::styled("  [y] delete  ·  any other key cancels", theme::dim())),
        ];

        let block = Block::default()
            .title(Span::styled(" Delete Habit ", theme::red()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::red())
            .style(theme::surface());

        frame.render_widget(Paragraph::new(text).block(block), popup_area);
    }
}

/// Run the dashboard until the user quits.
pub fn run<S: HabitStore + RecordStore>(store: S, config: AppConfig) -> Result<()> {
    let tick_rate = std::time::Duration::from_millis(config.dashboard.tick_rate_ms);
    let mut app = App::new(config, time::today());
    app.load(&store)?;

    let mut terminal = ratatui::init();
    let events = EventHandler::new(tick_rate);
    let result = event_loop(&mut terminal, &mut app, &events, &store);
    ratatui::restore();
    result
}

fn event_loop<S: HabitStore + RecordStore>(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    events: &EventHandler,
    store: &S,
) -> Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        match events.next()? {
            Event::Key(key) => {
                app.handle_key(key, store);
                if app.should_quit {
                    return Ok(());
                }
            }
            Event::Resize => {}
            Event::Tick => app.tick(store, time::today()),
        }
    }
}
