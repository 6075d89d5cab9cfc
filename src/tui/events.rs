use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent, KeyEvent};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Terminal input on a background thread. Only events cross the channel;
/// the store stays on the caller's thread.
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || poll_loop(tx, tick_rate));
        Self { rx }
    }

    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }
}

fn poll_loop(tx: mpsc::Sender<Event>, tick_rate: Duration) {
    let mut last_tick = Instant::now();
    loop {
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout).unwrap_or(false) {
            let forwarded = match event::read() {
                Ok(CEvent::Key(key)) => Some(Event::Key(key)),
                Ok(CEvent::Resize(_, _)) => Some(Event::Resize),
                Ok(_) => None,
                Err(err) => {
                    log::warn!("terminal input closed: {}", err);
                    return;
                }
            };
            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    return;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if tx.send(Event::Tick).is_err() {
                return;
            }
            last_tick = Instant::now();
        }
    }
}
