//! Event Mapper - converts terminal events to core events

use crossterm::event::{Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::{Event, Key};

#[derive(Default)]
pub struct EventMapper;

impl EventMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map_event(&mut self, term_event: TermEvent) -> Event {
        match term_event {
            TermEvent::Key(key) => map_key(key),
            // any mouse activity keeps the session alive
            TermEvent::Mouse(_) => Event::Pointer,
            _ => Event::Ignored,
        }
    }
}

fn map_key(key: KeyEvent) -> Event {
    // windows reports releases too
    if key.kind == KeyEventKind::Release {
        return Event::Ignored;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Event::Quit,
            _ => Event::Ignored,
        };
    }

    match key.code {
        KeyCode::Char(c) => Event::Key(Key::Char(c)),
        KeyCode::Enter => Event::Key(Key::Enter),
        KeyCode::Esc => Event::Key(Key::Esc),
        KeyCode::Backspace => Event::Key(Key::Backspace),
        KeyCode::Up => Event::Key(Key::Up),
        KeyCode::Down => Event::Key(Key::Down),
        _ => Event::Ignored,
    }
}
