use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameInput {
    Flap,
    Pause,
    Quit,
}

pub fn handle_events(poll_timeout: std::time::Duration) -> io::Result<Option<GameInput>> {
    if event::poll(poll_timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(None);
            }
            return Ok(map_key(key.code));
        }
    }
    Ok(None)
}

fn map_key(code: KeyCode) -> Option<GameInput> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(GameInput::Quit),
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => {
            Some(GameInput::Flap)
        }
        KeyCode::Char('p') => Some(GameInput::Pause),
        _ => None,
    }
}
