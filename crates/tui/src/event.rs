use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::App;
use crate::ui;

pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        app.drain_logs();
        terminal.draw(|f| ui::draw(f, app))?;

        // 100ms poll keeps the stats panel fresh while the worker runs
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.quit_prompt.is_some() {
                    match key.code {
                        KeyCode::Left | KeyCode::Right | KeyCode::Tab
                        | KeyCode::Char('h') | KeyCode::Char('l') => app.confirm_toggle(),
                        KeyCode::Enter => app.confirm_accept(),
                        KeyCode::Char('y') | KeyCode::Char('Y') => app.quit(),
                        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.confirm_cancel(),
                        _ => {}
                    }
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => app.request_quit(),
                    KeyCode::Char('s') | KeyCode::Char('S') => app.start_stop(),
                    KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
                    KeyCode::PageUp => app.scroll_log_up(10),
                    KeyCode::PageDown => app.scroll_log_down(10),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}
