use std::sync::{mpsc, Arc};

use autoclick_core::AutoClicker;

use crate::quit::QuitPrompt;

/// Log lines kept for the log pane.
const MAX_LOG_LINES: usize = 2000;

pub struct App {
    pub clicker: Arc<AutoClicker>,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub log_rx: mpsc::Receiver<String>,
    pub quit_prompt: Option<QuitPrompt>,
    pub should_quit: bool,
}

impl App {
    pub fn new(clicker: Arc<AutoClicker>, log_rx: mpsc::Receiver<String>) -> Self {
        Self {
            clicker,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            log_rx,
            quit_prompt: None,
            should_quit: false,
        }
    }

    pub fn drain_logs(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
        if self.log_messages.len() > MAX_LOG_LINES {
            let excess = self.log_messages.len() - MAX_LOG_LINES;
            self.log_messages.drain(..excess);
        }
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    pub fn start_stop(&mut self) {
        if self.clicker.is_running() {
            self.clicker.stop();
        } else {
            self.clicker.start();
        }
    }

    /// Quit right away when idle, otherwise ask first.
    pub fn request_quit(&mut self) {
        if self.clicker.is_running() {
            self.quit_prompt = Some(QuitPrompt::default());
        } else {
            self.quit();
        }
    }

    pub fn confirm_toggle(&mut self) {
        if let Some(prompt) = &mut self.quit_prompt {
            prompt.toggle();
        }
    }

    pub fn confirm_accept(&mut self) {
        if let Some(prompt) = self.quit_prompt.take() {
            if prompt.stop_selected {
                self.quit();
            }
        }
    }

    pub fn confirm_cancel(&mut self) {
        self.quit_prompt = None;
    }

    pub fn quit(&mut self) {
        self.clicker.stop();
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoclick_core::platform::create_platform;
    use autoclick_core::AutomationConfig;

    fn app() -> (App, mpsc::Sender<String>) {
        let clicker = AutoClicker::new(AutomationConfig::default(), create_platform(true)).unwrap();
        let (tx, rx) = mpsc::channel();
        (App::new(Arc::new(clicker), rx), tx)
    }

    #[test]
    fn quitting_while_idle_needs_no_confirmation() {
        let (mut app, _tx) = app();
        app.request_quit();
        assert!(app.quit_prompt.is_none());
        assert!(app.should_quit);
    }

    #[test]
    fn quitting_while_running_asks_first() {
        let (mut app, _tx) = app();
        app.start_stop();
        assert!(app.clicker.is_running());

        app.request_quit();
        assert!(app.quit_prompt.is_some());
        // Default answer keeps running.
        app.confirm_accept();
        assert!(!app.should_quit);
        assert!(app.clicker.is_running());

        app.request_quit();
        app.confirm_toggle();
        app.confirm_accept();
        assert!(app.should_quit);
        assert!(!app.clicker.is_running());
    }

    #[test]
    fn log_buffer_is_bounded() {
        let (mut app, tx) = app();
        for i in 0..MAX_LOG_LINES + 10 {
            tx.send(format!("line {}", i)).unwrap();
        }
        app.drain_logs();
        assert_eq!(app.log_messages.len(), MAX_LOG_LINES);
        assert_eq!(app.log_messages[0], "line 10");
    }
}
