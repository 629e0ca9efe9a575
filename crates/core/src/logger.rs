use std::fmt::{self, Write as _};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{mpsc, Mutex};

use anyhow::{Context as _, Result};
use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Field separator of lines sent to the control panel:
/// `level\x1ftarget\x1ftimestamp\x1fmessage`
pub const FIELD_SEP: char = '\x1f';

/// Install the global subscriber. Clears `<log_dir>/app.log`.
///
/// Fails without touching the log file if a global subscriber is already set.
pub fn init(log_dir: &Path, stderr: bool, tui_tx: Option<mpsc::Sender<String>>) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        anyhow::bail!("logger already initialized");
    }
    fs::create_dir_all(log_dir).with_context(|| format!("failed to create {:?}", log_dir))?;
    let log_path = log_dir.join("app.log");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {:?}", log_path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let stderr_layer = stderr.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let tui_layer = tui_tx.map(ChannelLayer::new);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .with(tui_layer)
        .try_init()
        .context("logger already initialized")?;
    Ok(())
}

/// Forwards events to the control panel as separator-delimited lines.
pub struct ChannelLayer {
    tx: Mutex<mpsc::Sender<String>>,
}

impl ChannelLayer {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl<S: Subscriber> Layer<S> for ChannelLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let target = meta.target().rsplit("::").next().unwrap_or_default();
        let line = format_line(&meta.level().to_string(), target, &visitor.message);
        if let Ok(tx) = self.tx.lock() {
            tx.send(line).ok();
        }
    }
}

fn format_line(level: &str, target: &str, message: &str) -> String {
    let ts = Local::now().format("%H:%M:%S");
    format!("{level}{FIELD_SEP}{target}{FIELD_SEP}{ts}{FIELD_SEP}{message}")
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.message, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.message, " {}={}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails_and_keeps_the_live_log() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), false, None).unwrap();
        tracing::warn!("first run");

        let log_path = dir.path().join("app.log");
        let before = fs::read_to_string(&log_path).unwrap();
        assert!(before.contains("first run"));

        assert!(init(dir.path(), false, None).is_err());
        let after = fs::read_to_string(&log_path).unwrap();
        assert!(after.starts_with(&before));
    }

    #[test]
    fn channel_layer_sends_structured_lines() {
        let (tx, rx) = mpsc::channel();
        let subscriber = tracing_subscriber::registry().with(ChannelLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "autoclick_core::orchestrator", attempts = 3, "target still visible");
        });

        let line = rx.try_recv().unwrap();
        let parts: Vec<&str> = line.split(FIELD_SEP).collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "WARN");
        assert_eq!(parts[1], "orchestrator");
        assert!(parts[3].contains("target still visible"));
        assert!(parts[3].contains("attempts=3"));
    }
}
