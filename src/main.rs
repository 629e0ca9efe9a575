use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use crossterm::{
    execute,
    event::{EnableMouseCapture, DisableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use autoclick_core::platform::create_platform;
use autoclick_core::types::Region;
use autoclick_core::{logger, AutoClicker, AutomationConfig};

/// Click on a reference image whenever it shows up on screen.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Reference image to click. Omit to run in change-detection-only mode.
    image: Option<PathBuf>,

    /// RGB distance tolerated per pixel (0 = exact) [default: 30]
    #[arg(long)]
    tolerance: Option<u32>,

    /// Search step in pixels [default: 2]
    #[arg(long)]
    stride: Option<u32>,

    /// Horizontal click offset [default: 0]
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<i32>,

    /// Vertical click offset [default: 0]
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<i32>,

    /// Milliseconds between scans, at least 100 [default: 3000]
    #[arg(long)]
    interval: Option<u64>,

    /// Capture area as x,y,w,h (absolute screen coordinates)
    #[arg(long, allow_hyphen_values = true)]
    region: Option<Region>,

    /// Click when this much of the screen changes between scans
    #[arg(long)]
    change_detect: bool,

    /// Percent of sampled pixels that must change [default: 5]
    #[arg(long)]
    change_threshold: Option<u8>,

    /// JSON config file; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the logging-only platform (no real capture or clicks)
    #[arg(long)]
    stub: bool,

    /// Run the terminal control panel instead of headless mode
    #[arg(long)]
    tui: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> Result<AutomationConfig> {
        let mut config = match &self.config {
            Some(path) => AutomationConfig::load(path)?,
            None => AutomationConfig::default(),
        };

        if let Some(image) = self.image {
            config.template_path = Some(image);
        }
        if let Some(v) = self.tolerance {
            config.tolerance = v;
        }
        if let Some(v) = self.stride {
            config.stride = v;
        }
        if let Some(v) = self.offset_x {
            config.click_offset.x = v;
        }
        if let Some(v) = self.offset_y {
            config.click_offset.y = v;
        }
        if let Some(v) = self.interval {
            config.scan_interval_ms = v;
        }
        if let Some(v) = self.region {
            config.region = Some(v);
        }
        if self.change_detect {
            config.change_detection = true;
        }
        if let Some(v) = self.change_threshold {
            config.change_threshold_percent = v;
        }

        let mut config = config.normalized();
        if !config.has_template() {
            config.change_detection = true;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let force_stub = args.stub;
    let tui = args.tui;
    let log_dir = args.log_dir.clone();

    let (log_tx, log_rx) = mpsc::channel::<String>();
    logger::init(&log_dir, !tui, tui.then_some(log_tx))?;

    let config = args.into_config()?;
    if config.has_template() {
        info!("template mode, tolerance {}, stride {}", config.tolerance, config.stride);
    } else {
        info!("no image given, running in change-detection-only mode");
    }

    let platform = create_platform(force_stub);
    let clicker = Arc::new(AutoClicker::new(config, platform).context("failed to set up automation")?);

    if tui {
        run_tui(clicker, log_rx)
    } else {
        run_headless(&clicker)
    }
}

/// Run until SIGINT/SIGTERM.
fn run_headless(clicker: &AutoClicker) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))?;

    clicker.start();
    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));
    }
    info!("shutting down");
    clicker.stop();
    Ok(())
}

fn run_tui(clicker: Arc<AutoClicker>, log_rx: mpsc::Receiver<String>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = autoclick_tui::App::new(Arc::clone(&clicker), log_rx);
    let result = autoclick_tui::event::run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    clicker.stop();
    result
}
