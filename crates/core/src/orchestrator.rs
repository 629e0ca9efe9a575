use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::change::change_percent;
use crate::clicker::{ClickOutcome, ClickTiming, ClickVerifier, VerifyMode};
use crate::config::AutomationConfig;
use crate::error::Result;
use crate::matcher::TemplateMatcher;
use crate::platform::Platform;
use crate::sleep::CancelToken;
use crate::types::{MatchResult, Point, Raster, RunState};

/// Counters the control panel reads while the loop runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub ticks: u64,
    pub capture_failures: u64,
    pub change_triggers: u64,
    pub matches: u64,
    pub clicks_succeeded: u64,
    pub clicks_failed: u64,
    pub last_change_percent: Option<u32>,
    pub last_match: Option<MatchResult>,
}

/// What a single scan tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    CaptureFailed,
    ChangeTriggered { percent: u32, outcome: ClickOutcome },
    Matched { rect: MatchResult, outcome: ClickOutcome },
    Idle,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Per-tick state: capture, detect, click.
pub struct Scanner {
    config: AutomationConfig,
    matcher: Option<TemplateMatcher>,
    platform: Platform,
    verifier: ClickVerifier,
    previous: Option<Raster>,
    stats: Arc<Mutex<Stats>>,
}

impl Scanner {
    fn new(config: AutomationConfig, matcher: Option<TemplateMatcher>, platform: Platform, timing: ClickTiming) -> Self {
        Self {
            config,
            matcher,
            platform,
            verifier: ClickVerifier::new(timing),
            previous: None,
            stats: Arc::new(Mutex::new(Stats::default())),
        }
    }

    fn reset(&mut self) {
        self.previous = None;
    }

    pub fn tick(&mut self, cancel: &CancelToken) -> TickOutcome {
        let frame = match self.platform.capture.capture(self.config.region) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                warn!("capture region has no on-screen area");
                lock(&self.stats).capture_failures += 1;
                return TickOutcome::CaptureFailed;
            }
            Err(e) => {
                warn!("{}", e);
                lock(&self.stats).capture_failures += 1;
                return TickOutcome::CaptureFailed;
            }
        };
        lock(&self.stats).ticks += 1;

        if self.config.change_detection {
            if let Some(prev) = &self.previous {
                let percent = change_percent(Some(prev), Some(&frame), self.config.change_sample_step);
                debug!("screen changed {}%", percent);
                lock(&self.stats).last_change_percent = Some(percent);

                if percent >= self.config.change_threshold_percent as u32 {
                    let outcome = match self.change_target() {
                        Some(target) => {
                            info!("change {}% >= {}%, clicking ({}, {})", percent, self.config.change_threshold_percent, target.x, target.y);
                            self.verifier.attempt(&mut self.platform, target, VerifyMode::Unverified, cancel)
                        }
                        None => ClickOutcome::OutOfBounds,
                    };
                    self.record_click(outcome, |s| s.change_triggers += 1);
                    self.previous = Some(frame);
                    return TickOutcome::ChangeTriggered { percent, outcome };
                }
            }
        }

        let mut result = TickOutcome::Idle;
        if let Some(matcher) = &self.matcher {
            if let Some(rect) = matcher.find(Some(&frame)) {
                let origin = self.config.region.map(|r| r.origin()).unwrap_or_default();
                let center = rect.center();
                let target = Point::new(origin.x + center.x, origin.y + center.y).offset(self.config.click_offset);
                info!("template found at {},{}, clicking ({}, {})", rect.x, rect.y, target.x, target.y);

                let mode = VerifyMode::Verified { matcher, region: self.config.region };
                let outcome = self.verifier.attempt(&mut self.platform, target, mode, cancel);
                self.record_click(outcome, |s| {
                    s.matches += 1;
                    s.last_match = Some(rect);
                });
                result = TickOutcome::Matched { rect, outcome };
            }
        }

        self.previous = Some(frame);
        result
    }

    /// Change-triggered clicks go to the region origin, or the display
    /// center when no region is set, plus the click offset.
    fn change_target(&self) -> Option<Point> {
        let base = match self.config.region {
            Some(region) => region.origin(),
            None => match self.platform.capture.screen_bounds() {
                Ok(bounds) => bounds.center(),
                Err(e) => {
                    warn!("cannot resolve change target: {}", e);
                    return None;
                }
            },
        };
        Some(base.offset(self.config.click_offset))
    }

    fn record_click(&self, outcome: ClickOutcome, update: impl FnOnce(&mut Stats)) {
        let mut stats = lock(&self.stats);
        update(&mut stats);
        match outcome {
            ClickOutcome::Cancelled { .. } => {}
            o if o.is_success() => stats.clicks_succeeded += 1,
            _ => stats.clicks_failed += 1,
        }
    }
}

struct Worker {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Clears the running flag when the worker exits, panics included.
struct RunningFlag(Arc<AtomicBool>);

impl Drop for RunningFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Background scan-match-click loop with a start/stop lifecycle.
///
/// `start`, `stop` and `is_running` may be called from any thread.
pub struct AutoClicker {
    config: AutomationConfig,
    scanner: Arc<Mutex<Scanner>>,
    stats: Arc<Mutex<Stats>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
}

impl AutoClicker {
    /// Load the reference template (if any) and prepare an idle loop.
    pub fn new(config: AutomationConfig, platform: Platform) -> Result<Self> {
        Self::with_timing(config, platform, ClickTiming::default())
    }

    pub fn with_timing(config: AutomationConfig, platform: Platform, timing: ClickTiming) -> Result<Self> {
        let config = config.normalized();
        let matcher = match &config.template_path {
            Some(path) => {
                let template = Raster::load(path)?;
                info!("loaded template {:?} ({}x{})", path, template.width(), template.height());
                Some(TemplateMatcher::new(template, config.tolerance, config.stride))
            }
            None => None,
        };
        if matcher.is_none() && !config.change_detection {
            warn!("no template and change detection disabled; nothing will be clicked");
        }

        let scanner = Scanner::new(config.clone(), matcher, platform, timing);
        let stats = Arc::clone(&scanner.stats);
        Ok(Self {
            config,
            scanner: Arc::new(Mutex::new(scanner)),
            stats,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    /// Spawn the worker. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut worker = lock(&self.worker);
        // A worker that cleared its flag has exited or is unwinding; reap it.
        if worker.is_some() && !self.is_running() {
            if let Some(dead) = worker.take() {
                if dead.handle.join().is_err() {
                    error!("scan worker panicked");
                }
            }
        }
        if worker.is_some() {
            debug!("start ignored, already running");
            return false;
        }

        let cancel = CancelToken::new();
        let token = cancel.clone();
        let scanner = Arc::clone(&self.scanner);
        let interval = self.config.scan_interval();

        self.running.store(true, Ordering::SeqCst);
        let flag = RunningFlag(Arc::clone(&self.running));
        let spawned = thread::Builder::new()
            .name("autoclick-scan".into())
            .spawn(move || {
                let _flag = flag;
                let mut scanner = lock(&scanner);
                scanner.reset();
                info!("automation loop started");
                while !token.is_cancelled() {
                    scanner.tick(&token);
                    if !token.sleep(interval) {
                        break;
                    }
                }
                info!("automation loop stopped");
            });

        match spawned {
            Ok(handle) => {
                *worker = Some(Worker { cancel, handle });
                true
            }
            // The closure, and its flag, were dropped with the error.
            Err(e) => {
                error!("failed to spawn scan worker: {}", e);
                false
            }
        }
    }

    /// Cancel the worker and wait for it to unwind. No-op when idle.
    pub fn stop(&self) {
        let mut worker = lock(&self.worker);
        let Some(w) = worker.take() else {
            return;
        };
        w.cancel.cancel();
        if w.handle.join().is_err() {
            error!("scan worker panicked");
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> RunState {
        if self.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    pub fn stats(&self) -> Stats {
        lock(&self.stats).clone()
    }
}

impl Drop for AutoClicker {
    fn drop(&mut self) {
        self.stop();
    }
}
