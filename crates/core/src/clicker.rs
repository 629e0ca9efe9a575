use std::time::Duration;

use tracing::{debug, info, warn};

use crate::matcher::TemplateMatcher;
use crate::platform::Platform;
use crate::sleep::CancelToken;
use crate::types::{Point, Region};

pub const MAX_CLICK_RETRIES: u32 = 5;
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);
pub const RETRY_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickTiming {
    /// Wait after each click before re-sampling the screen.
    pub settle: Duration,
    /// Extra wait before retrying when the template is still visible.
    pub backoff: Duration,
    pub max_retries: u32,
}

impl Default for ClickTiming {
    fn default() -> Self {
        Self {
            settle: SETTLE_DELAY,
            backoff: RETRY_BACKOFF,
            max_retries: MAX_CLICK_RETRIES,
        }
    }
}

/// How a click's effect is confirmed.
#[derive(Debug, Clone, Copy)]
pub enum VerifyMode<'a> {
    /// Click `max_retries` times; nothing to re-check against.
    Unverified,
    /// Click until `matcher` no longer finds its template in `region`.
    Verified {
        matcher: &'a TemplateMatcher,
        region: Option<Region>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Unverified run finished all its clicks.
    Completed { clicks: u32 },
    /// The template disappeared after a click.
    Confirmed { clicks: u32 },
    /// Target is not on the primary display; nothing was clicked.
    OutOfBounds,
    /// Every retry ran and the template is still on screen.
    Exhausted { clicks: u32 },
    /// Stop was requested mid-protocol.
    Cancelled { clicks: u32 },
}

impl ClickOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ClickOutcome::Completed { .. } | ClickOutcome::Confirmed { .. })
    }
}

/// Click, wait, re-sample, retry.
#[derive(Debug, Clone, Default)]
pub struct ClickVerifier {
    timing: ClickTiming,
}

impl ClickVerifier {
    pub fn new(timing: ClickTiming) -> Self {
        Self { timing }
    }

    pub fn attempt(
        &self,
        platform: &mut Platform,
        target: Point,
        mode: VerifyMode<'_>,
        cancel: &CancelToken,
    ) -> ClickOutcome {
        match platform.capture.screen_bounds() {
            Ok(bounds) if bounds.contains(target) => {}
            Ok(bounds) => {
                warn!("target ({}, {}) is outside display {}", target.x, target.y, bounds);
                return ClickOutcome::OutOfBounds;
            }
            Err(e) => {
                warn!("cannot check target ({}, {}): {}", target.x, target.y, e);
                return ClickOutcome::OutOfBounds;
            }
        }

        match mode {
            VerifyMode::Unverified => self.click_unverified(platform, target, cancel),
            VerifyMode::Verified { matcher, region } => {
                self.click_verified(platform, target, matcher, region, cancel)
            }
        }
    }

    fn click_once(platform: &mut Platform, target: Point) {
        if let Err(e) = platform.input.click(target) {
            warn!("click at ({}, {}) failed: {}", target.x, target.y, e);
        }
    }

    fn click_unverified(&self, platform: &mut Platform, target: Point, cancel: &CancelToken) -> ClickOutcome {
        let mut clicks = 0;
        for _ in 0..self.timing.max_retries {
            if cancel.is_cancelled() {
                return ClickOutcome::Cancelled { clicks };
            }
            Self::click_once(platform, target);
            clicks += 1;
            if !cancel.sleep(self.timing.settle) {
                return ClickOutcome::Cancelled { clicks };
            }
        }
        info!("clicked ({}, {}) {} times", target.x, target.y, clicks);
        ClickOutcome::Completed { clicks }
    }

    fn click_verified(
        &self,
        platform: &mut Platform,
        target: Point,
        matcher: &TemplateMatcher,
        region: Option<Region>,
        cancel: &CancelToken,
    ) -> ClickOutcome {
        let mut clicks = 0;
        for attempt in 1..=self.timing.max_retries {
            if cancel.is_cancelled() {
                return ClickOutcome::Cancelled { clicks };
            }
            Self::click_once(platform, target);
            clicks += 1;
            if !cancel.sleep(self.timing.settle) {
                return ClickOutcome::Cancelled { clicks };
            }

            match platform.capture.capture(region) {
                Ok(frame) => {
                    if matcher.find(frame.as_ref()).is_none() {
                        info!("target gone after {} click(s)", clicks);
                        return ClickOutcome::Confirmed { clicks };
                    }
                    debug!("target still visible after attempt {}", attempt);
                }
                // An unreadable frame proves nothing; keep trying.
                Err(e) => warn!("verification capture failed: {}", e),
            }

            if attempt < self.timing.max_retries && !cancel.sleep(self.timing.backoff) {
                return ClickOutcome::Cancelled { clicks };
            }
        }
        warn!("target still visible after {} clicks", clicks);
        ClickOutcome::Exhausted { clicks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fake_platform, Frame};
    use crate::types::Raster;

    const BG: [u8; 4] = [0, 0, 0, 255];
    const BUTTON: [u8; 4] = [0, 180, 0, 255];

    fn instant() -> ClickVerifier {
        ClickVerifier::new(ClickTiming {
            settle: Duration::ZERO,
            backoff: Duration::ZERO,
            max_retries: MAX_CLICK_RETRIES,
        })
    }

    fn with_button() -> Raster {
        Raster::from_fn(40, 40, |x, y| {
            if (10..20).contains(&x) && (10..20).contains(&y) { image::Rgba(BUTTON) } else { image::Rgba(BG) }
        })
    }

    fn matcher() -> TemplateMatcher {
        TemplateMatcher::new(Raster::solid(10, 10, BUTTON), 0, 1)
    }

    #[test]
    fn unverified_mode_clicks_every_retry() {
        let (mut platform, probe) = fake_platform(100, 100, Raster::solid(40, 40, BG));
        let outcome = instant().attempt(&mut platform, Point::new(50, 50), VerifyMode::Unverified, &CancelToken::new());

        assert_eq!(outcome, ClickOutcome::Completed { clicks: MAX_CLICK_RETRIES });
        assert!(outcome.is_success());
        assert_eq!(probe.clicks(), vec![Point::new(50, 50); MAX_CLICK_RETRIES as usize]);
    }

    #[test]
    fn out_of_bounds_target_is_never_clicked() {
        let (mut platform, probe) = fake_platform(100, 100, Raster::solid(40, 40, BG));
        let cancel = CancelToken::new();
        for target in [Point::new(100, 5), Point::new(-1, 5), Point::new(5, 400)] {
            let outcome = instant().attempt(&mut platform, target, VerifyMode::Unverified, &cancel);
            assert_eq!(outcome, ClickOutcome::OutOfBounds);
            assert!(!outcome.is_success());
        }
        assert!(probe.clicks().is_empty());
    }

    #[test]
    fn verified_mode_stops_once_target_disappears() {
        let (mut platform, probe) = fake_platform(100, 100, Raster::solid(40, 40, BG));
        // Still visible after the first click, gone after the second.
        probe.push(Frame::Image(with_button()));

        let m = matcher();
        let mode = VerifyMode::Verified { matcher: &m, region: Some(Region::new(0, 0, 40, 40)) };
        let outcome = instant().attempt(&mut platform, Point::new(15, 15), mode, &CancelToken::new());

        assert_eq!(outcome, ClickOutcome::Confirmed { clicks: 2 });
        assert_eq!(probe.clicks().len(), 2);
        assert!(probe.requests.lock().unwrap().iter().all(|r| *r == Some(Region::new(0, 0, 40, 40))));
    }

    #[test]
    fn verified_mode_reports_exhaustion() {
        let (mut platform, probe) = fake_platform(100, 100, with_button());
        let m = matcher();
        let mode = VerifyMode::Verified { matcher: &m, region: None };
        let outcome = instant().attempt(&mut platform, Point::new(15, 15), mode, &CancelToken::new());

        assert_eq!(outcome, ClickOutcome::Exhausted { clicks: MAX_CLICK_RETRIES });
        assert!(!outcome.is_success());
        assert_eq!(probe.clicks().len(), MAX_CLICK_RETRIES as usize);
    }

    #[test]
    fn failed_verification_capture_keeps_retrying() {
        let (mut platform, probe) = fake_platform(100, 100, Raster::solid(40, 40, BG));
        probe.push(Frame::Fail);
        probe.push(Frame::Fail);

        let m = matcher();
        let mode = VerifyMode::Verified { matcher: &m, region: None };
        let outcome = instant().attempt(&mut platform, Point::new(15, 15), mode, &CancelToken::new());
        assert_eq!(outcome, ClickOutcome::Confirmed { clicks: 3 });
    }

    #[test]
    fn cancelled_token_stops_before_clicking() {
        let (mut platform, probe) = fake_platform(100, 100, with_button());
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = instant().attempt(&mut platform, Point::new(15, 15), VerifyMode::Unverified, &cancel);
        assert_eq!(outcome, ClickOutcome::Cancelled { clicks: 0 });
        assert!(probe.clicks().is_empty());
    }
}
