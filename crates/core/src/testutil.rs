use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::platform::{InputInjector, Platform, ScreenCapture};
use crate::types::{Point, Raster, Region};

/// Frame the scripted capture hands out next.
pub enum Frame {
    Image(Raster),
    OffScreen,
    Fail,
    /// Capture panics, as a crashing backend would.
    Panic,
}

/// Capture that replays queued frames, then repeats `fallback`.
pub struct ScriptedCapture {
    pub bounds: Region,
    pub frames: Arc<Mutex<VecDeque<Frame>>>,
    pub fallback: Raster,
    pub requests: Arc<Mutex<Vec<Option<Region>>>>,
}

impl ScreenCapture for ScriptedCapture {
    fn screen_bounds(&self) -> Result<Region> {
        Ok(self.bounds)
    }

    fn capture(&mut self, region: Option<Region>) -> Result<Option<Raster>> {
        self.requests.lock().unwrap().push(region);
        let next = self.frames.lock().unwrap().pop_front();
        match next {
            Some(Frame::Image(r)) => Ok(Some(r)),
            Some(Frame::OffScreen) => Ok(None),
            Some(Frame::Fail) => Err(Error::Capture("display unavailable".into())),
            Some(Frame::Panic) => panic!("capture backend crashed"),
            None => Ok(Some(self.fallback.clone())),
        }
    }
}

pub struct RecordingInput {
    pub clicks: Arc<Mutex<Vec<Point>>>,
}

impl InputInjector for RecordingInput {
    fn click(&mut self, point: Point) -> Result<()> {
        self.clicks.lock().unwrap().push(point);
        Ok(())
    }
}

/// Handles for inspecting a fake platform after it has been moved away.
pub struct Probe {
    pub frames: Arc<Mutex<VecDeque<Frame>>>,
    pub clicks: Arc<Mutex<Vec<Point>>>,
    pub requests: Arc<Mutex<Vec<Option<Region>>>>,
}

impl Probe {
    pub fn push(&self, frame: Frame) {
        self.frames.lock().unwrap().push_back(frame);
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.clicks.lock().unwrap().clone()
    }
}

/// Fake platform on a `width`x`height` display that keeps showing `fallback`
/// once its queue is drained.
pub fn fake_platform(width: u32, height: u32, fallback: Raster) -> (Platform, Probe) {
    let frames = Arc::new(Mutex::new(VecDeque::new()));
    let clicks = Arc::new(Mutex::new(Vec::new()));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let platform = Platform {
        capture: Box::new(ScriptedCapture {
            bounds: Region::new(0, 0, width, height),
            frames: Arc::clone(&frames),
            fallback,
            requests: Arc::clone(&requests),
        }),
        input: Box::new(RecordingInput { clicks: Arc::clone(&clicks) }),
    };
    (platform, Probe { frames, clicks, requests })
}
