use tracing::info;

use crate::error::Result;
use crate::types::{Point, Raster, Region};
use super::{clamp_region, InputInjector, ScreenCapture};

/// Fake 1920x1080 display filled with a single color.
pub struct StubCapture {
    pub bounds: Region,
    pub color: [u8; 4],
}

impl Default for StubCapture {
    fn default() -> Self {
        Self {
            bounds: Region::new(0, 0, 1920, 1080),
            color: [48, 48, 48, 255],
        }
    }
}

impl ScreenCapture for StubCapture {
    fn screen_bounds(&self) -> Result<Region> {
        Ok(self.bounds)
    }

    fn capture(&mut self, region: Option<Region>) -> Result<Option<Raster>> {
        info!(target: "stub", "capture({:?})", region);
        Ok(clamp_region(region, self.bounds).map(|r| Raster::solid(r.width, r.height, self.color)))
    }
}

pub struct StubInput;

impl InputInjector for StubInput {
    fn click(&mut self, point: Point) -> Result<()> {
        info!(target: "stub", "click({}, {})", point.x, point.y);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_capture_honours_region_clamping() {
        let mut capture = StubCapture::default();
        let full = capture.capture(None).unwrap().unwrap();
        assert_eq!((full.width(), full.height()), (1920, 1080));

        let part = capture.capture(Some(Region::new(1900, 1000, 100, 100))).unwrap().unwrap();
        assert_eq!((part.width(), part.height()), (20, 80));

        assert!(capture.capture(Some(Region::new(5000, 0, 10, 10))).unwrap().is_none());
    }
}
