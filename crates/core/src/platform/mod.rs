pub mod stub;

#[cfg(feature = "desktop")]
pub mod desktop;

use tracing::info;

use crate::error::Result;
use crate::types::{Point, Raster, Region};

/// Produces snapshots of the primary display.
pub trait ScreenCapture: Send {
    /// Primary display bounds in absolute coordinates.
    fn screen_bounds(&self) -> Result<Region>;

    /// Capture `region` clamped to the display, or the whole display when
    /// `None`. A region with no on-screen area yields `Ok(None)`.
    fn capture(&mut self, region: Option<Region>) -> Result<Option<Raster>>;
}

/// Synthesizes primary-button clicks.
pub trait InputInjector: Send {
    /// Move to `point` (clamped to the display) and press/release the
    /// primary button.
    fn click(&mut self, point: Point) -> Result<()>;
}

/// The pair of OS capabilities the automation loop drives.
pub struct Platform {
    pub capture: Box<dyn ScreenCapture>,
    pub input: Box<dyn InputInjector>,
}

/// Resolve a capture request against the display bounds.
pub fn clamp_region(region: Option<Region>, bounds: Region) -> Option<Region> {
    match region {
        Some(r) => r.intersect(&bounds),
        None if bounds.width > 0 && bounds.height > 0 => Some(bounds),
        None => None,
    }
}

/// Create the platform appropriate for the current machine.
pub fn create_platform(force_stub: bool) -> Platform {
    if force_stub {
        info!("using stub platform");
        return Platform {
            capture: Box::new(stub::StubCapture::default()),
            input: Box::new(stub::StubInput),
        };
    }
    #[cfg(feature = "desktop")]
    {
        info!("using desktop platform");
        Platform {
            capture: Box::new(desktop::DesktopCapture),
            input: Box::new(desktop::DesktopInput),
        }
    }
    #[cfg(not(feature = "desktop"))]
    {
        tracing::warn!("built without desktop support, falling back to stub platform");
        Platform {
            capture: Box::new(stub::StubCapture::default()),
            input: Box::new(stub::StubInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_region_defaults_to_full_display() {
        let bounds = Region::new(0, 0, 800, 600);
        assert_eq!(clamp_region(None, bounds), Some(bounds));
        assert_eq!(
            clamp_region(Some(Region::new(700, 500, 300, 300)), bounds),
            Some(Region::new(700, 500, 100, 100))
        );
        assert_eq!(clamp_region(Some(Region::new(-300, 0, 300, 300)), bounds), None);
    }
}
