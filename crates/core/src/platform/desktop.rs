use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use image::imageops::{self, FilterType};
use tracing::debug;
use xcap::Monitor;

use crate::error::{Error, Result};
use crate::sleep;
use crate::types::{Point, Raster, Region};
use super::{clamp_region, InputInjector, ScreenCapture};

/// Delay between press and release.
const CLICK_HOLD_MS: u64 = 50;

fn capture_err(e: impl std::fmt::Display) -> Error {
    Error::Capture(e.to_string())
}

fn input_err(e: impl std::fmt::Display) -> Error {
    Error::Input(e.to_string())
}

fn primary_monitor() -> Result<Monitor> {
    let monitors = Monitor::all().map_err(capture_err)?;
    let idx = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);
    monitors
        .into_iter()
        .nth(idx)
        .ok_or_else(|| Error::Capture("no monitors found".into()))
}

fn monitor_bounds(monitor: &Monitor) -> Result<Region> {
    Ok(Region {
        x: monitor.x().map_err(capture_err)?,
        y: monitor.y().map_err(capture_err)?,
        width: monitor.width().map_err(capture_err)?,
        height: monitor.height().map_err(capture_err)?,
    })
}

/// Primary-monitor capture through `xcap`.
pub struct DesktopCapture;

impl ScreenCapture for DesktopCapture {
    fn screen_bounds(&self) -> Result<Region> {
        monitor_bounds(&primary_monitor()?)
    }

    fn capture(&mut self, region: Option<Region>) -> Result<Option<Raster>> {
        let monitor = primary_monitor()?;
        let bounds = monitor_bounds(&monitor)?;
        let Some(area) = clamp_region(region, bounds) else {
            return Ok(None);
        };

        let mut image = monitor.capture_image().map_err(capture_err)?;
        // HiDPI displays capture at physical resolution; bring the frame back
        // to the logical coordinates clicks are issued in.
        if image.width() != bounds.width || image.height() != bounds.height {
            debug!(
                "scaling capture {}x{} to {}x{}",
                image.width(),
                image.height(),
                bounds.width,
                bounds.height
            );
            image = imageops::resize(&image, bounds.width, bounds.height, FilterType::Triangle);
        }

        let rel_x = (area.x - bounds.x) as u32;
        let rel_y = (area.y - bounds.y) as u32;
        let cropped = imageops::crop_imm(&image, rel_x, rel_y, area.width, area.height).to_image();
        Ok(Some(Raster::from_rgba(cropped)))
    }
}

/// Synthetic mouse input through `enigo`.
pub struct DesktopInput;

impl InputInjector for DesktopInput {
    fn click(&mut self, point: Point) -> Result<()> {
        let mut enigo = Enigo::new(&Settings::default()).map_err(input_err)?;
        let (w, h) = enigo.main_display().map_err(input_err)?;
        let x = point.x.clamp(0, (w - 1).max(0));
        let y = point.y.clamp(0, (h - 1).max(0));

        enigo.move_mouse(x, y, Coordinate::Abs).map_err(input_err)?;
        enigo.button(Button::Left, Direction::Press).map_err(input_err)?;
        sleep::sleep_ms(CLICK_HOLD_MS);
        enigo.button(Button::Left, Direction::Release).map_err(input_err)?;
        debug!("clicked ({}, {})", x, y);
        Ok(())
    }
}
