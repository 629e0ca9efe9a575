use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Immutable RGBA pixel grid. Three-channel sources get an opaque alpha.
#[derive(Clone, PartialEq)]
pub struct Raster {
    inner: RgbaImage,
}

impl Raster {
    pub fn from_rgba(inner: RgbaImage) -> Self {
        Self { inner }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { inner: image.into_rgba8() }
    }

    /// Decode an image file into a raster.
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|source| Error::TemplateLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(image))
    }

    /// Uniformly colored raster.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self { inner: RgbaImage::from_pixel(width, height, Rgba(color)) }
    }

    pub fn from_fn(width: u32, height: u32, f: impl FnMut(u32, u32) -> Rgba<u8>) -> Self {
        Self { inner: RgbaImage::from_fn(width, height, f) }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.width() == 0 || self.inner.height() == 0
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.inner.get_pixel(x, y)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.inner
    }

    /// Copy out a sub-rectangle. The rectangle must lie inside the raster.
    pub fn crop(&self, rect: Rect) -> Raster {
        let view = image::imageops::crop_imm(&self.inner, rect.x, rect.y, rect.width, rect.height);
        Self { inner: view.to_image() }
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Raster({}x{})", self.width(), self.height())
    }
}

/// Rectangle relative to the raster it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.x + self.width / 2) as i32,
            y: (self.y + self.height / 2) as i32,
        }
    }
}

/// A template match: top-left offset plus the template's dimensions.
pub type MatchResult = Rect;

/// Capture area in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point { x: self.x, y: self.y }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + (self.width / 2) as i32,
            y: self.y + (self.height / 2) as i32,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        let (px, py) = (p.x as i64, p.y as i64);
        px >= self.x as i64
            && py >= self.y as i64
            && px < self.x as i64 + self.width as i64
            && py < self.y as i64 + self.height as i64
    }

    /// Overlap of two regions, `None` when it has zero area.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let l = (self.x as i64).max(other.x as i64);
        let t = (self.y as i64).max(other.y as i64);
        let r = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let b = (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);
        if r <= l || b <= t {
            return None;
        }
        Some(Region {
            x: l as i32,
            y: t as i32,
            width: (r - l) as u32,
            height: (b - t) as u32,
        })
    }
}

impl FromStr for Region {
    type Err = String;

    /// Parses `x,y,w,h`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,w,h but got \"{}\"", s));
        }
        let x = parts[0].parse::<i32>().map_err(|e| format!("x: {}", e))?;
        let y = parts[1].parse::<i32>().map_err(|e| format!("y: {}", e))?;
        let width = parts[2].parse::<u32>().map_err(|e| format!("width: {}", e))?;
        let height = parts[3].parse::<u32>().map_err(|e| format!("height: {}", e))?;
        if width == 0 || height == 0 {
            return Err("region must have a non-zero area".into());
        }
        Ok(Region { x, y, width, height })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Absolute screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Offset) -> Point {
        Point {
            x: self.x.saturating_add(by.x),
            y: self.y.saturating_add(by.y),
        }
    }
}

/// Signed displacement added to a computed click point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

/// Lifecycle of an automation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parses_from_cli_form() {
        let r: Region = "10, 20,300,400".parse().unwrap();
        assert_eq!(r, Region::new(10, 20, 300, 400));
        assert!("1,2,3".parse::<Region>().is_err());
        assert!("1,2,0,4".parse::<Region>().is_err());
    }

    #[test]
    fn region_intersection_clamps_to_bounds() {
        let screen = Region::new(0, 0, 1920, 1080);
        let r = Region::new(1800, -50, 400, 200);
        assert_eq!(r.intersect(&screen), Some(Region::new(1800, 0, 120, 150)));
        assert_eq!(Region::new(2000, 0, 10, 10).intersect(&screen), None);
    }

    #[test]
    fn region_contains_is_half_open() {
        let screen = Region::new(0, 0, 100, 50);
        assert!(screen.contains(Point::new(0, 0)));
        assert!(screen.contains(Point::new(99, 49)));
        assert!(!screen.contains(Point::new(100, 10)));
        assert!(!screen.contains(Point::new(-1, 10)));
    }

    #[test]
    fn three_channel_images_become_opaque() {
        let rgb = image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let raster = Raster::from_image(DynamicImage::ImageRgb8(rgb));
        assert_eq!(raster.pixel(1, 1), Rgba([1, 2, 3, 255]));
    }
}
