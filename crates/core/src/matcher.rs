use image::Rgba;

use crate::types::{MatchResult, Raster, Rect};

/// Sparse pre-check samples roughly a 4x4 grid of the template.
const SPARSE_GRID_DIVISOR: u32 = 4;

/// Whether two pixels are within `tolerance` in RGB space. Alpha is ignored.
#[inline]
pub fn pixels_close(p1: Rgba<u8>, p2: Rgba<u8>, tolerance: u32) -> bool {
    if tolerance == 0 {
        return p1[0] == p2[0] && p1[1] == p2[1] && p1[2] == p2[2];
    }
    let dr = p1[0] as i64 - p2[0] as i64;
    let dg = p1[1] as i64 - p2[1] as i64;
    let db = p1[2] as i64 - p2[2] as i64;
    let tol = tolerance as i64;
    dr * dr + dg * dg + db * db <= tol * tol
}

/// First offset, in row-major scan order, where `template` fits `raster`.
///
/// Offsets advance by `stride` on both axes starting at (0, 0). Fully
/// transparent template pixels never constrain the match. This is a
/// first-match search, not a best-match one.
pub fn find_match(raster: &Raster, template: &Raster, tolerance: u32, stride: u32) -> Option<MatchResult> {
    if template.is_empty() || raster.is_empty() {
        return None;
    }
    if template.width() > raster.width() || template.height() > raster.height() {
        return None;
    }

    let stride = stride.max(1) as usize;
    let max_x = raster.width() - template.width();
    let max_y = raster.height() - template.height();

    for y in (0..=max_y).step_by(stride) {
        for x in (0..=max_x).step_by(stride) {
            if is_match(raster, template, x, y, tolerance) {
                return Some(Rect::new(x, y, template.width(), template.height()));
            }
        }
    }
    None
}

fn is_match(raster: &Raster, template: &Raster, x: u32, y: u32, tolerance: u32) -> bool {
    sparse_check(raster, template, x, y, tolerance) && full_check(raster, template, x, y, tolerance)
}

fn sparse_check(raster: &Raster, template: &Raster, x: u32, y: u32, tolerance: u32) -> bool {
    let step_x = (template.width() / SPARSE_GRID_DIVISOR).max(1) as usize;
    let step_y = (template.height() / SPARSE_GRID_DIVISOR).max(1) as usize;

    for ty in (0..template.height()).step_by(step_y) {
        for tx in (0..template.width()).step_by(step_x) {
            if !template_pixel_fits(raster, template, x, y, tx, ty, tolerance) {
                return false;
            }
        }
    }
    true
}

fn full_check(raster: &Raster, template: &Raster, x: u32, y: u32, tolerance: u32) -> bool {
    for ty in 0..template.height() {
        for tx in 0..template.width() {
            if !template_pixel_fits(raster, template, x, y, tx, ty, tolerance) {
                return false;
            }
        }
    }
    true
}

#[inline]
fn template_pixel_fits(raster: &Raster, template: &Raster, x: u32, y: u32, tx: u32, ty: u32, tolerance: u32) -> bool {
    let tp = template.pixel(tx, ty);
    if tp[3] == 0 {
        return true;
    }
    pixels_close(tp, raster.pixel(x + tx, y + ty), tolerance)
}

/// A reference template bound to its search parameters.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    template: Raster,
    tolerance: u32,
    stride: u32,
}

impl TemplateMatcher {
    pub fn new(template: Raster, tolerance: u32, stride: u32) -> Self {
        Self { template, tolerance, stride: stride.max(1) }
    }

    /// `None` when the raster is absent or the template is not found.
    pub fn find(&self, raster: Option<&Raster>) -> Option<MatchResult> {
        raster.and_then(|r| find_match(r, &self.template, self.tolerance, self.stride))
    }
}
