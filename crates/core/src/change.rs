use crate::types::Raster;

/// Squared RGB distance above which a sampled pixel counts as changed (30²).
pub const PIXEL_CHANGE_THRESHOLD_SQ: i64 = 900;

/// Percentage of sampled pixels that changed between two frames, truncated.
///
/// Only the overlapping area is compared, sampled every `sample_step`
/// pixels on both axes. Absent frames or an empty overlap yield 0.
pub fn change_percent(prev: Option<&Raster>, curr: Option<&Raster>, sample_step: u32) -> u32 {
    let (Some(prev), Some(curr)) = (prev, curr) else {
        return 0;
    };
    let w = prev.width().min(curr.width());
    let h = prev.height().min(curr.height());
    if w == 0 || h == 0 {
        return 0;
    }

    let step = sample_step.max(1) as usize;
    let mut total: u64 = 0;
    let mut changed: u64 = 0;

    for y in (0..h).step_by(step) {
        for x in (0..w).step_by(step) {
            let a = prev.pixel(x, y);
            let b = curr.pixel(x, y);
            let dr = a[0] as i64 - b[0] as i64;
            let dg = a[1] as i64 - b[1] as i64;
            let db = a[2] as i64 - b[2] as i64;
            if dr * dr + dg * dg + db * db > PIXEL_CHANGE_THRESHOLD_SQ {
                changed += 1;
            }
            total += 1;
        }
    }

    (changed * 100 / total) as u32
}
