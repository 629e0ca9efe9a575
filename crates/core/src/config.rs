use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Offset, Region};

pub const MIN_SCAN_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_TOLERANCE: u32 = 30;
pub const DEFAULT_STRIDE: u32 = 2;
pub const DEFAULT_CHANGE_THRESHOLD_PERCENT: u8 = 5;
pub const DEFAULT_CHANGE_SAMPLE_STEP: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Reference image to look for. `None` (or an empty path) means no
    /// template matching; only change detection can trigger clicks.
    pub template_path: Option<PathBuf>,
    /// Euclidean RGB distance accepted per pixel. 0 requires exact equality.
    pub tolerance: u32,
    /// Step between candidate offsets, in both axes.
    pub stride: u32,
    pub click_offset: Offset,
    pub scan_interval_ms: u64,
    /// Capture area. `None` means the whole primary display.
    pub region: Option<Region>,
    pub change_detection: bool,
    pub change_threshold_percent: u8,
    pub change_sample_step: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            template_path: None,
            tolerance: DEFAULT_TOLERANCE,
            stride: DEFAULT_STRIDE,
            click_offset: Offset::default(),
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            region: None,
            change_detection: false,
            change_threshold_percent: DEFAULT_CHANGE_THRESHOLD_PERCENT,
            change_sample_step: DEFAULT_CHANGE_SAMPLE_STEP,
        }
    }
}

impl AutomationConfig {
    /// Read a JSON config. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply every clamp so downstream code can rely on the ranges.
    pub fn normalized(mut self) -> Self {
        if self
            .template_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.template_path = None;
        }
        self.stride = self.stride.max(1);
        self.scan_interval_ms = self.scan_interval_ms.max(MIN_SCAN_INTERVAL_MS);
        self.change_threshold_percent = self.change_threshold_percent.clamp(1, 100);
        self.change_sample_step = self.change_sample_step.max(1);
        self.region = self.region.filter(|r| r.width > 0 && r.height > 0);
        self
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.max(MIN_SCAN_INTERVAL_MS))
    }

    pub fn has_template(&self) -> bool {
        self.template_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }
}
