//! Screen automation core: capture a display region, look for a reference
//! template or bulk pixel change, and click when something is detected.

pub mod change;
pub mod clicker;
pub mod config;
pub mod error;
pub mod logger;
pub mod matcher;
pub mod orchestrator;
pub mod platform;
pub mod sleep;
pub mod types;

#[cfg(test)]
mod testutil;

pub use config::AutomationConfig;
pub use error::{Error, Result};
pub use orchestrator::{AutoClicker, Stats};
