mod app;
pub mod event;
mod quit;
mod ui;

pub use app::App;
