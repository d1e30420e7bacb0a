// The reader side: article grid and comment
// sidebar, against a backend reached over HTTP.
pub mod api;
pub mod articles;
pub mod controller;
pub mod pager;
pub mod render;
pub mod ui;

pub use api::{ApiError, HttpReaderApi, ReaderApi};
pub use controller::ReaderController;
pub use pager::ScrollMetrics;
pub use ui::Ui;

#[cfg(test)]
mod tests;
