//! # boxdrop
//!
//! Click anywhere in the window to drop a box. Boxes fall under gravity,
//! bounce off the ground and pile up until the registry is full. `R` clears
//! the boxes, `Escape` quits.

pub mod app;
pub mod config;
pub mod headless;
pub mod render;

pub use app::App;
