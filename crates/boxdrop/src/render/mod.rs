//! Rendering module

mod renderer;

pub use renderer::Renderer;
