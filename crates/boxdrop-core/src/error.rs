//! Error types for the sandbox core

use thiserror::Error;

/// Spawn refused because the registry is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("entity registry is full ({capacity} bodies)")]
pub struct SpawnRejected {
    pub capacity: usize,
}

/// Per-frame failure reported by a render surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to acquire frame: {0}")]
    Acquire(String),

    #[error("failed to present frame: {0}")]
    Present(String),
}

/// Invalid sandbox configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_bodies must be at least 1")]
    ZeroCapacity,

    #[error("pixels_per_meter must be positive and finite, got {0}")]
    InvalidScale(f32),

    #[error("canvas must have a non-zero size, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("time_step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),

    #[error("sub_steps must be at least 1")]
    ZeroSubSteps,

    #[error("body size must be positive, got {width}x{height}")]
    InvalidBodySize { width: f32, height: f32 },

    #[error("ground must have a positive finite size, got strip {height} px and half extents {half_extents:?}")]
    InvalidGround { height: f32, half_extents: [f32; 2] },
}

/// Failure while building a sandbox
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
