//! Sandbox configuration
//!
//! Defaults reproduce the classic 640x480 demo: 30 px per meter, gravity
//! (0, -1), up to 20 boxes of 20x20 px, a green ground strip 50 px tall.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::coords::{CoordinateMapper, CANVAS_HEIGHT, CANVAS_WIDTH, PIXELS_PER_METER};
use crate::error::ConfigError;
use crate::physics::BoxMaterial;

/// Main sandbox configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SandboxConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub bodies: BodyConfig,

    #[serde(default)]
    pub ground: GroundConfig,

    #[serde(default)]
    pub colors: ColorConfig,

    /// Seed for body colors; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Canvas size and simulation scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub pixels_per_meter: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH as u32,
            height: CANVAS_HEIGHT as u32,
            pixels_per_meter: PIXELS_PER_METER,
        }
    }
}

/// Physics stepping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity in m/s^2, Y-up
    pub gravity: [f32; 2],
    /// Simulated seconds per frame
    pub time_step: f32,
    /// Solver iterations per step
    pub sub_steps: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -1.0],
            time_step: 1.0 / 60.0,
            sub_steps: 4,
        }
    }
}

/// Spawned boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Registry capacity; clicks beyond it are ignored
    pub max_bodies: usize,
    /// Box width in pixels
    pub width: f32,
    /// Box height in pixels
    pub height: f32,
    pub material: BoxMaterial,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_bodies: 20,
            width: 20.0,
            height: 20.0,
            material: BoxMaterial::default(),
        }
    }
}

/// Static ground fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Height of the drawn strip at the bottom of the canvas, in pixels
    pub height: f32,
    /// Half extents of the ground box in meters
    pub half_extents: [f32; 2],
    pub material: BoxMaterial,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            height: 50.0,
            half_extents: [50.0, 10.0],
            material: BoxMaterial {
                density: 1.0,
                friction: 0.6,
                restitution: 0.5,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub background: Rgba,
    pub ground: Rgba,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: Rgba::opaque(22, 255, 255),
            ground: Rgba::opaque(0, 128, 0),
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.canvas.pixels_per_meter;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::InvalidScale(scale));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::InvalidCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        let dt = self.world.time_step;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(dt));
        }
        if self.world.sub_steps == 0 {
            return Err(ConfigError::ZeroSubSteps);
        }
        if self.bodies.max_bodies == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.bodies.width > 0.0 && self.bodies.height > 0.0) {
            return Err(ConfigError::InvalidBodySize {
                width: self.bodies.width,
                height: self.bodies.height,
            });
        }
        let strip = self.ground.height;
        let [hx, hy] = self.ground.half_extents;
        if ![strip, hx, hy].iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(ConfigError::InvalidGround {
                height: strip,
                half_extents: self.ground.half_extents,
            });
        }
        Ok(())
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.canvas.pixels_per_meter, self.canvas.height as f32)
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::from(self.world.gravity)
    }

    pub fn body_size(&self) -> Vec2 {
        Vec2::new(self.bodies.width, self.bodies.height)
    }
}
