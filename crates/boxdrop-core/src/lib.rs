//! # boxdrop-core
//!
//! Click-to-spawn rigid body sandbox, minus the window. Spawned boxes live in
//! a bounded [`EntityRegistry`], physics advances in fixed steps through a
//! [`PhysicsBackend`], and every frame the boxes are redrawn on a
//! [`RenderSurface`] after mapping simulation space (meters, Y-up) to screen
//! space (pixels, Y-down).

pub mod color;
pub mod config;
pub mod coords;
pub mod error;
pub mod physics;
pub mod registry;
pub mod sandbox;
pub mod surface;

pub use color::Rgba;
pub use config::SandboxConfig;
pub use coords::CoordinateMapper;
pub use error::{ConfigError, SandboxError, SpawnRejected, SurfaceError};
pub use physics::{BodyKind, BoxMaterial, PhysicsBackend, RapierWorld};
pub use registry::{Entity, EntityHandle, EntityRegistry, SpawnRequest};
pub use sandbox::{FrameSummary, Ground, LoopState, Sandbox};
pub use surface::{DrawRect, InputEvent, RecordedFrame, RenderSurface, ScriptedSurface};
