//! Rigid body physics backend

use std::fmt::Debug;
use std::num::NonZeroUsize;

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a body moves under simulation or stays put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Surface and mass properties of a box shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxMaterial {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for BoxMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.3,
            restitution: 0.5,
        }
    }
}

/// What the simulation loop needs from a physics engine.
///
/// Handles are opaque and owned by the backend; callers hold copies and
/// resolve them again every frame through [`PhysicsBackend::body_position`].
pub trait PhysicsBackend {
    type BodyHandle: Copy + Debug + PartialEq;

    fn create_body(&mut self, kind: BodyKind, position: Vec2) -> Self::BodyHandle;

    fn attach_box(&mut self, body: Self::BodyHandle, half_extents: Vec2, material: BoxMaterial);

    /// Advance by `dt` seconds using `sub_steps` solver iterations
    fn step(&mut self, dt: f32, sub_steps: usize);

    /// Current center of `body`, or `None` if the handle no longer resolves
    fn body_position(&self, body: Self::BodyHandle) -> Option<Vec2>;

    fn remove_body(&mut self, body: Self::BodyHandle);
}

/// Manages rapier2d physics world
pub struct RapierWorld {
    /// World gravity in m/s^2
    gravity: Vector<Real>,

    /// Rapier rigid body set
    rigid_body_set: RigidBodySet,

    /// Rapier collider set
    collider_set: ColliderSet,

    /// Physics pipeline
    pipeline: PhysicsPipeline,

    /// Integration parameters
    integration_parameters: IntegrationParameters,

    /// Island manager
    island_manager: IslandManager,

    /// Broad phase
    broad_phase: BroadPhase,

    /// Narrow phase
    narrow_phase: NarrowPhase,

    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver
    ccd_solver: CCDSolver,

    /// Query pipeline
    query_pipeline: QueryPipeline,
}

impl RapierWorld {
    pub fn new(gravity: Vec2) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: 1.0 / 60.0, // 60 FPS
            ..Default::default()
        };

        log::debug!(
            "Physics: Created world with gravity ({}, {})",
            gravity.x,
            gravity.y
        );

        Self {
            gravity: vector![gravity.x, gravity.y],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    /// Number of bodies (static and dynamic) currently in the world
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -9.81))
    }
}

impl PhysicsBackend for RapierWorld {
    type BodyHandle = RigidBodyHandle;

    fn create_body(&mut self, kind: BodyKind, position: Vec2) -> RigidBodyHandle {
        let builder = match kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let rigid_body = builder.translation(vector![position.x, position.y]).build();
        let handle = self.rigid_body_set.insert(rigid_body);

        log::debug!(
            "Physics: Created {:?} body {:?} at ({:.2}, {:.2})",
            kind,
            handle,
            position.x,
            position.y
        );

        handle
    }

    fn attach_box(&mut self, body: RigidBodyHandle, half_extents: Vec2, material: BoxMaterial) {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .density(material.density)
            .friction(material.friction)
            .restitution(material.restitution)
            .build();

        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
    }

    fn step(&mut self, dt: f32, sub_steps: usize) {
        self.integration_parameters.dt = dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(sub_steps).unwrap_or(NonZeroUsize::MIN);

        let physics_hooks = ();
        let event_handler = ();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
    }

    fn body_position(&self, body: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body).map(|b| {
            let translation = b.translation();
            Vec2::new(translation.x, translation.y)
        })
    }

    fn remove_body(&mut self, body: RigidBodyHandle) {
        // Attached colliders go with the body
        self.rigid_body_set.remove(
            body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}
