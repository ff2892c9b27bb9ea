//! Bounded storage for spawned boxes
//!
//! The registry owns each entity's draw rectangle and color and keeps a copy
//! of its physics handle. Storage is allocated once at the configured
//! capacity; a full registry rejects spawns instead of growing.

use glam::Vec2;

use crate::color::Rgba;
use crate::coords::CoordinateMapper;
use crate::error::SpawnRejected;
use crate::physics::{BodyKind, BoxMaterial, PhysicsBackend};
use crate::surface::DrawRect;

/// Index of an entity in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(usize);

impl EntityHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A spawned box
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<H> {
    handle: EntityHandle,
    body: H,
    rect: DrawRect,
    color: Rgba,
}

impl<H: Copy> Entity<H> {
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Physics body backing this entity
    pub fn body(&self) -> H {
        self.body
    }

    pub fn rect(&self) -> DrawRect {
        self.rect
    }

    pub fn color(&self) -> Rgba {
        self.color
    }
}

/// Parameters for one spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    /// Click position in screen space; becomes the box center
    pub position: Vec2,
    /// Box size in pixels
    pub size: Vec2,
    pub material: BoxMaterial,
}

/// Fixed-capacity, insertion-ordered entity storage
#[derive(Debug)]
pub struct EntityRegistry<H> {
    entities: Vec<Entity<H>>,
    capacity: usize,
}

impl<H: Copy> EntityRegistry<H> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a body for `request` and track it.
    ///
    /// When the registry is full nothing happens: no body is created and
    /// `color` is not called.
    pub fn try_spawn<P>(
        &mut self,
        physics: &mut P,
        mapper: &CoordinateMapper,
        request: SpawnRequest,
        color: impl FnOnce() -> Rgba,
    ) -> Result<EntityHandle, SpawnRejected>
    where
        P: PhysicsBackend<BodyHandle = H>,
    {
        if self.is_full() {
            return Err(SpawnRejected {
                capacity: self.capacity,
            });
        }

        let position = mapper.to_simulation(request.position);
        let body = physics.create_body(BodyKind::Dynamic, position);
        let half_extents = mapper.pixels_to_meters(request.size * 0.5);
        physics.attach_box(body, half_extents, request.material);

        let handle = EntityHandle(self.entities.len());
        self.entities.push(Entity {
            handle,
            body,
            rect: DrawRect::centered(request.position, request.size),
            color: color(),
        });

        Ok(handle)
    }

    /// Live entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<H>> + '_ {
        self.entities.iter()
    }

    /// Handles of the live entities in spawn order, without borrowing the
    /// registry
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> {
        (0..self.entities.len()).map(EntityHandle)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity<H>> {
        self.entities.get(handle.0)
    }

    /// Re-center an entity's rectangle on a simulation position.
    ///
    /// Only x and y change. Unknown handles are ignored.
    pub fn refresh_draw_rect(
        &mut self,
        handle: EntityHandle,
        position: Vec2,
        mapper: &CoordinateMapper,
    ) {
        if let Some(entity) = self.entities.get_mut(handle.0) {
            let screen = mapper.to_screen(position);
            entity.rect.x = screen.x - 0.5 * entity.rect.w;
            entity.rect.y = screen.y - 0.5 * entity.rect.h;
        }
    }

    /// Forget every entity, returning their bodies for the caller to free
    pub fn clear(&mut self) -> Vec<H> {
        self.entities.drain(..).map(|e| e.body).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.capacity
    }
}
