//! The per-frame loop: drain input, spawn, step physics, redraw.

use glam::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::color::Rgba;
use crate::config::SandboxConfig;
use crate::coords::CoordinateMapper;
use crate::error::SandboxError;
use crate::physics::{BodyKind, PhysicsBackend, RapierWorld};
use crate::registry::{EntityHandle, EntityRegistry, SpawnRequest};
use crate::surface::{DrawRect, InputEvent, RenderSurface};

/// Loop state; `Terminated` is final
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// The static floor: one fixed body and the strip drawn for it
#[derive(Debug, Clone, Copy)]
pub struct Ground<H> {
    pub body: H,
    pub rect: DrawRect,
    pub color: Rgba,
}

/// What happened during one `run_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSummary {
    pub events: usize,
    pub spawned: usize,
    pub rejected: usize,
    pub stepped: bool,
}

/// Click-to-spawn rigid body sandbox over a physics backend
pub struct Sandbox<P: PhysicsBackend> {
    config: SandboxConfig,
    mapper: CoordinateMapper,
    physics: P,
    registry: EntityRegistry<P::BodyHandle>,
    ground: Ground<P::BodyHandle>,
    rng: Xoshiro256PlusPlus,
    state: LoopState,
    frame: u64,
}

impl Sandbox<RapierWorld> {
    /// Sandbox backed by a fresh rapier world using the configured gravity
    pub fn with_rapier(config: SandboxConfig) -> Result<Self, SandboxError> {
        let physics = RapierWorld::new(config.gravity());
        Self::new(physics, config)
    }
}

impl<P: PhysicsBackend> Sandbox<P> {
    pub fn new(mut physics: P, config: SandboxConfig) -> Result<Self, SandboxError> {
        config.validate()?;

        let mapper = config.mapper();
        let ground = Self::create_ground(&mut physics, &config, &mapper);
        let rng = match config.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        log::info!(
            "Sandbox ready: {}x{} canvas, {} px/m, up to {} bodies",
            config.canvas.width,
            config.canvas.height,
            config.canvas.pixels_per_meter,
            config.bodies.max_bodies
        );

        Ok(Self {
            registry: EntityRegistry::with_capacity(config.bodies.max_bodies),
            config,
            mapper,
            physics,
            ground,
            rng,
            state: LoopState::Running,
            frame: 0,
        })
    }

    fn create_ground(
        physics: &mut P,
        config: &SandboxConfig,
        mapper: &CoordinateMapper,
    ) -> Ground<P::BodyHandle> {
        let strip = config.ground.height;
        let half_extents = Vec2::from(config.ground.half_extents);

        // Top face of the box sits exactly at the top of the drawn strip
        let position = Vec2::new(0.0, strip * mapper.meters_per_pixel() - half_extents.y);
        let body = physics.create_body(BodyKind::Static, position);
        physics.attach_box(body, half_extents, config.ground.material);

        let canvas_w = config.canvas.width as f32;
        let canvas_h = config.canvas.height as f32;

        Ground {
            body,
            rect: DrawRect::new(0.0, canvas_h - strip, canvas_w, strip),
            color: config.colors.ground,
        }
    }

    /// Apply one input event
    pub fn handle_event(&mut self, event: InputEvent, summary: &mut FrameSummary) {
        summary.events += 1;
        match event {
            InputEvent::Quit => {
                if self.state == LoopState::Running {
                    log::info!("Quit requested after {} frames", self.frame);
                }
                self.state = LoopState::Terminated;
            }
            InputEvent::PointerPressed { position } => match self.spawn(position) {
                Some(_) => summary.spawned += 1,
                None => summary.rejected += 1,
            },
            InputEvent::Reset => self.reset(),
            InputEvent::Other => {}
        }
    }

    /// Spawn a box centered on a screen position.
    ///
    /// Returns `None` when the registry is full.
    pub fn spawn(&mut self, position: Vec2) -> Option<EntityHandle> {
        let request = SpawnRequest {
            position,
            size: self.config.body_size(),
            material: self.config.bodies.material,
        };
        let rng = &mut self.rng;
        match self
            .registry
            .try_spawn(&mut self.physics, &self.mapper, request, || Rgba::random(rng))
        {
            Ok(handle) => {
                log::debug!(
                    "Spawned box {} at ({}, {})",
                    handle.index(),
                    position.x,
                    position.y
                );
                Some(handle)
            }
            Err(rejected) => {
                log::debug!("Ignoring click at ({}, {}): {}", position.x, position.y, rejected);
                None
            }
        }
    }

    /// Drop every spawned box and start a new run
    pub fn reset(&mut self) {
        let bodies = self.registry.clear();
        log::info!("Reset: removing {} bodies", bodies.len());
        for body in bodies {
            self.physics.remove_body(body);
        }
    }

    /// Drain every queued event from the surface
    pub fn drain_events<S: RenderSurface>(&mut self, surface: &mut S, summary: &mut FrameSummary) {
        while let Some(event) = surface.poll_event() {
            self.handle_event(event, summary);
        }
    }

    /// One fixed physics step, independent of wall-clock time
    pub fn advance(&mut self) {
        self.physics
            .step(self.config.world.time_step, self.config.world.sub_steps);
        self.frame += 1;
    }

    /// Clear, draw ground and every box in spawn order.
    ///
    /// Box rectangles are re-derived from the bodies before drawing.
    pub fn draw<S: RenderSurface>(&mut self, surface: &mut S) {
        surface.clear(self.config.colors.background);
        surface.fill_rect(self.ground.rect, self.ground.color);

        for handle in self.registry.handles() {
            let Some(body) = self.registry.get(handle).map(|e| e.body()) else {
                continue;
            };
            match self.physics.body_position(body) {
                Some(position) => self.registry.refresh_draw_rect(handle, position, &self.mapper),
                // Keep the last known rectangle
                None => log::warn!(
                    "Body {:?} for box {} no longer exists",
                    body,
                    handle.index()
                ),
            }
            if let Some(entity) = self.registry.get(handle) {
                surface.fill_rect(entity.rect(), entity.color());
            }
        }
    }

    /// Present, logging failures instead of stopping the loop
    fn present<S: RenderSurface>(&mut self, surface: &mut S) {
        if let Err(e) = surface.present() {
            log::error!("Render error on frame {}: {}", self.frame, e);
        }
    }

    /// First frame before any input: background and ground only
    pub fn present_initial_frame<S: RenderSurface>(&mut self, surface: &mut S) {
        surface.clear(self.config.colors.background);
        surface.fill_rect(self.ground.rect, self.ground.color);
        self.present(surface);
    }

    /// One loop iteration: input, step, draw, present.
    ///
    /// Once terminated this only drains input; nothing is stepped or drawn.
    pub fn run_frame<S: RenderSurface>(&mut self, surface: &mut S) -> FrameSummary {
        let mut summary = FrameSummary::default();
        self.drain_events(surface, &mut summary);

        if self.state == LoopState::Running {
            self.advance();
            summary.stepped = true;
            self.draw(surface);
            self.present(surface);
        }

        log::trace!("Frame {}: {:?}", self.frame, summary);
        summary
    }

    /// Run until a quit event arrives
    pub fn run<S: RenderSurface>(&mut self, surface: &mut S) {
        self.present_initial_frame(surface);
        while self.state == LoopState::Running {
            self.run_frame(surface);
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Physics steps taken so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn registry(&self) -> &EntityRegistry<P::BodyHandle> {
        &self.registry
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn ground(&self) -> &Ground<P::BodyHandle> {
        &self.ground
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Simulation-space position of every box, in spawn order
    pub fn body_positions(&self) -> Vec<Option<Vec2>> {
        self.registry
            .iter()
            .map(|e| self.physics.body_position(e.body()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BoxMaterial;
    use crate::surface::ScriptedSurface;
    use std::collections::HashMap;

    fn click(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerPressed {
            position: Vec2::new(x, y),
        }
    }

    fn seeded_config(seed: u64) -> SandboxConfig {
        SandboxConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// `frames` batches of events plus one trailing batch so the script does
    /// not quit during the last frame
    fn script(frames: usize, events: &[(usize, InputEvent)]) -> ScriptedSurface {
        let mut batches = vec![Vec::new(); frames + 1];
        for (frame, event) in events {
            batches[*frame].push(*event);
        }
        ScriptedSurface::new(batches)
    }

    /// Backend with teleportable bodies and no dynamics
    #[derive(Default)]
    struct StubBackend {
        next: u32,
        positions: HashMap<u32, Vec2>,
        steps: Vec<(f32, usize)>,
    }

    impl PhysicsBackend for StubBackend {
        type BodyHandle = u32;

        fn create_body(&mut self, _kind: BodyKind, position: Vec2) -> u32 {
            self.next += 1;
            self.positions.insert(self.next, position);
            self.next
        }

        fn attach_box(&mut self, _body: u32, _half_extents: Vec2, _material: BoxMaterial) {}

        fn step(&mut self, dt: f32, sub_steps: usize) {
            self.steps.push((dt, sub_steps));
        }

        fn body_position(&self, body: u32) -> Option<Vec2> {
            self.positions.get(&body).copied()
        }

        fn remove_body(&mut self, body: u32) {
            self.positions.remove(&body);
        }
    }

    #[test]
    fn test_ground_fixture() {
        let sandbox = Sandbox::with_rapier(seeded_config(1)).unwrap();
        let ground = sandbox.ground();

        assert_eq!(ground.rect, DrawRect::new(0.0, 430.0, 640.0, 50.0));
        assert_eq!(ground.color, Rgba::opaque(0, 128, 0));

        let pos = sandbox.physics().body_position(ground.body).unwrap();
        assert_eq!(pos.x, 0.0);
        assert!((pos.y - (50.0 / 30.0 - 10.0)).abs() < 1e-5);
        assert_eq!(sandbox.physics().body_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SandboxConfig::default();
        config.bodies.max_bodies = 0;
        assert!(matches!(
            Sandbox::with_rapier(config),
            Err(SandboxError::Config(_))
        ));
    }

    #[test]
    fn test_clicked_box_falls() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(1)).unwrap();
        let mut surface = script(60, &[(0, click(100.0, 100.0))]);

        let summary = sandbox.run_frame(&mut surface);
        assert_eq!(summary.spawned, 1);
        assert!(summary.stepped);

        let first = sandbox.body_positions()[0].unwrap();
        assert!((first.x - 3.333).abs() < 0.001);
        assert!(first.y < 380.0 / 30.0, "box should start falling, y={}", first.y);

        for _ in 1..60 {
            sandbox.run_frame(&mut surface);
        }

        let entity = sandbox.registry().iter().next().unwrap();
        // Spawn rect top was 90 px; one second at 1 m/s^2 drops ~15 px
        assert!(entity.rect().y > 90.0, "screen y should grow, got {}", entity.rect().y);
        assert_eq!(entity.rect().x, 90.0);
    }

    #[test]
    fn test_capacity_saturates() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(2)).unwrap();
        let clicks: Vec<(usize, InputEvent)> = (0..21)
            .map(|i| (0, click(20.0 + i as f32 * 25.0, 100.0)))
            .collect();
        let mut surface = script(2, &clicks);

        let summary = sandbox.run_frame(&mut surface);

        assert_eq!(summary.spawned, 20);
        assert_eq!(summary.rejected, 1);
        assert_eq!(sandbox.registry().len(), 20);
        // Ground plus twenty boxes
        assert_eq!(sandbox.physics().body_count(), 21);

        sandbox.run_frame(&mut surface);
        assert!(sandbox.is_running());
        assert_eq!(surface.last_frame().unwrap().rects.len(), 21);
    }

    #[test]
    fn test_same_spot_draws_later_box_last() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(3)).unwrap();
        let mut surface = script(1, &[(0, click(200.0, 50.0)), (0, click(200.0, 50.0))]);

        sandbox.run_frame(&mut surface);

        let frame = surface.last_frame().unwrap();
        assert_eq!(frame.rects.len(), 3);
        assert_eq!(frame.rects[0], (sandbox.ground().rect, sandbox.ground().color));

        let entities: Vec<_> = sandbox.registry().iter().collect();
        assert_eq!(frame.rects[1].1, entities[0].color());
        assert_eq!(frame.rects[2].1, entities[1].color());
        assert_eq!(frame.rects[2].0, entities[1].rect());
    }

    #[test]
    fn test_draw_order_ignores_position() {
        let mut sandbox = Sandbox::new(StubBackend::default(), seeded_config(4)).unwrap();
        let mut surface = script(1, &[(0, click(600.0, 10.0)), (0, click(10.0, 400.0))]);

        sandbox.run_frame(&mut surface);

        let rects: Vec<DrawRect> = surface.last_frame().unwrap().rects.iter().map(|r| r.0).collect();
        assert_eq!(rects[1].center(), Vec2::new(600.0, 10.0));
        assert_eq!(rects[2].center(), Vec2::new(10.0, 400.0));
    }

    #[test]
    fn test_fixed_step_parameters() {
        let mut sandbox = Sandbox::new(StubBackend::default(), seeded_config(5)).unwrap();
        let mut surface = script(3, &[]);
        for _ in 0..3 {
            sandbox.run_frame(&mut surface);
        }
        assert_eq!(sandbox.frame(), 3);
        assert_eq!(sandbox.physics().steps, vec![(1.0 / 60.0, 4); 3]);
    }

    #[test]
    fn test_quit_finishes_drain_without_stepping() {
        let mut sandbox = Sandbox::new(StubBackend::default(), seeded_config(6)).unwrap();
        let mut surface = script(3, &[(0, InputEvent::Quit), (0, click(50.0, 50.0))]);

        let summary = sandbox.run_frame(&mut surface);

        assert_eq!(sandbox.state(), LoopState::Terminated);
        assert_eq!(summary.events, 2);
        assert_eq!(summary.spawned, 1);
        assert!(!summary.stepped);
        assert_eq!(sandbox.registry().len(), 1);
        assert_eq!(sandbox.frame(), 0);
        assert!(sandbox.physics().steps.is_empty());
        assert!(surface.frames().is_empty());
    }

    #[test]
    fn test_other_events_are_ignored() {
        let mut sandbox = Sandbox::new(StubBackend::default(), seeded_config(7)).unwrap();
        let mut surface = script(1, &[(0, InputEvent::Other), (0, InputEvent::Other)]);
        let summary = sandbox.run_frame(&mut surface);
        assert_eq!(summary.events, 2);
        assert_eq!(summary.spawned, 0);
        assert!(sandbox.is_running());
        assert!(sandbox.registry().is_empty());
    }

    #[test]
    fn test_size_and_color_never_change() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(8)).unwrap();
        let mut surface = script(
            200,
            &[(0, click(100.0, 100.0)), (0, click(110.0, 60.0)), (5, click(300.0, 200.0))],
        );

        sandbox.run_frame(&mut surface);
        let initial: Vec<(Vec2, Rgba)> = sandbox
            .registry()
            .iter()
            .map(|e| (e.rect().size(), e.color()))
            .collect();

        for _ in 1..200 {
            sandbox.run_frame(&mut surface);
            for (entity, (size, color)) in sandbox.registry().iter().zip(&initial) {
                assert_eq!(entity.rect().size(), *size);
                assert_eq!(entity.color(), *color);
            }
        }
        assert_eq!(sandbox.registry().len(), 3);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let events = [
            (0, click(100.0, 100.0)),
            (0, click(105.0, 60.0)),
            (10, click(300.0, 40.0)),
            (30, click(310.0, 20.0)),
        ];

        let run = || {
            let mut sandbox = Sandbox::with_rapier(seeded_config(42)).unwrap();
            let mut surface = script(240, &events);
            let mut history = Vec::new();
            for _ in 0..240 {
                sandbox.run_frame(&mut surface);
                history.push(sandbox.body_positions());
            }
            let colors: Vec<Rgba> = sandbox.registry().iter().map(|e| e.color()).collect();
            (history, colors)
        };

        let (first, first_colors) = run();
        let (second, second_colors) = run();
        assert_eq!(first, second);
        assert_eq!(first_colors, second_colors);
        assert_eq!(first_colors.len(), 4);
    }

    #[test]
    fn test_box_lands_on_ground() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(9)).unwrap();
        let mut surface = script(1800, &[(0, click(320.0, 100.0))]);
        for _ in 0..1800 {
            sandbox.run_frame(&mut surface);
        }

        let rect = sandbox.registry().iter().next().unwrap().rect();
        let bottom = rect.y + rect.h;
        assert!((bottom - 430.0).abs() <= 2.0, "box bottom at {}", bottom);
    }

    #[test]
    fn test_reset_frees_bodies_and_allows_spawning() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(10)).unwrap();
        let mut surface = script(
            3,
            &[
                (0, click(10.0, 10.0)),
                (0, click(40.0, 10.0)),
                (0, click(70.0, 10.0)),
                (1, InputEvent::Reset),
                (2, click(100.0, 100.0)),
            ],
        );

        sandbox.run_frame(&mut surface);
        assert_eq!(sandbox.physics().body_count(), 4);

        sandbox.run_frame(&mut surface);
        assert!(sandbox.registry().is_empty());
        assert_eq!(sandbox.physics().body_count(), 1);
        assert_eq!(surface.last_frame().unwrap().rects.len(), 1);

        sandbox.run_frame(&mut surface);
        assert_eq!(sandbox.registry().len(), 1);
        assert_eq!(sandbox.registry().iter().next().unwrap().handle().index(), 0);
    }

    #[test]
    fn test_failed_present_keeps_running() {
        let mut sandbox = Sandbox::new(StubBackend::default(), seeded_config(11)).unwrap();
        let mut surface = script(4, &[(0, click(10.0, 10.0))]);
        surface.fail_next_presents(2);

        for _ in 0..4 {
            sandbox.run_frame(&mut surface);
        }

        assert!(sandbox.is_running());
        assert_eq!(sandbox.frame(), 4);
        assert_eq!(surface.frames().len(), 2);
    }

    #[test]
    fn test_vanished_body_keeps_last_rect() {
        let mut sandbox = Sandbox::new(StubBackend::default(), seeded_config(12)).unwrap();
        let mut surface = script(2, &[(0, click(100.0, 100.0))]);
        sandbox.run_frame(&mut surface);

        let entity = sandbox.registry().iter().next().unwrap().clone();
        sandbox.physics_mut().remove_body(entity.body());
        sandbox.run_frame(&mut surface);

        let frame = surface.last_frame().unwrap();
        assert_eq!(frame.rects.len(), 2);
        assert_eq!(frame.rects[1], (entity.rect(), entity.color()));
    }

    #[test]
    fn test_run_stops_when_script_ends() {
        let mut sandbox = Sandbox::with_rapier(seeded_config(13)).unwrap();
        let mut surface = ScriptedSurface::with_idle_frames(vec![click(100.0, 100.0)], 10);

        sandbox.run(&mut surface);

        assert_eq!(sandbox.state(), LoopState::Terminated);
        assert_eq!(sandbox.registry().len(), 1);
        assert!(sandbox.frame() > 0);

        // The initial frame shows only the ground
        let first = &surface.frames()[0];
        assert_eq!(first.background, Some(Rgba::opaque(22, 255, 255)));
        assert_eq!(first.rects.len(), 1);
        assert_eq!(surface.frames().len() as u64, sandbox.frame() + 1);
    }
}
