//! Headless runs: drive the sandbox for a fixed number of frames without a
//! window and report where every box ended up.

use anyhow::Result;
use glam::Vec2;

use boxdrop_core::{
    DrawRect, InputEvent, LoopState, PhysicsBackend, Sandbox, SandboxConfig, ScriptedSurface,
};

/// Final state of one box
#[derive(Debug, Clone, PartialEq)]
pub struct BodyReport {
    pub index: usize,
    /// Simulation-space center, `None` if the body vanished
    pub position: Option<Vec2>,
    pub rect: DrawRect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    /// Physics steps taken
    pub frames: u64,
    /// Clicks that did not fit in the registry
    pub rejected: usize,
    pub bodies: Vec<BodyReport>,
}

/// Deliver `clicks` on the first frame, then step until `frames` frames
/// have been simulated.
pub fn run(config: SandboxConfig, frames: u64, clicks: &[Vec2]) -> Result<HeadlessReport> {
    let mut sandbox = Sandbox::with_rapier(config)?;
    let events: Vec<InputEvent> = clicks
        .iter()
        .map(|&position| InputEvent::PointerPressed { position })
        .collect();
    let mut surface = ScriptedSurface::with_idle_frames(events, frames as usize + 1);

    log::info!(
        "Headless run: {} frames, {} scripted clicks",
        frames,
        clicks.len()
    );

    sandbox.present_initial_frame(&mut surface);
    let mut rejected = 0;
    while sandbox.frame() < frames && sandbox.state() == LoopState::Running {
        rejected += sandbox.run_frame(&mut surface).rejected;
    }

    let bodies = sandbox
        .registry()
        .iter()
        .map(|entity| BodyReport {
            index: entity.handle().index(),
            position: sandbox.physics().body_position(entity.body()),
            rect: entity.rect(),
        })
        .collect();

    Ok(HeadlessReport {
        frames: sandbox.frame(),
        rejected,
        bodies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SandboxConfig {
        SandboxConfig {
            seed: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_runs_requested_frames() {
        let report = run(config(), 120, &[Vec2::new(100.0, 100.0)]).unwrap();

        assert_eq!(report.frames, 120);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.bodies.len(), 1);

        let body = &report.bodies[0];
        assert_eq!(body.index, 0);
        assert!(body.position.unwrap().y < 380.0 / 30.0);
        assert!(body.rect.y > 90.0);
    }

    #[test]
    fn test_reports_rejected_clicks() {
        let clicks: Vec<Vec2> = (0..25).map(|i| Vec2::new(10.0 + i as f32 * 24.0, 50.0)).collect();
        let report = run(config(), 1, &clicks).unwrap();

        assert_eq!(report.bodies.len(), 20);
        assert_eq!(report.rejected, 5);
    }

    #[test]
    fn test_zero_frames_spawns_nothing() {
        let report = run(config(), 0, &[Vec2::new(10.0, 10.0)]).unwrap();
        assert_eq!(report.frames, 0);
        assert!(report.bodies.is_empty());
    }

    #[test]
    fn test_invalid_config_errors() {
        let mut config = config();
        config.world.sub_steps = 0;
        assert!(run(config, 10, &[]).is_err());
    }
}
