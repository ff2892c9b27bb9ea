//! Render surface seam: input polling, rectangle drawing, presentation

use std::collections::VecDeque;

use glam::Vec2;

use crate::color::Rgba;
use crate::error::SurfaceError;

/// Screen-space rectangle, top-left origin, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl DrawRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of `size` whose center sits on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - 0.5 * size.x,
            center.y - 0.5 * size.y,
            size.x,
            size.y,
        )
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + 0.5 * self.w, self.y + 0.5 * self.h)
    }
}

/// Input the loop reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Window closed or quit requested
    Quit,
    /// Primary button pressed at a screen position
    PointerPressed { position: Vec2 },
    /// Remove every spawned body and start a new run
    Reset,
    /// Anything else; ignored
    Other,
}

/// What the simulation loop needs from a window and renderer.
pub trait RenderSurface {
    /// Next queued event, never blocks
    fn poll_event(&mut self) -> Option<InputEvent>;

    fn clear(&mut self, color: Rgba);

    fn fill_rect(&mut self, rect: DrawRect, color: Rgba);

    /// Flush the frame built since the last `clear`
    fn present(&mut self) -> Result<(), SurfaceError>;
}

/// One presented frame captured by [`ScriptedSurface`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedFrame {
    pub background: Option<Rgba>,
    pub rects: Vec<(DrawRect, Rgba)>,
}

/// Headless surface fed from a script of per-frame event batches.
///
/// Each `present` queues the next batch. Once the script runs out the
/// surface reports `Quit`, so `Sandbox::run` terminates on its own.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    batches: VecDeque<Vec<InputEvent>>,
    current: VecDeque<InputEvent>,
    pending: RecordedFrame,
    frames: Vec<RecordedFrame>,
    quit_sent: bool,
    failing_presents: usize,
}

impl ScriptedSurface {
    pub fn new(batches: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        let mut batches: VecDeque<Vec<InputEvent>> = batches.into_iter().collect();
        let current = batches.pop_front().unwrap_or_default().into();
        Self {
            batches,
            current,
            ..Default::default()
        }
    }

    /// Script that delivers `events` in the first frame and then idles for
    /// `idle_frames` more frames
    pub fn with_idle_frames(events: Vec<InputEvent>, idle_frames: usize) -> Self {
        Self::new(std::iter::once(events).chain(std::iter::repeat_with(Vec::new).take(idle_frames)))
    }

    /// Make the next `count` presents fail
    pub fn fail_next_presents(&mut self, count: usize) {
        self.failing_presents = count;
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }
}

impl RenderSurface for ScriptedSurface {
    fn poll_event(&mut self) -> Option<InputEvent> {
        if let Some(event) = self.current.pop_front() {
            return Some(event);
        }
        if self.batches.is_empty() && !self.quit_sent {
            self.quit_sent = true;
            return Some(InputEvent::Quit);
        }
        None
    }

    fn clear(&mut self, color: Rgba) {
        self.pending = RecordedFrame {
            background: Some(color),
            rects: Vec::new(),
        };
    }

    fn fill_rect(&mut self, rect: DrawRect, color: Rgba) {
        self.pending.rects.push((rect, color));
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let frame = std::mem::take(&mut self.pending);
        // Events nobody polled carry over into the next frame
        if let Some(batch) = self.batches.pop_front() {
            self.current.extend(batch);
        }

        if self.failing_presents > 0 {
            self.failing_presents -= 1;
            return Err(SurfaceError::Present("scripted failure".to_string()));
        }

        self.frames.push(frame);
        Ok(())
    }
}
