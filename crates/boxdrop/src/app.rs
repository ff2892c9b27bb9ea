//! Application state and event loop

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use boxdrop_core::{
    DrawRect, InputEvent, RapierWorld, RenderSurface, Rgba, Sandbox, SandboxConfig, SurfaceError,
};

use crate::render::Renderer;

/// The window handed to the sandbox for one frame: queued window events in,
/// rectangles out.
struct WindowSurface<'a> {
    renderer: &'a mut Renderer,
    events: &'a mut VecDeque<InputEvent>,
}

impl RenderSurface for WindowSurface<'_> {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    fn clear(&mut self, color: Rgba) {
        self.renderer.begin_frame(color);
    }

    fn fill_rect(&mut self, rect: DrawRect, color: Rgba) {
        self.renderer.push_rect(rect, color);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.renderer.end_frame()
    }
}

/// Main application state
pub struct App {
    // Window and rendering
    window: Arc<Window>,
    renderer: Renderer,

    // Simulation
    sandbox: Sandbox<RapierWorld>,

    // Input state
    events: VecDeque<InputEvent>,
    /// Cursor in canvas pixels
    cursor: Option<Vec2>,

    /// Whether the ground-only first frame has been shown
    started: bool,
}

impl App {
    /// Create a new app
    pub async fn new(config: SandboxConfig) -> Result<(Self, EventLoop<()>)> {
        // Create event loop
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        // Create window
        let (width, height) = (config.canvas.width, config.canvas.height);
        let window_attrs = WindowAttributes::default()
            .with_title("boxdrop")
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(false);

        #[allow(deprecated)]
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        // Create renderer
        let renderer = Renderer::new(window.clone(), width, height).await?;

        // Create sandbox
        let sandbox = Sandbox::with_rapier(config)?;

        Ok((
            Self {
                window,
                renderer,
                sandbox,
                events: VecDeque::new(),
                cursor: None,
                started: false,
            },
            event_loop,
        ))
    }

    /// Run the event loop
    pub fn run(event_loop: EventLoop<()>, mut app: Self) -> Result<()> {
        event_loop.run_app(&mut app)?;
        log::info!(
            "Exiting after {} frames with {} boxes",
            app.sandbox.frame(),
            app.sandbox.registry().len()
        );
        Ok(())
    }

    /// Drain queued input, step and draw one frame
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let mut surface = WindowSurface {
            renderer: &mut self.renderer,
            events: &mut self.events,
        };

        if !self.started {
            self.sandbox.present_initial_frame(&mut surface);
            self.started = true;
        }

        self.sandbox.run_frame(&mut surface);

        if self.sandbox.is_running() {
            self.window.request_redraw();
        } else {
            event_loop.exit();
        }
    }

    /// Map a winit event to sandbox input, if it is one
    fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CloseRequested => Some(InputEvent::Quit),
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(self.window.scale_factor());
                self.cursor = Some(Vec2::new(logical.x, logical.y));
                None
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                None
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => Some(press_event(*button, self.cursor)),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => Some(InputEvent::Quit),
                    PhysicalKey::Code(KeyCode::KeyR) => Some(InputEvent::Reset),
                    _ => Some(InputEvent::Other),
                }
            }
            _ => None,
        }
    }
}

/// Input for a mouse press; a left click needs a known cursor position
fn press_event(button: MouseButton, cursor: Option<Vec2>) -> InputEvent {
    match (button, cursor) {
        (MouseButton::Left, Some(position)) => InputEvent::PointerPressed { position },
        (MouseButton::Left, None) => {
            log::debug!("Dropping click: cursor position not known yet");
            InputEvent::Other
        }
        _ => InputEvent::Other,
    }
}

/// Whether queued input must be handled without waiting for a redraw
fn needs_immediate_frame(events: &VecDeque<InputEvent>) -> bool {
    events.contains(&InputEvent::Quit)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        self.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(input) = self.translate(&event) {
            self.events.push_back(input);
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                self.renderer.resize(size);
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Redraws may never arrive for a hidden window
        if needs_immediate_frame(&self.events) {
            self.frame(event_loop);
        }
    }
}
