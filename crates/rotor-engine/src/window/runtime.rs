use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{FrameLoop, FrameScheduler, Harness, TickOutcome};
use crate::device::{WgpuBackend, WgpuInit, WindowSurface};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "rotor".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the windowed harness.
pub struct Runtime;

impl Runtime {
    /// Opens one window and animates the triangle until it is closed.
    ///
    /// Setup failures (no usable context, allocation, shader errors) end the event
    /// loop and are returned here so the host can report them.
    pub fn run(config: RuntimeConfig, wgpu_init: WgpuInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState::new(config, wgpu_init);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Window plus the harness whose surface borrows it.
#[self_referencing]
struct Session {
    frame_loop: FrameLoop,

    window: Window,

    #[borrows(window)]
    #[covariant]
    harness: Harness<WgpuBackend<'this>>,
}

/// Maps frame requests onto winit redraw requests.
struct RedrawScheduler<'a>(&'a Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

struct RuntimeState {
    config: RuntimeConfig,
    wgpu_init: WgpuInit,
    epoch: Instant,

    session: Option<Session>,
    error: Option<anyhow::Error>,
}

impl RuntimeState {
    fn new(config: RuntimeConfig, wgpu_init: WgpuInit) -> Self {
        Self {
            config,
            wgpu_init,
            epoch: Instant::now(),
            session: None,
            error: None,
        }
    }

    fn create_session(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let init = self.wgpu_init.clone();
        let session = SessionTryBuilder {
            frame_loop: FrameLoop::new(),
            window,
            harness_builder: |w| Harness::with_default_shaders(&WindowSurface::new(w, init)),
        }
        .try_build()
        .context("graphics setup failed")?;

        Ok(session)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        self.session = None;
        event_loop.exit();
    }

    /// Milliseconds since the runtime started, standing in for a frame timestamp.
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

impl ApplicationHandler for RuntimeState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.error.is_some() {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => {
                session.with(|f| f.frame_loop.start(&mut RedrawScheduler(f.window)));
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Frames are driven by redraw requests issued from the loop itself.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let now_ms = self.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                session.with_frame_loop(|fl| fl.cancel_handle().cancel());
                self.session = None;
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => {
                let outcome = session.with_mut(|f| {
                    f.frame_loop
                        .tick(now_ms, f.harness, &mut RedrawScheduler(f.window))
                });

                if outcome == TickOutcome::Stopped {
                    log::info!("frame loop stopped; closing window");
                    self.session = None;
                    event_loop.exit();
                }
            }

            WindowEvent::Resized(size) => {
                log::debug!("window resized to {}x{}; viewport unchanged", size.width, size.height);
            }

            _ => {}
        }
    }
}
