//! Window and event loop.
//!
//! The winit handler only forwards events into [`Input`] and asks the
//! [`RenderLoop`] for a frame on every redraw. Fatal errors stop the event
//! loop and are returned from [`ParticleSystem::run`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::{ParticleSystem, WINDOW_TITLE};
use crate::controls::SimulationContext;
use crate::error::{ParticleSystemError, Result};
use crate::gpu::{GpuContext, GpuParticleBuffers, Renderer};
use crate::input::Input;
use crate::kernel::GpuKernel;
use crate::render_loop::{LoopState, RenderLoop};
use crate::time::Time;

const TITLE_REFRESH: Duration = Duration::from_millis(500);

struct Running {
    window: Arc<Window>,
    renderer: Renderer,
    render_loop: RenderLoop<GpuKernel>,
    last_title_update: Instant,
}

struct App {
    config: ParticleSystem,
    input: Input,
    running: Option<Running>,
    error: Option<ParticleSystemError>,
}

impl App {
    fn new(config: ParticleSystem) -> Self {
        let (width, height) = config.window_size();
        Self {
            config,
            input: Input::new(width, height),
            running: None,
            error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let (width, height) = self.config.window_size();
        let window_attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let context = pollster::block_on(GpuContext::new(window.clone()))?;
        self.config.validate_for_limits(&context.device.limits())?;
        let projection = self
            .config
            .projection(context.config.width, context.config.height);

        let buffers = GpuParticleBuffers::new(
            context.device.clone(),
            context.queue.clone(),
            context.device_lost.clone(),
            self.config.particle_count(),
        );

        let kernel_source = self.config.kernel_source()?;
        let kernel = GpuKernel::new(
            context.device.clone(),
            &buffers,
            &kernel_source.text,
            &kernel_source.name,
        )?;

        let render_source = self.config.render_source()?;
        let sprite = self.config.sprite()?;
        let renderer = Renderer::new(context, &render_source.text, &render_source.name, &sprite)?;

        let mut render_loop = RenderLoop::new(
            kernel,
            buffers,
            SimulationContext::new(projection),
            Time::new(),
        );
        render_loop.prime()?;

        Ok(Running {
            window,
            renderer,
            render_loop,
            last_title_update: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ParticleSystemError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                let size = running.window.inner_size();
                self.input.set_window_size(size.width, size.height);
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                running.render_loop.request_close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.renderer.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let frame = self.input.take_frame();
                match running.render_loop.frame(&frame, &mut running.renderer) {
                    Ok(LoopState::Closed) => event_loop.exit(),
                    Ok(_) => {
                        if running.last_title_update.elapsed() >= TITLE_REFRESH {
                            let fps = running.render_loop.time().fps();
                            running
                                .window
                                .set_title(&format!("{WINDOW_TITLE} (FPS: {fps:.0})"));
                            running.last_title_update = Instant::now();
                        }
                    }
                    Err(e) => self.fail(event_loop, e),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

impl ParticleSystem {
    /// Open the window and run until it is closed or Escape is pressed.
    pub fn run(self) -> Result<()> {
        self.validate()?;
        log::info!("Starting particle system with {} particles", self.particle_count());

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
