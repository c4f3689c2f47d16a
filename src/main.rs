use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use text_rpg::cli::Cli;
use text_rpg::contents::{load_contents, ContentsManager};
use text_rpg::core::WinitController;
use text_rpg::traits::{BackendFactory, Button, Controller, Game};
use text_rpg::types::Extent;
use text_rpg::{GameConfig, GpuError, Pipeline, PipelineState, TextAdventure, WindowMessage};

#[cfg(windows)]
type Factory = text_rpg::backend::D3d11Factory;
#[cfg(not(windows))]
type Factory = text_rpg::backend::HeadlessFactory;

type Backend = <Factory as BackendFactory>::Backend;

#[cfg(windows)]
fn create_factory(config: &GameConfig) -> Factory {
    Factory::new(config.debug_layer, config.shader_dir.clone())
}

#[cfg(not(windows))]
fn create_factory(config: &GameConfig) -> Factory {
    if config.debug_layer || config.shader_dir.is_some() {
        warn!("No Direct3D on this platform; rendering headless");
    }
    Factory::without_log()
}

struct App {
    config: GameConfig,
    pipeline: Pipeline<Factory>,
    game: TextAdventure<Backend>,
    controller: WinitController,
    window: Option<Window>,
    handle: Option<RawWindowHandle>,
}

impl App {
    fn new(config: GameConfig, contents: ContentsManager) -> Self {
        let pipeline = Pipeline::new(create_factory(&config), config.failure_policy);
        let game = TextAdventure::new(contents, config.font.clone(), config.dialogue);

        Self {
            config,
            pipeline,
            game,
            controller: WinitController::new(),
            window: None,
            handle: None,
        }
    }

    fn start(&mut self, window: &Window) -> Result<(), GpuError> {
        let handle = window
            .window_handle()
            .map_err(|e| GpuError::DeviceCreation(e.to_string()))?
            .as_raw();
        self.handle = Some(handle);

        let size = window.inner_size();
        self.pipeline.dispatch(handle, WindowMessage::Create)?;
        self.pipeline
            .dispatch(handle, WindowMessage::Size(Extent::new(size.width, size.height)))?;

        self.game.start(self.pipeline.renderer()?)
    }

    fn frame(&mut self, handle: RawWindowHandle) -> Result<(), GpuError> {
        self.game
            .update(&self.controller, self.pipeline.renderer()?)?;
        self.pipeline.dispatch(handle, WindowMessage::Present)
    }

    /// Log `err`; returns true when the host has to stop
    fn report(&self, operation: &str, err: &GpuError) -> bool {
        if err.is_fatal() || !self.pipeline.policy().discards(err) {
            error!("{} failed: {}", operation, err);
            true
        } else {
            warn!("{} failed: {}", operation, err);
            false
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Ok(renderer) = self.pipeline.renderer() {
            self.game.end(renderer);
        }

        if let Some(handle) = self.handle.take() {
            if self.pipeline.state() != PipelineState::Destroyed {
                if let Err(e) = self.pipeline.dispatch(handle, WindowMessage::Destroy) {
                    error!("Destroy failed: {}", e);
                }
            }
        }

        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(self.config.title.clone())
                .with_inner_size(PhysicalSize::new(
                    self.config.window.width,
                    self.config.window.height,
                )),
        ) {
            Ok(w) => w,
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.start(&window) {
            error!("Failed to start: {}", e);
            self.window = Some(window);
            self.shutdown(event_loop);
            return;
        }

        info!("Controls: N next, B back, Escape to quit");
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        self.controller.process_event(&event);

        let Some(handle) = self.handle else {
            return;
        };

        if self.controller.went_down(Button::Escape) {
            self.shutdown(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                let message = WindowMessage::Size(Extent::new(size.width, size.height));
                if let Err(e) = self.pipeline.dispatch(handle, message) {
                    if self.report("Resize", &e) {
                        self.shutdown(event_loop);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let status = self.frame(handle);
                self.controller.end_frame();
                if let Err(e) = status {
                    if self.report("Frame", &e) {
                        self.shutdown(event_loop);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = GameConfig::from_cli(&cli)?;

    let blocks = match &config.contents {
        Some(path) => load_contents(path, config.delimiter)?,
        None => Vec::new(),
    };
    let contents = ContentsManager::new(blocks, config.seed)?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, contents);
    event_loop.run_app(&mut app)?;

    Ok(())
}
