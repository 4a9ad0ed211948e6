//! SDL2 and OpenGL application management.
//!
//! This module defines the [`GlApp`] struct which owns the SDL2 window, the OpenGL context and
//! the frame loop, and the [`Renderable`] trait implemented by whatever draws each frame.

use std::{sync::Arc, time::Instant};

use glow::HasContext;
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::{Keycode, Scancode},
};

use crate::{
    config::{
        Parameters, SCREEN_FPS_LIMIT, SCREEN_FULLSCREEN, SCREEN_HEIGHT, SCREEN_WIDTH,
        WINDOW_TITLE,
    },
    error::{Error, ErrorKind, Result},
    timing::{FrameClock, FrameLimiter},
};

/// Something that draws a frame.
pub trait Renderable {
    /// Draws one frame. `elapsed_ms` is the time since the previous frame started.
    fn render(&mut self, elapsed_ms: f64);
}

impl<R: Renderable + ?Sized> Renderable for Box<R> {
    fn render(&mut self, elapsed_ms: f64) {
        (**self).render(elapsed_ms);
    }
}

/// Lifecycle of a [`GlApp`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Uninitialized,
    Initialized,
    Running,
    Terminated,
}

/// Primary display metadata captured during initialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Native resolution in pixels.
    pub screen_width: i32,
    pub screen_height: i32,
    /// Physical size in millimetres, `0` when the driver does not report it.
    pub physical_width: i32,
    pub physical_height: i32,
    /// Refresh rate in Hz, `0` when unknown.
    pub refresh_rate: i32,
}

/// Window settings read from the [`Parameters`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub fullscreen: bool,
    pub fps_limit: Option<u32>,
}

impl WindowSettings {
    /// Reads the window keys out of `parameters`.
    pub fn from_parameters(parameters: &Parameters) -> Result<Self> {
        let settings = Self {
            title: parameters.get_str(WINDOW_TITLE)?.to_string(),
            width: parameters.get_i32(SCREEN_WIDTH)?,
            height: parameters.get_i32(SCREEN_HEIGHT)?,
            fullscreen: parameters.get_bool(SCREEN_FULLSCREEN)?,
            fps_limit: if parameters.contains(SCREEN_FPS_LIMIT) {
                Some(parameters.get_u32(SCREEN_FPS_LIMIT)?)
            } else {
                None
            },
        };
        if settings.width <= 0 || settings.height <= 0 {
            return Err(Error::new(
                ErrorKind::InvalidParameter,
                format!(
                    "screen size must be positive, got {}x{}",
                    settings.width, settings.height
                ),
            ));
        }
        Ok(settings)
    }
}

/// Offset that centers a `screen` sized viewport inside a `window` sized surface.
pub fn viewport_offset(window: (i32, i32), screen: (i32, i32)) -> (i32, i32) {
    ((window.0 - screen.0) / 2, (window.1 - screen.1) / 2)
}

/// Physical length in millimetres of `pixels` at `dpi` dots per inch.
pub fn physical_size_mm(pixels: i32, dpi: f32) -> i32 {
    if dpi > 0.0 {
        (pixels as f32 / dpi * 25.4).round() as i32
    } else {
        0
    }
}

// Field order is drop order: GL objects before the window, the window before SDL itself.
struct WindowContext {
    gl: Arc<glow::Context>,
    event_pump: sdl2::EventPump,
    _gl_context: sdl2::video::GLContext,
    window: sdl2::video::Window,
    _video: sdl2::VideoSubsystem,
    _sdl: sdl2::Sdl,
}

/// The [`GlApp`] struct owns the SDL2 window, the OpenGL context and the frame loop.
pub struct GlApp {
    parameters: Parameters,
    state: AppState,
    screen_width: i32,
    screen_height: i32,
    fullscreen: bool,
    window_width: i32,
    window_height: i32,
    viewport_x: i32,
    viewport_y: i32,
    monitor: MonitorInfo,
    limiter: FrameLimiter,
    fps: u32,
    elapsed_ms: f64,
    context: Option<WindowContext>,
}

impl GlApp {
    /// Creates an uninitialized application.
    ///
    /// Keys missing from `parameters` get defaults: a 1280x720 window titled
    /// "BaseGL Application", not fullscreen.
    pub fn new(mut parameters: Parameters) -> Self {
        parameters.set_default(WINDOW_TITLE, "BaseGL Application");
        parameters.set_default(SCREEN_WIDTH, 1280);
        parameters.set_default(SCREEN_HEIGHT, 720);
        parameters.set_default(SCREEN_FULLSCREEN, false);

        Self {
            parameters,
            state: AppState::Uninitialized,
            screen_width: 0,
            screen_height: 0,
            fullscreen: false,
            window_width: 0,
            window_height: 0,
            viewport_x: 0,
            viewport_y: 0,
            monitor: MonitorInfo::default(),
            limiter: FrameLimiter::default(),
            fps: 0,
            elapsed_ms: 0.0,
            context: None,
        }
    }

    /// Opens the window and creates the OpenGL context.
    ///
    /// Returns the GL context that buffers, textures and shaders are created with. If any step
    /// fails, everything created before it is torn down again.
    pub fn initialize(&mut self) -> Result<Arc<glow::Context>> {
        if self.context.is_some() {
            return Err(Error::new(
                ErrorKind::AlreadyInitialized,
                "the application is already initialized",
            ));
        }

        let settings = WindowSettings::from_parameters(&self.parameters)?;
        self.screen_width = settings.width;
        self.screen_height = settings.height;
        self.fullscreen = settings.fullscreen;
        if let Some(limit) = settings.fps_limit {
            self.limiter.set_fps(limit);
        }

        let sdl = sdl2::init()
            .map_err(|e| Error::new(ErrorKind::WindowingInit, format!("SDL init failed: {e}")))?;
        let video = sdl.video().map_err(|e| {
            Error::new(ErrorKind::WindowingInit, format!("SDL video init failed: {e}"))
        })?;

        let gl_attr = video.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_context_flags().forward_compatible().set();
        gl_attr.set_multisample_buffers(1);
        gl_attr.set_multisample_samples(4);

        self.monitor = query_monitor(&video)?;
        log::debug!("primary display: {:?}", self.monitor);

        if self.fullscreen {
            self.window_resized(self.monitor.screen_width, self.monitor.screen_height);
        } else {
            self.window_resized(self.screen_width, self.screen_height);
        }

        let mut builder = video.window(
            &settings.title,
            self.screen_width as u32,
            self.screen_height as u32,
        );
        builder.opengl().resizable();
        if self.fullscreen {
            builder.fullscreen_desktop();
        }
        let window = builder.build().map_err(|e| {
            Error::new(ErrorKind::WindowCreation, format!("window creation failed: {e}"))
        })?;

        let gl_context = window.gl_create_context().map_err(|e| {
            Error::new(ErrorKind::GlLoaderInit, format!("GL context creation failed: {e}"))
        })?;
        window.gl_make_current(&gl_context).map_err(|e| {
            Error::new(ErrorKind::GlLoaderInit, format!("GL context activation failed: {e}"))
        })?;
        let gl = unsafe {
            glow::Context::from_loader_function(|s| video.gl_get_proc_address(s) as *const _)
        };
        let version = gl.version();
        if (version.major, version.minor) < (3, 3) {
            return Err(Error::new(
                ErrorKind::GlLoaderInit,
                format!(
                    "OpenGL 3.3 is required, the driver provides {}.{}",
                    version.major, version.minor
                ),
            ));
        }

        let event_pump = sdl.event_pump().map_err(|e| {
            Error::new(ErrorKind::WindowingInit, format!("SDL event pump failed: {e}"))
        })?;

        log::info!(
            "created {}x{} window \"{}\" (OpenGL {}.{}{})",
            self.screen_width,
            self.screen_height,
            settings.title,
            version.major,
            version.minor,
            if self.fullscreen { ", fullscreen" } else { "" }
        );

        let gl = Arc::new(gl);
        self.context = Some(WindowContext {
            gl: Arc::clone(&gl),
            event_pump,
            _gl_context: gl_context,
            window,
            _video: video,
            _sdl: sdl,
        });
        self.state = AppState::Initialized;

        Ok(gl)
    }

    /// Runs the frame loop until Escape is pressed or the window is closed, then tears the
    /// window and the context down.
    ///
    /// The renderable is dropped before the context goes away, so the GPU objects it owns are
    /// released while they are still valid.
    pub fn run<R: Renderable>(&mut self, mut renderable: R) -> Result<()> {
        let Some(mut ctx) = self.context.take() else {
            return Err(Error::new(
                ErrorKind::NotInitialized,
                "initialize() must succeed before run()",
            ));
        };
        self.state = AppState::Running;
        let gl = Arc::clone(&ctx.gl);

        let vertex_array = match unsafe { gl.create_vertex_array() } {
            Ok(vertex_array) => vertex_array,
            Err(e) => {
                drop(renderable);
                drop(ctx);
                self.state = AppState::Terminated;
                return Err(Error::new(
                    ErrorKind::CreateBuffer,
                    format!("vertex array creation failed: {e}"),
                ));
            }
        };
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
        }

        let mut clock = FrameClock::new(Instant::now());
        let mut close_requested = false;

        while !close_requested
            && !ctx
                .event_pump
                .keyboard_state()
                .is_scancode_pressed(Scancode::Escape)
        {
            unsafe {
                gl.viewport(
                    self.viewport_x,
                    self.viewport_y,
                    self.screen_width,
                    self.screen_height,
                );
                gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            }

            self.elapsed_ms = clock.tick(Instant::now());
            self.fps = clock.fps();

            renderable.render(self.elapsed_ms);

            self.limiter.wait(clock.frame_start());

            ctx.window.gl_swap_window();
            for event in ctx.event_pump.poll_iter() {
                match event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => close_requested = true,
                    Event::Window {
                        win_event: WindowEvent::SizeChanged(width, height),
                        ..
                    } => self.window_resized(width, height),
                    _ => {}
                }
            }
        }

        unsafe {
            gl.bind_vertex_array(None);
            gl.delete_vertex_array(vertex_array);
        }
        drop(renderable);
        drop(ctx);
        self.state = AppState::Terminated;
        log::info!("window closed");

        Ok(())
    }

    /// Records a new window size and recenters the viewport inside it.
    pub fn window_resized(&mut self, width: i32, height: i32) {
        self.window_width = width;
        self.window_height = height;
        (self.viewport_x, self.viewport_y) =
            viewport_offset((width, height), (self.screen_width, self.screen_height));
    }

    /// Caps the frame rate at `fps` frames per second. `0` renders as fast as possible.
    pub fn set_fps_limit(&mut self, fps: u32) {
        self.limiter.set_fps(fps);
    }

    pub fn fps_limit(&self) -> u32 {
        self.limiter.fps()
    }

    /// Frames rendered during the last complete second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Milliseconds between the two most recent frames.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// The GL context, while the window is open.
    pub fn gl(&self) -> Option<&Arc<glow::Context>> {
        self.context.as_ref().map(|ctx| &ctx.gl)
    }

    pub fn monitor_info(&self) -> MonitorInfo {
        self.monitor
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Parameters can be changed until [`GlApp::initialize`] reads them.
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn window_size(&self) -> (i32, i32) {
        (self.window_width, self.window_height)
    }

    pub fn screen_size(&self) -> (i32, i32) {
        (self.screen_width, self.screen_height)
    }

    pub fn viewport_offset(&self) -> (i32, i32) {
        (self.viewport_x, self.viewport_y)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

fn query_monitor(video: &sdl2::VideoSubsystem) -> Result<MonitorInfo> {
    let mode = video.current_display_mode(0).map_err(|e| {
        Error::new(ErrorKind::WindowingInit, format!("display mode query failed: {e}"))
    })?;
    let (physical_width, physical_height) = match video.display_dpi(0) {
        Ok((_, hdpi, vdpi)) => (physical_size_mm(mode.w, hdpi), physical_size_mm(mode.h, vdpi)),
        Err(e) => {
            log::warn!("display DPI unavailable: {e}");
            (0, 0)
        }
    };

    Ok(MonitorInfo {
        screen_width: mode.w,
        screen_height: mode.h,
        physical_width,
        physical_height,
        refresh_rate: mode.refresh_rate,
    })
}
