//! Minimal OpenGL application scaffolding.
//!
//! [`GlApp`] opens a window with an OpenGL 3.3 core context and runs a frame loop that calls a
//! [`Renderable`] once per frame. [`Buffer`], [`Texture`] and [`Shader`] own the GPU objects a
//! renderer draws with and release them when dropped.
//!
//! ```no_run
//! use basegl::{GlApp, Parameters, Renderable};
//!
//! struct Blank;
//!
//! impl Renderable for Blank {
//!     fn render(&mut self, _elapsed_ms: f64) {}
//! }
//!
//! fn main() -> basegl::Result<()> {
//!     let mut app = GlApp::new(Parameters::new());
//!     app.initialize()?;
//!     app.run(Blank)
//! }
//! ```

pub mod abs;
pub mod config;
pub mod error;
pub mod logging;
pub mod timing;

pub use abs::*;
pub use config::Parameters;
pub use error::{Error, ErrorKind, Result};
