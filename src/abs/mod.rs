//! This module contains the OpenGL wrappers of the crate: application setup and the frame loop,
//! buffer objects, shader programs and textures.

pub mod app;
pub mod buffer;
pub mod shader;
pub mod texture;

pub use app::*;
pub use buffer::*;
pub use shader::*;
pub use texture::*;
