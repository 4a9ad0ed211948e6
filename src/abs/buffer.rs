//! GPU buffer objects.
//!
//! This module defines the [`Buffer`] struct which owns a single OpenGL buffer object bound to a
//! fixed [`BufferTarget`], such as a vertex buffer or an index buffer.

use std::{marker::PhantomData, sync::Arc};

use glow::HasContext;

use crate::error::{Error, ErrorKind, Result};

/// The binding slot a [`Buffer`] is used with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data (`GL_ARRAY_BUFFER`).
    Array,
    /// Index data (`GL_ELEMENT_ARRAY_BUFFER`).
    ElementArray,
}

impl BufferTarget {
    /// The OpenGL enum for this target.
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// A buffer object holding elements of type `T` on the GPU side.
pub struct Buffer<T> {
    gl: Arc<glow::Context>,
    id: glow::Buffer,
    target: BufferTarget,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> Buffer<T> {
    /// Creates an empty buffer for the given target.
    pub fn new(gl: &Arc<glow::Context>, target: BufferTarget) -> Result<Self> {
        let id = unsafe { gl.create_buffer() }
            .map_err(|e| Error::new(ErrorKind::CreateBuffer, format!("buffer creation failed: {e}")))?;
        log::debug!("created {target:?} buffer {id:?}");

        Ok(Self {
            gl: Arc::clone(gl),
            id,
            target,
            len: 0,
            _marker: PhantomData,
        })
    }

    /// Uploads `data` as static draw data, replacing the previous contents.
    ///
    /// The buffer stays bound to its target afterwards.
    pub fn set(&mut self, data: &[T]) {
        unsafe {
            self.gl.bind_buffer(self.target.gl_enum(), Some(self.id));
            self.gl.buffer_data_u8_slice(
                self.target.gl_enum(),
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
        }
        self.len = data.len();
    }
}

impl<T> Buffer<T> {
    /// Binds the buffer to its target.
    pub fn bind(&self) {
        unsafe {
            self.gl.bind_buffer(self.target.gl_enum(), Some(self.id));
        }
    }

    /// Unbinds whatever buffer is bound to this buffer's target.
    pub fn unbind(&self) {
        unsafe {
            self.gl.bind_buffer(self.target.gl_enum(), None);
        }
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Number of elements uploaded by the last [`Buffer::set`].
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size in bytes of the uploaded data.
    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_enums() {
        assert_eq!(BufferTarget::Array.gl_enum(), glow::ARRAY_BUFFER);
        assert_eq!(
            BufferTarget::ElementArray.gl_enum(),
            glow::ELEMENT_ARRAY_BUFFER
        );
    }
}
