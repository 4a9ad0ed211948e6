//! OpenGL Shaders
//!
//! This module defines the [`ShaderStage`] struct for a single compiled stage and the [`Shader`]
//! struct for a vertex/fragment program built from source files. It also provides the
//! [`Uniform`] trait for setting uniform variables in shader programs.

use std::{collections::HashMap, path::Path, sync::Arc};

use glam::{IVec3, Mat3, Mat4, Vec2, Vec3, Vec4};
use glow::HasContext;

use crate::error::{Error, ErrorKind, Result};

/// Reads a whole shader source file as text.
pub fn read_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorKind::FileLoad,
            format!("shader file {} could not be loaded: {e}", path.display()),
        )
    })
}

/// Represents an individual compiled OpenGL shader stage.
pub struct ShaderStage {
    gl: Arc<glow::Context>,
    id: glow::Shader,
}

impl ShaderStage {
    /// Compiles a new shader stage from the given source code.
    ///
    /// `shader_type` is `glow::VERTEX_SHADER` or `glow::FRAGMENT_SHADER`. On failure the driver's
    /// info log, when it has one, is part of the error message.
    pub fn new(gl: &Arc<glow::Context>, shader_type: u32, source: &str) -> Result<Self> {
        unsafe {
            let shader = gl.create_shader(shader_type).map_err(|e| {
                Error::new(
                    ErrorKind::CreateShader,
                    format!("{} creation failed: {e}", stage_name(shader_type)),
                )
            })?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                let message = if log.trim().is_empty() {
                    format!("could not compile {}", stage_name(shader_type))
                } else {
                    format!("could not compile {}: {}", stage_name(shader_type), log.trim())
                };
                return Err(Error::new(ErrorKind::ShaderCompile, message));
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
            })
        }
    }
}

impl Drop for ShaderStage {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex shader",
        glow::FRAGMENT_SHADER => "fragment shader",
        _ => "shader",
    }
}

/// Represents a uniform variable type that can be uploaded to a shader program.
pub trait Uniform {
    /// Uploads the value to the uniform at `location` of the program in use.
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for bool {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_i32(Some(location), *self as i32);
        }
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_f32(Some(location), *self);
        }
    }
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_i32(Some(location), *self);
        }
    }
}

impl Uniform for Vec2 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_2_f32(Some(location), self.x, self.y);
        }
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_3_f32(Some(location), self.x, self.y, self.z);
        }
    }
}

impl Uniform for IVec3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_3_i32(Some(location), self.x, self.y, self.z);
        }
    }
}

impl Uniform for Vec4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_4_f32(Some(location), self.x, self.y, self.z, self.w);
        }
    }
}

impl Uniform for Mat3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_matrix_3_f32_slice(Some(location), false, &self.to_cols_array());
        }
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_matrix_4_f32_slice(Some(location), false, &self.to_cols_array());
        }
    }
}

impl<const N: usize> Uniform for [Vec3; N] {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        let data: Vec<f32> = self.iter().flat_map(|v| v.to_array()).collect();
        unsafe {
            gl.uniform_3_f32_slice(Some(location), &data);
        }
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        (*self).set_uniform(gl, location);
    }
}

/// A linked program together with the two stages it was built from.
struct Program {
    id: glow::Program,
    _vertex: ShaderStage,
    _fragment: ShaderStage,
}

/// Represents an OpenGL program made of one vertex and one fragment stage.
///
/// Uniform locations are cached by name: [`Shader::add_uniform`] registers one up front, and
/// [`Shader::set_uniform`] registers a name on first use. Attribute bindings requested with
/// [`Shader::bind_attrib_location`] are applied to every program this shader links.
pub struct Shader {
    gl: Arc<glow::Context>,
    program: Option<Program>,
    uniforms: HashMap<String, Option<glow::UniformLocation>>,
    attrib_bindings: Vec<(u32, String)>,
}

impl Shader {
    /// Creates a shader with no program yet.
    pub fn new(gl: &Arc<glow::Context>) -> Self {
        Self {
            gl: Arc::clone(gl),
            program: None,
            uniforms: HashMap::new(),
            attrib_bindings: Vec::new(),
        }
    }

    /// Reads both source files, compiles them and links them into a program.
    ///
    /// Any program built by an earlier call is released first. Nothing is allocated on the GPU
    /// unless both files could be read.
    pub fn load_compile_and_link(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<()> {
        let vertex_source = read_source(vertex_path)?;
        let fragment_source = read_source(fragment_path)?;
        self.load_compile_and_link_sources(&vertex_source, &fragment_source)
    }

    /// Compiles and links a program from in-memory sources.
    pub fn load_compile_and_link_sources(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<()> {
        self.release();

        let gl = &self.gl;
        unsafe {
            let program = gl.create_program().map_err(|e| {
                Error::new(ErrorKind::CreateProgram, format!("program creation failed: {e}"))
            })?;

            let stages = ShaderStage::new(gl, glow::VERTEX_SHADER, vertex_source).and_then(
                |vertex| {
                    ShaderStage::new(gl, glow::FRAGMENT_SHADER, fragment_source)
                        .map(|fragment| (vertex, fragment))
                },
            );
            let (vertex, fragment) = match stages {
                Ok(stages) => stages,
                Err(e) => {
                    gl.delete_program(program);
                    return Err(e);
                }
            };

            gl.attach_shader(program, vertex.id);
            gl.attach_shader(program, fragment.id);
            for (index, name) in &self.attrib_bindings {
                gl.bind_attrib_location(program, *index, name);
            }
            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(Error::new(
                    ErrorKind::ShaderLink,
                    format!("program link failed: {}", log.trim()),
                ));
            }

            log::debug!("linked shader program {program:?}");
            self.program = Some(Program {
                id: program,
                _vertex: vertex,
                _fragment: fragment,
            });
        }

        Ok(())
    }

    fn release(&mut self) {
        self.uniforms.clear();
        if let Some(program) = self.program.take() {
            unsafe {
                self.gl.use_program(None);
                self.gl.delete_program(program.id);
            }
        }
    }

    /// Whether a program has been successfully compiled and linked.
    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    /// The linked program handle.
    pub fn program(&self) -> Option<glow::Program> {
        self.program.as_ref().map(|p| p.id)
    }

    /// Makes the program current for subsequent draw calls.
    pub fn use_program(&self) {
        if let Some(program) = &self.program {
            unsafe {
                self.gl.use_program(Some(program.id));
            }
        }
    }

    /// Binds a vertex attribute name to an index. Takes effect at the next link.
    ///
    /// A later binding for the same name replaces the earlier one.
    pub fn bind_attrib_location(&mut self, index: u32, name: &str) {
        set_binding(&mut self.attrib_bindings, index, name);
    }

    /// Looks up an attribute's index directly from the program.
    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        let program = self.program.as_ref()?;
        unsafe { self.gl.get_attrib_location(program.id, name) }
    }

    /// Looks up a uniform's location directly from the program, bypassing the cache.
    pub fn uniform_location(&self, name: &str) -> Option<glow::UniformLocation> {
        let program = self.program.as_ref()?;
        unsafe { self.gl.get_uniform_location(program.id, name) }
    }

    /// Registers `name` in the location cache.
    ///
    /// Fails with [`ErrorKind::ProgramNotCreated`] before the program is linked.
    pub fn add_uniform(&mut self, name: &str) -> Result<()> {
        if self.program.is_none() {
            return Err(Error::new(
                ErrorKind::ProgramNotCreated,
                format!("cannot register uniform `{name}` before the program is linked"),
            ));
        }
        let location = self.uniform_location(name);
        if location.is_none() {
            log::warn!("uniform `{name}` is not declared by the program");
        }
        self.uniforms.insert(name.to_string(), location);
        Ok(())
    }

    /// Sets a uniform variable on the program, which must be in use.
    ///
    /// Names are resolved through the cache; a name the program does not declare is ignored.
    pub fn set_uniform<T: Uniform>(&mut self, name: &str, value: T) {
        if self.program.is_none() {
            return;
        }
        if !self.uniforms.contains_key(name) {
            let location = self.uniform_location(name);
            if location.is_none() {
                log::warn!("uniform `{name}` is not declared by the program");
            }
            self.uniforms.insert(name.to_string(), location);
        }
        if let Some(Some(location)) = self.uniforms.get(name) {
            value.set_uniform(&self.gl, location);
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.release();
    }
}

fn set_binding(bindings: &mut Vec<(u32, String)>, index: u32, name: &str) {
    match bindings.iter_mut().find(|(_, bound)| bound == name) {
        Some(binding) => binding.0 = index,
        None => bindings.push((index, name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_source() {
        let path = std::env::temp_dir().join(format!("basegl-{}-simple.vert", std::process::id()));
        let source = "#version 330 core\nvoid main() {\n    gl_Position = vec4(0.0);\n}\n";
        std::fs::write(&path, source).unwrap();
        let read = read_source(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read.unwrap(), source);
    }

    #[test]
    fn test_read_missing_source() {
        let path = std::env::temp_dir().join("basegl-no-such-shader.frag");
        let err = read_source(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileLoad);
        assert!(err.message().contains("no-such-shader.frag"));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(stage_name(glow::VERTEX_SHADER), "vertex shader");
        assert_eq!(stage_name(glow::FRAGMENT_SHADER), "fragment shader");
        assert_eq!(stage_name(glow::GEOMETRY_SHADER), "shader");
    }

    #[test]
    fn test_attrib_bindings_replace_by_name() {
        let mut bindings = Vec::new();
        set_binding(&mut bindings, 0, "position");
        set_binding(&mut bindings, 1, "uv");
        set_binding(&mut bindings, 5, "position");
        assert_eq!(
            bindings,
            vec![(5, "position".to_string()), (1, "uv".to_string())]
        );
    }
}
