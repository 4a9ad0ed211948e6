//! Checks that need a live OpenGL 3.3 context.
//!
//! SDL may only be driven from one thread, so everything runs inside a single test. Run with
//! `cargo test -- --ignored` on a machine with a display.

use basegl::{
    AppState, Buffer, BufferTarget, ErrorKind, GlApp, Parameters, PixelFormat, Shader, Texture,
    config,
};
use glam::{Mat4, Vec3};
use glow::HasContext;

const VERTEX: &str = "#version 330 core
in vec2 position;
uniform mat4 u_transform;
void main() {
    gl_Position = u_transform * vec4(position, 0.0, 1.0);
}
";

const FRAGMENT: &str = "#version 330 core
uniform vec3 u_color;
out vec4 color;
void main() {
    color = vec4(u_color, 1.0);
}
";

#[test]
#[ignore = "requires a display and an OpenGL 3.3 driver"]
fn test_wrappers_against_a_live_context() {
    let mut params = Parameters::new();
    params.set(config::WINDOW_TITLE, "basegl tests");
    params.set(config::SCREEN_WIDTH, 64);
    params.set(config::SCREEN_HEIGHT, 64);
    let mut app = GlApp::new(params);
    let gl = app.initialize().unwrap();
    assert_eq!(app.state(), AppState::Initialized);
    assert_eq!(app.window_size(), (64, 64));
    assert_eq!(
        app.initialize().unwrap_err().kind(),
        ErrorKind::AlreadyInitialized
    );

    // buffers
    {
        let untouched = Buffer::<f32>::new(&gl, BufferTarget::Array).unwrap();
        assert!(untouched.is_empty());
        drop(untouched);

        let mut indices = Buffer::<u16>::new(&gl, BufferTarget::ElementArray).unwrap();
        indices.set(&[0, 1, 3, 0, 3, 2]);
        assert_eq!(indices.len(), 6);
        assert_eq!(indices.byte_len(), 12);
        indices.unbind();
    }

    // textures
    {
        let mut texture = Texture::empty(&gl);
        texture.bind();
        let err = texture.load_to_gpu().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImageNotLoaded);
        assert!(!texture.is_loaded_to_gpu());
        assert!(texture.handle().is_none());

        let path = std::env::temp_dir().join(format!("basegl-gl-{}.png", std::process::id()));
        image::GrayImage::new(5, 3).save(&path).unwrap();
        let mut texture = Texture::from_file(&gl, &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(texture.is_loaded_to_memory());
        assert_eq!(texture.format(), Some(PixelFormat::Luminance));
        texture.load_to_gpu().unwrap();
        assert!(texture.is_loaded_to_gpu());
        assert_eq!((texture.width(), texture.height()), (5, 3));
        texture.active_and_bind(1);
        texture.unbind();

        // the host copy survives the upload, so uploading again works
        assert!(texture.is_loaded_to_memory());
        texture.load_to_gpu().unwrap();
        let gray_handle = texture.handle();
        let swizzle_r = |texture: &Texture| unsafe {
            texture.bind();
            gl.get_tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_R)
        };
        let swizzle_g = |texture: &Texture| unsafe {
            texture.bind();
            gl.get_tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_SWIZZLE_G)
        };
        assert_eq!(swizzle_g(&texture), glow::RED as i32);

        // reusing the object for a color image drops the gray swizzle
        let path = std::env::temp_dir().join(format!("basegl-gl-{}-rgba.png", std::process::id()));
        image::RgbaImage::new(2, 2).save(&path).unwrap();
        texture.load_to_memory(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        texture.load_to_gpu().unwrap();
        assert_eq!(texture.handle(), gray_handle);
        assert_eq!(texture.format(), Some(PixelFormat::Rgba));
        assert_eq!(swizzle_r(&texture), glow::RED as i32);
        assert_eq!(swizzle_g(&texture), glow::GREEN as i32);
        texture.unbind();
    }

    // shaders
    {
        let mut shader = Shader::new(&gl);
        assert_eq!(
            shader.add_uniform("u_color").unwrap_err().kind(),
            ErrorKind::ProgramNotCreated
        );

        let missing = std::env::temp_dir().join("basegl-missing.vert");
        let err = shader
            .load_compile_and_link(&missing, &missing)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileLoad);
        assert!(shader.program().is_none());

        let err = shader
            .load_compile_and_link_sources("#version 330 core\nvoid main() { oops }", FRAGMENT)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShaderCompile);
        assert!(err.message().len() > "could not compile vertex shader".len());
        assert!(!shader.is_compiled());

        shader.bind_attrib_location(5, "position");
        shader.load_compile_and_link_sources(VERTEX, FRAGMENT).unwrap();
        assert!(shader.is_compiled());
        assert_eq!(shader.attrib_location("position"), Some(5));
        assert!(shader.uniform_location("u_transform").is_some());
        assert!(shader.uniform_location("u_missing").is_none());

        shader.use_program();
        shader.add_uniform("u_color").unwrap();
        shader.set_uniform("u_color", Vec3::new(1.0, 0.5, 0.0));
        shader.set_uniform("u_transform", Mat4::IDENTITY);
        shader.set_uniform("u_missing", 1.0f32);

        // bindings are kept across relinks
        shader.bind_attrib_location(3, "position");
        shader.load_compile_and_link_sources(VERTEX, FRAGMENT).unwrap();
        assert_eq!(shader.attrib_location("position"), Some(3));
    }
}
