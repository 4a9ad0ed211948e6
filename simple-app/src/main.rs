//! Draws a textured quad filling the window.
//!
//! An optional JSON parameter file given as the first argument overrides the defaults below,
//! e.g. `{ "screen.fpsLimit": 60, "log.level": "debug" }`.

use std::sync::Arc;

use basegl::{
    Buffer, BufferTarget, Error, ErrorKind, GlApp, Parameters, Renderable, Shader, Texture,
    config, logging,
};
use glow::HasContext;

const LOG_LEVEL: &str = "log.level";

macro_rules! asset_path {
    ($path:literal) => {
        concat!(env!("CARGO_MANIFEST_DIR"), "/src/", $path)
    };
}

/// Interleaved `x, y, u, v` per vertex.
const VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 1.0, //
    1.0, -1.0, 1.0, 1.0, //
    -1.0, 1.0, 0.0, 0.0, //
    1.0, 1.0, 1.0, 0.0,
];

const INDICES: [u16; 6] = [0, 1, 3, 0, 3, 2];

const STRIDE: i32 = 4 * std::mem::size_of::<f32>() as i32;

struct SimpleScene {
    gl: Arc<glow::Context>,
    shader: Shader,
    vbo: Buffer<f32>,
    ibo: Buffer<u16>,
    texture: Texture,
    position: u32,
    uv: u32,
    time_ms: f64,
}

impl SimpleScene {
    fn new(gl: &Arc<glow::Context>) -> basegl::Result<Self> {
        let mut shader = Shader::new(gl);
        shader.load_compile_and_link(
            asset_path!("shaders/simple/vert.glsl"),
            asset_path!("shaders/simple/frag.glsl"),
        )?;

        let position = attrib(&shader, "position")?;
        let uv = attrib(&shader, "uv")?;
        shader.add_uniform("textureSampler")?;
        shader.add_uniform("u_fade")?;

        let mut vbo = Buffer::new(gl, BufferTarget::Array)?;
        vbo.set(&VERTICES);
        let mut ibo = Buffer::new(gl, BufferTarget::ElementArray)?;
        ibo.set(&INDICES);

        let mut texture = Texture::from_file(gl, asset_path!("assets/hello_world.png"))?;
        texture.load_to_gpu()?;

        Ok(Self {
            gl: Arc::clone(gl),
            shader,
            vbo,
            ibo,
            texture,
            position,
            uv,
            time_ms: 0.0,
        })
    }
}

fn attrib(shader: &Shader, name: &str) -> basegl::Result<u32> {
    shader.attrib_location(name).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidParameter,
            format!("shader has no `{name}` attribute"),
        )
    })
}

impl Renderable for SimpleScene {
    fn render(&mut self, elapsed_ms: f64) {
        self.time_ms += elapsed_ms;
        let fade = 0.75 + 0.25 * (self.time_ms / 1000.0).sin() as f32;

        self.shader.use_program();
        self.texture.active_and_bind(0);
        self.shader.set_uniform("textureSampler", 0);
        self.shader.set_uniform("u_fade", fade);

        self.vbo.bind();
        self.ibo.bind();

        unsafe {
            self.gl.enable_vertex_attrib_array(self.position);
            self.gl
                .vertex_attrib_pointer_f32(self.position, 2, glow::FLOAT, false, STRIDE, 0);
            self.gl.enable_vertex_attrib_array(self.uv);
            self.gl
                .vertex_attrib_pointer_f32(self.uv, 2, glow::FLOAT, false, STRIDE, 8);

            self.gl.draw_elements(
                glow::TRIANGLES,
                self.ibo.len() as i32,
                glow::UNSIGNED_SHORT,
                0,
            );

            self.gl.disable_vertex_attrib_array(self.position);
            self.gl.disable_vertex_attrib_array(self.uv);
        }

        self.vbo.unbind();
        self.ibo.unbind();
    }
}

fn run() -> basegl::Result<()> {
    let mut params = Parameters::new();
    params.set(config::WINDOW_TITLE, "Hello world application");
    params.set(config::SCREEN_WIDTH, 512);
    params.set(config::SCREEN_HEIGHT, 512);
    params.set(LOG_LEVEL, "info");
    if let Some(path) = std::env::args().nth(1) {
        params.merge(Parameters::load(path)?);
    }

    logging::init(logging::parse_level(params.get_str(LOG_LEVEL)?)?)?;

    let mut app = GlApp::new(params);
    let gl = app.initialize()?;

    unsafe {
        gl.enable(glow::CULL_FACE);
        gl.enable(glow::BLEND);
        gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        gl.clear_color(0.2, 0.2, 0.2, 1.0);
    }

    let scene = SimpleScene::new(&gl)?;
    app.run(scene)?;
    log::info!("last measured fps: {}", app.fps());

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
