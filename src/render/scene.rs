use anyhow::Result;
use std::ffi::c_void;

use scene_mirror::UvTransform;

use crate::render::egl::link_program;

/// Axis-aligned rectangle in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// Corners in normalized device coordinates for a `width`x`height` target.
    fn to_ndc(self, width: f32, height: f32) -> [[f32; 2]; 4] {
        let x0 = self.x / width * 2.0 - 1.0;
        let x1 = (self.x + self.w) / width * 2.0 - 1.0;
        let y0 = 1.0 - self.y / height * 2.0;
        let y1 = 1.0 - (self.y + self.h) / height * 2.0;
        [[x0, y1], [x1, y1], [x0, y0], [x1, y0]]
    }
}

pub type Rgba = [f32; 4];

const COLOR_VS: &str = r#"
    #version 100
    attribute vec3 pos;
    void main() {
        gl_Position = vec4(pos, 1.0);
    }
"#;

const COLOR_FS: &str = r#"
    #version 100
    precision mediump float;
    uniform vec4 u_color;
    void main() {
        gl_FragColor = u_color;
    }
"#;

const BLIT_VS: &str = r#"
    #version 100
    attribute vec2 pos;
    attribute vec2 tex;
    uniform vec2 u_uv_scale;
    uniform vec2 u_uv_offset;
    varying vec2 v_tex;
    void main() {
        gl_Position = vec4(pos, 0.0, 1.0);
        v_tex = tex * u_uv_scale + u_uv_offset;
    }
"#;

const BLIT_FS: &str = r#"
    #version 100
    precision mediump float;
    varying vec2 v_tex;
    uniform sampler2D u_texture;
    void main() {
        gl_FragColor = texture2D(u_texture, v_tex);
    }
"#;

const SKY: Rgba = [0.45, 0.65, 0.9, 1.0];
const GROUND: Rgba = [0.3, 0.55, 0.25, 1.0];
const SUN: Rgba = [1.0, 0.85, 0.2, 1.0];
const WALL: Rgba = [0.8, 0.5, 0.35, 1.0];
const ROOF: Rgba = [0.55, 0.2, 0.15, 1.0];
const ARROW: Rgba = [0.95, 0.95, 0.95, 1.0];
const MARKER: Rgba = [0.9, 0.1, 0.3, 1.0];

/// Draws the demo scene, the mirror overlay and the UI strip.
pub struct Painter {
    color_program: u32,
    color_uniform: i32,
    blit_program: u32,
    uv_scale_uniform: i32,
    uv_offset_uniform: i32,
    quad_vao: u32,
    quad_vbo: u32,
    blit_vao: u32,
    blit_vbo: u32,
    target: (f32, f32),
}

impl Painter {
    /// Needs a current context with GL loaded.
    pub fn new() -> Result<Self> {
        unsafe {
            let color_program = link_program(COLOR_VS, COLOR_FS)?;
            let blit_program = link_program(BLIT_VS, BLIT_FS)?;

            let color_uniform = gl::GetUniformLocation(color_program, c"u_color".as_ptr());
            let uv_scale_uniform = gl::GetUniformLocation(blit_program, c"u_uv_scale".as_ptr());
            let uv_offset_uniform = gl::GetUniformLocation(blit_program, c"u_uv_offset".as_ptr());

            // Rect quads are rewritten per draw
            let mut quad_vao = 0;
            let mut quad_vbo = 0;
            gl::GenVertexArrays(1, &mut quad_vao);
            gl::BindVertexArray(quad_vao);
            gl::GenBuffers(1, &mut quad_vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, quad_vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (12 * std::mem::size_of::<f32>()) as isize,
                std::ptr::null(),
                gl::DYNAMIC_DRAW,
            );
            let pos_loc = gl::GetAttribLocation(color_program, c"pos".as_ptr());
            gl::EnableVertexAttribArray(pos_loc as u32);
            gl::VertexAttribPointer(
                pos_loc as u32,
                3,
                gl::FLOAT,
                gl::FALSE,
                (3 * std::mem::size_of::<f32>()) as i32,
                std::ptr::null(),
            );

            // Full screen quad
            let vertices: [f32; 16] = [
                // pos      // tex
                -1.0, -1.0, 0.0, 0.0, 1.0, -1.0, 1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0,
            ];
            let mut blit_vao = 0;
            let mut blit_vbo = 0;
            gl::GenVertexArrays(1, &mut blit_vao);
            gl::BindVertexArray(blit_vao);
            gl::GenBuffers(1, &mut blit_vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, blit_vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (vertices.len() * std::mem::size_of::<f32>()) as isize,
                vertices.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
            let pos_loc = gl::GetAttribLocation(blit_program, c"pos".as_ptr());
            let tex_loc = gl::GetAttribLocation(blit_program, c"tex".as_ptr());
            gl::EnableVertexAttribArray(pos_loc as u32);
            gl::VertexAttribPointer(
                pos_loc as u32,
                2,
                gl::FLOAT,
                gl::FALSE,
                (4 * std::mem::size_of::<f32>()) as i32,
                std::ptr::null(),
            );
            gl::EnableVertexAttribArray(tex_loc as u32);
            gl::VertexAttribPointer(
                tex_loc as u32,
                2,
                gl::FLOAT,
                gl::FALSE,
                (4 * std::mem::size_of::<f32>()) as i32,
                (2 * std::mem::size_of::<f32>()) as *const c_void,
            );

            gl::UseProgram(blit_program);
            gl::Uniform1i(gl::GetUniformLocation(blit_program, c"u_texture".as_ptr()), 0);
            gl::BindVertexArray(0);

            Ok(Self {
                color_program,
                color_uniform,
                blit_program,
                uv_scale_uniform,
                uv_offset_uniform,
                quad_vao,
                quad_vbo,
                blit_vao,
                blit_vbo,
                target: (1.0, 1.0),
            })
        }
    }

    /// Binds `fbo` and clears it. Every later draw goes there.
    pub fn begin(&mut self, fbo: u32, width: u32, height: u32) {
        self.target = (width.max(1) as f32, height.max(1) as f32);
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);
            gl::Viewport(0, 0, width as i32, height as i32);
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
            gl::ClearDepthf(1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
    }

    /// `depth` in [-1, 1]; nearer wins.
    pub fn fill_rect(&self, rect: Rect, depth: f32, color: Rgba) {
        let (w, h) = self.target;
        let corners = rect.to_ndc(w, h);
        let mut vertices = [0.0f32; 12];
        for (i, [x, y]) in corners.into_iter().enumerate() {
            vertices[i * 3] = x;
            vertices[i * 3 + 1] = y;
            vertices[i * 3 + 2] = depth;
        }
        unsafe {
            gl::UseProgram(self.color_program);
            gl::Uniform4f(self.color_uniform, color[0], color[1], color[2], color[3]);
            gl::BindVertexArray(self.quad_vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, self.quad_vbo);
            gl::BufferSubData(
                gl::ARRAY_BUFFER,
                0,
                std::mem::size_of_val(&vertices) as isize,
                vertices.as_ptr() as *const c_void,
            );
            gl::DrawArrays(gl::TRIANGLE_STRIP, 0, 4);
        }
    }

    /// A scene with an obvious left and right: sun top-left, arrow pointing
    /// right. `marker` is where the scene believes the pointer is, as a
    /// fraction of the target.
    pub fn draw_scene(&self, marker: Option<(f32, f32)>) {
        let (w, h) = self.target;
        unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::DepthFunc(gl::LESS);
        }

        self.fill_rect(Rect::new(0.0, 0.0, w, h * 0.6), 0.9, SKY);
        self.fill_rect(Rect::new(0.0, h * 0.6, w, h * 0.4), 0.9, GROUND);
        self.fill_rect(Rect::new(w * 0.06, h * 0.08, w * 0.1, w * 0.1), 0.8, SUN);

        // House, roof overlapping the wall in front of it
        self.fill_rect(Rect::new(w * 0.55, h * 0.42, w * 0.2, h * 0.25), 0.5, WALL);
        self.fill_rect(Rect::new(w * 0.52, h * 0.34, w * 0.26, h * 0.1), 0.4, ROOF);

        // Arrow pointing right
        self.fill_rect(Rect::new(w * 0.15, h * 0.75, w * 0.22, h * 0.04), 0.3, ARROW);
        for step in 0..6 {
            let t = step as f32;
            let size = h * (0.12 - t * 0.02);
            self.fill_rect(
                Rect::new(w * 0.37 + t * w * 0.01, h * 0.77 - size / 2.0, w * 0.01, size),
                0.3,
                ARROW,
            );
        }

        if let Some((fx, fy)) = marker {
            let size = (w.min(h) * 0.02).max(6.0);
            self.fill_rect(
                Rect::new(fx * w - size / 2.0, fy * h - size / 2.0, size, size),
                -0.5,
                MARKER,
            );
        }

        unsafe { gl::Disable(gl::DEPTH_TEST) };
    }

    /// Samples `texture` across the whole target through `uv`.
    pub fn composite(&self, texture: u32, uv: UvTransform) {
        unsafe {
            gl::UseProgram(self.blit_program);
            gl::Uniform2f(self.uv_scale_uniform, uv.scale[0], uv.scale[1]);
            gl::Uniform2f(self.uv_offset_uniform, uv.offset[0], uv.offset[1]);
            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::BindVertexArray(self.blit_vao);
            gl::DrawArrays(gl::TRIANGLE_STRIP, 0, 4);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }

    /// Flat 2D pass, drawn last and never flipped.
    pub fn draw_panels(&self, panels: impl IntoIterator<Item = (Rect, Rgba)>) {
        for (rect, color) in panels {
            self.fill_rect(rect, 0.0, color);
        }
    }
}

impl Drop for Painter {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteProgram(self.color_program);
            gl::DeleteProgram(self.blit_program);
            gl::DeleteBuffers(1, &self.quad_vbo);
            gl::DeleteBuffers(1, &self.blit_vbo);
            gl::DeleteVertexArrays(1, &self.quad_vao);
            gl::DeleteVertexArrays(1, &self.blit_vao);
        }
    }
}
