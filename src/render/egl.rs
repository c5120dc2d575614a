use anyhow::{bail, Context, Result};
use khronos_egl as egl;
use std::ffi::c_void;

/// One GLES 3 context shared by the window surface and every offscreen target.
pub struct EglContext {
    pub egl: egl::DynamicInstance<egl::EGL1_5>,
    pub display: egl::Display,
    pub context: egl::Context,
    pub config: egl::Config,
}

impl EglContext {
    pub fn new(wayland_display: *mut c_void) -> Result<Self> {
        let egl = unsafe { egl::DynamicInstance::<egl::EGL1_5>::load_required() }
            .context("Failed to load EGL")?;

        let display = unsafe { egl.get_display(wayland_display) }
            .ok_or_else(|| anyhow::anyhow!("Failed to get EGL display"))?;

        let (major, minor) = egl.initialize(display).context("Failed to initialize EGL")?;
        tracing::debug!(major, minor, "EGL initialized");

        // Depth lives in the offscreen targets, the window only needs color
        let config_attribs = [
            egl::SURFACE_TYPE,
            egl::WINDOW_BIT,
            egl::RED_SIZE,
            8,
            egl::GREEN_SIZE,
            8,
            egl::BLUE_SIZE,
            8,
            egl::ALPHA_SIZE,
            8,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_ES3_BIT,
            egl::NONE,
        ];

        let config = egl
            .choose_first_config(display, &config_attribs)
            .context("Failed to choose EGL config")?
            .ok_or_else(|| anyhow::anyhow!("No GLES 3 capable EGL config found"))?;

        egl.bind_api(egl::OPENGL_ES_API)
            .context("Failed to bind OpenGL ES API")?;

        let context_attribs = [
            egl::CONTEXT_MAJOR_VERSION,
            3,
            egl::CONTEXT_MINOR_VERSION,
            0,
            egl::NONE,
        ];

        let context = egl
            .create_context(display, config, None, &context_attribs)
            .context("Failed to create EGL context")?;

        Ok(Self {
            egl,
            display,
            context,
            config,
        })
    }

    pub fn make_current(&self, surface: egl::Surface) -> Result<()> {
        self.egl
            .make_current(
                self.display,
                Some(surface),
                Some(surface),
                Some(self.context),
            )
            .context("Failed to make EGL context current")?;
        Ok(())
    }

    pub fn create_window_surface(
        &self,
        native_window: egl::NativeWindowType,
    ) -> Result<egl::Surface> {
        let surface = unsafe {
            self.egl
                .create_window_surface(self.display, self.config, native_window, None)
        }
        .context("Failed to create EGL window surface")?;
        Ok(surface)
    }

    pub fn destroy_surface(&self, surface: egl::Surface) -> Result<()> {
        self.egl
            .destroy_surface(self.display, surface)
            .context("Failed to destroy EGL surface")?;
        Ok(())
    }

    /// Frame pacing follows the compositor.
    pub fn set_vsync(&self, enabled: bool) -> Result<()> {
        self.egl
            .swap_interval(self.display, i32::from(enabled))
            .context("Failed to set swap interval")?;
        Ok(())
    }

    pub fn swap_buffers(&self, surface: egl::Surface) -> Result<()> {
        self.egl
            .swap_buffers(self.display, surface)
            .context("Failed to swap buffers")?;
        Ok(())
    }

    /// Loads GL entry points. Needs a current context.
    pub fn load_gl(&self) {
        gl::load_with(|s| {
            self.egl
                .get_proc_address(s)
                .map(|p| p as *const c_void)
                .unwrap_or(std::ptr::null())
        });
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        let _ = self.egl.make_current(self.display, None, None, None);
        let _ = self.egl.destroy_context(self.display, self.context);
        let _ = self.egl.terminate(self.display);
    }
}

pub unsafe fn compile_shader(shader_type: u32, source: &str) -> Result<u32> {
    let shader = gl::CreateShader(shader_type);
    let source_ptr = source.as_ptr() as *const i8;
    let source_len = source.len() as i32;
    gl::ShaderSource(shader, 1, &source_ptr, &source_len);
    gl::CompileShader(shader);

    let mut status = 0;
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
    if status == 0 {
        let mut len = 0;
        gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len.max(1) as usize];
        gl::GetShaderInfoLog(
            shader,
            len,
            std::ptr::null_mut(),
            buf.as_mut_ptr() as *mut i8,
        );
        gl::DeleteShader(shader);
        bail!("Shader compile error: {}", String::from_utf8_lossy(&buf));
    }

    Ok(shader)
}

pub unsafe fn link_program(vs_src: &str, fs_src: &str) -> Result<u32> {
    let vs = compile_shader(gl::VERTEX_SHADER, vs_src)?;
    let fs = compile_shader(gl::FRAGMENT_SHADER, fs_src)?;

    let program = gl::CreateProgram();
    gl::AttachShader(program, vs);
    gl::AttachShader(program, fs);
    gl::LinkProgram(program);
    gl::DeleteShader(vs);
    gl::DeleteShader(fs);

    let mut status = 0;
    gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
    if status == 0 {
        gl::DeleteProgram(program);
        bail!("Failed to link shader program");
    }

    Ok(program)
}
