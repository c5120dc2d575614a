use std::collections::HashMap;

use scene_mirror::redirect::{FilterMode, WrapMode};
use scene_mirror::{MirrorError, MirrorResult, RenderDevice, SurfaceDesc, SurfaceId};

/// Offscreen color+depth target. With more than one sample the scene is
/// drawn into `msaa_fbo` and resolved into `fbo` before compositing.
struct GlTarget {
    desc: SurfaceDesc,
    fbo: u32,
    texture: u32,
    depth: u32,
    msaa_fbo: u32,
    msaa_color: u32,
    msaa_depth: u32,
}

impl GlTarget {
    unsafe fn delete(&self) {
        gl::DeleteFramebuffers(1, &self.fbo);
        gl::DeleteTextures(1, &self.texture);
        gl::DeleteRenderbuffers(1, &self.depth);
        if self.msaa_fbo != 0 {
            gl::DeleteFramebuffers(1, &self.msaa_fbo);
            gl::DeleteRenderbuffers(1, &self.msaa_color);
            gl::DeleteRenderbuffers(1, &self.msaa_depth);
        }
    }
}

/// [`RenderDevice`] backed by GLES 3 framebuffer objects.
///
/// Needs the EGL context current for every call, including drop.
pub struct GlDevice {
    targets: HashMap<SurfaceId, GlTarget>,
    next: u64,
    max_texture_size: u32,
    max_samples: u32,
}

impl GlDevice {
    pub fn new() -> Self {
        let (mut max_texture_size, mut max_samples) = (0, 0);
        unsafe {
            gl::GetIntegerv(gl::MAX_TEXTURE_SIZE, &mut max_texture_size);
            gl::GetIntegerv(gl::MAX_SAMPLES, &mut max_samples);
        }
        tracing::debug!(max_texture_size, max_samples, "GL limits");
        Self {
            targets: HashMap::new(),
            next: 0,
            max_texture_size: max_texture_size.max(0) as u32,
            max_samples: max_samples.max(1) as u32,
        }
    }

    /// Framebuffer the scene camera should draw into, with its size.
    pub fn draw_target(&self, id: SurfaceId) -> Option<(u32, u32, u32)> {
        self.targets.get(&id).map(|t| {
            let fbo = if t.msaa_fbo != 0 { t.msaa_fbo } else { t.fbo };
            (fbo, t.desc.width, t.desc.height)
        })
    }

    /// Resolves multisampled content into the sampleable texture.
    pub fn resolve(&self, id: SurfaceId) {
        let Some(t) = self.targets.get(&id) else { return };
        if t.msaa_fbo == 0 {
            return;
        }
        let (w, h) = (t.desc.width as i32, t.desc.height as i32);
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, t.msaa_fbo);
            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, t.fbo);
            gl::BlitFramebuffer(0, 0, w, h, 0, 0, w, h, gl::COLOR_BUFFER_BIT, gl::NEAREST);
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
    }

    pub fn texture(&self, id: SurfaceId) -> Option<u32> {
        self.targets.get(&id).map(|t| t.texture)
    }

    unsafe fn build(&self, desc: &SurfaceDesc, samples: u32) -> MirrorResult<GlTarget> {
        let (w, h) = (desc.width as i32, desc.height as i32);
        let depth_format = if desc.depth_bits > 16 {
            gl::DEPTH_COMPONENT24
        } else {
            gl::DEPTH_COMPONENT16
        };
        let filter = match desc.filter {
            FilterMode::Nearest => gl::NEAREST,
            FilterMode::Bilinear => gl::LINEAR,
        } as i32;
        let wrap = match desc.wrap {
            WrapMode::Clamp => gl::CLAMP_TO_EDGE,
            WrapMode::Repeat => gl::REPEAT,
        } as i32;

        let mut target = GlTarget {
            desc: *desc,
            fbo: 0,
            texture: 0,
            depth: 0,
            msaa_fbo: 0,
            msaa_color: 0,
            msaa_depth: 0,
        };

        gl::GenTextures(1, &mut target.texture);
        gl::BindTexture(gl::TEXTURE_2D, target.texture);
        gl::TexStorage2D(gl::TEXTURE_2D, 1, gl::RGBA8, w, h);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap);

        gl::GenRenderbuffers(1, &mut target.depth);
        gl::BindRenderbuffer(gl::RENDERBUFFER, target.depth);
        gl::RenderbufferStorage(gl::RENDERBUFFER, depth_format, w, h);

        gl::GenFramebuffers(1, &mut target.fbo);
        gl::BindFramebuffer(gl::FRAMEBUFFER, target.fbo);
        gl::FramebufferTexture2D(
            gl::FRAMEBUFFER,
            gl::COLOR_ATTACHMENT0,
            gl::TEXTURE_2D,
            target.texture,
            0,
        );
        gl::FramebufferRenderbuffer(
            gl::FRAMEBUFFER,
            gl::DEPTH_ATTACHMENT,
            gl::RENDERBUFFER,
            target.depth,
        );
        let mut status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);

        if status == gl::FRAMEBUFFER_COMPLETE && samples > 1 {
            let samples = samples as i32;
            gl::GenRenderbuffers(1, &mut target.msaa_color);
            gl::BindRenderbuffer(gl::RENDERBUFFER, target.msaa_color);
            gl::RenderbufferStorageMultisample(gl::RENDERBUFFER, samples, gl::RGBA8, w, h);

            gl::GenRenderbuffers(1, &mut target.msaa_depth);
            gl::BindRenderbuffer(gl::RENDERBUFFER, target.msaa_depth);
            gl::RenderbufferStorageMultisample(gl::RENDERBUFFER, samples, depth_format, w, h);

            gl::GenFramebuffers(1, &mut target.msaa_fbo);
            gl::BindFramebuffer(gl::FRAMEBUFFER, target.msaa_fbo);
            gl::FramebufferRenderbuffer(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::RENDERBUFFER,
                target.msaa_color,
            );
            gl::FramebufferRenderbuffer(
                gl::FRAMEBUFFER,
                gl::DEPTH_ATTACHMENT,
                gl::RENDERBUFFER,
                target.msaa_depth,
            );
            status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        }

        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        gl::BindRenderbuffer(gl::RENDERBUFFER, 0);
        gl::BindTexture(gl::TEXTURE_2D, 0);

        if status != gl::FRAMEBUFFER_COMPLETE {
            target.delete();
            return Err(MirrorError::Device(format!(
                "framebuffer incomplete (status {status:#x})"
            )));
        }
        Ok(target)
    }
}

impl RenderDevice for GlDevice {
    fn create_surface(&mut self, desc: &SurfaceDesc) -> MirrorResult<SurfaceId> {
        if desc.width > self.max_texture_size || desc.height > self.max_texture_size {
            return Err(MirrorError::Device(format!(
                "{}x{} exceeds the {} texel texture limit",
                desc.width, desc.height, self.max_texture_size
            )));
        }

        let samples = desc.samples.min(self.max_samples);
        if samples != desc.samples {
            tracing::warn!(
                requested = desc.samples,
                used = samples,
                "MSAA sample count clamped to device limit"
            );
        }

        let target = unsafe { self.build(desc, samples)? };
        self.next += 1;
        let id = SurfaceId(self.next);
        self.targets.insert(id, target);
        Ok(id)
    }

    fn release_surface(&mut self, id: SurfaceId) {
        if let Some(target) = self.targets.remove(&id) {
            unsafe { target.delete() };
        }
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        for (_, target) in self.targets.drain() {
            unsafe { target.delete() };
        }
    }
}
