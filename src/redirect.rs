//! Offscreen render surface ownership and camera redirection.

use tracing::{debug, info};

use crate::error::{MirrorError, MirrorResult};
use crate::host::{ScreenSize, SceneCamera};

/// Smallest extent, per axis, of any mirror surface.
pub const MIN_SURFACE_EXTENT: u32 = 256;

/// Depth buffer precision requested for every surface.
pub const DEPTH_BITS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Bilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
}

/// Everything a device needs to allocate a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub depth_bits: u32,
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

impl SurfaceDesc {
    /// Surface for a screen of `screen` pixels rendered at `render_scale`.
    ///
    /// Each axis is `max(256, floor(extent * render_scale))`; an
    /// `antialiasing` of zero means one sample.
    pub fn for_screen(screen: ScreenSize, render_scale: f32, antialiasing: u32) -> Self {
        Self {
            width: scaled_extent(screen.width, render_scale),
            height: scaled_extent(screen.height, render_scale),
            samples: antialiasing.max(1),
            depth_bits: DEPTH_BITS,
            filter: FilterMode::Bilinear,
            wrap: WrapMode::Clamp,
        }
    }
}

fn scaled_extent(extent: i32, render_scale: f32) -> u32 {
    let scaled = (f64::from(extent) * f64::from(render_scale)).floor();
    if scaled < f64::from(MIN_SURFACE_EXTENT) {
        MIN_SURFACE_EXTENT
    } else {
        scaled.min(f64::from(u32::MAX)) as u32
    }
}

/// GPU backend that owns the actual color and depth storage.
pub trait RenderDevice {
    fn create_surface(&mut self, desc: &SurfaceDesc) -> MirrorResult<SurfaceId>;

    /// Frees the storage immediately. Unknown ids are ignored.
    fn release_surface(&mut self, id: SurfaceId);
}

/// A live surface and the description it was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurface {
    pub id: SurfaceId,
    pub desc: SurfaceDesc,
}

/// Owns the one mirror surface and tracks whether the camera points at it.
#[derive(Debug, Default)]
pub struct RenderRedirector {
    surface: Option<RenderSurface>,
    camera_attached: bool,
}

impl RenderRedirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self) -> Option<&RenderSurface> {
        self.surface.as_ref()
    }

    pub fn is_camera_attached(&self) -> bool {
        self.camera_attached
    }

    /// Allocates a fresh surface, releasing any previous one first.
    pub fn allocate(
        &mut self,
        device: &mut dyn RenderDevice,
        desc: SurfaceDesc,
    ) -> MirrorResult<RenderSurface> {
        if self.surface.is_some() {
            self.release(device);
        }

        let id = device.create_surface(&desc)?;
        let surface = RenderSurface { id, desc };
        self.surface = Some(surface);
        info!(
            surface = id.0,
            width = desc.width,
            height = desc.height,
            samples = desc.samples,
            "mirror surface created"
        );
        Ok(surface)
    }

    /// Releases the surface right away. Safe to call with nothing allocated.
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(surface) = self.surface.take() {
            device.release_surface(surface.id);
            debug!(surface = surface.id.0, "mirror surface released");
        }
    }

    /// Points the camera at the current surface.
    pub fn attach(&mut self, camera: &mut dyn SceneCamera) -> MirrorResult<()> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| MirrorError::Device("no surface to attach the camera to".into()))?;
        camera.set_target(Some(surface.id));
        self.camera_attached = true;
        Ok(())
    }

    /// Sends the camera back to the screen if this redirector had taken it.
    ///
    /// With the camera gone the attachment is simply forgotten.
    pub fn detach(&mut self, camera: Option<&mut dyn SceneCamera>) {
        if !self.camera_attached {
            return;
        }
        if let Some(camera) = camera {
            camera.set_target(None);
        }
        self.camera_attached = false;
    }
}
