//! The boundary between the mirroring core and the application hosting it.

use crate::audio::AudioListener;
use crate::overlay::UiLayer;
use crate::redirect::{RenderDevice, SurfaceId};

/// Current drawable size of the host window, in pixels.
///
/// Signed on purpose: some platforms report zero or negative sizes while a
/// window is minimised, and callers must be able to see that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Both axes are strictly positive.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// The camera that renders the 3D scene.
pub trait SceneCamera {
    /// Redirect output into `target`, or back to the screen with `None`.
    fn set_target(&mut self, target: Option<SurfaceId>);

    fn target(&self) -> Option<SurfaceId>;
}

/// The host's active rendering pipeline.
///
/// Pipelines that render at a reduced internal resolution expose it through
/// [`RenderPipeline::render_scale`]; the rest keep the default.
pub trait RenderPipeline {
    fn render_scale(&self) -> Option<f32> {
        None
    }
}

/// Everything the controller looks up from the host on the main tick.
pub trait Host {
    fn screen(&self) -> ScreenSize;

    /// Host MSAA sample count; zero when the host has none configured.
    fn antialiasing(&self) -> u32;

    fn render_pipeline(&self) -> Option<&dyn RenderPipeline>;

    /// The camera tagged as the main scene camera, if one exists right now.
    fn main_camera(&mut self) -> Option<&mut dyn SceneCamera>;

    fn audio_listener(&mut self) -> Option<&mut dyn AudioListener>;

    fn device(&mut self) -> &mut dyn RenderDevice;

    fn ui(&mut self) -> &mut dyn UiLayer;
}
