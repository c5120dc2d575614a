//! The demo application the mirror is hosted in.

use std::collections::HashMap;

use scene_mirror::{
    AudioListener, Host, MirrorError, MirrorResult, NodeId, OverlayDesc, RenderDevice,
    RenderPipeline, SceneCamera, ScreenSize, SurfaceId, UiHit, UiLayer, UiRaycaster,
};

use crate::render::scene::{Painter, Rect, Rgba};
use crate::render::GlDevice;
#[cfg(feature = "audio")]
use crate::sound::ToneListener;

const TOOLBAR_HEIGHT: f32 = 48.0;
const TOOLBAR_WIDTH: f32 = 360.0;
const BUTTON: Rect = Rect::new(12.0, 8.0, 120.0, 32.0);

const TOOLBAR_COLOR: Rgba = [0.12, 0.12, 0.14, 0.95];
const BUTTON_OFF: Rgba = [0.4, 0.4, 0.42, 1.0];
const BUTTON_ON: Rgba = [0.2, 0.7, 0.35, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Toolbar,
    MirrorButton,
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    node: NodeId,
    root: NodeId,
    rect: Rect,
    widget: Widget,
}

/// A toolbar with one button, plus whatever overlays the mirror asks for.
#[derive(Debug)]
pub struct DemoUi {
    next: u64,
    panels: Vec<Panel>,
    overlays: HashMap<NodeId, OverlayDesc>,
}

impl DemoUi {
    pub fn new(screen: ScreenSize) -> Self {
        let mut ui = Self {
            next: 0,
            panels: Vec::new(),
            overlays: HashMap::new(),
        };
        let toolbar = ui.allocate();
        let button = ui.allocate();
        ui.panels = vec![
            Panel {
                node: toolbar,
                root: toolbar,
                rect: Rect::new(0.0, 0.0, TOOLBAR_WIDTH, TOOLBAR_HEIGHT),
                widget: Widget::Toolbar,
            },
            Panel {
                node: button,
                root: toolbar,
                rect: BUTTON,
                widget: Widget::MirrorButton,
            },
        ];
        ui.layout(screen);
        ui
    }

    fn allocate(&mut self) -> NodeId {
        self.next += 1;
        NodeId(self.next)
    }

    /// The toolbar never grows past the window.
    pub fn layout(&mut self, screen: ScreenSize) {
        let width = (screen.width.max(0) as f32).min(TOOLBAR_WIDTH);
        for panel in &mut self.panels {
            if panel.widget == Widget::Toolbar {
                panel.rect.w = width;
            }
        }
    }

    /// Front-most widget under `(x, y)`.
    pub fn widget_at(&self, x: f32, y: f32) -> Option<Widget> {
        self.panels
            .iter()
            .rev()
            .find(|panel| panel.rect.contains(x, y))
            .map(|panel| panel.widget)
    }

    /// The overlay to composite, lowest sort order first.
    pub fn overlay(&self) -> Option<&OverlayDesc> {
        self.overlays.values().min_by_key(|desc| desc.sort_order)
    }

    pub fn panels(&self, mirrored: bool) -> impl Iterator<Item = (Rect, Rgba)> + '_ {
        self.panels.iter().map(move |panel| {
            let color = match panel.widget {
                Widget::Toolbar => TOOLBAR_COLOR,
                Widget::MirrorButton if mirrored => BUTTON_ON,
                Widget::MirrorButton => BUTTON_OFF,
            };
            (panel.rect, color)
        })
    }
}

impl UiLayer for DemoUi {
    fn create_overlay(&mut self, desc: &OverlayDesc) -> MirrorResult<NodeId> {
        if !self.overlays.is_empty() {
            return Err(MirrorError::Ui("only one overlay is supported".into()));
        }
        let node = self.allocate();
        self.overlays.insert(node, desc.clone());
        Ok(node)
    }

    fn set_overlay_surface(&mut self, node: NodeId, surface: SurfaceId) -> MirrorResult<()> {
        let desc = self
            .overlays
            .get_mut(&node)
            .ok_or_else(|| MirrorError::Ui(format!("no overlay node {}", node.0)))?;
        desc.surface = surface;
        Ok(())
    }

    fn destroy_overlay(&mut self, node: NodeId) {
        self.overlays.remove(&node);
    }
}

impl UiRaycaster for DemoUi {
    fn raycast_all(&self, x: f32, y: f32) -> Vec<UiHit> {
        let mut hits: Vec<UiHit> = self
            .panels
            .iter()
            .rev()
            .filter(|panel| panel.rect.contains(x, y))
            .map(|panel| UiHit {
                node: panel.node,
                root: panel.root,
            })
            .collect();
        // Overlays sit beneath every panel
        hits.extend(
            self.overlays
                .iter()
                .filter(|(_, desc)| desc.raycast_target)
                .map(|(node, _)| UiHit {
                    node: *node,
                    root: *node,
                }),
        );
        hits
    }
}

#[derive(Debug, Default)]
pub struct DemoCamera {
    target: Option<SurfaceId>,
}

impl SceneCamera for DemoCamera {
    fn set_target(&mut self, target: Option<SurfaceId>) {
        self.target = target;
    }

    fn target(&self) -> Option<SurfaceId> {
        self.target
    }
}

/// Internal resolution setting, as `--render-scale` gave it.
#[derive(Debug, Clone, Copy)]
pub struct ScaledPipeline {
    pub scale: Option<f32>,
}

impl RenderPipeline for ScaledPipeline {
    fn render_scale(&self) -> Option<f32> {
        self.scale
    }
}

pub struct DemoHost {
    pub screen: ScreenSize,
    pub antialiasing: u32,
    pub pipeline: ScaledPipeline,
    pub camera: DemoCamera,
    pub device: GlDevice,
    pub ui: DemoUi,
    #[cfg(feature = "audio")]
    pub listener: Option<ToneListener>,
}

impl DemoHost {
    /// Creates the GL device, so the context must be current.
    pub fn new(screen: ScreenSize, antialiasing: u32, render_scale: Option<f32>) -> Self {
        Self {
            screen,
            antialiasing,
            pipeline: ScaledPipeline {
                scale: render_scale,
            },
            camera: DemoCamera::default(),
            device: GlDevice::new(),
            ui: DemoUi::new(screen),
            #[cfg(feature = "audio")]
            listener: match ToneListener::new() {
                Ok(listener) => Some(listener),
                Err(e) => {
                    tracing::warn!("No test tone: {e:#}");
                    None
                }
            },
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen = ScreenSize::new(width as i32, height as i32);
        self.ui.layout(self.screen);
    }

    /// Scene into the camera target, overlay, then UI straight to the window.
    ///
    /// `marker` is the pointer as the scene reads it, as a fraction of the
    /// window.
    pub fn draw_frame(&self, painter: &mut Painter, marker: Option<(f32, f32)>, mirrored: bool) {
        let window = (self.screen.width.max(0) as u32, self.screen.height.max(0) as u32);
        let redirected = self
            .camera
            .target()
            .and_then(|id| self.device.draw_target(id).map(|target| (id, target)));

        match redirected {
            Some((id, (fbo, width, height))) => {
                painter.begin(fbo, width, height);
                painter.draw_scene(marker);
                self.device.resolve(id);

                painter.begin(0, window.0, window.1);
                let overlay = self
                    .ui
                    .overlay()
                    .and_then(|desc| self.device.texture(desc.surface).map(|tex| (tex, desc.uv)));
                if let Some((texture, uv)) = overlay {
                    painter.composite(texture, uv);
                }
            }
            None => {
                painter.begin(0, window.0, window.1);
                painter.draw_scene(marker);
            }
        }

        painter.draw_panels(self.ui.panels(mirrored));
    }
}

impl Host for DemoHost {
    fn screen(&self) -> ScreenSize {
        self.screen
    }

    fn antialiasing(&self) -> u32 {
        self.antialiasing
    }

    fn render_pipeline(&self) -> Option<&dyn RenderPipeline> {
        Some(&self.pipeline)
    }

    fn main_camera(&mut self) -> Option<&mut dyn SceneCamera> {
        Some(&mut self.camera)
    }

    #[cfg(feature = "audio")]
    fn audio_listener(&mut self) -> Option<&mut dyn AudioListener> {
        self.listener
            .as_mut()
            .map(|listener| listener as &mut dyn AudioListener)
    }

    #[cfg(not(feature = "audio"))]
    fn audio_listener(&mut self) -> Option<&mut dyn AudioListener> {
        None
    }

    fn device(&mut self) -> &mut dyn RenderDevice {
        &mut self.device
    }

    fn ui(&mut self) -> &mut dyn UiLayer {
        &mut self.ui
    }
}
