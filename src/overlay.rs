//! Screen-space layer that shows the mirror surface with a horizontal flip.

use tracing::debug;

use crate::error::MirrorResult;
use crate::redirect::SurfaceId;

/// Sort order of the overlay: beneath every interactive UI layer.
pub const OVERLAY_SORT_ORDER: i32 = -100;

pub const OVERLAY_LABEL: &str = "mirror-display";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// `uv' = uv * scale + offset`, applied per axis when sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl UvTransform {
    pub const IDENTITY: UvTransform = UvTransform {
        scale: [1.0, 1.0],
        offset: [0.0, 0.0],
    };

    /// Mirrors U; V is untouched.
    pub const FLIP_HORIZONTAL: UvTransform = UvTransform {
        scale: [-1.0, 1.0],
        offset: [1.0, 0.0],
    };

    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        [
            uv[0] * self.scale[0] + self.offset[0],
            uv[1] * self.scale[1] + self.offset[1],
        ]
    }
}

/// How the host should build the overlay node.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDesc {
    pub label: &'static str,
    pub surface: SurfaceId,
    pub uv: UvTransform,
    pub sort_order: i32,
    /// Stretch to cover the whole screen.
    pub full_screen: bool,
    pub raycast_target: bool,
}

impl OverlayDesc {
    pub fn mirrored(surface: SurfaceId) -> Self {
        Self {
            label: OVERLAY_LABEL,
            surface,
            uv: UvTransform::FLIP_HORIZONTAL,
            sort_order: OVERLAY_SORT_ORDER,
            full_screen: true,
            raycast_target: false,
        }
    }
}

/// Host-side management of screen-space nodes.
pub trait UiLayer {
    fn create_overlay(&mut self, desc: &OverlayDesc) -> MirrorResult<NodeId>;

    /// Repoints an existing overlay at another surface.
    fn set_overlay_surface(&mut self, node: NodeId, surface: SurfaceId) -> MirrorResult<()>;

    fn destroy_overlay(&mut self, node: NodeId);
}

/// One element under the pointer, with the root layer it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiHit {
    pub node: NodeId,
    pub root: NodeId,
}

/// Host UI hit testing.
pub trait UiRaycaster {
    /// Every UI element under `(x, y)`, front-most first.
    fn raycast_all(&self, x: f32, y: f32) -> Vec<UiHit>;
}

/// The live overlay node and the surface it currently samples.
#[derive(Debug)]
pub struct CompositorOverlay {
    node: NodeId,
    surface: SurfaceId,
}

impl CompositorOverlay {
    pub fn create(ui: &mut dyn UiLayer, surface: SurfaceId) -> MirrorResult<Self> {
        let desc = OverlayDesc::mirrored(surface);
        let node = ui.create_overlay(&desc)?;
        debug!(node = node.0, surface = surface.0, "mirror overlay created");
        Ok(Self { node, surface })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn retarget(&mut self, ui: &mut dyn UiLayer, surface: SurfaceId) -> MirrorResult<()> {
        ui.set_overlay_surface(self.node, surface)?;
        self.surface = surface;
        Ok(())
    }

    pub fn destroy(self, ui: &mut dyn UiLayer) {
        ui.destroy_overlay(self.node);
        debug!(node = self.node.0, "mirror overlay destroyed");
    }
}

/// A hit on the overlay itself, or on anything parented to it, is not UI.
pub fn is_overlay_hit(hit: &UiHit, overlay: NodeId) -> bool {
    hit.node == overlay || hit.root == overlay
}
