use anyhow::{Context, Result};
use khronos_egl as egl;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use wayland_client::{
    protocol::{wl_compositor, wl_output, wl_surface},
    Connection, Dispatch, Proxy, QueueHandle,
};
use wayland_egl::WlEglSurface;
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1::{self, ZwlrLayerShellV1},
    zwlr_layer_surface_v1::{self, ZwlrLayerSurfaceV1},
};

use crate::render::EglContext;
use crate::wayland::WaylandState;

/// Layer surface state written by configure events.
#[derive(Default)]
pub struct LayerConfig {
    configured: AtomicBool,
    closed: AtomicBool,
    width: AtomicU32,
    height: AtomicU32,
}

impl LayerConfig {
    fn pending_size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::Acquire),
            self.height.load(Ordering::Acquire),
        )
    }
}

/// Full-output window the demo scene is presented in.
pub struct HostWindow {
    pub wl_surface: wl_surface::WlSurface,
    pub layer_surface: ZwlrLayerSurfaceV1,
    pub egl_surface: WlEglSurface,
    pub egl_window_surface: egl::Surface,
    pub width: u32,
    pub height: u32,
    config: Arc<LayerConfig>,
}

impl HostWindow {
    pub fn new(
        compositor: &wl_compositor::WlCompositor,
        layer_shell: &ZwlrLayerShellV1,
        output: &wl_output::WlOutput,
        egl_ctx: &EglContext,
        qh: &QueueHandle<WaylandState>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let config = Arc::new(LayerConfig::default());
        config.width.store(width, Ordering::Release);
        config.height.store(height, Ordering::Release);

        let wl_surface = compositor.create_surface(qh, ());

        let layer_surface = layer_shell.get_layer_surface(
            &wl_surface,
            Some(output),
            zwlr_layer_shell_v1::Layer::Top,
            "scene-mirror".to_string(),
            qh,
            config.clone(),
        );

        layer_surface.set_anchor(
            zwlr_layer_surface_v1::Anchor::Top
                | zwlr_layer_surface_v1::Anchor::Bottom
                | zwlr_layer_surface_v1::Anchor::Left
                | zwlr_layer_surface_v1::Anchor::Right,
        );
        layer_surface.set_exclusive_zone(-1);
        // Pointer only; the toggle arrives as SIGUSR1
        layer_surface
            .set_keyboard_interactivity(zwlr_layer_surface_v1::KeyboardInteractivity::None);

        wl_surface.commit();

        let egl_surface = WlEglSurface::new(wl_surface.id(), width.max(1) as i32, height.max(1) as i32)
            .context("Failed to create WlEglSurface")?;

        let egl_window_surface =
            egl_ctx.create_window_surface(egl_surface.ptr() as egl::NativeWindowType)?;

        Ok(Self {
            wl_surface,
            layer_surface,
            egl_surface,
            egl_window_surface,
            width,
            height,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.configured.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.config.closed.load(Ordering::Acquire)
    }

    /// Applies the last configured size. Returns whether it changed.
    pub fn resize_if_needed(&mut self) -> bool {
        let (width, height) = self.config.pending_size();
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        if width > 0 && height > 0 {
            self.egl_surface.resize(width as i32, height as i32, 0, 0);
        }
        true
    }
}

impl Dispatch<ZwlrLayerSurfaceV1, Arc<LayerConfig>> for WaylandState {
    fn event(
        _state: &mut Self,
        surface: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        data: &Arc<LayerConfig>,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                surface.ack_configure(serial);
                // Zero means "your choice"; the anchors already fill the output
                if width > 0 && height > 0 {
                    data.width.store(width, Ordering::Release);
                    data.height.store(height, Ordering::Release);
                }
                data.configured.store(true, Ordering::Release);
            }
            zwlr_layer_surface_v1::Event::Closed => {
                tracing::info!("compositor closed the window");
                data.closed.store(true, Ordering::Release);
            }
            _ => {}
        }
    }
}

impl Drop for HostWindow {
    fn drop(&mut self) {
        self.layer_surface.destroy();
        self.wl_surface.destroy();
    }
}
