use anyhow::{Context, Result};
use wayland_client::{
    delegate_noop,
    protocol::{wl_compositor, wl_output, wl_registry, wl_seat, wl_surface},
    Connection, Dispatch, EventQueue, QueueHandle,
};
use wayland_protocols::xdg::xdg_output::zv1::client::zxdg_output_manager_v1;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1;

use super::outputs::OutputRegistry;
use super::pointer::PointerTracker;

/// Globals bound from the registry plus everything event handlers update.
pub struct WaylandState {
    pub compositor: Option<wl_compositor::WlCompositor>,
    pub layer_shell: Option<zwlr_layer_shell_v1::ZwlrLayerShellV1>,
    pub xdg_output_manager: Option<zxdg_output_manager_v1::ZxdgOutputManagerV1>,
    pub seat: Option<wl_seat::WlSeat>,
    pub outputs: OutputRegistry,
    pub pointer: PointerTracker,
}

impl WaylandState {
    fn new() -> Self {
        Self {
            compositor: None,
            layer_shell: None,
            xdg_output_manager: None,
            seat: None,
            outputs: OutputRegistry::default(),
            pointer: PointerTracker::default(),
        }
    }
}

pub struct WaylandConnection {
    pub connection: Connection,
    pub state: WaylandState,
    pub queue: EventQueue<WaylandState>,
}

impl WaylandConnection {
    pub fn connect() -> Result<Self> {
        let connection = Connection::connect_to_env()
            .context("Failed to connect to Wayland display")?;

        let mut state = WaylandState::new();
        let mut queue = connection.new_event_queue();
        let qh = queue.handle();

        connection.display().get_registry(&qh, ());

        // Globals first, then the output and seat events they trigger
        queue.roundtrip(&mut state)?;
        state.outputs.request_xdg_names(state.xdg_output_manager.as_ref(), &qh);
        queue.roundtrip(&mut state)?;

        Ok(Self {
            connection,
            state,
            queue,
        })
    }

    pub fn roundtrip(&mut self) -> Result<()> {
        self.queue.roundtrip(&mut self.state)?;
        Ok(())
    }

    pub fn queue_handle(&self) -> QueueHandle<WaylandState> {
        self.queue.handle()
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global { name, interface, version } => match interface.as_str() {
                "wl_compositor" => {
                    state.compositor = Some(registry.bind(name, version.min(5), qh, ()));
                }
                "zwlr_layer_shell_v1" => {
                    state.layer_shell = Some(registry.bind(name, version.min(4), qh, ()));
                }
                "zxdg_output_manager_v1" => {
                    state.xdg_output_manager = Some(registry.bind(name, version.min(3), qh, ()));
                }
                "wl_seat" if state.seat.is_none() => {
                    state.seat = Some(registry.bind(name, version.min(7), qh, ()));
                }
                "wl_output" => {
                    let output: wl_output::WlOutput = registry.bind(name, version.min(4), qh, name);
                    state.outputs.add(name, output);
                }
                _ => {}
            },
            wl_registry::Event::GlobalRemove { name } => {
                state.outputs.remove(name);
            }
            _ => {}
        }
    }
}

delegate_noop!(WaylandState: wl_compositor::WlCompositor);
delegate_noop!(WaylandState: zwlr_layer_shell_v1::ZwlrLayerShellV1);
delegate_noop!(WaylandState: zxdg_output_manager_v1::ZxdgOutputManagerV1);
delegate_noop!(WaylandState: ignore wl_surface::WlSurface);
