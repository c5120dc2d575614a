use wayland_client::{protocol::wl_output, Connection, Dispatch, QueueHandle, WEnum};
use wayland_protocols::xdg::xdg_output::zv1::client::{zxdg_output_manager_v1, zxdg_output_v1};

use super::connection::WaylandState;

/// A monitor the host window can be placed on.
#[derive(Debug, Clone)]
pub struct Display {
    pub name: String,        // e.g. "DP-1"
    pub description: String, // e.g. "Dell U2720Q"
    pub width: i32,
    pub height: i32,
    pub wl_output: wl_output::WlOutput,
}

/// Outputs keyed by their registry name.
#[derive(Default)]
pub struct OutputRegistry {
    displays: Vec<(u32, Display)>,
}

impl OutputRegistry {
    pub fn add(&mut self, global: u32, wl_output: wl_output::WlOutput) {
        self.displays.push((
            global,
            Display {
                name: String::new(),
                description: String::new(),
                width: 0,
                height: 0,
                wl_output,
            },
        ));
    }

    pub fn remove(&mut self, global: u32) {
        self.displays.retain(|(g, _)| *g != global);
    }

    pub fn find(&self, name: &str) -> Option<&Display> {
        self.iter().find(|d| d.name == name)
    }

    /// The named display, or the first one the compositor announced.
    pub fn pick(&self, name: Option<&str>) -> Option<&Display> {
        match name {
            Some(name) => self.find(name),
            None => self.iter().next(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Display> {
        self.displays.iter().map(|(_, d)| d)
    }

    fn get_mut(&mut self, global: u32) -> Option<&mut Display> {
        self.displays
            .iter_mut()
            .find(|(g, _)| *g == global)
            .map(|(_, d)| d)
    }

    /// wl_output before v4 has no name event; xdg_output fills the gap.
    pub fn request_xdg_names(
        &self,
        manager: Option<&zxdg_output_manager_v1::ZxdgOutputManagerV1>,
        qh: &QueueHandle<WaylandState>,
    ) {
        let Some(manager) = manager else { return };
        for (global, display) in &self.displays {
            manager.get_xdg_output(&display.wl_output, qh, *global);
        }
    }
}

impl Dispatch<wl_output::WlOutput, u32> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &wl_output::WlOutput,
        event: wl_output::Event,
        global: &u32,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(display) = state.outputs.get_mut(*global) else { return };
        match event {
            wl_output::Event::Mode {
                flags: WEnum::Value(flags),
                width,
                height,
                ..
            } if flags.contains(wl_output::Mode::Current) => {
                display.width = width;
                display.height = height;
            }
            wl_output::Event::Name { name } => display.name = name,
            wl_output::Event::Description { description } => display.description = description,
            _ => {}
        }
    }
}

impl Dispatch<zxdg_output_v1::ZxdgOutputV1, u32> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &zxdg_output_v1::ZxdgOutputV1,
        event: zxdg_output_v1::Event,
        global: &u32,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let Some(display) = state.outputs.get_mut(*global) else { return };
        if let zxdg_output_v1::Event::Name { name } = event {
            if display.name.is_empty() {
                display.name = name;
            }
        }
    }
}
