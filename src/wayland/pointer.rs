use scene_mirror::{PointerButtons, PointerPosition, PointerSample};
use wayland_client::{
    protocol::{wl_pointer, wl_seat},
    Connection, Dispatch, QueueHandle, WEnum,
};

use super::connection::WaylandState;

// linux/input-event-codes.h
const BTN_LEFT: u32 = 0x110;
const BTN_RIGHT: u32 = 0x111;
const BTN_MIDDLE: u32 = 0x112;

/// Accumulates `wl_pointer` events between ticks.
#[derive(Default)]
pub struct PointerTracker {
    pointer: Option<wl_pointer::WlPointer>,
    x: f32,
    y: f32,
    held: PointerButtons,
    pressed: PointerButtons,
    released: PointerButtons,
}

impl PointerTracker {
    /// Returns this tick's sample and clears the edge sets.
    pub fn take_sample(&mut self) -> PointerSample {
        PointerSample {
            position: PointerPosition::new(self.x, self.y, 0.0),
            held: self.held,
            pressed: std::mem::take(&mut self.pressed),
            released: std::mem::take(&mut self.released),
        }
    }

    fn button(&mut self, code: u32, state: wl_pointer::ButtonState) {
        let button = match code {
            BTN_LEFT => PointerButtons::LEFT,
            BTN_RIGHT => PointerButtons::RIGHT,
            BTN_MIDDLE => PointerButtons::MIDDLE,
            _ => return,
        };
        match state {
            wl_pointer::ButtonState::Pressed => {
                self.held |= button;
                self.pressed |= button;
            }
            wl_pointer::ButtonState::Released => {
                self.held.remove(button);
                self.released |= button;
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_seat::WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(caps),
        } = event
        {
            let has_pointer = caps.contains(wl_seat::Capability::Pointer);
            if has_pointer && state.pointer.pointer.is_none() {
                state.pointer.pointer = Some(seat.get_pointer(qh, ()));
            } else if !has_pointer {
                if let Some(pointer) = state.pointer.pointer.take() {
                    pointer.release();
                }
            }
        }
    }
}

impl Dispatch<wl_pointer::WlPointer, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _pointer: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let tracker = &mut state.pointer;
        match event {
            wl_pointer::Event::Enter {
                surface_x, surface_y, ..
            }
            | wl_pointer::Event::Motion {
                surface_x, surface_y, ..
            } => {
                tracker.x = surface_x as f32;
                tracker.y = surface_y as f32;
            }
            wl_pointer::Event::Leave { .. } => {
                // Buttons held when the pointer leaves never report a release.
                tracker.released |= tracker.held;
                tracker.held = PointerButtons::empty();
            }
            wl_pointer::Event::Button {
                button,
                state: WEnum::Value(button_state),
                ..
            } => tracker.button(button, button_state),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_clears_edges_but_keeps_held() {
        let mut tracker = PointerTracker::default();
        tracker.button(BTN_LEFT, wl_pointer::ButtonState::Pressed);

        let first = tracker.take_sample();
        assert_eq!(first.pressed, PointerButtons::LEFT);
        assert_eq!(first.held, PointerButtons::LEFT);

        let second = tracker.take_sample();
        assert!(second.pressed.is_empty());
        assert_eq!(second.held, PointerButtons::LEFT);
    }

    #[test]
    fn release_drops_the_held_bit() {
        let mut tracker = PointerTracker::default();
        tracker.button(BTN_RIGHT, wl_pointer::ButtonState::Pressed);
        tracker.button(BTN_RIGHT, wl_pointer::ButtonState::Released);

        let sample = tracker.take_sample();
        assert_eq!(sample.pressed, PointerButtons::RIGHT);
        assert_eq!(sample.released, PointerButtons::RIGHT);
        assert!(sample.held.is_empty());
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut tracker = PointerTracker::default();
        tracker.button(0x113, wl_pointer::ButtonState::Pressed);
        assert_eq!(tracker.take_sample(), PointerSample::default());
    }
}
