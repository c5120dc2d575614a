//! Pointer position interception.
//!
//! While the mirror is on, a pointer read over the 3D scene is reflected about
//! the vertical centre line so it lands on what the player actually sees. Reads
//! over host UI are left alone because the UI is drawn un-mirrored.
//!
//! The choice is pinned for a whole press-to-release gesture: a drag that
//! starts on a slider keeps raw coordinates even when it wanders over the
//! scene, and a camera drag stays mirrored across UI panels.

use bitflags::bitflags;

use crate::controller::MirrorWatch;
use crate::overlay::{is_overlay_hit, NodeId, UiRaycaster};

bitflags! {
    /// Pointer buttons that take part in drag locking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PointerButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

impl Default for PointerButtons {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl PointerPosition {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Pointer state for one tick, as the host sampled it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub position: PointerPosition,
    /// Buttons held at the end of the tick.
    pub held: PointerButtons,
    /// Buttons that went down during the tick.
    pub pressed: PointerButtons,
    /// Buttons that went up during the tick.
    pub released: PointerButtons,
}

/// Mirror decision pinned at the start of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerDragLock {
    locked: bool,
    mirror: bool,
}

impl PointerDragLock {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The pinned decision, while a gesture is in progress.
    pub fn decision(&self) -> Option<bool> {
        self.locked.then_some(self.mirror)
    }
}

#[derive(Debug)]
pub struct InputRemapper {
    watch: MirrorWatch,
    lock: PointerDragLock,
}

impl InputRemapper {
    pub fn new(watch: MirrorWatch) -> Self {
        Self {
            watch,
            lock: PointerDragLock::default(),
        }
    }

    pub fn drag_lock(&self) -> PointerDragLock {
        self.lock
    }

    /// Updates the drag lock from this tick's button edges and returns the
    /// view through which the tick's pointer reads go.
    ///
    /// Reads borrow the remapper, so none can happen before the lock is
    /// current.
    pub fn begin_tick<'a>(
        &'a mut self,
        sample: &PointerSample,
        ui: &'a dyn UiRaycaster,
        screen_width: f32,
    ) -> PointerReads<'a> {
        let overlay = self.watch.status().overlay;

        if !sample.pressed.is_empty() {
            self.lock = PointerDragLock {
                locked: true,
                mirror: !over_ui(ui, sample.position, overlay),
            };
        }
        if !sample.released.is_empty() && sample.held.is_empty() {
            self.lock.locked = false;
        }

        PointerReads {
            remapper: self,
            ui,
            screen_width,
        }
    }
}

/// Pointer reads for the current tick.
pub struct PointerReads<'a> {
    remapper: &'a InputRemapper,
    ui: &'a dyn UiRaycaster,
    screen_width: f32,
}

impl PointerReads<'_> {
    /// The position the rest of the application should see for `raw`.
    pub fn position(&self, raw: PointerPosition) -> PointerPosition {
        if self.remapper.watch.is_mirrored() && self.should_mirror(raw) {
            PointerPosition::new(self.screen_width - raw.x, raw.y, raw.z)
        } else {
            raw
        }
    }

    /// Whether `raw` would be mirrored, were the mirror on.
    pub fn should_mirror(&self, raw: PointerPosition) -> bool {
        match self.remapper.lock.decision() {
            Some(mirror) => mirror,
            None => {
                let overlay = self.remapper.watch.status().overlay;
                !over_ui(self.ui, raw, overlay)
            }
        }
    }
}

fn over_ui(ui: &dyn UiRaycaster, at: PointerPosition, overlay: Option<NodeId>) -> bool {
    ui.raycast_all(at.x, at.y)
        .iter()
        .any(|hit| !overlay.is_some_and(|overlay| is_overlay_hit(hit, overlay)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::MirrorStatus;
    use crate::overlay::UiHit;

    /// One UI panel covering x < 100, plus a full-screen overlay node.
    struct Panel;

    const PANEL: NodeId = NodeId(1);
    const OVERLAY: NodeId = NodeId(2);

    impl UiRaycaster for Panel {
        fn raycast_all(&self, x: f32, _y: f32) -> Vec<UiHit> {
            let mut hits = Vec::new();
            if x < 100.0 {
                hits.push(UiHit { node: PANEL, root: PANEL });
            }
            hits.push(UiHit { node: OVERLAY, root: OVERLAY });
            hits
        }
    }

    fn mirrored_watch() -> MirrorWatch {
        let watch = MirrorWatch::new();
        watch.publish(MirrorStatus {
            mirrored: true,
            overlay: Some(OVERLAY),
        });
        watch
    }

    fn idle(x: f32) -> PointerSample {
        PointerSample {
            position: PointerPosition::new(x, 50.0, 0.0),
            ..Default::default()
        }
    }

    fn press(x: f32) -> PointerSample {
        PointerSample {
            position: PointerPosition::new(x, 50.0, 0.0),
            held: PointerButtons::LEFT,
            pressed: PointerButtons::LEFT,
            ..Default::default()
        }
    }

    fn hold(x: f32, held: PointerButtons) -> PointerSample {
        PointerSample {
            position: PointerPosition::new(x, 50.0, 0.0),
            held,
            ..Default::default()
        }
    }

    #[test]
    fn disabled_reads_are_raw() {
        let mut remapper = InputRemapper::new(MirrorWatch::new());
        let raw = PointerPosition::new(500.0, 20.0, 3.0);
        let reads = remapper.begin_tick(&idle(500.0), &Panel, 1920.0);
        assert_eq!(reads.position(raw), raw);
    }

    #[test]
    fn scene_reads_mirror_x_only() {
        let mut remapper = InputRemapper::new(mirrored_watch());
        let raw = PointerPosition::new(500.0, 20.0, 3.0);
        let reads = remapper.begin_tick(&idle(500.0), &Panel, 1920.0);
        assert_eq!(reads.position(raw), PointerPosition::new(1420.0, 20.0, 3.0));
    }

    #[test]
    fn ui_reads_stay_raw() {
        let mut remapper = InputRemapper::new(mirrored_watch());
        let raw = PointerPosition::new(40.0, 20.0, 0.0);
        let reads = remapper.begin_tick(&idle(40.0), &Panel, 1920.0);
        assert_eq!(reads.position(raw), raw);
    }

    #[test]
    fn overlay_alone_does_not_count_as_ui() {
        let mut remapper = InputRemapper::new(mirrored_watch());
        let reads = remapper.begin_tick(&idle(800.0), &Panel, 1920.0);
        assert!(reads.should_mirror(PointerPosition::new(800.0, 0.0, 0.0)));
    }

    #[test]
    fn press_over_ui_stays_raw_for_the_whole_drag() {
        let mut remapper = InputRemapper::new(mirrored_watch());

        remapper.begin_tick(&press(40.0), &Panel, 1920.0);
        assert_eq!(remapper.drag_lock().decision(), Some(false));

        let over_scene = PointerPosition::new(900.0, 50.0, 0.0);
        let reads = remapper.begin_tick(&hold(900.0, PointerButtons::LEFT), &Panel, 1920.0);
        assert_eq!(reads.position(over_scene), over_scene);
    }

    #[test]
    fn release_reopens_the_decision() {
        let mut remapper = InputRemapper::new(mirrored_watch());
        remapper.begin_tick(&press(40.0), &Panel, 1920.0);

        let release = PointerSample {
            position: PointerPosition::new(900.0, 50.0, 0.0),
            released: PointerButtons::LEFT,
            ..Default::default()
        };
        remapper.begin_tick(&release, &Panel, 1920.0);
        assert!(!remapper.drag_lock().is_locked());

        let reads = remapper.begin_tick(&press(900.0), &Panel, 1920.0);
        assert_eq!(
            reads.position(PointerPosition::new(900.0, 50.0, 0.0)),
            PointerPosition::new(1020.0, 50.0, 0.0)
        );
    }

    #[test]
    fn lock_survives_until_every_button_is_up() {
        let mut remapper = InputRemapper::new(mirrored_watch());
        remapper.begin_tick(&press(900.0), &Panel, 1920.0);

        let second_button = PointerSample {
            position: PointerPosition::new(900.0, 50.0, 0.0),
            held: PointerButtons::LEFT | PointerButtons::RIGHT,
            pressed: PointerButtons::RIGHT,
            ..Default::default()
        };
        remapper.begin_tick(&second_button, &Panel, 1920.0);

        let left_up = PointerSample {
            position: PointerPosition::new(40.0, 50.0, 0.0),
            held: PointerButtons::RIGHT,
            released: PointerButtons::LEFT,
            ..Default::default()
        };
        let reads = remapper.begin_tick(&left_up, &Panel, 1920.0);
        assert!(reads.should_mirror(PointerPosition::new(40.0, 50.0, 0.0)));
        assert!(remapper.drag_lock().is_locked());
    }

    #[test]
    fn a_click_within_one_tick_does_not_leave_a_lock() {
        let mut remapper = InputRemapper::new(mirrored_watch());
        let click = PointerSample {
            position: PointerPosition::new(40.0, 50.0, 0.0),
            pressed: PointerButtons::LEFT,
            released: PointerButtons::LEFT,
            ..Default::default()
        };
        remapper.begin_tick(&click, &Panel, 1920.0);
        assert!(!remapper.drag_lock().is_locked());
    }
}
