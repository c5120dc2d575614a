//! Per-tick screen size sampling.

use tracing::{debug, info};

use crate::host::ScreenSize;

/// Remembers the last drawable screen size and reports changes to it.
#[derive(Debug, Default)]
pub struct ResolutionWatcher {
    last: Option<ScreenSize>,
}

impl ResolutionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes `size` as the baseline without reporting a change.
    pub fn reset(&mut self, size: ScreenSize) {
        self.last = size.is_drawable().then_some(size);
    }

    pub fn last(&self) -> Option<ScreenSize> {
        self.last
    }

    /// Returns the new size when it differs from the last one seen.
    ///
    /// A zero or negative size (a minimised window) is not a resize: it is
    /// skipped without touching the baseline, so the check repeats next tick.
    pub fn observe(&mut self, current: ScreenSize) -> Option<ScreenSize> {
        if !current.is_drawable() {
            debug!(
                width = current.width,
                height = current.height,
                "screen not drawable, rebuild deferred"
            );
            return None;
        }

        match self.last {
            Some(last) if last == current => None,
            previous => {
                self.last = Some(current);
                if let Some(previous) = previous {
                    info!(
                        from_width = previous.width,
                        from_height = previous.height,
                        to_width = current.width,
                        to_height = current.height,
                        "screen resized"
                    );
                }
                Some(current)
            }
        }
    }
}
