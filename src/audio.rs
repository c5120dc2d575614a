//! Stereo channel swap on the active audio listener.
//!
//! [`ChannelSwap::process`] runs on the host's real-time audio thread. It only
//! reads an atomic flag and swaps samples in the buffer it is handed, so it
//! never allocates and never blocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{MirrorError, MirrorResult, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A per-callback filter on interleaved `f32` samples.
pub trait AudioFilter: Send + Sync {
    fn process(&self, data: &mut [f32], channels: usize);
}

/// The object that receives the mixed output of the scene.
pub trait AudioListener {
    fn id(&self) -> ListenerId;

    /// Inserts `filter` into the listener's output chain.
    fn attach_filter(&mut self, filter: Arc<dyn AudioFilter>) -> MirrorResult<()>;
}

/// Swaps left and right of every stereo frame while enabled.
#[derive(Debug, Default)]
pub struct ChannelSwap {
    enabled: AtomicBool,
}

impl ChannelSwap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl AudioFilter for ChannelSwap {
    fn process(&self, data: &mut [f32], channels: usize) {
        if self.is_enabled() {
            swap_stereo(data, channels);
        }
    }
}

/// `[L0, R0, L1, R1, ..]` becomes `[R0, L0, R1, L1, ..]`.
///
/// Anything but two channels passes through, as does a trailing half frame.
pub fn swap_stereo(data: &mut [f32], channels: usize) {
    if channels != 2 {
        return;
    }
    for frame in data.chunks_exact_mut(2) {
        frame.swap(0, 1);
    }
}

/// The swap filter currently installed on a listener.
#[derive(Debug, Default)]
pub struct AudioRoute {
    installed: Option<(ListenerId, Arc<ChannelSwap>)>,
}

impl AudioRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.installed
            .as_ref()
            .is_some_and(|(_, swap)| swap.is_enabled())
    }

    /// Installs the filter on `listener` if needed and turns it on.
    ///
    /// A missing or uncooperative listener only costs the audio half of the
    /// mirror, so both are logged and swallowed here.
    pub fn enable(&mut self, listener: Option<&mut dyn AudioListener>) {
        let Some(listener) = listener else {
            let err = MirrorError::ResourceUnavailable(Resource::AudioListener);
            warn!(%err, "skipping audio channel swap");
            return;
        };

        let id = listener.id();
        let reusable = self
            .installed
            .as_ref()
            .filter(|(installed_on, _)| *installed_on == id)
            .map(|(_, swap)| Arc::clone(swap));

        let swap = match reusable {
            Some(swap) => swap,
            None => {
                let swap = Arc::new(ChannelSwap::new());
                if let Err(err) = listener.attach_filter(Arc::clone(&swap) as Arc<dyn AudioFilter>) {
                    error!(%err, listener = id.0, "could not attach audio channel swap");
                    return;
                }
                // A filter left on an old listener dies with it.
                self.installed = Some((id, Arc::clone(&swap)));
                swap
            }
        };

        swap.set_enabled(true);
        info!(listener = id.0, "audio channels swapped");
    }

    pub fn disable(&mut self) {
        if let Some((id, swap)) = &self.installed {
            if swap.is_enabled() {
                swap.set_enabled(false);
                info!(listener = id.0, "audio channels restored");
            }
        }
    }
}
