//! Live horizontal mirroring for an interactive 3D scene.
//!
//! The scene camera renders into an offscreen surface which a screen-space
//! overlay presents with a horizontal UV flip, so lighting and normals are
//! untouched. Pointer reads are remapped into the flipped space unless the
//! pointer is over the host's own UI, and stereo audio has its channels swapped.
//!
//! Everything the core needs from the host application is a trait in
//! [`host`], [`redirect`], [`overlay`] and [`audio`]. [`MirrorController`] is
//! the only entry point that changes state.

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod input;
pub mod logging;
pub mod overlay;
pub mod redirect;
pub mod resolution;
pub mod schedule;

pub use audio::{AudioFilter, AudioListener, AudioRoute, ChannelSwap, ListenerId};
pub use config::MirrorConfig;
pub use controller::{MirrorController, MirrorState, MirrorStatus, MirrorWatch, SetupStage};
pub use error::{MirrorError, MirrorResult, Resource};
pub use host::{Host, RenderPipeline, SceneCamera, ScreenSize};
pub use input::{InputRemapper, PointerButtons, PointerDragLock, PointerPosition, PointerReads, PointerSample};
pub use overlay::{CompositorOverlay, NodeId, OverlayDesc, UiHit, UiLayer, UiRaycaster, UvTransform};
pub use redirect::{RenderDevice, RenderRedirector, RenderSurface, SurfaceDesc, SurfaceId};
pub use resolution::ResolutionWatcher;
pub use schedule::{TaskHandle, TickScheduler};
