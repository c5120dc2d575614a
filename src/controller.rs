//! The mirror mode state machine.
//!
//! `MirrorController` is the only thing that allocates, attaches, composites
//! or routes anything. Every public operation runs on the host's main tick,
//! catches its own failures and leaves the mirror either fully on or fully
//! off.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::audio::AudioRoute;
use crate::error::{MirrorError, MirrorResult, Resource};
use crate::host::{Host, ScreenSize};
use crate::overlay::{CompositorOverlay, NodeId};
use crate::redirect::{RenderRedirector, RenderSurface, SurfaceDesc};
use crate::resolution::ResolutionWatcher;
use crate::schedule::{TaskHandle, TickScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorState {
    #[default]
    Disabled,
    Enabled,
}

/// One step of bringing the mirror up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    AllocateSurface,
    AttachCamera,
    CreateOverlay,
    RetargetOverlay,
    MirrorInput,
    RouteAudio,
}

impl SetupStage {
    /// Stages of a cold enable, in order.
    pub const ENABLE: [SetupStage; 5] = [
        SetupStage::AllocateSurface,
        SetupStage::AttachCamera,
        SetupStage::CreateOverlay,
        SetupStage::MirrorInput,
        SetupStage::RouteAudio,
    ];

    /// Stages after the old surface is detached and released on a resize.
    pub const REBUILD: [SetupStage; 3] = [
        SetupStage::AllocateSurface,
        SetupStage::AttachCamera,
        SetupStage::RetargetOverlay,
    ];
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetupStage::AllocateSurface => "allocate the render surface",
            SetupStage::AttachCamera => "attach the scene camera",
            SetupStage::CreateOverlay => "create the overlay",
            SetupStage::RetargetOverlay => "retarget the overlay",
            SetupStage::MirrorInput => "mirror pointer input",
            SetupStage::RouteAudio => "route audio",
        })
    }
}

/// What pointer interception needs to know about the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorStatus {
    pub mirrored: bool,
    /// The overlay node to leave out of UI hit tests.
    pub overlay: Option<NodeId>,
}

/// Read side of the controller's published [`MirrorStatus`].
///
/// Clones share the same cell; every clone sees each change as soon as the
/// controller makes it.
#[derive(Debug, Clone, Default)]
pub struct MirrorWatch {
    status: Rc<Cell<MirrorStatus>>,
}

impl MirrorWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> MirrorStatus {
        self.status.get()
    }

    pub fn is_mirrored(&self) -> bool {
        self.status.get().mirrored
    }

    pub(crate) fn publish(&self, status: MirrorStatus) {
        self.status.set(status);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Enable,
}

#[derive(Debug, Default)]
pub struct MirrorController {
    state: MirrorState,
    redirector: RenderRedirector,
    overlay: Option<CompositorOverlay>,
    audio: AudioRoute,
    watcher: ResolutionWatcher,
    scheduler: TickScheduler<Deferred>,
    watch: MirrorWatch,
}

impl MirrorController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MirrorState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == MirrorState::Enabled
    }

    pub fn surface(&self) -> Option<&RenderSurface> {
        self.redirector.surface()
    }

    pub fn overlay(&self) -> Option<&CompositorOverlay> {
        self.overlay.as_ref()
    }

    /// Subscription for the pointer interception layer.
    pub fn watch(&self) -> MirrorWatch {
        self.watch.clone()
    }

    pub fn enable(&mut self, host: &mut dyn Host) {
        if self.is_enabled() {
            self.verify(host);
            return;
        }

        if host.main_camera().is_none() {
            let err = MirrorError::ResourceUnavailable(Resource::Camera);
            warn!(%err, "mirror mode not enabled");
            return;
        }

        let size = host.screen();
        match self.run_stages(host, &SetupStage::ENABLE, size) {
            Ok(()) => {
                self.state = MirrorState::Enabled;
                self.watcher.reset(size);
                info!(width = size.width, height = size.height, "mirror mode on");
            }
            Err(err) => {
                log_failure(&err, "mirror mode could not be enabled");
                self.teardown(host);
            }
        }
    }

    pub fn disable(&mut self, host: &mut dyn Host) {
        self.scheduler.cancel_where(|task| *task == Deferred::Enable);

        if !self.is_enabled() && !self.holds_anything() {
            debug!("mirror mode already off");
            return;
        }

        self.teardown(host);
        info!("mirror mode off");
    }

    pub fn toggle(&mut self, host: &mut dyn Host) {
        if self.is_enabled() {
            self.disable(host);
        } else {
            self.enable(host);
        }
    }

    /// Idempotent entry point for settings UI.
    pub fn set_mirror_state(&mut self, host: &mut dyn Host, enabled: bool) {
        if enabled {
            self.enable(host);
        } else {
            self.disable(host);
        }
    }

    /// Rebuilds the surface for a new screen size within the current tick.
    ///
    /// Ignored while disabled. A failure turns the mirror off.
    pub fn handle_resolution_change(&mut self, host: &mut dyn Host, width: i32, height: i32) {
        if !self.is_enabled() {
            debug!(width, height, "resolution change ignored, mirror mode off");
            return;
        }

        let size = ScreenSize::new(width, height);
        match self.rebuild(host, size) {
            Ok(()) => {
                self.watcher.reset(size);
                debug!(width, height, "mirror surface rebuilt");
            }
            Err(err) => {
                log_failure(&err, "mirror rebuild failed, mirror mode off");
                self.teardown(host);
            }
        }
    }

    /// Enables the mirror once `settle_ticks` more ticks have run.
    ///
    /// An explicit [`disable`](Self::disable) before then cancels it.
    pub fn schedule_enable(&mut self, settle_ticks: u32) -> TaskHandle {
        debug!(settle_ticks, "mirror mode enable scheduled");
        self.scheduler.schedule_after(settle_ticks, Deferred::Enable)
    }

    /// Per-frame work: deferred tasks first, then the resize check.
    pub fn tick(&mut self, host: &mut dyn Host) {
        for task in self.scheduler.advance() {
            match task {
                Deferred::Enable => self.enable(host),
            }
        }

        if self.is_enabled() {
            if let Some(size) = self.watcher.observe(host.screen()) {
                self.handle_resolution_change(host, size.width, size.height);
            }
        }
    }

    /// Releases everything before the host goes away.
    pub fn shutdown(&mut self, host: &mut dyn Host) {
        self.disable(host);
    }

    fn rebuild(&mut self, host: &mut dyn Host, size: ScreenSize) -> MirrorResult<()> {
        self.redirector.detach(host.main_camera());
        self.redirector.release(host.device());
        self.run_stages(host, &SetupStage::REBUILD, size)
    }

    fn run_stages(
        &mut self,
        host: &mut dyn Host,
        stages: &[SetupStage],
        size: ScreenSize,
    ) -> MirrorResult<()> {
        for &stage in stages {
            self.run_stage(host, stage, size)
                .map_err(|err| MirrorError::at(stage, err))?;
            debug!(%stage, "mirror setup stage done");
        }
        Ok(())
    }

    fn run_stage(&mut self, host: &mut dyn Host, stage: SetupStage, size: ScreenSize) -> MirrorResult<()> {
        match stage {
            SetupStage::AllocateSurface => {
                let desc = SurfaceDesc::for_screen(size, render_scale(host), host.antialiasing());
                self.redirector.allocate(host.device(), desc)?;
            }
            SetupStage::AttachCamera => {
                let camera = host
                    .main_camera()
                    .ok_or(MirrorError::ResourceUnavailable(Resource::Camera))?;
                self.redirector.attach(camera)?;
            }
            SetupStage::CreateOverlay => {
                let surface = self.current_surface()?;
                self.overlay = Some(CompositorOverlay::create(host.ui(), surface.id)?);
            }
            SetupStage::RetargetOverlay => {
                let surface = self.current_surface()?;
                let overlay = self
                    .overlay
                    .as_mut()
                    .ok_or_else(|| MirrorError::Ui("no overlay to retarget".into()))?;
                overlay.retarget(host.ui(), surface.id)?;
            }
            SetupStage::MirrorInput => {
                self.watch.publish(MirrorStatus {
                    mirrored: true,
                    overlay: self.overlay.as_ref().map(CompositorOverlay::node),
                });
            }
            SetupStage::RouteAudio => self.audio.enable(host.audio_listener()),
        }
        Ok(())
    }

    fn current_surface(&self) -> MirrorResult<RenderSurface> {
        self.redirector
            .surface()
            .copied()
            .ok_or_else(|| MirrorError::Device("mirror surface missing".into()))
    }

    /// Re-entering enable checks the pieces still line up, including where
    /// the host's current main camera actually renders.
    fn verify(&mut self, host: &mut dyn Host) {
        let surface = self.redirector.surface().map(|s| s.id);
        let camera_target = host.main_camera().and_then(|camera| camera.target());
        let consistent = surface.is_some()
            && self.redirector.is_camera_attached()
            && camera_target == surface
            && self.overlay.as_ref().map(CompositorOverlay::surface) == surface;

        if consistent {
            debug!("mirror mode already on");
        } else {
            warn!("mirror mode on but its resources drifted, rebuilding");
            let size = host.screen();
            self.handle_resolution_change(host, size.width, size.height);
        }
    }

    fn holds_anything(&self) -> bool {
        self.redirector.surface().is_some()
            || self.redirector.is_camera_attached()
            || self.overlay.is_some()
            || self.watch.is_mirrored()
            || self.audio.is_enabled()
    }

    /// Undoes whatever exists, in reverse setup order. Never fails.
    fn teardown(&mut self, host: &mut dyn Host) {
        self.redirector.detach(host.main_camera());
        self.redirector.release(host.device());
        if let Some(overlay) = self.overlay.take() {
            overlay.destroy(host.ui());
        }
        self.watch.publish(MirrorStatus::default());
        self.audio.disable();
        self.state = MirrorState::Disabled;
    }
}

impl Drop for MirrorController {
    fn drop(&mut self) {
        if self.holds_anything() {
            warn!("mirror controller dropped without shutdown, host resources left behind");
        }
    }
}

fn render_scale(host: &dyn Host) -> f32 {
    match host.render_pipeline().and_then(|pipeline| pipeline.render_scale()) {
        Some(scale) if scale.is_finite() && scale > 0.0 => scale,
        Some(scale) => {
            let err = MirrorError::CapabilityUnavailable("render scale");
            debug!(%err, scale, "ignoring unusable render scale, using 1.0");
            1.0
        }
        None => 1.0,
    }
}

fn log_failure(err: &MirrorError, message: &str) {
    match std::error::Error::source(err) {
        Some(cause) => error!(error = %err, %cause, "{message}"),
        None => error!(error = %err, "{message}"),
    }
}
