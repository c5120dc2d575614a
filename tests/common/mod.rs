#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use scene_mirror::{
    AudioFilter, AudioListener, Host, ListenerId, MirrorError, MirrorResult, NodeId, OverlayDesc,
    RenderDevice, RenderPipeline, SceneCamera, ScreenSize, SurfaceDesc, SurfaceId, UiHit, UiLayer,
    UiRaycaster,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

#[derive(Default)]
pub struct MockDevice {
    next: u64,
    pub live: HashMap<SurfaceId, SurfaceDesc>,
    pub created: Vec<SurfaceDesc>,
    pub released: Vec<SurfaceId>,
    /// Fail every allocation after this many more have succeeded.
    pub fail_after: Option<usize>,
}

impl RenderDevice for MockDevice {
    fn create_surface(&mut self, desc: &SurfaceDesc) -> MirrorResult<SurfaceId> {
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                return Err(MirrorError::Device("out of video memory".into()));
            }
            *remaining -= 1;
        }
        self.next += 1;
        let id = SurfaceId(self.next);
        self.live.insert(id, *desc);
        self.created.push(*desc);
        Ok(id)
    }

    fn release_surface(&mut self, id: SurfaceId) {
        assert!(self.live.remove(&id).is_some(), "double release of {id:?}");
        self.released.push(id);
    }
}

#[derive(Default)]
pub struct MockCamera {
    target: Option<SurfaceId>,
}

impl SceneCamera for MockCamera {
    fn set_target(&mut self, target: Option<SurfaceId>) {
        self.target = target;
    }

    fn target(&self) -> Option<SurfaceId> {
        self.target
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

#[derive(Default)]
pub struct MockUi {
    next: u64,
    pub overlays: HashMap<NodeId, OverlayDesc>,
    pub panels: Vec<(NodeId, Rect)>,
    pub fail_create: bool,
    pub fail_retarget: bool,
}

impl MockUi {
    pub fn add_panel(&mut self, rect: Rect) -> NodeId {
        self.next += 1;
        let node = NodeId(1000 + self.next);
        self.panels.push((node, rect));
        node
    }
}

impl UiLayer for MockUi {
    fn create_overlay(&mut self, desc: &OverlayDesc) -> MirrorResult<NodeId> {
        if self.fail_create {
            return Err(MirrorError::Ui("canvas limit reached".into()));
        }
        self.next += 1;
        let node = NodeId(self.next);
        self.overlays.insert(node, desc.clone());
        Ok(node)
    }

    fn set_overlay_surface(&mut self, node: NodeId, surface: SurfaceId) -> MirrorResult<()> {
        if self.fail_retarget {
            return Err(MirrorError::Ui("overlay is gone".into()));
        }
        let desc = self
            .overlays
            .get_mut(&node)
            .ok_or_else(|| MirrorError::Ui(format!("unknown node {node:?}")))?;
        desc.surface = surface;
        Ok(())
    }

    fn destroy_overlay(&mut self, node: NodeId) {
        assert!(self.overlays.remove(&node).is_some(), "double destroy of {node:?}");
    }
}

impl UiRaycaster for MockUi {
    /// Reports overlays too, whatever their raycast flag, so the remapper's
    /// own filtering is what keeps them out.
    fn raycast_all(&self, x: f32, y: f32) -> Vec<UiHit> {
        let mut hits: Vec<UiHit> = self
            .panels
            .iter()
            .filter(|(_, rect)| rect.contains(x, y))
            .map(|(node, _)| UiHit { node: *node, root: *node })
            .collect();
        hits.extend(self.overlays.keys().map(|node| UiHit { node: *node, root: *node }));
        hits
    }
}

pub struct MockListener {
    pub id: ListenerId,
    pub filters: Vec<Arc<dyn AudioFilter>>,
}

impl MockListener {
    pub fn new(id: u64) -> Self {
        Self {
            id: ListenerId(id),
            filters: Vec::new(),
        }
    }

    pub fn render(&self, data: &mut [f32], channels: usize) {
        for filter in &self.filters {
            filter.process(data, channels);
        }
    }
}

impl AudioListener for MockListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn attach_filter(&mut self, filter: Arc<dyn AudioFilter>) -> MirrorResult<()> {
        self.filters.push(filter);
        Ok(())
    }
}

pub struct MockPipeline {
    pub scale: Option<f32>,
}

impl RenderPipeline for MockPipeline {
    fn render_scale(&self) -> Option<f32> {
        self.scale
    }
}

pub struct MockHost {
    pub screen: ScreenSize,
    pub antialiasing: u32,
    pub pipeline: Option<MockPipeline>,
    pub camera: Option<MockCamera>,
    pub listener: Option<MockListener>,
    pub device: MockDevice,
    pub ui: MockUi,
}

impl MockHost {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            screen: ScreenSize::new(width, height),
            antialiasing: 0,
            pipeline: None,
            camera: Some(MockCamera::default()),
            listener: Some(MockListener::new(1)),
            device: MockDevice::default(),
            ui: MockUi::default(),
        }
    }

    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.pipeline = Some(MockPipeline { scale: Some(scale) });
        self
    }

    pub fn camera_target(&self) -> Option<SurfaceId> {
        self.camera.as_ref().and_then(|camera| camera.target())
    }
}

impl Host for MockHost {
    fn screen(&self) -> ScreenSize {
        self.screen
    }

    fn antialiasing(&self) -> u32 {
        self.antialiasing
    }

    fn render_pipeline(&self) -> Option<&dyn RenderPipeline> {
        self.pipeline.as_ref().map(|p| p as &dyn RenderPipeline)
    }

    fn main_camera(&mut self) -> Option<&mut dyn SceneCamera> {
        self.camera.as_mut().map(|c| c as &mut dyn SceneCamera)
    }

    fn audio_listener(&mut self) -> Option<&mut dyn AudioListener> {
        self.listener.as_mut().map(|l| l as &mut dyn AudioListener)
    }

    fn device(&mut self) -> &mut dyn RenderDevice {
        &mut self.device
    }

    fn ui(&mut self) -> &mut dyn UiLayer {
        &mut self.ui
    }
}

/// Counts warnings and errors emitted while it is the active subscriber.
#[derive(Clone, Default)]
pub struct LogCounter {
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl LogCounter {
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for LogCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::WARN {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        } else if level == Level::ERROR {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` with a [`LogCounter`] installed on this thread.
pub fn count_logs<R>(f: impl FnOnce() -> R) -> (R, LogCounter) {
    let counter = LogCounter::default();
    let subscriber = Registry::default().with(counter.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, counter)
}
