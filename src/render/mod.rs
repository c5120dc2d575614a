pub mod device;
pub mod egl;
pub mod scene;
pub mod surface;

pub use device::GlDevice;
pub use egl::EglContext;
pub use scene::Painter;
pub use surface::HostWindow;
