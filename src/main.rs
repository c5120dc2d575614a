mod app;
mod render;
#[cfg(feature = "audio")]
mod sound;
mod wayland;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::ffi::c_void;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use scene_mirror::{logging, InputRemapper, MirrorConfig, MirrorController, PointerButtons, ScreenSize};

use app::{DemoHost, Widget};
use render::{EglContext, HostWindow, Painter};
use wayland::WaylandConnection;

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);
static TOGGLE_REQUESTED: AtomicBool = AtomicBool::new(false);

fn get_pid_file_path() -> PathBuf {
    // XDG_RUNTIME_DIR is per-user with proper permissions
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(dir).join("scene-mirror.pid");
    }
    if let Ok(dir) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(dir).join("scene-mirror.pid");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/scene-mirror.pid");
    }
    PathBuf::from("/tmp/scene-mirror.pid")
}

#[derive(Parser)]
#[command(name = "scene-mirror")]
#[command(about = "Live horizontal mirroring of a 3D scene, its pointer input and its audio")]
struct Cli {
    /// Output to open the window on (e.g., eDP-1, DP-7); the first one if omitted
    output: Option<String>,

    /// List available outputs and exit
    #[arg(short, long)]
    list: bool,

    /// MSAA sample count for the scene (0 = off)
    #[arg(long, default_value_t = 0)]
    msaa: u32,

    /// Internal scene resolution relative to the window (e.g., 0.5)
    #[arg(long)]
    render_scale: Option<f32>,

    /// Config file (default: $XDG_CONFIG_HOME/scene-mirror/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Turn mirroring on once the window has settled
    #[arg(long)]
    enable_on_start: bool,

    /// Frames to wait before the start-up enable
    #[arg(long)]
    settle_ticks: Option<u32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Toggle mirroring in the running instance
    #[arg(long)]
    toggle: bool,

    /// Stop the running instance
    #[arg(long)]
    stop: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<MirrorConfig> {
        let path = self.config.clone().unwrap_or_else(MirrorConfig::default_path);
        let mut config = MirrorConfig::load(&path)?;
        if self.enable_on_start {
            config.enable_on_start = true;
        }
        if let Some(ticks) = self.settle_ticks {
            config.settle_ticks = ticks;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn write_pid_file() -> Result<()> {
    let pid_file = get_pid_file_path();
    let mut file = fs::File::create(&pid_file)
        .with_context(|| format!("Failed to create {}", pid_file.display()))?;
    writeln!(file, "{}", process::id())?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(get_pid_file_path());
}

fn is_scene_mirror_process(pid: Pid) -> bool {
    // /proc/<pid>/comm guards against a recycled PID
    fs::read_to_string(format!("/proc/{pid}/comm"))
        .map(|comm| comm.trim() == "scene-mirror")
        .unwrap_or(false)
}

/// PID of a live instance. A stale PID file is removed.
fn running_instance() -> Option<Pid> {
    let pid_str = fs::read_to_string(get_pid_file_path()).ok()?;
    let pid = pid_str.trim().parse().ok().map(Pid::from_raw);
    match pid {
        Some(pid) if is_scene_mirror_process(pid) && signal::kill(pid, None).is_ok() => Some(pid),
        _ => {
            remove_pid_file();
            None
        }
    }
}

fn signal_running_instance(sig: Signal) -> Result<()> {
    let Some(pid) = running_instance() else {
        bail!("No running scene-mirror instance found");
    };
    signal::kill(pid, sig).with_context(|| format!("Failed to signal PID {pid}"))?;
    println!("Sent {sig} to scene-mirror (PID {pid})");
    Ok(())
}

extern "C" fn on_toggle(_: libc::c_int) {
    TOGGLE_REQUESTED.store(true, Ordering::SeqCst);
}

extern "C" fn on_terminate(_: libc::c_int) {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() -> Result<()> {
    let toggle = SigAction::new(SigHandler::Handler(on_toggle), SaFlags::SA_RESTART, SigSet::empty());
    let terminate = SigAction::new(SigHandler::Handler(on_terminate), SaFlags::SA_RESTART, SigSet::empty());
    // Handlers only store to atomics
    unsafe {
        signal::sigaction(Signal::SIGUSR1, &toggle).context("Failed to install SIGUSR1 handler")?;
        signal::sigaction(Signal::SIGTERM, &terminate).context("Failed to install SIGTERM handler")?;
    }
    ctrlc::set_handler(|| STOP_REQUESTED.store(true, Ordering::SeqCst))
        .context("Error setting Ctrl+C handler")?;
    Ok(())
}

/// Everything that lives on the GL context, dropped before the window.
struct Session {
    host: DemoHost,
    painter: Painter,
    controller: MirrorController,
    remapper: InputRemapper,
}

impl Session {
    fn new(window: &HostWindow, cli: &Cli, config: &MirrorConfig) -> Result<Self> {
        let screen = ScreenSize::new(window.width as i32, window.height as i32);
        let host = DemoHost::new(screen, cli.msaa, cli.render_scale);
        let painter = Painter::new()?;
        let mut controller = MirrorController::new();
        let remapper = InputRemapper::new(controller.watch());

        if config.enable_on_start {
            controller.schedule_enable(config.settle_ticks);
        }

        Ok(Self {
            host,
            painter,
            controller,
            remapper,
        })
    }

    fn frame(&mut self, conn: &mut WaylandConnection, egl_ctx: &EglContext, window: &mut HostWindow) -> Result<()> {
        if window.resize_if_needed() {
            self.host.resize(window.width, window.height);
        }

        if TOGGLE_REQUESTED.swap(false, Ordering::SeqCst) {
            info!("toggle requested");
            self.controller.toggle(&mut self.host);
        }
        self.controller.tick(&mut self.host);

        let sample = conn.state.pointer.take_sample();
        let screen = self.host.screen;
        let reads = self.remapper.begin_tick(&sample, &self.host.ui, screen.width as f32);
        let seen = reads.position(sample.position);

        let raw = sample.position;
        if sample.pressed.contains(PointerButtons::LEFT)
            && self.host.ui.widget_at(raw.x, raw.y) == Some(Widget::MirrorButton)
        {
            self.controller.toggle(&mut self.host);
        }

        let marker = screen
            .is_drawable()
            .then(|| (seen.x / screen.width as f32, seen.y / screen.height as f32));
        self.host
            .draw_frame(&mut self.painter, marker, self.controller.is_enabled());

        egl_ctx.swap_buffers(window.egl_window_surface)?;
        conn.roundtrip()?;
        Ok(())
    }

    fn run(mut self, conn: &mut WaylandConnection, egl_ctx: &EglContext, window: &mut HostWindow) -> Result<()> {
        let mut result = Ok(());
        while !STOP_REQUESTED.load(Ordering::SeqCst) && !window.is_closed() {
            result = self.frame(conn, egl_ctx, window);
            if result.is_err() {
                break;
            }
        }
        self.controller.shutdown(&mut self.host);
        result
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    logging::init(&config.log_level)?;

    if cli.stop {
        return signal_running_instance(Signal::SIGTERM);
    }
    if cli.toggle {
        return signal_running_instance(Signal::SIGUSR1);
    }

    if let Some(pid) = running_instance() {
        bail!("scene-mirror is already running (PID {pid}). Use --toggle or --stop.");
    }

    let mut conn = WaylandConnection::connect()?;

    if cli.list {
        println!("Available outputs:");
        for output in conn.state.outputs.iter() {
            println!(
                "  {} - {} ({}x{})",
                output.name, output.description, output.width, output.height
            );
        }
        return Ok(());
    }

    let display = conn
        .state
        .outputs
        .pick(cli.output.as_deref())
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Output not found. Use --list to see available outputs."))?;
    let (output_name, output_width, output_height) = (&display.name, display.width, display.height);
    info!(output = %output_name, width = output_width, height = output_height, "opening window");

    install_signal_handlers()?;

    let wayland_display = conn.connection.backend().display_ptr() as *mut c_void;
    let egl_ctx = EglContext::new(wayland_display)?;

    let mut window = {
        let compositor = conn
            .state
            .compositor
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("wl_compositor not available"))?;
        let layer_shell = conn
            .state
            .layer_shell
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("zwlr_layer_shell_v1 not available"))?;
        let qh = conn.queue_handle();
        HostWindow::new(
            compositor,
            layer_shell,
            &display.wl_output,
            &egl_ctx,
            &qh,
            display.width.max(1) as u32,
            display.height.max(1) as u32,
        )?
    };

    while !window.is_configured() {
        conn.roundtrip()?;
    }
    window.resize_if_needed();

    egl_ctx.make_current(window.egl_window_surface)?;
    egl_ctx.load_gl();
    if let Err(e) = egl_ctx.set_vsync(true) {
        warn!("{e:#}");
    }

    write_pid_file()?;
    info!("running; toggle with --toggle, stop with Ctrl+C or --stop");

    let result = Session::new(&window, &cli, &config)
        .and_then(|session| session.run(&mut conn, &egl_ctx, &mut window));

    info!("shutting down");
    if let Err(e) = egl_ctx.destroy_surface(window.egl_window_surface) {
        warn!("{e:#}");
    }
    drop(window);
    // Flush destroy requests to the compositor
    let _ = conn.roundtrip();
    remove_pid_file();

    result
}
