use anyhow::Result;
use clap::Parser;
use proton_mail_tray::config;
use proton_mail_tray::monitor::SubprocessMonitor;
use proton_mail_tray::paths;
use proton_mail_tray::process::{ProcessController, SystemProcessTable};
use proton_mail_tray::tray::{TrayEvent, TrayManager};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tao::event::Event;
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the event loop wakes up to drain tray events.
const TRAY_POLL: Duration = Duration::from_millis(100);
/// Watcher polling interval for external-exit detection.
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(
    name = "proton-mail-tray",
    about = "Tray icon that toggles Proton Mail Beta on and off",
    version
)]
struct Cli {
    /// Manually specify the path to the Proton Mail Beta executable
    #[arg(long, value_name = "PATH")]
    proton_mail_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = config::default_config_path()?;

    let mut controller = ProcessController::with_system_table();

    // Watch for Proton Mail terminating outside our control.
    let monitor = SubprocessMonitor::new(controller.tracked_slot(), WATCH_INTERVAL);
    let mut monitor_handle = Some(monitor.start()?);

    // The event loop must exist before the tray icon on Linux.
    let event_loop = EventLoopBuilder::new().build();
    let tray = TrayManager::new()?;

    info!("Proton Mail Tray started");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + TRAY_POLL);

        if let Event::NewEvents(_) = event {
            while let Some(tray_event) = tray.poll_events() {
                match tray_event {
                    TrayEvent::Toggle => {
                        toggle(&mut controller, cli.proton_mail_path.as_deref(), &config_path)
                    }
                    TrayEvent::Quit => {
                        info!("quit requested");
                        if let Some(handle) = monitor_handle.take() {
                            handle.stop();
                        }
                        // Quitting the tray also closes the managed process;
                        // a no-op when it is not running.
                        controller.close();
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
        }
    });
}

/// One tray activation: close Proton Mail if it is running, open it otherwise.
fn toggle(
    controller: &mut ProcessController<SystemProcessTable>,
    explicit: Option<&Path>,
    config_path: &Path,
) {
    if let Some(pid) = controller.running_pid() {
        info!(pid, "Proton Mail is running, closing it");
        controller.close();
        return;
    }

    let Some(path) = paths::resolve(explicit, config_path) else {
        warn!("could not locate the Proton Mail Beta executable");
        return;
    };

    match controller.launch(&path) {
        Ok(pid) => info!(pid, "Proton Mail opened successfully"),
        Err(e) => error!(error = %e, "failed to open Proton Mail"),
    }
}
