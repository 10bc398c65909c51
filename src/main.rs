use color_eyre::{eyre::eyre, Result};
use padstate::{AxisId, GamepadHandle, GamepadSettings, GamepadSnapshot, WorkerStatus};
use std::time::Duration;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let mut settings = GamepadSettings::load_or_default();
    if let Some(path) = std::env::args_os().nth(1) {
        settings.device_path = path.into();
    }

    info!("Opening gamepad at {}", settings.device_path.display());
    let handle = GamepadHandle::open(Some(settings))
        .map_err(|e| eyre!("Failed to open gamepad: {}", e))?;

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut last_summary = String::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary = summarize(&handle.snapshot());
                if summary != last_summary {
                    info!("{}", summary);
                    last_summary = summary;
                }

                if handle.status() == WorkerStatus::Disconnected {
                    warn!("Gamepad disconnected, last known state: {}", last_summary);
                    break;
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    // Joining the worker blocks, keep it off the runtime threads
    let reason = tokio::task::spawn_blocking(move || handle.stop()).await??;
    debug!("Poll worker exited: {:?}", reason);
    Ok(())
}

fn summarize(snapshot: &GamepadSnapshot) -> String {
    let pressed: Vec<&str> = snapshot.pressed().map(|button| button.name()).collect();
    format!(
        "L:({:.2},{:.2}) R:({:.2},{:.2}) LT:{:.2} RT:{:.2} Buttons:[{}]",
        snapshot.axis(AxisId::LeftStickX),
        snapshot.axis(AxisId::LeftStickY),
        snapshot.axis(AxisId::RightStickX),
        snapshot.axis(AxisId::RightStickY),
        snapshot.axis(AxisId::LeftTrigger),
        snapshot.axis(AxisId::RightTrigger),
        pressed.join(" ")
    )
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
