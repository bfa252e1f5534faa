//! Main application module: builds the shared state, starts the vision,
//! display and button threads, and serves HTTP on the calling thread.

use crate::capture::{self, CaptureBackend};
use crate::classifier;
use crate::config::Config;
use crate::display::button::{button_channel, ButtonSender, GpioButton};
use crate::display::preview::PreviewDisplay;
use crate::display::{DisplayArbiter, DisplayMode, SharedDisplay};
use crate::face_lock::FaceLockTracker;
use crate::heart_meter::{HeartMeter, SharedMeter};
use crate::pipeline::VisionPipeline;
use crate::server::{self, AppState};
use crate::smoother::MajoritySmoother;
use crate::status::SharedStatus;
use crate::{Error, Result};
use log::{error, info, warn};
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Mood meter application
pub struct MoodApp {
    config: Config,
    stop: Arc<AtomicBool>,
    status: SharedStatus,
    display: SharedDisplay,
    meter: SharedMeter,
}

impl MoodApp {
    /// Create the application and its shared state
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        info!("Initializing mood meter");

        let meter = Arc::new(Mutex::new(HeartMeter::new(config.meter.settings(), Instant::now())));
        let display = SharedDisplay::new(DisplayMode::Progress, config.display.text_limit);

        Ok(Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
            status: SharedStatus::new(),
            display,
            meter,
        })
    }

    /// Flag that stops every loop once raised
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Exit immediately on SIGINT/SIGTERM after raising the stop flag
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already installed.
    pub fn install_signal_handler(&self) -> Result<()> {
        let stop = self.stop_flag();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal...");
            stop.store(true, Ordering::SeqCst);
            std::process::exit(0);
        })
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
    }

    /// Start all workers and serve HTTP until the server stops
    ///
    /// # Errors
    ///
    /// Returns an error if the preview directory, a worker thread, the async
    /// runtime or the HTTP listener cannot be set up.
    pub fn run(self) -> Result<()> {
        let (buttons, button_events) = button_channel();
        let mut workers = Vec::new();

        let preview = PreviewDisplay::new(
            self.config.display.panel_width,
            self.config.display.panel_height,
            &self.config.display.assets_dir,
            &self.config.display.runtime_dir,
        )?;
        let mut arbiter = DisplayArbiter::new(self.display.clone(), Box::new(preview), button_events);
        arbiter.splash(&boot_message(&self.config, self.display.mode()));

        let refresh = self.config.display.refresh_interval();
        let stop = self.stop_flag();
        workers.push(spawn("display", move || arbiter.run(refresh, &stop))?);

        if let Some(worker) = self.spawn_button(buttons.clone())? {
            workers.push(worker);
        }
        workers.push(self.spawn_vision()?);

        let addr = SocketAddr::new(bind_address(&self.config.server.bind), self.config.server.port);
        let state = AppState {
            status: self.status.clone(),
            display: self.display.clone(),
            meter: Arc::clone(&self.meter),
            buttons,
        };

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        let served = runtime.block_on(server::serve(addr, state));

        info!("Application shutting down");
        self.stop.store(true, Ordering::SeqCst);
        for worker in workers {
            if worker.join().is_err() {
                warn!("A worker thread panicked");
            }
        }

        served?;
        Ok(())
    }

    fn spawn_button(&self, sender: ButtonSender) -> Result<Option<JoinHandle<()>>> {
        let Some(path) = &self.config.button.gpio_value_path else {
            info!("No GPIO button configured");
            return Ok(None);
        };

        let button = match GpioButton::new(path, Duration::from_millis(self.config.button.debounce_ms), sender) {
            Ok(button) => button.with_poll_interval(Duration::from_millis(self.config.button.poll_ms)),
            Err(e) => {
                warn!("GPIO button disabled: {e}");
                return Ok(None);
            }
        };

        let stop = self.stop_flag();
        Ok(Some(spawn("button", move || button.run(&stop))?))
    }

    fn spawn_vision(&self) -> Result<JoinHandle<()>> {
        let config = self.config.clone();
        let meter = Arc::clone(&self.meter);
        let status = self.status.clone();
        let stop = self.stop_flag();

        spawn("vision", move || {
            let CaptureBackend {
                mut source,
                detector,
                tracker_factory,
            } = match capture::open_backend(&config.camera, &config.tracker) {
                Ok(backend) => backend,
                Err(e) => {
                    error!("Vision disabled, presence stays false: {e}");
                    return;
                }
            };

            let face_lock = FaceLockTracker::with_lost_limit(detector, tracker_factory, config.tracker.lost_limit);
            let now = Instant::now();
            let pipeline = VisionPipeline::new(
                face_lock,
                classifier::select(&config.classifier),
                meter,
                MajoritySmoother::with_window(config.smoother.window(), now),
                status,
            )
            .with_analyze_every(config.camera.analyze_every_n)
            .with_min_crop_side(config.camera.min_crop_side);

            pipeline.run(source.as_mut(), &stop);
        })
    }
}

fn spawn<F>(name: &str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    Ok(thread::Builder::new().name(name.to_string()).spawn(body)?)
}

fn bind_address(bind: &str) -> IpAddr {
    bind.parse().unwrap_or_else(|_| {
        warn!("Invalid bind address {bind:?}, using 0.0.0.0");
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    })
}

/// Address other devices on the LAN can reach us at
///
/// Connecting a UDP socket sends nothing; it only selects the outbound interface.
#[must_use]
pub fn lan_ip() -> IpAddr {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |addr| addr.ip())
}

/// Text shown on the panel while the workers start
#[must_use]
pub fn boot_message(config: &Config, mode: DisplayMode) -> String {
    format!(
        "Starting…\n{}:{}\nmode: {mode}",
        lan_ip(),
        config.server.port
    )
}
