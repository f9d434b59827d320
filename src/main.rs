use clap::Parser;
use luminctl::config::Config;
use luminctl::device::{self, AuraProvider, DemoProvider, DeviceProvider};
use luminctl::events::{self, Event, Outcome};
use luminctl::sensor::{SensorMonitor, SensorSource, SimulatedSensors, SystemSensors, Walk};
use luminctl::{Coordinator, ProfileError, ProfileStore};

use std::time::Instant;
use tokio::time::Duration;

/// Drives RGB peripherals with effects, temperature linking and profiles.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Profile to load at startup instead of the default one.
    #[clap(long)]
    profile: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("luminctl v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let cfg = Config::load();
    log::info!("Profiles dir: {}", cfg.profiles_dir.display());

    let (sink, mut event_rx) = events::channel();
    let mut coordinator =
        Coordinator::new(sink.clone()).with_strict_effect_names(cfg.strict_effect_names);

    let mut providers: Vec<Box<dyn DeviceProvider>> = Vec::new();
    if cfg.devices.demo {
        providers.push(Box::new(DemoProvider::new()));
    }
    if cfg.devices.aura {
        providers.push(Box::new(AuraProvider::new()));
    }
    for handle in device::discover(&mut providers) {
        coordinator.register_device(handle);
    }
    if coordinator.devices().is_empty() {
        log::warn!("No devices found. Enable a backend under [devices] in the config.");
    }

    let source: Box<dyn SensorSource> = if cfg.sensors.simulate_only {
        Box::new(SimulatedSensors::new(Walk::from_clock()))
    } else {
        Box::new(SystemSensors::new(Walk::from_clock()))
    };
    let mut sensors = SensorMonitor::new(source);

    // First sample before linking so the initial broadcast has real values
    let (sample, _) = sensors.poll();
    coordinator.update_temperatures(sample.cpu_temperature, sample.gpu_temperature);
    if cfg.temperature_linking {
        coordinator.set_temperature_linking(true);
    }

    let store = ProfileStore::new(&cfg.profiles_dir, &cfg.default_profile_file, sink);
    let startup = match &args.profile {
        Some(name) => store.load(&mut coordinator, name),
        None => store.load_default(&mut coordinator),
    };
    // Other failures are reported through the event channel
    if let Err(ProfileError::NoDefault) = startup {
        log::info!("No default profile set");
    }
    log_events(&mut event_rx);

    let mut effect_ticker = tokio::time::interval(Duration::from_millis(cfg.tick_ms.max(1)));
    let mut sensor_ticker =
        tokio::time::interval(Duration::from_millis(cfg.sensor_interval_ms.max(1)));
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = effect_ticker.tick() => {
                let now = Instant::now();
                coordinator.advance(now - last_tick);
                last_tick = now;
            }
            _ = sensor_ticker.tick() => {
                let (sample, changes) = sensors.poll();
                if changes.cpu_temperature || changes.gpu_temperature {
                    log::debug!(
                        "CPU {}°C ({}%), GPU {}°C ({}%)",
                        sample.cpu_temperature,
                        sample.cpu_usage,
                        sample.gpu_temperature,
                        sample.gpu_usage
                    );
                }
                coordinator.update_temperatures(sample.cpu_temperature, sample.gpu_temperature);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::error!("Failed to listen for shutdown signal: {e}");
                }
                log::info!("Shutting down");
                break;
            }
        }
        log_events(&mut event_rx);
    }
}

fn log_events(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Event>) {
    for event in events::drain(rx) {
        match event {
            // Per-tick color pushes are too chatty for info
            Event::ColorChanged { device_id, color } => log::trace!("{device_id} → {color}"),
            Event::EffectChanged { device_id, effect } => {
                log::info!("{device_id}: effect {effect}")
            }
            Event::ActionResult { outcome: Outcome::Success, message } => log::debug!("{message}"),
            Event::ActionResult { message, .. } => log::warn!("{message}"),
            Event::TemperatureLinkingChanged(on) => {
                log::info!("Temperature linking {}", if on { "on" } else { "off" })
            }
            Event::ProfileLoaded(name) => log::info!("Profile '{name}' active"),
            Event::ProfileSaved(name) => log::info!("Profile '{name}' saved"),
            Event::ProfileDeleted(name) => log::info!("Profile '{name}' deleted"),
            Event::ProfileFailed(message) => log::error!("{message}"),
        }
    }
}
