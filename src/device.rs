//! Device capability interface and the simulated backends.
//!
//! Backends are reached through `Arc<dyn RgbDevice>` handles. Every mutating
//! call is best-effort: `false` means the backend refused the command.
//!
//! Providers stand in for pluggable vendor SDKs:
//!   DemoProvider → five always-accepting demo peripherals
//!   AuraProvider → simulated ASUS Aura board, limited effect support

use crate::color::Color;
use crate::effect::{self, EffectParams};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One addressable lighting peripheral.
pub trait RgbDevice: Send + Sync {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    /// Free-form category ("Keyboard", "GPU", ...).
    fn device_type(&self) -> &str;
    fn set_color(&self, color: Color) -> bool;
    fn color(&self) -> Color;
    fn set_effect(&self, name: &str, params: &EffectParams) -> bool;
    fn active_effect(&self) -> String;
    fn effect_parameters(&self) -> EffectParams;
    fn is_connected(&self) -> bool;
}

pub type DeviceHandle = Arc<dyn RgbDevice>;

/// Source of devices, initialised once at startup.
pub trait DeviceProvider {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn initialize(&mut self) -> bool;
    fn devices(&self) -> Vec<DeviceHandle>;
}

/// Initialise every provider and collect its devices. Providers that fail to
/// initialise are logged and skipped.
pub fn discover(providers: &mut [Box<dyn DeviceProvider>]) -> Vec<DeviceHandle> {
    let mut found = Vec::new();
    for provider in providers.iter_mut() {
        if !provider.initialize() {
            log::warn!("Provider {} failed to initialise, skipping", provider.name());
            continue;
        }
        let devices = provider.devices();
        log::info!(
            "Provider {} v{}: {} device(s)",
            provider.name(),
            provider.version(),
            devices.len()
        );
        for device in &devices {
            log::info!("Found {} ({})", device.display_name(), device.device_type());
        }
        found.extend(devices);
    }
    found
}

// ── Shared simulated state ──────────────────────────────────────────

#[derive(Debug)]
struct SimState {
    color: Color,
    effect: String,
    params: EffectParams,
    connected: bool,
}

#[derive(Debug)]
struct SimCore {
    id: String,
    name: String,
    kind: String,
    state: Mutex<SimState>,
}

impl SimCore {
    fn new(id: &str, name: &str, kind: &str, color: Color) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            state: Mutex::new(SimState {
                color,
                effect: "Static".to_string(),
                params: EffectParams::new(),
                connected: true,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an accepted effect. A Static effect carrying a color also
    /// updates the stored color.
    fn record_effect(&self, name: &str, params: &EffectParams) {
        let mut state = self.state();
        state.effect = name.to_string();
        state.params = params.clone();
        if name == "Static" {
            if let Some(c) = effect::param_color(params, "color") {
                state.color = c;
            }
        }
    }
}

// ── Demo backend ────────────────────────────────────────────────────

/// Simulated peripheral that accepts every command.
#[derive(Debug)]
pub struct DemoDevice {
    core: SimCore,
}

impl DemoDevice {
    pub fn new(id: &str, name: &str, kind: &str) -> Self {
        Self { core: SimCore::new(id, name, kind, Color::WHITE) }
    }

    pub fn set_connected(&self, connected: bool) {
        self.core.state().connected = connected;
    }
}

impl RgbDevice for DemoDevice {
    fn id(&self) -> &str {
        &self.core.id
    }

    fn display_name(&self) -> &str {
        &self.core.name
    }

    fn device_type(&self) -> &str {
        &self.core.kind
    }

    fn set_color(&self, color: Color) -> bool {
        log::trace!("Demo device {}: color {color}", self.core.name);
        self.core.state().color = color;
        true
    }

    fn color(&self) -> Color {
        self.core.state().color
    }

    fn set_effect(&self, name: &str, params: &EffectParams) -> bool {
        log::debug!("Demo device {}: effect {name}", self.core.name);
        self.core.record_effect(name, params);
        true
    }

    fn active_effect(&self) -> String {
        self.core.state().effect.clone()
    }

    fn effect_parameters(&self) -> EffectParams {
        self.core.state().params.clone()
    }

    fn is_connected(&self) -> bool {
        self.core.state().connected
    }
}

pub struct DemoProvider {
    devices: Vec<Arc<DemoDevice>>,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    /// Concrete handles, for toggling connectivity.
    pub fn demo_devices(&self) -> &[Arc<DemoDevice>] {
        &self.devices
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProvider for DemoProvider {
    fn name(&self) -> &str {
        "Demo RGB Device Provider"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn initialize(&mut self) -> bool {
        self.devices = [
            ("demo_keyboard", "Demo RGB Keyboard", "Keyboard"),
            ("demo_mouse", "Demo RGB Mouse", "Mouse"),
            ("demo_headset", "Demo RGB Headset", "Headset"),
            ("demo_strip", "Demo RGB LED Strip", "LED Strip"),
            ("demo_fan", "Demo RGB Fan", "Fan"),
        ]
        .into_iter()
        .map(|(id, name, kind)| Arc::new(DemoDevice::new(id, name, kind)))
        .collect();
        true
    }

    fn devices(&self) -> Vec<DeviceHandle> {
        self.devices.iter().map(|d| Arc::clone(d) as DeviceHandle).collect()
    }
}

// ── ASUS Aura backend (simulated) ───────────────────────────────────

/// Effects the Aura firmware understands.
pub const AURA_EFFECTS: [&str; 5] = ["Static", "Breathing", "ColorCycle", "Rainbow", "Strobe"];

#[derive(Debug)]
pub struct AuraDevice {
    core: SimCore,
}

impl AuraDevice {
    pub fn new(id: &str, name: &str, kind: &str) -> Self {
        Self { core: SimCore::new(id, name, kind, Color::BLACK) }
    }

    pub fn supported_effects(&self) -> &'static [&'static str] {
        &AURA_EFFECTS
    }

    pub fn set_connected(&self, connected: bool) {
        self.core.state().connected = connected;
    }
}

impl RgbDevice for AuraDevice {
    fn id(&self) -> &str {
        &self.core.id
    }

    fn display_name(&self) -> &str {
        &self.core.name
    }

    fn device_type(&self) -> &str {
        &self.core.kind
    }

    /// A direct color write switches the firmware to its static mode.
    fn set_color(&self, color: Color) -> bool {
        log::trace!("Aura {}: color {color}", self.core.name);
        let mut state = self.core.state();
        state.color = color;
        state.effect = "Static".to_string();
        true
    }

    fn color(&self) -> Color {
        self.core.state().color
    }

    fn set_effect(&self, name: &str, params: &EffectParams) -> bool {
        if !AURA_EFFECTS.contains(&name) {
            log::warn!("Effect {name} is not supported by Aura device {}", self.core.name);
            return false;
        }
        log::debug!("Aura {}: effect {name}", self.core.name);
        self.core.record_effect(name, params);
        true
    }

    fn active_effect(&self) -> String {
        self.core.state().effect.clone()
    }

    fn effect_parameters(&self) -> EffectParams {
        self.core.state().params.clone()
    }

    fn is_connected(&self) -> bool {
        self.core.state().connected
    }
}

pub struct AuraProvider {
    devices: Vec<Arc<AuraDevice>>,
}

impl AuraProvider {
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    pub fn aura_devices(&self) -> &[Arc<AuraDevice>] {
        &self.devices
    }
}

impl Default for AuraProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProvider for AuraProvider {
    fn name(&self) -> &str {
        "ASUS Aura Provider"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn initialize(&mut self) -> bool {
        self.devices = [
            ("asus-mb-1", "ASUS ROG Strix Z690-E Gaming WiFi", "Motherboard"),
            ("asus-gpu-1", "ASUS ROG Strix GeForce RTX 3080", "GPU"),
            ("asus-ram-1", "ASUS ROG Strix RGB DDR5", "RAM"),
            ("asus-kb-1", "ASUS ROG Strix Scope NX", "Keyboard"),
            ("asus-mouse-1", "ASUS ROG Gladius III", "Mouse"),
        ]
        .into_iter()
        .map(|(id, name, kind)| Arc::new(AuraDevice::new(id, name, kind)))
        .collect();
        true
    }

    fn devices(&self) -> Vec<DeviceHandle> {
        self.devices.iter().map(|d| Arc::clone(d) as DeviceHandle).collect()
    }
}
