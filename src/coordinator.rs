//! Device registry and per-device effect ownership.
//!
//! The coordinator is the only writer of device colors and effects. At most
//! one effect exists per device id; replacing it runs
//!   stop old → create new → wire listener → start new → inform backend
//! so the old effect can never publish after the switch.
//!
//! Temperature linking is a full override: while enabled every sample turns
//! into a Static color broadcast to all devices.

use crate::color::{self, Color};
use crate::device::DeviceHandle;
use crate::effect::{self, Effect, EffectKind, EffectParams};
use crate::error::ControlError;
use crate::events::{Event, EventSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct Coordinator {
    devices: Vec<DeviceHandle>,
    effects: HashMap<String, Effect>,
    temperature_linking: bool,
    cpu_temperature: i32,
    gpu_temperature: i32,
    strict_effect_names: bool,
    events: EventSink,
}

impl Coordinator {
    pub fn new(events: EventSink) -> Self {
        Self {
            devices: Vec::new(),
            effects: HashMap::new(),
            temperature_linking: false,
            cpu_temperature: 0,
            gpu_temperature: 0,
            strict_effect_names: false,
            events,
        }
    }

    /// Reject unknown effect names instead of falling back to Static.
    pub fn with_strict_effect_names(mut self, strict: bool) -> Self {
        self.strict_effect_names = strict;
        self
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    // ── Registry ────────────────────────────────────────────────────

    /// Append a device. Returns false if the id is already registered.
    pub fn register_device(&mut self, device: DeviceHandle) -> bool {
        if self.devices.iter().any(|d| d.id() == device.id()) {
            log::debug!("Device {} already registered", device.id());
            return false;
        }
        log::info!("Registered {} ({})", device.display_name(), device.id());
        self.devices.push(device);
        true
    }

    /// Remove a device and drop its effect.
    pub fn unregister_device(&mut self, id: &str) -> bool {
        let Some(pos) = self.devices.iter().position(|d| d.id() == id) else {
            return false;
        };
        self.devices.remove(pos);
        self.stop_effect(id);
        log::info!("Unregistered {id}");
        true
    }

    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    pub fn device_by_id(&self, id: &str) -> Option<DeviceHandle> {
        self.devices.iter().find(|d| d.id() == id).map(Arc::clone)
    }

    pub fn available_effects(&self) -> Vec<&'static str> {
        effect::available_effects()
    }

    // ── Colors ──────────────────────────────────────────────────────

    /// Push a color to one device and replace its effect with a Static one.
    pub fn set_color_for_device(
        &mut self,
        device: &DeviceHandle,
        color: Color,
    ) -> Result<(), ControlError> {
        if !device.is_connected() {
            return Err(self.report(ControlError::Disconnected {
                device: device.display_name().to_string(),
            }));
        }
        if !device.set_color(color) {
            return Err(self.report(ControlError::ColorRejected {
                device: device.display_name().to_string(),
            }));
        }

        let id = device.id().to_string();
        self.stop_effect(&id);
        let mut fixed = Effect::static_color(color);
        fixed.start();
        self.effects.insert(id.clone(), fixed);

        self.events.emit(Event::ColorChanged { device_id: id, color });
        self.events.emit(Event::success(format!(
            "Color {color} set for device '{}'",
            device.display_name()
        )));
        Ok(())
    }

    /// Apply a color to each device in order. Returns the success count.
    pub fn set_color_for_devices(&mut self, devices: &[DeviceHandle], color: Color) -> usize {
        let ok = devices
            .iter()
            .filter(|d| self.set_color_for_device(d, color).is_ok())
            .count();
        self.report_batch(
            ok,
            devices.len(),
            &format!("Color {color} set for"),
            "Failed to set color for all devices",
        );
        ok
    }

    pub fn set_color_for_all_devices(&mut self, color: Color) -> usize {
        let devices = self.devices.clone();
        self.set_color_for_devices(&devices, color)
    }

    pub fn set_color_for_device_id(&mut self, id: &str, color: Color) -> Result<(), ControlError> {
        let device = self.lookup(id)?;
        self.set_color_for_device(&device, color)
    }

    // ── Effects ─────────────────────────────────────────────────────

    /// Replace the device's effect with a freshly started one.
    pub fn set_effect_for_device(
        &mut self,
        device: &DeviceHandle,
        name: &str,
        params: &EffectParams,
    ) -> Result<(), ControlError> {
        if !device.is_connected() {
            return Err(self.report(ControlError::Disconnected {
                device: device.display_name().to_string(),
            }));
        }
        if self.strict_effect_names && EffectKind::parse(name).is_none() {
            return Err(self.report(ControlError::UnknownEffect(name.to_string())));
        }

        let id = device.id().to_string();
        self.stop_effect(&id);

        let mut effect = Effect::create(name, params);
        let sink = self.events.clone();
        let target = Arc::clone(device);
        effect.on_color_changed(move |color| {
            target.set_color(color);
            sink.emit(Event::ColorChanged { device_id: target.id().to_string(), color });
        });
        effect.start();
        self.effects.insert(id.clone(), effect);

        // Backends may know effects the engine renders as Static, so they
        // get the requested name rather than the engine's fallback.
        let effect_name = EffectKind::parse(name).map_or(name.trim(), |k| k.name());
        // While linked, the temperature broadcast owns the backend.
        let accepted = self.temperature_linking || device.set_effect(effect_name, params);
        if !accepted {
            return Err(self.report(ControlError::EffectRejected {
                device: device.display_name().to_string(),
                effect: effect_name.to_string(),
            }));
        }

        self.events.emit(Event::EffectChanged {
            device_id: id,
            effect: effect_name.to_string(),
        });
        self.events.emit(Event::success(format!(
            "Effect '{effect_name}' set for device '{}'",
            device.display_name()
        )));
        Ok(())
    }

    pub fn set_effect_for_devices(
        &mut self,
        devices: &[DeviceHandle],
        name: &str,
        params: &EffectParams,
    ) -> usize {
        let ok = devices
            .iter()
            .filter(|d| self.set_effect_for_device(d, name, params).is_ok())
            .count();
        self.report_batch(
            ok,
            devices.len(),
            &format!("Effect '{name}' set for"),
            &format!("Failed to set effect '{name}' for all devices"),
        );
        ok
    }

    pub fn set_effect_for_all_devices(&mut self, name: &str, params: &EffectParams) -> usize {
        let devices = self.devices.clone();
        self.set_effect_for_devices(&devices, name, params)
    }

    pub fn set_effect_for_device_id(
        &mut self,
        id: &str,
        name: &str,
        params: &EffectParams,
    ) -> Result<(), ControlError> {
        let device = self.lookup(id)?;
        self.set_effect_for_device(&device, name, params)
    }

    /// Fire the Reactive effect running on `id`.
    pub fn trigger_device(&mut self, id: &str) -> Result<(), ControlError> {
        let device = self.lookup(id)?;
        let fired = self.effects.get_mut(id).is_some_and(|effect| effect.trigger());
        if fired {
            Ok(())
        } else {
            Err(self.report(ControlError::NotReactive {
                device: device.display_name().to_string(),
            }))
        }
    }

    pub fn active_effect(&self, id: &str) -> Option<&Effect> {
        self.effects.get(id)
    }

    /// Effect name and parameters for a device: the engine's view when an
    /// effect exists, otherwise what the backend reports.
    pub fn effect_snapshot(&self, id: &str) -> Option<(String, EffectParams)> {
        if let Some(effect) = self.effects.get(id) {
            return Some((effect.name().to_string(), effect.parameters().clone()));
        }
        let device = self.device_by_id(id)?;
        Some((device.active_effect(), device.effect_parameters()))
    }

    /// Drive every effect's schedule forward.
    pub fn advance(&mut self, elapsed: Duration) {
        for effect in self.effects.values_mut() {
            effect.advance(elapsed);
        }
    }

    // ── Temperature linking ─────────────────────────────────────────

    /// Toggle the override. Enabling applies the last known temperatures
    /// right away.
    pub fn set_temperature_linking(&mut self, enabled: bool) {
        self.temperature_linking = enabled;
        self.events.emit(Event::TemperatureLinkingChanged(enabled));
        if enabled {
            self.update_temperatures(self.cpu_temperature, self.gpu_temperature);
        }
    }

    /// Set the flag without broadcasting; the next sample applies it.
    pub fn restore_temperature_linking(&mut self, enabled: bool) {
        self.temperature_linking = enabled;
        self.events.emit(Event::TemperatureLinkingChanged(enabled));
    }

    pub fn is_temperature_linking_enabled(&self) -> bool {
        self.temperature_linking
    }

    /// Record a sample; while linked, broadcast the color for the hotter of
    /// the two readings.
    pub fn update_temperatures(&mut self, cpu: i32, gpu: i32) {
        self.cpu_temperature = cpu;
        self.gpu_temperature = gpu;
        if self.temperature_linking {
            let color = color::from_temperature(cpu.max(gpu));
            self.set_color_for_all_devices(color);
        }
    }

    /// Last recorded (cpu, gpu) temperatures.
    pub fn temperatures(&self) -> (i32, i32) {
        (self.cpu_temperature, self.gpu_temperature)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn stop_effect(&mut self, id: &str) {
        if let Some(mut old) = self.effects.remove(id) {
            old.stop();
        }
    }

    fn lookup(&self, id: &str) -> Result<DeviceHandle, ControlError> {
        self.device_by_id(id)
            .ok_or_else(|| self.report(ControlError::UnknownDevice(id.to_string())))
    }

    /// Emit the error as a failure event and hand it back.
    fn report(&self, err: ControlError) -> ControlError {
        log::warn!("{err}");
        self.events.emit(Event::failure(err.to_string()));
        err
    }

    fn report_batch(&self, ok: usize, total: usize, done: &str, all_failed: &str) {
        if total == 0 {
            return;
        }
        let event = if ok == total {
            Event::success(format!("{done} {ok} device(s)"))
        } else if ok > 0 {
            Event::partial(format!("{done} {ok} of {total} device(s)"))
        } else {
            Event::failure(all_failed)
        };
        self.events.emit(event);
    }
}
