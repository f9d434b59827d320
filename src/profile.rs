//! Named profiles: JSON snapshots of every device's color and effect plus
//! the temperature-linking flag.
//!
//! Layout on disk:
//!   <profiles_dir>/<name>.json   one document per profile
//!   <default_file>               plain text holding the default profile name
//!
//! Loading skips device ids that are not registered, so a profile written on
//! one machine applies cleanly on another.

use crate::color::Color;
use crate::coordinator::Coordinator;
use crate::effect::{EffectKind, EffectParams};
use crate::error::ProfileError;
use crate::events::{Event, EventSink};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub devices: Vec<DeviceEntry>,
    #[serde(
        rename = "temperatureRules",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature_rules: Option<TemperatureRules>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub effect: String,
    #[serde(
        rename = "effectParameters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub effect_parameters: Option<EffectParams>,
}

impl DeviceEntry {
    /// Entries without an effect name, or naming Static, restore a color.
    fn is_static(&self) -> bool {
        self.effect.trim().is_empty() || EffectKind::parse(&self.effect) == Some(EffectKind::Static)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureRules {
    #[serde(default)]
    pub enabled: bool,
}

pub struct ProfileStore {
    profiles_dir: PathBuf,
    default_file: PathBuf,
    events: EventSink,
}

impl ProfileStore {
    pub fn new(
        profiles_dir: impl Into<PathBuf>,
        default_file: impl Into<PathBuf>,
        events: EventSink,
    ) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            default_file: default_file.into(),
            events,
        }
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// Profile names (file stems of `*.json`), sorted. Empty if the
    /// directory does not exist yet.
    pub fn available_profiles(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.profiles_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.path_for(name).is_file()
    }

    /// Snapshot every registered device into `<name>.json`.
    pub fn save(
        &self,
        coordinator: &Coordinator,
        name: &str,
        include_temperature_rule: bool,
    ) -> Result<(), ProfileError> {
        validate_name(name).map_err(|e| self.fail(e))?;
        let document = snapshot(coordinator, include_temperature_rule);
        let json = serde_json::to_string_pretty(&document).map_err(|source| {
            self.fail(ProfileError::Serialize { name: name.to_string(), source })
        })?;

        fs::create_dir_all(&self.profiles_dir).map_err(|source| {
            self.fail(ProfileError::Directory { path: self.profiles_dir.clone(), source })
        })?;
        fs::write(self.path_for(name), json)
            .map_err(|source| self.fail(ProfileError::Write { name: name.to_string(), source }))?;

        log::info!("Saved profile '{name}' ({} devices)", document.devices.len());
        self.events.emit(Event::ProfileSaved(name.to_string()));
        Ok(())
    }

    /// Read `<name>.json` and apply it to the coordinator.
    pub fn load(&self, coordinator: &mut Coordinator, name: &str) -> Result<(), ProfileError> {
        validate_name(name).map_err(|e| self.fail(e))?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(self.fail(ProfileError::NotFound(name.to_string())));
        }
        let text = fs::read_to_string(&path)
            .map_err(|source| self.fail(ProfileError::Read { name: name.to_string(), source }))?;
        let document: ProfileDocument = serde_json::from_str(&text)
            .map_err(|source| self.fail(ProfileError::Parse { name: name.to_string(), source }))?;

        apply(coordinator, &document);

        log::info!("Loaded profile '{name}'");
        self.events.emit(Event::ProfileLoaded(name.to_string()));
        Ok(())
    }

    /// Remove `<name>.json`; clears the default pointer if it named this profile.
    pub fn delete(&self, name: &str) -> Result<(), ProfileError> {
        validate_name(name).map_err(|e| self.fail(e))?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(self.fail(ProfileError::NotFound(name.to_string())));
        }
        fs::remove_file(&path)
            .map_err(|source| self.fail(ProfileError::Delete { name: name.to_string(), source }))?;

        if self.default_profile() == name {
            if let Err(e) = fs::remove_file(&self.default_file) {
                log::warn!("Could not clear default profile pointer: {e}");
            }
        }

        log::info!("Deleted profile '{name}'");
        self.events.emit(Event::ProfileDeleted(name.to_string()));
        Ok(())
    }

    /// Point the default at an existing profile.
    pub fn set_default(&self, name: &str) -> Result<(), ProfileError> {
        validate_name(name).map_err(|e| self.fail(e))?;
        if !self.exists(name) {
            return Err(self.fail(ProfileError::NotFound(name.to_string())));
        }
        if let Some(parent) = self.default_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| self.fail(ProfileError::DefaultPointer { source }))?;
        }
        fs::write(&self.default_file, name)
            .map_err(|source| self.fail(ProfileError::DefaultPointer { source }))?;
        log::info!("Default profile set to '{name}'");
        Ok(())
    }

    /// The default profile name, or "" when unset or unreadable. The name is
    /// returned as written; the profile itself may no longer exist.
    pub fn default_profile(&self) -> String {
        fs::read_to_string(&self.default_file)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Load the default profile. Fails quietly with `NoDefault` when unset.
    pub fn load_default(&self, coordinator: &mut Coordinator) -> Result<(), ProfileError> {
        let name = self.default_profile();
        if name.is_empty() {
            return Err(ProfileError::NoDefault);
        }
        self.load(coordinator, &name)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.json"))
    }

    fn fail(&self, err: ProfileError) -> ProfileError {
        log::error!("{err}");
        self.events.emit(Event::ProfileFailed(err.to_string()));
        err
    }
}

fn validate_name(name: &str) -> Result<(), ProfileError> {
    let bad = name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name.contains("..");
    if bad {
        Err(ProfileError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Build the document for the coordinator's current state.
pub fn snapshot(coordinator: &Coordinator, include_temperature_rule: bool) -> ProfileDocument {
    let devices = coordinator
        .devices()
        .iter()
        .map(|device| {
            let (effect, params) = coordinator
                .effect_snapshot(device.id())
                .unwrap_or_else(|| ("Static".to_string(), EffectParams::new()));
            let is_static = effect.is_empty() || effect == EffectKind::Static.name();
            DeviceEntry {
                id: device.id().to_string(),
                name: device.display_name().to_string(),
                color: Some(device.color()),
                effect,
                effect_parameters: (!is_static).then_some(params),
            }
        })
        .collect();

    ProfileDocument {
        devices,
        temperature_rules: include_temperature_rule.then(|| TemperatureRules {
            enabled: coordinator.is_temperature_linking_enabled(),
        }),
    }
}

/// Apply a document entry by entry. Unknown ids are skipped and device
/// failures are reported by the coordinator without stopping the load.
pub fn apply(coordinator: &mut Coordinator, document: &ProfileDocument) {
    for entry in &document.devices {
        let Some(device) = coordinator.device_by_id(&entry.id) else {
            log::debug!("Device '{}' not registered, skipping", entry.id);
            continue;
        };
        let result = if entry.is_static() {
            match entry.color {
                Some(color) => coordinator.set_color_for_device(&device, color),
                None => Ok(()),
            }
        } else {
            let params = entry.effect_parameters.clone().unwrap_or_default();
            coordinator.set_effect_for_device(&device, &entry.effect, &params)
        };
        // Already surfaced as a failure event by the coordinator
        if let Err(e) = result {
            log::debug!("Profile entry '{}' not fully applied: {e}", entry.id);
        }
    }
    if let Some(rules) = document.temperature_rules {
        coordinator.restore_temperature_linking(rules.enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AuraDevice, DemoDevice, DeviceHandle, RgbDevice};
    use crate::events::{self, Event};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        dir: PathBuf,
        store: ProfileStore,
        coordinator: Coordinator,
        rx: tokio::sync::mpsc::UnboundedReceiver<Event>,
    }

    impl Fixture {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir()
                .join(format!("luminctl_profile_{tag}_{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            let (sink, rx) = events::channel();
            let store = ProfileStore::new(
                dir.join("profiles"),
                dir.join("config").join("default_profile.txt"),
                sink.clone(),
            );
            let mut coordinator = Coordinator::new(sink);
            for id in ["kb", "fan"] {
                coordinator.register_device(Arc::new(DemoDevice::new(id, id, "Fan")));
            }
            Self { dir, store, coordinator, rx }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    #[test]
    fn save_writes_expected_document() {
        let mut f = Fixture::new("save");
        f.coordinator.set_color_for_device_id("kb", Color::new(10, 20, 30)).unwrap();
        f.coordinator
            .set_effect_for_device_id(
                "fan",
                "Breathing",
                json!({ "speed": 1500 }).as_object().unwrap(),
            )
            .unwrap();
        f.store.save(&f.coordinator, "desk", false).unwrap();

        let text = fs::read_to_string(f.dir.join("profiles").join("desk.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["devices"][0]["color"], json!({ "r": 10, "g": 20, "b": 30 }));
        assert_eq!(doc["devices"][0]["effect"], json!("Static"));
        assert!(doc["devices"][0].get("effectParameters").is_none());
        assert_eq!(doc["devices"][1]["effect"], json!("Breathing"));
        assert_eq!(doc["devices"][1]["effectParameters"]["speed"], json!(1500));
        assert!(doc.get("temperatureRules").is_none());
        assert!(events::drain(&mut f.rx).contains(&Event::ProfileSaved("desk".into())));
    }

    #[test]
    fn load_missing_and_malformed() {
        let mut f = Fixture::new("load_err");
        let err = f.store.load(&mut f.coordinator, "ghost").unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));

        fs::create_dir_all(f.dir.join("profiles")).unwrap();
        fs::write(f.dir.join("profiles").join("bad.json"), "{ not json").unwrap();
        let err = f.store.load(&mut f.coordinator, "bad").unwrap_err();
        assert!(matches!(err, ProfileError::Parse { .. }));
        assert!(err.to_string().contains("bad"));

        // A document without a device list is rejected too
        fs::write(f.dir.join("profiles").join("empty.json"), "{}").unwrap();
        assert!(f.store.load(&mut f.coordinator, "empty").is_err());

        let failures = events::drain(&mut f.rx)
            .into_iter()
            .filter(|e| matches!(e, Event::ProfileFailed(_)))
            .count();
        assert_eq!(failures, 3);
    }

    #[test]
    fn load_applies_colors_and_skips_unknown_ids() {
        let mut f = Fixture::new("apply");
        fs::create_dir_all(f.dir.join("profiles")).unwrap();
        let doc = json!({
            "devices": [
                { "id": "gone", "name": "Gone", "color": { "r": 1, "g": 1, "b": 1 },
                  "effect": "Static" },
                { "id": "kb", "name": "kb", "color": { "r": 0, "g": 128, "b": 255 },
                  "effect": "Static" },
                { "id": "fan", "name": "fan", "color": { "r": 0, "g": 0, "b": 0 },
                  "effect": "Wave", "effectParameters": { "speed": 300 } }
            ]
        });
        fs::write(f.dir.join("profiles").join("mix.json"), doc.to_string()).unwrap();
        f.store.load(&mut f.coordinator, "mix").unwrap();

        let kb = f.coordinator.device_by_id("kb").unwrap();
        assert_eq!(kb.color(), Color::new(0, 128, 255));
        let (name, params) = f.coordinator.effect_snapshot("fan").unwrap();
        assert_eq!(name, "Wave");
        assert_eq!(params["speed"], json!(300));
        assert!(!f.coordinator.is_temperature_linking_enabled());
    }

    #[test]
    fn rejected_entry_does_not_stop_the_load() {
        let mut f = Fixture::new("rejected");
        f.coordinator.register_device(Arc::new(AuraDevice::new("ram", "RAM", "RAM")));
        fs::create_dir_all(f.dir.join("profiles")).unwrap();
        let doc = json!({
            "devices": [
                { "id": "ram", "name": "RAM", "effect": "Wave" },
                { "id": "kb", "name": "kb", "color": { "r": 9, "g": 8, "b": 7 },
                  "effect": "Static" }
            ]
        });
        fs::write(f.dir.join("profiles").join("aura.json"), doc.to_string()).unwrap();
        events::drain(&mut f.rx);

        f.store.load(&mut f.coordinator, "aura").unwrap();
        let kb = f.coordinator.device_by_id("kb").unwrap();
        assert_eq!(kb.color(), Color::new(9, 8, 7));
        let evs = events::drain(&mut f.rx);
        assert!(evs.iter().any(Event::is_error));
        assert!(evs.contains(&Event::ProfileLoaded("aura".into())));
    }

    #[test]
    fn default_pointer_lifecycle() {
        let mut f = Fixture::new("default");
        assert_eq!(f.store.default_profile(), "");
        assert!(matches!(f.store.load_default(&mut f.coordinator), Err(ProfileError::NoDefault)));
        assert!(f.store.set_default("night").is_err());

        f.store.save(&f.coordinator, "night", true).unwrap();
        f.store.save(&f.coordinator, "day", false).unwrap();
        f.store.set_default("night").unwrap();
        assert_eq!(f.store.default_profile(), "night");
        f.store.load_default(&mut f.coordinator).unwrap();

        // Deleting another profile keeps the pointer
        f.store.delete("day").unwrap();
        assert_eq!(f.store.default_profile(), "night");
        f.store.delete("night").unwrap();
        assert_eq!(f.store.default_profile(), "");
        assert!(f.store.delete("night").is_err());
    }

    #[test]
    fn pointer_is_trimmed_and_trusted() {
        let f = Fixture::new("trim");
        fs::create_dir_all(f.dir.join("config")).unwrap();
        fs::write(f.dir.join("config").join("default_profile.txt"), "  evening \n").unwrap();
        assert_eq!(f.store.default_profile(), "evening");
    }

    #[test]
    fn listing_and_names() {
        let f = Fixture::new("list");
        assert!(f.store.available_profiles().is_empty());
        for name in ["b", "a", "c"] {
            f.store.save(&f.coordinator, name, false).unwrap();
        }
        fs::write(f.dir.join("profiles").join("notes.txt"), "x").unwrap();
        assert_eq!(f.store.available_profiles(), vec!["a", "b", "c"]);
        assert!(f.store.exists("a"));
        assert!(!f.store.exists("zz"));

        for bad in ["", "  ", "../up", "a/b", "a\\b"] {
            assert!(matches!(
                f.store.save(&f.coordinator, bad, false),
                Err(ProfileError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let f = Fixture::new("blocked");
        fs::create_dir_all(&f.dir).unwrap();
        // A file where the directory should be
        fs::write(f.dir.join("profiles"), "").unwrap();
        let err = f.store.save(&f.coordinator, "x", false).unwrap_err();
        assert!(matches!(err, ProfileError::Directory { .. }));
        assert!(err.is_storage());
        // Later calls still behave
        assert!(f.store.available_profiles().is_empty());
    }

    #[test]
    fn temperature_rule_round_trip() {
        let mut f = Fixture::new("rule");
        f.coordinator.restore_temperature_linking(true);
        f.store.save(&f.coordinator, "linked", true).unwrap();

        let (sink, _rx) = events::channel();
        let mut fresh = Coordinator::new(sink);
        let dev: DeviceHandle = Arc::new(DemoDevice::new("kb", "kb", "Fan"));
        fresh.register_device(dev);
        f.store.load(&mut fresh, "linked").unwrap();
        assert!(fresh.is_temperature_linking_enabled());
    }
}
