//! Error types for device control and profile storage.
//!
//! Every message is meant to be shown to the user as-is, so variants carry
//! the device id or profile name they concern.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Device control
// ---------------------------------------------------------------------------

/// Failure of a coordinator command against one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// No registered device has this id.
    UnknownDevice(String),
    /// The device reports itself as not connected.
    Disconnected { device: String },
    /// Effect name not recognised (only raised with strict effect names).
    UnknownEffect(String),
    /// The device has no Reactive effect to trigger.
    NotReactive { device: String },
    /// Backend refused the color.
    ColorRejected { device: String },
    /// Backend refused the effect.
    EffectRejected { device: String, effect: String },
}

impl ControlError {
    /// True for rejections made before anything was changed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownDevice(_)
                | Self::Disconnected { .. }
                | Self::UnknownEffect(_)
                | Self::NotReactive { .. }
        )
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDevice(id) => write!(f, "Unknown device '{id}'"),
            Self::Disconnected { device } => write!(f, "Device '{device}' is not connected"),
            Self::UnknownEffect(name) => write!(f, "Unknown effect '{name}'"),
            Self::NotReactive { device } => {
                write!(f, "Device '{device}' is not running a Reactive effect")
            }
            Self::ColorRejected { device } => write!(f, "Failed to set color for '{device}'"),
            Self::EffectRejected { device, effect } => {
                write!(f, "Failed to set effect '{effect}' for '{device}'")
            }
        }
    }
}

impl std::error::Error for ControlError {}

// ---------------------------------------------------------------------------
// Profile storage
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ProfileError {
    /// Empty name, or one that would escape the profiles directory.
    InvalidName(String),
    NotFound(String),
    /// The profiles directory could not be created.
    Directory { path: PathBuf, source: std::io::Error },
    Read { name: String, source: std::io::Error },
    Parse { name: String, source: serde_json::Error },
    Serialize { name: String, source: serde_json::Error },
    Write { name: String, source: std::io::Error },
    Delete { name: String, source: std::io::Error },
    /// The default-profile pointer file could not be written or removed.
    DefaultPointer { source: std::io::Error },
    /// No default profile is set.
    NoDefault,
}

impl ProfileError {
    /// True when the failure came from the filesystem or the document
    /// format rather than from the request itself.
    pub fn is_storage(&self) -> bool {
        !matches!(self, Self::InvalidName(_) | Self::NotFound(_) | Self::NoDefault)
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "Invalid profile name '{name}'"),
            Self::NotFound(name) => write!(f, "Profile '{name}' does not exist"),
            Self::Directory { path, source } => {
                write!(f, "Cannot create profiles directory {}: {source}", path.display())
            }
            Self::Read { name, source } => write!(f, "Cannot open profile '{name}': {source}"),
            Self::Parse { name, source } => write!(f, "Invalid profile format '{name}': {source}"),
            Self::Serialize { name, source } => {
                write!(f, "Cannot serialize profile '{name}': {source}")
            }
            Self::Write { name, source } => write!(f, "Cannot save profile '{name}': {source}"),
            Self::Delete { name, source } => write!(f, "Cannot delete profile '{name}': {source}"),
            Self::DefaultPointer { source } => {
                write!(f, "Cannot update default profile: {source}")
            }
            Self::NoDefault => f.write_str("No default profile set"),
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Directory { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::Delete { source, .. }
            | Self::DefaultPointer { source } => Some(source),
            Self::Parse { source, .. } | Self::Serialize { source, .. } => Some(source),
            Self::InvalidName(_) | Self::NotFound(_) | Self::NoDefault => None,
        }
    }
}
