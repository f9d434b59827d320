//! luminctl: effect engine, device coordination, temperature linking and
//! profile storage for addressable RGB peripherals.

pub mod color;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod effect;
pub mod error;
pub mod events;
pub mod profile;
pub mod sensor;

pub use color::Color;
pub use coordinator::Coordinator;
pub use device::{DeviceHandle, RgbDevice};
pub use effect::{Effect, EffectKind, EffectParams};
pub use error::{ControlError, ProfileError};
pub use events::{Event, EventSink, Outcome};
pub use profile::ProfileStore;
