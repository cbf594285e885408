//! The display device a session is established against.
//!
//! Devices are produced by the discovery collaborator (route scanning, picker
//! UI) and handed to the session manager as immutable values.  Nothing in the
//! sender ever edits a `Device` after it was discovered.

use std::fmt;

use uuid::Uuid;

/// Opaque identifier assigned to a device by discovery.
pub type DeviceId = Uuid;

/// A display device that can host the dashboard application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    id: DeviceId,
    name: String,
}

impl Device {
    /// Creates a device value.  Intended for discovery adapters and tests.
    pub fn new(id: DeviceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the opaque discovery identifier.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the human-readable name shown in the route picker.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
