//! Machine components: power receiver, safety configuration, lifecycle marker.
//!
//! The `SafetyRecord` itself comes from `machsafe-logic` and is attached as
//! a component once the machine is first simulated.

use machsafe_logic::SafetyConfig;
use serde::{Deserialize, Serialize};

/// Power receiver state on a machine.
///
/// While a `SafetyRecord` is attached, only the safety monitor toggles
/// `power_disabled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerReceiver {
    pub power_disabled: bool,
}

impl PowerReceiver {
    pub fn powered() -> Self {
        Self {
            power_disabled: false,
        }
    }

    pub fn disabled() -> Self {
        Self {
            power_disabled: true,
        }
    }

    pub fn is_powered(&self) -> bool {
        !self.power_disabled
    }
}

/// Load-time safety configuration. A machine with this component gets a
/// `SafetyRecord` on its first simulated tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineSafety(pub SafetyConfig);

/// Marker for entities queued for deletion this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Terminating;
