//! Gas mixture readings and atmosphere classification.
//!
//! The environment sensor reports the mixture around a machine. This module
//! decides whether that mixture is enough atmosphere to keep the machine
//! powered. Sensor failures and missing mixtures both collapse to "vacuum".

use serde::{Deserialize, Serialize};

use crate::constants::{MIN_ATMOSPHERE_MOLES, OVERHEAT_TEMPERATURE, VACUUM_PRESSURE_KPA};

/// Snapshot of the gas mixture containing a machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasMixture {
    /// Pressure in kPa.
    pub pressure: f32,
    /// Temperature in Kelvin.
    pub temperature: f32,
    /// Total moles of gas in the mixture.
    pub total_moles: f32,
}

impl GasMixture {
    pub fn new(pressure: f32, temperature: f32, total_moles: f32) -> Self {
        Self {
            pressure,
            temperature,
            total_moles,
        }
    }

    /// Standard station air at the given temperature.
    pub fn standard(temperature: f32) -> Self {
        Self::new(101.325, temperature, 103.92)
    }

    /// Temperature in Celsius, for log output.
    pub fn celsius(&self) -> f32 {
        self.temperature - 273.15
    }

    /// Pressure and gas content are both sufficient. NaN in either is not.
    pub fn is_breathable_for_machines(&self) -> bool {
        self.pressure >= VACUUM_PRESSURE_KPA && self.total_moles > MIN_ATMOSPHERE_MOLES
    }

    pub fn is_low_pressure(&self) -> bool {
        self.pressure < VACUUM_PRESSURE_KPA
    }

    pub fn is_thin(&self) -> bool {
        self.total_moles <= MIN_ATMOSPHERE_MOLES
    }

    /// At or below the fixed overheat threshold. NaN is not cool.
    pub fn is_cool(&self) -> bool {
        self.temperature <= OVERHEAT_TEMPERATURE
    }

    /// The temperature is a usable number.
    pub fn has_valid_temperature(&self) -> bool {
        self.temperature.is_finite()
    }
}

/// Decide atmosphere presence from a sensor result.
///
/// `Err` and `Ok(None)` both mean vacuum: the monitor fails toward unsafe.
pub fn has_atmosphere<E>(reading: &Result<Option<GasMixture>, E>) -> bool {
    matches!(reading, Ok(Some(mixture)) if mixture.is_breathable_for_machines())
}
