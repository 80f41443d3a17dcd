//! Alert catalog - message keys and English templates for safety broadcasts.

use crate::record::Warning;

/// Why a machine is calling out on the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    AtmosphereRestored,
    VacuumShutdown,
    OverheatStarted,
    Countdown(Warning),
    CoolingRestored,
    Meltdown,
}

impl AlertKind {
    /// Localization key.
    pub fn key(self) -> &'static str {
        match self {
            AlertKind::AtmosphereRestored => "machine-safety-atmosphere-restored",
            AlertKind::VacuumShutdown => "machine-safety-vacuum-shutdown",
            AlertKind::OverheatStarted => "machine-safety-overheat-warning",
            AlertKind::Countdown(Warning::FiveMinutes) => "machine-safety-meltdown-5min",
            AlertKind::Countdown(Warning::ThreeMinutes) => "machine-safety-meltdown-3min",
            AlertKind::Countdown(Warning::OneMinute) => "machine-safety-meltdown-1min",
            AlertKind::Countdown(Warning::ThirtySeconds) => "machine-safety-meltdown-30sec",
            AlertKind::Countdown(Warning::TenSeconds) => "machine-safety-meltdown-10sec",
            AlertKind::CoolingRestored => "machine-safety-cooling-restored",
            AlertKind::Meltdown => "machine-safety-meltdown",
        }
    }

    /// English template with a `{machine}` placeholder.
    pub fn template(self) -> &'static str {
        match self {
            AlertKind::AtmosphereRestored => {
                "{machine}: atmosphere restored, power back online."
            }
            AlertKind::VacuumShutdown => "{machine}: vacuum detected, emergency power shutdown!",
            AlertKind::OverheatStarted => "{machine}: overheating! Restore cooling immediately.",
            AlertKind::Countdown(Warning::FiveMinutes) => {
                "{machine}: 5 minutes until meltdown!"
            }
            AlertKind::Countdown(Warning::ThreeMinutes) => {
                "{machine}: 3 minutes until meltdown!"
            }
            AlertKind::Countdown(Warning::OneMinute) => "{machine}: 1 minute until meltdown!",
            AlertKind::Countdown(Warning::ThirtySeconds) => {
                "{machine}: 30 seconds until meltdown!"
            }
            AlertKind::Countdown(Warning::TenSeconds) => {
                "{machine}: 10 seconds until meltdown!"
            }
            AlertKind::CoolingRestored => "{machine}: temperature normal, cooling restored.",
            AlertKind::Meltdown => "{machine}: MELTDOWN! Evacuate the area!",
        }
    }

    /// Fill the template with the machine's display name.
    pub fn render(self, machine: &str) -> String {
        self.template().replace("{machine}", machine)
    }
}
