//! Safety thresholds and timing constants.
//!
//! Plain constants with no host dependency. Both the ECS runtime and the
//! headless simtest read these.

use std::time::Duration;

/// Minimum pressure (kPa) a machine needs to stay powered.
pub const VACUUM_PRESSURE_KPA: f32 = 5.0;

/// Minimum total moles for a mixture to count as an atmosphere.
///
/// A hot near-empty mixture can still report non-trivial pressure.
pub const MIN_ATMOSPHERE_MOLES: f32 = 0.01;

/// Fixed overheat threshold (K). Always below the critical temperature.
pub const OVERHEAT_TEMPERATURE: f32 = 320.0;

/// Overheat time accumulated per evaluation tick.
///
/// Fixed-step: one logical second per tick regardless of wall time.
pub const OVERHEAT_TICK_STEP: Duration = Duration::from_secs(1);

/// Minimum spacing between two transmitted alerts for one machine.
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(10);

/// Configuration defaults.
pub mod defaults {
    /// Instant-meltdown temperature (K).
    pub const CRITICAL_TEMPERATURE: f32 = 423.0;
    /// Cumulative overheat time tolerated before meltdown (seconds).
    pub const MAX_OVERHEAT_SECONDS: f32 = 600.0;
    /// Radio channel for safety alerts.
    pub const ALERT_CHANNEL: &str = "Engineering";
}
