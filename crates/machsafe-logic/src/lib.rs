//! Pure machine-safety logic.
//!
//! This crate holds everything about the thermal-safety watchdog that does
//! not depend on an entity store: the per-machine record, the countdown
//! warning ladder, atmosphere classification, the alert catalog, the
//! meltdown blast profile, and load-time configuration. Functions take plain
//! data and return results, so the monitor's rules are unit-testable without
//! a running world.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`alerts`] | Alert reasons, localization keys, message templates |
//! | [`atmosphere`] | Gas mixture snapshot, vacuum classification |
//! | [`blast`] | Fixed meltdown explosion profile |
//! | [`config`] | Per-machine limits, JSON prototypes, validation |
//! | [`constants`] | Pressure/temperature thresholds, tick step, throttle window |
//! | [`record`] | Safety record, warning flags, episode transitions |

pub mod alerts;
pub mod atmosphere;
pub mod blast;
pub mod config;
pub mod constants;
pub mod record;

pub use alerts::AlertKind;
pub use atmosphere::GasMixture;
pub use config::{ConfigError, SafetyConfig};
pub use record::{AtmosphereTransition, SafetyRecord, SafetyStatus, Warning, WarningFlags};
