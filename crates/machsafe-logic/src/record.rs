//! Per-machine safety record and the overheat warning ladder.
//!
//! A `SafetyRecord` is the mutable state the monitor keeps for one machine:
//! thresholds, the cumulative overheat timer, one-shot warning flags, and the
//! alert throttle timestamp. Records are plain data; the monitor drives every
//! transition through the methods here so the episode invariants hold:
//!
//! - `overheat_elapsed` only grows while overheating and is zeroed whenever an
//!   episode ends.
//! - Warning flags only go from unset to set inside an episode and are all
//!   cleared together when it ends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SafetyConfig;
use crate::constants::{ALERT_COOLDOWN, OVERHEAT_TICK_STEP};

/// Countdown warnings, highest remaining time first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Warning {
    FiveMinutes,
    ThreeMinutes,
    OneMinute,
    ThirtySeconds,
    TenSeconds,
}

impl Warning {
    /// Evaluation order. The first unfired, due warning wins each tick.
    pub const LADDER: [Warning; 5] = [
        Warning::FiveMinutes,
        Warning::ThreeMinutes,
        Warning::OneMinute,
        Warning::ThirtySeconds,
        Warning::TenSeconds,
    ];

    /// Remaining time at or below which this warning is due.
    pub fn threshold(self) -> Duration {
        match self {
            Warning::FiveMinutes => Duration::from_secs(300),
            Warning::ThreeMinutes => Duration::from_secs(180),
            Warning::OneMinute => Duration::from_secs(60),
            Warning::ThirtySeconds => Duration::from_secs(30),
            Warning::TenSeconds => Duration::from_secs(10),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Warning::FiveMinutes => "5 minutes",
            Warning::ThreeMinutes => "3 minutes",
            Warning::OneMinute => "1 minute",
            Warning::ThirtySeconds => "30 seconds",
            Warning::TenSeconds => "10 seconds",
        }
    }
}

/// One-shot flags, one per rung of the warning ladder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningFlags {
    pub five_minutes: bool,
    pub three_minutes: bool,
    pub one_minute: bool,
    pub thirty_seconds: bool,
    pub ten_seconds: bool,
}

impl WarningFlags {
    pub fn is_set(&self, warning: Warning) -> bool {
        match warning {
            Warning::FiveMinutes => self.five_minutes,
            Warning::ThreeMinutes => self.three_minutes,
            Warning::OneMinute => self.one_minute,
            Warning::ThirtySeconds => self.thirty_seconds,
            Warning::TenSeconds => self.ten_seconds,
        }
    }

    fn flag_mut(&mut self, warning: Warning) -> &mut bool {
        match warning {
            Warning::FiveMinutes => &mut self.five_minutes,
            Warning::ThreeMinutes => &mut self.three_minutes,
            Warning::OneMinute => &mut self.one_minute,
            Warning::ThirtySeconds => &mut self.thirty_seconds,
            Warning::TenSeconds => &mut self.ten_seconds,
        }
    }

    pub fn set(&mut self, warning: Warning) {
        *self.flag_mut(warning) = true;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        Warning::LADDER.iter().any(|w| self.is_set(*w))
    }

    /// Count of fired warnings this episode.
    pub fn fired(&self) -> usize {
        Warning::LADDER.iter().filter(|w| self.is_set(**w)).count()
    }

    /// First unfired warning whose threshold `remaining` has reached.
    pub fn next_due(&self, remaining: Duration) -> Option<Warning> {
        Warning::LADDER
            .into_iter()
            .find(|w| !self.is_set(*w) && remaining <= w.threshold())
    }
}

/// Result of feeding a fresh atmosphere reading into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtmosphereTransition {
    /// Atmosphere was present last tick and is gone now.
    Lost,
    /// Atmosphere was absent last tick and is back now.
    Restored,
    /// No change since last tick.
    Steady,
}

/// Coarse machine state for UIs and harness output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyStatus {
    Normal,
    Overheating,
    Vacuum,
}

/// Mutable safety state for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRecord {
    critical_temperature: f32,
    max_overheat: Duration,
    overheat_elapsed: Duration,
    /// Sim time of the last transmitted alert.
    last_alert: Option<Duration>,
    is_overheating: bool,
    has_atmosphere: bool,
    warnings: WarningFlags,
    alert_channel: String,
}

impl SafetyRecord {
    /// Seed a fresh record: timers zeroed, flags cleared, atmosphere assumed.
    pub fn from_config(config: &SafetyConfig) -> Self {
        Self {
            critical_temperature: config.critical_temperature,
            max_overheat: config.max_overheat(),
            overheat_elapsed: Duration::ZERO,
            last_alert: None,
            is_overheating: false,
            has_atmosphere: true,
            warnings: WarningFlags::default(),
            alert_channel: config.alert_channel.clone(),
        }
    }

    pub fn critical_temperature(&self) -> f32 {
        self.critical_temperature
    }

    pub fn max_overheat(&self) -> Duration {
        self.max_overheat
    }

    pub fn overheat_elapsed(&self) -> Duration {
        self.overheat_elapsed
    }

    pub fn last_alert(&self) -> Option<Duration> {
        self.last_alert
    }

    pub fn is_overheating(&self) -> bool {
        self.is_overheating
    }

    pub fn has_atmosphere(&self) -> bool {
        self.has_atmosphere
    }

    pub fn warnings(&self) -> &WarningFlags {
        &self.warnings
    }

    pub fn alert_channel(&self) -> &str {
        &self.alert_channel
    }

    /// Overheat time left before meltdown, floored at zero.
    pub fn time_remaining(&self) -> Duration {
        self.max_overheat.saturating_sub(self.overheat_elapsed)
    }

    pub fn status(&self) -> SafetyStatus {
        if !self.has_atmosphere {
            SafetyStatus::Vacuum
        } else if self.is_overheating {
            SafetyStatus::Overheating
        } else {
            SafetyStatus::Normal
        }
    }

    /// Record the latest atmosphere state and report the edge, if any.
    pub fn set_atmosphere(&mut self, present: bool) -> AtmosphereTransition {
        let was_present = self.has_atmosphere;
        self.has_atmosphere = present;
        match (was_present, present) {
            (true, false) => AtmosphereTransition::Lost,
            (false, true) => AtmosphereTransition::Restored,
            _ => AtmosphereTransition::Steady,
        }
    }

    /// Start an overheat episode. Returns false if one is already running.
    pub fn begin_overheat(&mut self) -> bool {
        if self.is_overheating {
            return false;
        }
        self.is_overheating = true;
        self.overheat_elapsed = Duration::ZERO;
        true
    }

    /// Add one fixed tick of overheat time.
    pub fn accumulate_overheat(&mut self) {
        if self.is_overheating {
            self.overheat_elapsed += OVERHEAT_TICK_STEP;
        }
    }

    /// Mark and return the warning due this tick, at most one.
    pub fn take_due_warning(&mut self) -> Option<Warning> {
        let due = self.warnings.next_due(self.time_remaining())?;
        self.warnings.set(due);
        Some(due)
    }

    /// Cumulative overheat time has gone past the tolerated maximum.
    pub fn overheat_expired(&self) -> bool {
        self.overheat_elapsed > self.max_overheat
    }

    /// End the current episode. Returns false if none was running.
    pub fn end_overheat(&mut self) -> bool {
        let was_overheating = self.is_overheating;
        self.is_overheating = false;
        self.overheat_elapsed = Duration::ZERO;
        self.warnings.clear();
        was_overheating
    }

    /// Clear warning flags so a fresh grace period starts.
    pub fn reset_warnings(&mut self) {
        self.warnings.clear();
    }

    /// Claim the alert slot at `now`. False while inside the cooldown window.
    pub fn try_claim_alert(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_alert {
            if now.saturating_sub(last) < ALERT_COOLDOWN {
                return false;
            }
        }
        self.last_alert = Some(now);
        true
    }
}

impl Default for SafetyRecord {
    fn default() -> Self {
        Self::from_config(&SafetyConfig::default())
    }
}
