//! MachSafe Core - Machine Thermal-Safety Monitor
//!
//! An ECS-hosted watchdog for powered machines. Every tick it senses the
//! atmosphere around each anchored machine, cuts or restores power, tracks
//! how long the machine has been overheating, radios escalating warnings to
//! its department, and melts the machine down when limits are exceeded.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Machines placed on maps
//! - **Components**: Transform, PowerReceiver, MachineSafety config, SafetyRecord
//! - **Systems**: Record seeding, the safety monitor, deferred deletion
//! - **Services**: Traits for the host's atmosphere, radio and explosion systems
//!
//! # Example
//!
//! ```rust,no_run
//! use machsafe_core::prelude::*;
//! use machsafe_core::harness::headless_engine;
//! use machsafe_logic::SafetyConfig;
//!
//! let mut engine = headless_engine();
//! let machine = engine.spawn_machine(
//!     "Thermomachine",
//!     Transform::anchored(MapId(0), Vec2::new(4.0, 2.0)),
//!     SafetyConfig::default(),
//! );
//!
//! loop {
//!     engine.tick();
//!     if engine.record(machine).is_none() {
//!         break;
//!     }
//! }
//! ```

pub mod components;
pub mod engine;
pub mod harness;
pub mod persistence;
pub mod services;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::SimulationEngine;
    pub use crate::services::{
        AlertChannel, EnvironmentSensor, ExplosionQueue, ExplosionRequest, SafetyServices,
        SensorError,
    };
}
