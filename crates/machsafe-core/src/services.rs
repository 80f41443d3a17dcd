//! Collaborator contracts the safety monitor calls out to.
//!
//! The host owns the real atmosphere simulation, radio network and explosion
//! system. The monitor only sees these narrow traits, invoked synchronously
//! from inside its tick.

use hecs::Entity;
use machsafe_logic::blast::BlastProfile;
use machsafe_logic::GasMixture;
use thiserror::Error;

use crate::components::MapCoordinates;

/// Failure reported by an environment sensor.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no atmosphere grid for map {0:?}")]
    NoGrid(crate::components::MapId),

    #[error("tile at ({x}, {y}) is not simulated")]
    TileUnavailable { x: f32, y: f32 },

    #[error("sensor fault: {0}")]
    Fault(String),
}

/// Reads the gas mixture around an entity.
pub trait EnvironmentSensor {
    /// `excite` wakes the mixture for this read; passive samples pass false.
    fn sample(
        &mut self,
        entity: Entity,
        location: MapCoordinates,
        excite: bool,
    ) -> Result<Option<GasMixture>, SensorError>;
}

/// Fire-and-forget radio broadcast.
pub trait AlertChannel {
    fn broadcast(&mut self, source: Entity, message: &str, channel: &str);
}

/// A queued explosion, executed later by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionRequest {
    pub location: MapCoordinates,
    pub profile: BlastProfile,
    /// Entity the blast is attributed to.
    pub cause: Entity,
}

/// Destructive-event executor.
pub trait ExplosionQueue {
    fn queue_explosion(&mut self, request: ExplosionRequest);
}

/// Borrowed bundle of collaborators for one monitor pass.
pub struct SafetyServices<'a> {
    pub sensor: &'a mut dyn EnvironmentSensor,
    pub radio: &'a mut dyn AlertChannel,
    pub explosions: &'a mut dyn ExplosionQueue,
}

impl<'a> SafetyServices<'a> {
    pub fn new(
        sensor: &'a mut dyn EnvironmentSensor,
        radio: &'a mut dyn AlertChannel,
        explosions: &'a mut dyn ExplosionQueue,
    ) -> Self {
        Self {
            sensor,
            radio,
            explosions,
        }
    }
}
