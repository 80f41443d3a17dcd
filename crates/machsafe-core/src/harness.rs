//! In-memory collaborators for headless runs and tests.
//!
//! `ScriptedSensor` replays whatever reading was last set for each machine,
//! `RadioLog` and `ExplosionLog` record what the monitor sent out.

use std::collections::HashMap;

use hecs::Entity;
use machsafe_logic::GasMixture;

use crate::components::MapCoordinates;
use crate::engine::SimulationEngine;
use crate::services::{AlertChannel, EnvironmentSensor, ExplosionQueue, ExplosionRequest, SensorError};

/// A scripted sensor response.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    Mixture(GasMixture),
    NoMixture,
    Fault(String),
}

/// Sensor that answers from a per-entity script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    readings: HashMap<Entity, SensorReading>,
    /// Answer for entities with no script entry. `None` means no mixture.
    fallback: Option<SensorReading>,
    /// Passive reads return no mixture while set.
    passive_missing: bool,
    excited: usize,
    passive: usize,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensor that reports `reading` for every entity.
    pub fn uniform(reading: SensorReading) -> Self {
        Self {
            fallback: Some(reading),
            ..Self::default()
        }
    }

    pub fn set(&mut self, entity: Entity, reading: SensorReading) {
        self.readings.insert(entity, reading);
    }

    pub fn set_fallback(&mut self, reading: SensorReading) {
        self.fallback = Some(reading);
    }

    /// Make passive (non-excited) reads come back empty.
    pub fn fail_passive(&mut self, missing: bool) {
        self.passive_missing = missing;
    }

    pub fn excited_samples(&self) -> usize {
        self.excited
    }

    pub fn passive_samples(&self) -> usize {
        self.passive
    }
}

impl EnvironmentSensor for ScriptedSensor {
    fn sample(
        &mut self,
        entity: Entity,
        _location: MapCoordinates,
        excite: bool,
    ) -> Result<Option<GasMixture>, SensorError> {
        if excite {
            self.excited += 1;
        } else {
            self.passive += 1;
            if self.passive_missing {
                return Ok(None);
            }
        }

        match self.readings.get(&entity).or(self.fallback.as_ref()) {
            Some(SensorReading::Mixture(mixture)) => Ok(Some(*mixture)),
            Some(SensorReading::NoMixture) | None => Ok(None),
            Some(SensorReading::Fault(reason)) => Err(SensorError::Fault(reason.clone())),
        }
    }
}

/// One transmitted radio message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioMessage {
    pub source: Entity,
    pub message: String,
    pub channel: String,
}

/// Records every broadcast.
#[derive(Debug, Clone, Default)]
pub struct RadioLog {
    pub messages: Vec<RadioMessage>,
}

impl RadioLog {
    /// Messages sent by one machine.
    pub fn from_source(&self, source: Entity) -> impl Iterator<Item = &RadioMessage> {
        self.messages.iter().filter(move |m| m.source == source)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl AlertChannel for RadioLog {
    fn broadcast(&mut self, source: Entity, message: &str, channel: &str) {
        self.messages.push(RadioMessage {
            source,
            message: message.to_string(),
            channel: channel.to_string(),
        });
    }
}

/// Records every queued explosion.
#[derive(Debug, Clone, Default)]
pub struct ExplosionLog {
    pub queued: Vec<ExplosionRequest>,
}

impl ExplosionQueue for ExplosionLog {
    fn queue_explosion(&mut self, request: ExplosionRequest) {
        self.queued.push(request);
    }
}

/// Engine wired to the in-memory collaborators.
pub type HeadlessEngine = SimulationEngine<ScriptedSensor, RadioLog, ExplosionLog>;

/// Headless engine whose sensor reports standard air at room temperature.
pub fn headless_engine() -> HeadlessEngine {
    SimulationEngine::new(
        ScriptedSensor::uniform(SensorReading::Mixture(GasMixture::standard(293.15))),
        RadioLog::default(),
        ExplosionLog::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{MapId, Vec2};
    use hecs::World;

    fn coords() -> MapCoordinates {
        MapCoordinates::new(MapId(0), Vec2::ZERO)
    }

    #[test]
    fn test_scripted_sensor_per_entity() {
        let mut world = World::new();
        let a = world.spawn((1u8,));
        let b = world.spawn((2u8,));
        let mut sensor = ScriptedSensor::new();
        sensor.set(a, SensorReading::Mixture(GasMixture::standard(300.0)));
        sensor.set(b, SensorReading::Fault("broken".into()));

        assert!(sensor.sample(a, coords(), true).unwrap().is_some());
        assert!(sensor.sample(b, coords(), true).is_err());
        assert_eq!(sensor.excited_samples(), 2);
    }

    #[test]
    fn test_unscripted_entity_uses_fallback() {
        let mut world = World::new();
        let a = world.spawn((1u8,));
        let mut sensor = ScriptedSensor::new();
        assert_eq!(sensor.sample(a, coords(), false).unwrap(), None);

        sensor.set_fallback(SensorReading::Mixture(GasMixture::standard(310.0)));
        let m = sensor.sample(a, coords(), false).unwrap().unwrap();
        assert_eq!(m.temperature, 310.0);
        assert_eq!(sensor.passive_samples(), 2);
    }
}
