//! Simulation engine - main entry point for running the safety monitor

use std::io::{Read, Write};
use std::time::Duration;

use hecs::{Entity, World};
use machsafe_logic::{SafetyConfig, SafetyRecord};

use crate::components::*;
use crate::persistence::{self, SaveError};
use crate::services::{AlertChannel, EnvironmentSensor, ExplosionQueue, SafetyServices};
use crate::systems::*;

/// Main simulation engine, generic over the host collaborators
pub struct SimulationEngine<S, R, X> {
    /// ECS world containing all entities
    pub world: World,
    /// Environment sensor
    pub sensor: S,
    /// Alert radio channel
    pub radio: R,
    /// Explosion executor
    pub explosions: X,
    /// Entities to despawn at the end of the tick
    deletions: DeletionQueue,
    /// Simulation clock
    sim_time: Duration,
    ticks: u64,
    time_scale: f32,
}

impl<S, R, X> SimulationEngine<S, R, X>
where
    S: EnvironmentSensor,
    R: AlertChannel,
    X: ExplosionQueue,
{
    /// Create an empty simulation around the given collaborators
    pub fn new(sensor: S, radio: R, explosions: X) -> Self {
        Self {
            world: World::new(),
            sensor,
            radio,
            explosions,
            deletions: DeletionQueue::new(),
            sim_time: Duration::ZERO,
            ticks: 0,
            time_scale: 1.0,
        }
    }

    /// Place an anchored, powered machine with safety limits from `config`.
    ///
    /// Its `SafetyRecord` is seeded on the next update.
    pub fn spawn_machine(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        config: SafetyConfig,
    ) -> Entity {
        self.world.spawn((
            EntityName::new(name),
            transform,
            PowerReceiver::powered(),
            MachineSafety(config),
        ))
    }

    /// Advance the clock by `delta_seconds` and run one monitor tick.
    pub fn update(&mut self, delta_seconds: f32) -> SafetyTickReport {
        let scaled = delta_seconds * self.time_scale;
        self.sim_time += Duration::try_from_secs_f32(scaled).unwrap_or(Duration::ZERO);
        self.ticks += 1;

        init_machine_safety(&mut self.world);

        let mut services =
            SafetyServices::new(&mut self.sensor, &mut self.radio, &mut self.explosions);
        let report = machine_safety_system(
            &mut self.world,
            &mut services,
            &mut self.deletions,
            self.sim_time,
        );

        let removed = self.deletions.flush(&mut self.world);
        if removed > 0 {
            log::info!("Tick {}: removed {} destroyed machine(s)", self.ticks, removed);
        }
        report
    }

    /// One-second tick.
    pub fn tick(&mut self) -> SafetyTickReport {
        self.update(1.0)
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Current simulation time
    pub fn sim_time(&self) -> Duration {
        self.sim_time
    }

    /// Number of updates run so far
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Snapshot of a machine's safety record
    pub fn record(&self, machine: Entity) -> Option<SafetyRecord> {
        self.world
            .get::<&SafetyRecord>(machine)
            .ok()
            .map(|r| (*r).clone())
    }

    pub fn is_powered(&self, machine: Entity) -> Option<bool> {
        self.world
            .get::<&PowerReceiver>(machine)
            .ok()
            .map(|p| p.is_powered())
    }

    /// Count machines under safety monitoring
    pub fn machine_count(&self) -> usize {
        self.world.query::<&MachineSafety>().iter().count()
    }

    /// Save all monitored machines and the clock to a writer
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_machines(writer, &self.world, self.sim_time, self.time_scale)
    }

    /// Replace the world with machines loaded from a reader
    pub fn load<Rd: Read>(&mut self, reader: Rd) -> Result<(), SaveError> {
        let loaded = persistence::load_machines(reader)?;
        self.world = loaded.world;
        self.sim_time = loaded.sim_time;
        self.time_scale = loaded.time_scale;
        self.deletions = DeletionQueue::new();
        Ok(())
    }
}
