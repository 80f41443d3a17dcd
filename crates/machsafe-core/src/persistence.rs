//! Save/Load functionality for monitored machines
//!
//! Uses bincode for binary serialization. Each machine's components are
//! serialized individually then respawned on load, so overheat timers,
//! warning flags and the alert throttle survive a restart.

use std::io::{Read, Write};
use std::time::Duration;

use hecs::World;
use machsafe_logic::SafetyRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::*;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the monitored machines
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub sim_time: Duration,
    pub time_scale: f32,
    pub machines: Vec<SerializableMachine>,
}

/// All components of one machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableMachine {
    pub name: Option<EntityName>,
    pub transform: Option<Transform>,
    pub power: Option<PowerReceiver>,
    pub config: MachineSafety,
    /// `None` if the machine was saved before its first tick
    pub record: Option<SafetyRecord>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Result of loading machines
pub struct LoadedMachines {
    pub world: World,
    pub sim_time: Duration,
    pub time_scale: f32,
}

/// Extract every configured, non-terminating machine
fn serialize_machines(world: &World) -> Vec<SerializableMachine> {
    world
        .query::<(
            &MachineSafety,
            Option<&EntityName>,
            Option<&Transform>,
            Option<&PowerReceiver>,
            Option<&SafetyRecord>,
        )>()
        .without::<&Terminating>()
        .iter()
        .map(|(_, (config, name, transform, power, record))| SerializableMachine {
            name: name.cloned(),
            transform: transform.copied(),
            power: power.copied(),
            config: config.clone(),
            record: record.cloned(),
        })
        .collect()
}

/// Spawn a machine with whichever components were saved
fn spawn_machine(world: &mut World, machine: SerializableMachine) {
    let entity = world.spawn((machine.config,));

    if let Some(c) = machine.name {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = machine.transform {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = machine.power {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = machine.record {
        let _ = world.insert_one(entity, c);
    }
}

/// Save all monitored machines to a writer
pub fn save_machines<W: Write>(
    writer: W,
    world: &World,
    sim_time: Duration,
    time_scale: f32,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        time_scale,
        machines: serialize_machines(world),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load machines from a reader into a fresh world
pub fn load_machines<R: Read>(reader: R) -> Result<LoadedMachines, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    for machine in save_data.machines {
        spawn_machine(&mut world, machine);
    }

    Ok(LoadedMachines {
        world,
        sim_time: save_data.sim_time,
        time_scale: save_data.time_scale,
    })
}
