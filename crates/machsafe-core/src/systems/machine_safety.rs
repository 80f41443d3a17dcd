//! Machine safety monitor - atmosphere interlock, overheat timer, meltdown.
//!
//! Runs once per tick over every anchored machine that carries a
//! `SafetyRecord` and a `PowerReceiver`:
//!
//! 1. Sample the surrounding mixture (excited read). Vacuum, a missing
//!    mixture, or a sensor failure all cut power; atmosphere restores it.
//! 2. If the machine has atmosphere and power, take a passive temperature
//!    sample and advance the overheat episode: critical temperature is an
//!    instant meltdown, anything above 320K accumulates one second per tick
//!    and walks the countdown ladder, cooling ends the episode.
//! 3. Alerts share one per-machine throttle window.
//! 4. Meltdown queues an explosion and deletes the machine.

use std::time::Duration;

use hecs::{Entity, World};
use machsafe_logic::atmosphere::has_atmosphere;
use machsafe_logic::blast::MELTDOWN_BLAST;
use machsafe_logic::{AlertKind, AtmosphereTransition, SafetyRecord};

use super::lifecycle::DeletionQueue;
use crate::components::{
    EntityName, MachineSafety, MapCoordinates, PowerReceiver, Terminating, Transform,
};
use crate::services::{AlertChannel, ExplosionRequest, SafetyServices};

/// Per-machine facts resolved before evaluation.
struct MachineContext {
    entity: Entity,
    name: String,
    location: MapCoordinates,
    now: Duration,
}

/// What the evaluation decided for this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Continue,
    Meltdown,
}

/// Summary of one monitor pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyTickReport {
    /// Machines that passed the eligibility filter
    pub evaluated: usize,
    /// Machines that melted down this tick
    pub meltdowns: usize,
}

/// Display name used in alerts and logs.
fn display_name(entity: Entity, name: Option<&EntityName>) -> String {
    name.map(|n| n.as_str().to_string())
        .unwrap_or_else(|| format!("{:?}", entity))
}

/// Attach a fresh `SafetyRecord` to configured machines that lack one.
///
/// Returns how many records were seeded.
pub fn init_machine_safety(world: &mut World) -> usize {
    let pending: Vec<(Entity, String, SafetyRecord)> = world
        .query::<(&MachineSafety, Option<&EntityName>)>()
        .without::<&SafetyRecord>()
        .iter()
        .map(|(entity, (safety, name))| {
            let config = match safety.0.validate() {
                Ok(()) => safety.0.clone(),
                Err(e) => {
                    log::warn!(
                        "Machine {}: invalid safety config ({}), using defaults for bad fields",
                        display_name(entity, name),
                        e
                    );
                    safety.0.sanitized()
                }
            };
            (
                entity,
                display_name(entity, name),
                SafetyRecord::from_config(&config),
            )
        })
        .collect();

    let seeded = pending.len();
    for (entity, name, record) in pending {
        log::debug!(
            "Machine safety initialized for {}. Critical: {:.0}K, max overheat time: {}s",
            name,
            record.critical_temperature(),
            record.max_overheat().as_secs_f32()
        );
        let _ = world.insert_one(entity, record);
    }
    seeded
}

/// Evaluate every eligible machine once.
///
/// `now` is the simulation clock, used only for the alert throttle. The
/// overheat timer advances a fixed second per call.
pub fn machine_safety_system(
    world: &mut World,
    services: &mut SafetyServices<'_>,
    deletions: &mut DeletionQueue,
    now: Duration,
) -> SafetyTickReport {
    // Collect first: meltdown needs the world mutably mid-pass
    let eligible: Vec<MachineContext> = world
        .query::<(&SafetyRecord, &PowerReceiver, &Transform, Option<&EntityName>)>()
        .without::<&Terminating>()
        .iter()
        .filter(|(_, (_, _, xform, _))| xform.anchored)
        .filter_map(|(entity, (_, _, xform, name))| {
            let location = xform.map_coordinates()?;
            Some(MachineContext {
                entity,
                name: display_name(entity, name),
                location,
                now,
            })
        })
        .collect();

    let mut report = SafetyTickReport::default();

    for ctx in eligible {
        // Companion data can vanish mid-tick; skip and retry next tick
        let Ok((record, power)) =
            world.query_one_mut::<(&mut SafetyRecord, &mut PowerReceiver)>(ctx.entity)
        else {
            continue;
        };
        report.evaluated += 1;

        check_atmosphere(&ctx, record, power, services);

        let verdict = if record.has_atmosphere() && power.is_powered() {
            check_overheat(&ctx, record, services)
        } else {
            Verdict::Continue
        };

        if verdict == Verdict::Meltdown {
            trigger_meltdown(world, &ctx, services, deletions);
            report.meltdowns += 1;
        }
    }

    report
}

/// Step 1: excited read, then apply the atmosphere/power interlock.
fn check_atmosphere(
    ctx: &MachineContext,
    record: &mut SafetyRecord,
    power: &mut PowerReceiver,
    services: &mut SafetyServices<'_>,
) {
    let reading = services.sensor.sample(ctx.entity, ctx.location, true);

    match &reading {
        Err(e) => log::error!("Error checking atmosphere for {}: {}", ctx.name, e),
        Ok(None) => log::warn!("Machine {}: sensor returned no mixture", ctx.name),
        Ok(Some(mixture)) => {
            log::debug!(
                "Machine {} atmos: {:.1} kPa, {:.1}K ({:.1}C), {:.3} mol",
                ctx.name,
                mixture.pressure,
                mixture.temperature,
                mixture.celsius(),
                mixture.total_moles
            );
            if mixture.is_low_pressure() {
                log::debug!("Machine {}: low pressure {:.1} kPa", ctx.name, mixture.pressure);
            }
            if mixture.is_thin() {
                log::debug!("Machine {}: low gas content {:.3} mol", ctx.name, mixture.total_moles);
            }
        }
    }

    set_atmosphere_state(ctx, record, power, has_atmosphere(&reading), services.radio);
}

fn set_atmosphere_state(
    ctx: &MachineContext,
    record: &mut SafetyRecord,
    power: &mut PowerReceiver,
    present: bool,
    radio: &mut dyn AlertChannel,
) {
    let transition = record.set_atmosphere(present);

    if present {
        if power.power_disabled {
            log::info!("Machine {}: POWER ON - atmosphere restored", ctx.name);
            power.power_disabled = false;

            if transition == AtmosphereTransition::Restored {
                emit_alert(ctx, record, AlertKind::AtmosphereRestored, radio);
                record.reset_warnings();
            }
        }
        return;
    }

    if !power.power_disabled {
        log::warn!("Machine {}: POWER OFF - vacuum detected", ctx.name);
        power.power_disabled = true;

        if transition == AtmosphereTransition::Lost {
            emit_alert(ctx, record, AlertKind::VacuumShutdown, radio);
        }
    }

    // Vacuum suppresses the overheat hazard outright
    if record.end_overheat() {
        log::info!("Machine {}: overheat stopped due to power loss", ctx.name);
    }
}

/// Step 2: passive temperature read and the overheat episode.
fn check_overheat(
    ctx: &MachineContext,
    record: &mut SafetyRecord,
    services: &mut SafetyServices<'_>,
) -> Verdict {
    let mixture = match services.sensor.sample(ctx.entity, ctx.location, false) {
        Ok(Some(mixture)) => mixture,
        Ok(None) => return Verdict::Continue,
        Err(e) => {
            log::warn!("Machine {}: temperature read failed: {}", ctx.name, e);
            return Verdict::Continue;
        }
    };
    if !mixture.has_valid_temperature() {
        log::warn!(
            "Machine {}: unusable temperature reading {}",
            ctx.name,
            mixture.temperature
        );
        return Verdict::Continue;
    }
    let temperature = mixture.temperature;

    log::debug!(
        "Machine {} overheat check: temp={:.1}K, timer={}s",
        ctx.name,
        temperature,
        record.overheat_elapsed().as_secs()
    );

    if temperature > record.critical_temperature() {
        log::error!("Machine {}: CRITICAL OVERHEAT - {:.1}K", ctx.name, temperature);
        emit_alert(ctx, record, AlertKind::Meltdown, services.radio);
        return Verdict::Meltdown;
    }

    if mixture.is_cool() {
        if record.is_overheating() {
            log::info!("Machine {}: cooling restored", ctx.name);
            emit_alert(ctx, record, AlertKind::CoolingRestored, services.radio);
            record.end_overheat();
        }
        return Verdict::Continue;
    }

    if record.begin_overheat() {
        log::warn!("Machine {}: overheating started - {:.1}K", ctx.name, temperature);
        emit_alert(ctx, record, AlertKind::OverheatStarted, services.radio);
    }

    record.accumulate_overheat();

    if let Some(warning) = record.take_due_warning() {
        log::warn!("Machine {}: {} until meltdown", ctx.name, warning.label());
        emit_alert(ctx, record, AlertKind::Countdown(warning), services.radio);
    }

    if record.overheat_expired() {
        log::error!(
            "Machine {}: MELTDOWN - overheating for {}s",
            ctx.name,
            record.overheat_elapsed().as_secs()
        );
        emit_alert(ctx, record, AlertKind::Meltdown, services.radio);
        return Verdict::Meltdown;
    }

    Verdict::Continue
}

/// Step 3: throttled broadcast. Returns true if the message went out.
fn emit_alert(
    ctx: &MachineContext,
    record: &mut SafetyRecord,
    kind: AlertKind,
    radio: &mut dyn AlertChannel,
) -> bool {
    if !record.try_claim_alert(ctx.now) {
        log::debug!("Machine {}: alert {} throttled", ctx.name, kind.key());
        return false;
    }

    let message = kind.render(&ctx.name);
    radio.broadcast(ctx.entity, &message, record.alert_channel());
    log::info!("Radio [{}]: {}", record.alert_channel(), message);
    true
}

/// Step 4: final alert attempt, explosion, deletion.
fn trigger_meltdown(
    world: &mut World,
    ctx: &MachineContext,
    services: &mut SafetyServices<'_>,
    deletions: &mut DeletionQueue,
) {
    log::error!(
        "Machine {}: MELTDOWN TRIGGERED, blast radius ~{:.0} tiles",
        ctx.name,
        MELTDOWN_BLAST.approximate_radius()
    );

    if let Ok(mut record) = world.get::<&mut SafetyRecord>(ctx.entity) {
        emit_alert(ctx, &mut record, AlertKind::Meltdown, services.radio);
    }

    let location = world
        .get::<&Transform>(ctx.entity)
        .ok()
        .and_then(|xform| xform.map_coordinates())
        .unwrap_or(ctx.location);

    services.explosions.queue_explosion(ExplosionRequest {
        location,
        profile: MELTDOWN_BLAST,
        cause: ctx.entity,
    });

    deletions.queue_delete(world, ctx.entity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{MapId, Vec2};
    use crate::harness::{ExplosionLog, RadioLog, ScriptedSensor, SensorReading};
    use machsafe_logic::{GasMixture, SafetyConfig, SafetyStatus};

    struct Rig {
        world: World,
        sensor: ScriptedSensor,
        radio: RadioLog,
        explosions: ExplosionLog,
        deletions: DeletionQueue,
        machine: Entity,
        now: Duration,
    }

    impl Rig {
        fn new(config: SafetyConfig) -> Self {
            let mut world = World::new();
            let machine = world.spawn((
                EntityName::new("Thermomachine"),
                Transform::anchored(MapId(1), Vec2::new(2.0, 3.0)),
                PowerReceiver::powered(),
                MachineSafety(config),
            ));
            init_machine_safety(&mut world);
            let mut sensor = ScriptedSensor::new();
            sensor.set(machine, SensorReading::Mixture(GasMixture::standard(293.15)));
            Self {
                world,
                sensor,
                radio: RadioLog::default(),
                explosions: ExplosionLog::default(),
                deletions: DeletionQueue::new(),
                machine,
                now: Duration::ZERO,
            }
        }

        fn temperature(&mut self, kelvin: f32) {
            self.sensor
                .set(self.machine, SensorReading::Mixture(GasMixture::standard(kelvin)));
        }

        fn tick(&mut self) -> SafetyTickReport {
            let mut services =
                SafetyServices::new(&mut self.sensor, &mut self.radio, &mut self.explosions);
            let report =
                machine_safety_system(&mut self.world, &mut services, &mut self.deletions, self.now);
            self.deletions.flush(&mut self.world);
            self.now += Duration::from_secs(1);
            report
        }

        fn record(&self) -> SafetyRecord {
            (*self.world.get::<&SafetyRecord>(self.machine).unwrap()).clone()
        }

        fn power(&self) -> PowerReceiver {
            *self.world.get::<&PowerReceiver>(self.machine).unwrap()
        }
    }

    #[test]
    fn test_init_seeds_record_once() {
        let mut world = World::new();
        let e = world.spawn((MachineSafety(SafetyConfig::default()),));
        assert_eq!(init_machine_safety(&mut world), 1);
        assert_eq!(init_machine_safety(&mut world), 0);
        let record = world.get::<&SafetyRecord>(e).unwrap();
        assert_eq!(record.status(), SafetyStatus::Normal);
    }

    #[test]
    fn test_invalid_config_is_seeded_with_defaults() {
        let mut rig = Rig::new(SafetyConfig::new().with_critical_temperature(300.0));
        assert_eq!(rig.record().critical_temperature(), 423.0);

        rig.temperature(310.0);
        rig.tick();
        assert!(rig.world.contains(rig.machine));
        assert!(rig.explosions.queued.is_empty());
        assert!(!rig.record().is_overheating());
    }

    #[test]
    fn test_normal_machine_is_quiet() {
        let mut rig = Rig::new(SafetyConfig::default());
        for _ in 0..20 {
            rig.tick();
        }
        assert!(rig.radio.messages.is_empty());
        assert!(!rig.record().is_overheating());
        assert!(rig.power().is_powered());
    }

    #[test]
    fn test_unanchored_machine_is_skipped() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.world
            .insert_one(rig.machine, Transform::unanchored(MapId(1), Vec2::ZERO))
            .unwrap();
        rig.temperature(500.0);
        let report = rig.tick();
        assert_eq!(report.evaluated, 0);
        assert!(rig.world.contains(rig.machine));
        assert_eq!(rig.sensor.excited_samples(), 0);
    }

    #[test]
    fn test_machine_without_power_receiver_is_skipped() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.world.remove_one::<PowerReceiver>(rig.machine).unwrap();
        rig.temperature(500.0);
        assert_eq!(rig.tick().evaluated, 0);
        assert!(rig.world.contains(rig.machine));
    }

    #[test]
    fn test_vacuum_cuts_power_and_alerts() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.sensor.set(rig.machine, SensorReading::NoMixture);
        rig.tick();
        assert!(!rig.power().is_powered());
        assert_eq!(rig.record().status(), SafetyStatus::Vacuum);
        assert_eq!(rig.radio.messages.len(), 1);
        assert!(rig.radio.messages[0].message.contains("vacuum"));
        assert_eq!(rig.radio.messages[0].channel, "Engineering");
    }

    #[test]
    fn test_sensor_fault_is_treated_as_vacuum() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.sensor
            .set(rig.machine, SensorReading::Fault("grid offline".into()));
        rig.tick();
        assert!(!rig.power().is_powered());
        assert!(!rig.record().has_atmosphere());
    }

    #[test]
    fn test_restoration_enables_power() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.sensor.set(rig.machine, SensorReading::NoMixture);
        rig.tick();
        // Past the throttle window
        rig.now += Duration::from_secs(20);
        rig.temperature(293.15);
        rig.tick();
        assert!(rig.power().is_powered());
        assert_eq!(rig.radio.messages.len(), 2);
        assert!(rig.radio.messages[1].message.contains("restored"));
    }

    #[test]
    fn test_monitor_reclaims_externally_disabled_power() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.world
            .insert_one(rig.machine, PowerReceiver::disabled())
            .unwrap();
        rig.tick();
        assert!(rig.power().is_powered());
        // Atmosphere never went away, so no restoration alert
        assert!(rig.radio.messages.is_empty());
    }

    #[test]
    fn test_critical_temperature_is_instant() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.temperature(430.0);
        let report = rig.tick();
        assert_eq!(report.meltdowns, 1);
        assert!(!rig.world.contains(rig.machine));
        assert_eq!(rig.explosions.queued.len(), 1);
        let blast = &rig.explosions.queued[0];
        assert_eq!(blast.cause, rig.machine);
        assert_eq!(blast.location.position, Vec2::new(2.0, 3.0));
        assert_eq!(blast.profile, MELTDOWN_BLAST);
        // Reason alert sent, final attempt throttled
        assert_eq!(rig.radio.messages.len(), 1);
        assert!(rig.radio.messages[0].message.contains("MELTDOWN"));
    }

    #[test]
    fn test_vacuum_suppresses_critical_meltdown() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.sensor.set(
            rig.machine,
            SensorReading::Mixture(GasMixture::new(1.0, 900.0, 0.001)),
        );
        rig.tick();
        assert!(rig.world.contains(rig.machine));
        assert!(rig.explosions.queued.is_empty());
    }

    #[test]
    fn test_overheat_episode_and_cooling() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.temperature(350.0);
        rig.tick();
        let r = rig.record();
        assert!(r.is_overheating());
        assert_eq!(r.overheat_elapsed(), Duration::from_secs(1));
        assert!(rig.radio.messages[0].message.contains("overheating"));

        for _ in 0..14 {
            rig.tick();
        }
        assert_eq!(rig.record().overheat_elapsed(), Duration::from_secs(15));

        rig.temperature(300.0);
        rig.tick();
        let r = rig.record();
        assert!(!r.is_overheating());
        assert_eq!(r.overheat_elapsed(), Duration::ZERO);
        assert_eq!(rig.radio.messages.len(), 2);
        assert!(rig.radio.messages[1].message.contains("cooling restored"));
    }

    #[test]
    fn test_nan_atmosphere_cuts_power() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.sensor.set(
            rig.machine,
            SensorReading::Mixture(GasMixture::new(f32::NAN, 293.0, f32::NAN)),
        );
        rig.tick();
        assert!(!rig.record().has_atmosphere());
        assert!(!rig.power().is_powered());
    }

    #[test]
    fn test_nan_temperature_keeps_overheat_episode() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.temperature(350.0);
        for _ in 0..100 {
            rig.tick();
        }
        let sent = rig.radio.messages.len();

        rig.temperature(f32::NAN);
        rig.now += Duration::from_secs(20);
        rig.tick();
        let r = rig.record();
        assert!(r.is_overheating());
        assert_eq!(r.overheat_elapsed(), Duration::from_secs(100));
        assert_eq!(rig.radio.messages.len(), sent);
        assert!(rig.world.contains(rig.machine));

        rig.temperature(350.0);
        rig.tick();
        assert_eq!(rig.record().overheat_elapsed(), Duration::from_secs(101));
    }

    #[test]
    fn test_passive_read_missing_skips_evaluation() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.temperature(350.0);
        rig.tick();
        rig.sensor.fail_passive(true);
        rig.tick();
        assert_eq!(rig.record().overheat_elapsed(), Duration::from_secs(1));
        assert!(rig.record().is_overheating());
    }

    #[test]
    fn test_excited_then_passive_reads() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.tick();
        assert_eq!(rig.sensor.excited_samples(), 1);
        assert_eq!(rig.sensor.passive_samples(), 1);

        rig.sensor.set(rig.machine, SensorReading::NoMixture);
        rig.tick();
        assert_eq!(rig.sensor.excited_samples(), 2);
        assert_eq!(rig.sensor.passive_samples(), 1);
    }

    #[test]
    fn test_terminating_machine_is_skipped() {
        let mut rig = Rig::new(SafetyConfig::default());
        rig.world.insert_one(rig.machine, Terminating).unwrap();
        rig.temperature(500.0);
        let mut services =
            SafetyServices::new(&mut rig.sensor, &mut rig.radio, &mut rig.explosions);
        let report =
            machine_safety_system(&mut rig.world, &mut services, &mut rig.deletions, rig.now);
        assert_eq!(report.evaluated, 0);
        assert!(rig.explosions.queued.is_empty());
    }
}
