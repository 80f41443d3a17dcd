//! MachSafe Headless Simulation Harness
//!
//! Replays machine-safety hazard scenarios against the engine with in-memory
//! collaborators. Runs entirely in-process — no host, no networking.
//!
//! Usage:
//!   cargo run -p machsafe-simtest
//!   cargo run -p machsafe-simtest -- --verbose

use std::time::Duration;

use hecs::Entity;
use machsafe_core::components::{MapId, Transform, Vec2};
use machsafe_core::harness::{headless_engine, HeadlessEngine, SensorReading};
use machsafe_logic::config::load_prototypes;
use machsafe_logic::{GasMixture, SafetyConfig, SafetyStatus, Warning, WarningFlags};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Machine prototypes (same JSON a host would load) ────────────────────
const PROTOTYPES_JSON: &str = include_str!("../../../data/machine_prototypes.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== MachSafe Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Prototype configs
    results.extend(validate_prototypes(verbose));

    // 2. Sustained overheat
    results.extend(validate_sustained_overheat(verbose));

    // 3. Critical temperature
    results.extend(validate_critical_jump(verbose));

    // 4. Atmosphere loss and restoration
    results.extend(validate_vacuum_blip(verbose));

    // 5. Warning ladder
    results.extend(validate_warning_ladder(verbose));

    // 6. Alert throttle
    results.extend(validate_throttle(verbose));

    // 7. Randomized temperature walks
    results.extend(validate_random_walks(verbose));

    // 8. Save/load
    results.extend(validate_persistence(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn place(engine: &mut HeadlessEngine, name: &str, config: SafetyConfig) -> Entity {
    let x = engine.machine_count() as f32;
    engine.spawn_machine(name, Transform::anchored(MapId(0), Vec2::new(x, 0.0)), config)
}

/// Config of a named prototype from the bundled JSON.
fn prototype(id: &str) -> Option<SafetyConfig> {
    load_prototypes(PROTOTYPES_JSON).ok()?.remove(id)
}

fn heat(engine: &mut HeadlessEngine, machine: Entity, kelvin: f32) {
    engine
        .sensor
        .set(machine, SensorReading::Mixture(GasMixture::standard(kelvin)));
}

fn elapsed(engine: &HeadlessEngine, machine: Entity) -> u64 {
    engine
        .record(machine)
        .map(|r| r.overheat_elapsed().as_secs())
        .unwrap_or(0)
}

// ── 1. Prototypes ───────────────────────────────────────────────────────

fn validate_prototypes(verbose: bool) -> Vec<TestResult> {
    println!("--- Machine Prototypes ---");
    let mut results = Vec::new();

    let protos = match load_prototypes(PROTOTYPES_JSON) {
        Ok(p) => p,
        Err(e) => {
            results.push(check("prototypes_parse", false, format!("{}", e)));
            return results;
        }
    };

    results.push(check(
        "prototypes_not_empty",
        !protos.is_empty(),
        format!("{} prototypes loaded", protos.len()),
    ));

    let defaulted = protos
        .values()
        .filter(|c| c.alert_channel == "Engineering")
        .count();
    results.push(check(
        "prototypes_channel_defaults",
        defaulted >= 1,
        format!("{} prototypes on Engineering", defaulted),
    ));

    // Alerts follow the prototype's channel
    if let Some(config) = protos.get("ChemMaster") {
        let mut engine = headless_engine();
        let m = place(&mut engine, "ChemMaster", config.clone());
        heat(&mut engine, m, 350.0);
        engine.tick();
        let channel = engine.radio.messages.first().map(|msg| msg.channel.clone());
        results.push(check(
            "prototype_alert_channel",
            channel.as_deref() == Some("Medical"),
            format!("first alert on {:?}", channel),
        ));
    }

    // Shorter prototype budget melts down sooner
    if let Some(config) = protos.get("Recycler") {
        let budget = config.max_overheat_seconds as u32;
        let mut engine = headless_engine();
        let m = place(&mut engine, "Recycler", config.clone());
        heat(&mut engine, m, 350.0);
        let mut meltdown_tick = None;
        for tick in 1..=budget + 10 {
            if engine.tick().meltdowns > 0 {
                meltdown_tick = Some(tick);
                break;
            }
        }
        results.push(check(
            "prototype_overheat_budget",
            meltdown_tick == Some(budget + 1),
            format!("budget {}s, meltdown on tick {:?}", budget, meltdown_tick),
        ));
    }

    if verbose {
        for (id, c) in &protos {
            println!(
                "  {:<14} critical={:.0}K budget={:.0}s channel={}",
                id, c.critical_temperature, c.max_overheat_seconds, c.alert_channel
            );
        }
    }

    results
}

// ── 2. Sustained overheat ───────────────────────────────────────────────

fn validate_sustained_overheat(_verbose: bool) -> Vec<TestResult> {
    println!("--- Sustained Overheat ---");
    let mut results = Vec::new();
    let Some(config) = prototype("Thermomachine") else {
        results.push(check("overheat_prototype", false, "Thermomachine prototype missing"));
        return results;
    };
    let mut engine = headless_engine();
    let m = place(&mut engine, "Thermomachine", config);
    heat(&mut engine, m, 350.0);

    let mut meltdown_tick = None;
    for tick in 1..=700u32 {
        if engine.tick().meltdowns > 0 {
            meltdown_tick = Some(tick);
            break;
        }
    }

    results.push(check(
        "overheat_meltdown_tick",
        meltdown_tick == Some(601),
        format!("meltdown on tick {:?}", meltdown_tick),
    ));
    results.push(check(
        "overheat_explosion_queued",
        engine.explosions.queued.len() == 1,
        format!("{} explosions queued", engine.explosions.queued.len()),
    ));
    results.push(check(
        "overheat_countdown_messages",
        engine.radio.messages.len() == 7,
        format!("{} radio messages", engine.radio.messages.len()),
    ));

    results
}

// ── 3. Critical temperature ─────────────────────────────────────────────

fn validate_critical_jump(_verbose: bool) -> Vec<TestResult> {
    println!("--- Critical Temperature ---");
    let mut results = Vec::new();
    let mut engine = headless_engine();
    let m = place(&mut engine, "SpaceHeater", SafetyConfig::default());

    heat(&mut engine, m, 300.0);
    engine.tick();
    heat(&mut engine, m, 430.0);
    let report = engine.tick();

    results.push(check(
        "critical_instant_meltdown",
        report.meltdowns == 1 && engine.record(m).is_none(),
        format!("{} meltdowns on the jump tick", report.meltdowns),
    ));

    // Vacuum suppresses even a critical reading
    let mut engine = headless_engine();
    let m = place(&mut engine, "SpaceHeater", SafetyConfig::default());
    engine
        .sensor
        .set(m, SensorReading::Mixture(GasMixture::new(0.5, 900.0, 0.001)));
    let report = engine.tick();
    results.push(check(
        "critical_suppressed_in_vacuum",
        report.meltdowns == 0 && engine.is_powered(m) == Some(false),
        "hot thin gas cuts power instead of melting down",
    ));

    results
}

// ── 4. Vacuum blip ──────────────────────────────────────────────────────

fn validate_vacuum_blip(_verbose: bool) -> Vec<TestResult> {
    println!("--- Atmosphere Loss ---");
    let mut results = Vec::new();
    let mut engine = headless_engine();
    let m = place(&mut engine, "Thermomachine", SafetyConfig::default());

    heat(&mut engine, m, 350.0);
    for _ in 0..50 {
        engine.tick();
    }
    let before = elapsed(&engine, m);

    engine.sensor.set(m, SensorReading::NoMixture);
    engine.tick();
    let status = engine.record(m).map(|r| r.status());
    let during = elapsed(&engine, m);

    heat(&mut engine, m, 350.0);
    engine.tick();
    let after = elapsed(&engine, m);

    results.push(check(
        "vacuum_resets_timer",
        before == 50 && during == 0 && status == Some(SafetyStatus::Vacuum),
        format!("elapsed {}s -> {}s in vacuum", before, during),
    ));
    results.push(check(
        "vacuum_fresh_episode",
        after == 1 && engine.is_powered(m) == Some(true),
        format!("elapsed {}s after restoration", after),
    ));

    results
}

// ── 5. Warning ladder ───────────────────────────────────────────────────

fn validate_warning_ladder(_verbose: bool) -> Vec<TestResult> {
    println!("--- Warning Ladder ---");
    let mut results = Vec::new();

    let mut flags = WarningFlags::default();
    let before = flags.next_due(Duration::from_secs(310));
    let jump = flags.next_due(Duration::from_secs(295));
    results.push(check(
        "ladder_large_jump_single_rung",
        before.is_none() && jump == Some(Warning::FiveMinutes),
        format!("{:?} then {:?}", before, jump),
    ));

    let mut drained = Vec::new();
    while let Some(w) = flags.next_due(Duration::ZERO) {
        flags.set(w);
        drained.push(w);
    }
    results.push(check(
        "ladder_one_rung_per_tick",
        drained == Warning::LADDER.to_vec(),
        format!("{} rungs in order", drained.len()),
    ));

    results
}

// ── 6. Throttle ─────────────────────────────────────────────────────────

fn throttle_case(gap_ticks: u32) -> usize {
    let mut engine = headless_engine();
    let m = place(&mut engine, "Protolathe", SafetyConfig::default());
    engine.sensor.set(m, SensorReading::NoMixture);
    engine.tick();
    for _ in 1..gap_ticks {
        engine.tick();
    }
    heat(&mut engine, m, 293.0);
    engine.tick();
    engine.radio.messages.len()
}

fn validate_throttle(_verbose: bool) -> Vec<TestResult> {
    println!("--- Alert Throttle ---");
    let three = throttle_case(3);
    let eleven = throttle_case(11);
    vec![
        check("throttle_3s_collapses", three == 1, format!("{} messages", three)),
        check("throttle_11s_both_sent", eleven == 2, format!("{} messages", eleven)),
    ]
}

// ── 7. Random walks ─────────────────────────────────────────────────────

fn validate_random_walks(verbose: bool) -> Vec<TestResult> {
    println!("--- Random Temperature Walks ---");
    let mut rng = StdRng::seed_from_u64(42);
    let mut engine = headless_engine();

    let machines: Vec<(Entity, f32)> = (0..32)
        .map(|i| {
            let m = place(&mut engine, &format!("Machine-{}", i), SafetyConfig::default());
            (m, rng.gen_range(280.0f32..330.0))
        })
        .collect();
    let mut temps: Vec<f32> = machines.iter().map(|(_, t)| *t).collect();

    let mut violations = Vec::new();
    let mut meltdowns = 0;

    for tick in 0..2000 {
        let before: Vec<Option<u64>> = machines
            .iter()
            .map(|(m, _)| engine.record(*m).map(|r| r.overheat_elapsed().as_secs()))
            .collect();

        for (i, (m, _)) in machines.iter().enumerate() {
            temps[i] = (temps[i] + rng.gen_range(-3.0f32..3.0)).clamp(250.0, 440.0);
            if rng.gen_bool(0.01) {
                engine.sensor.set(*m, SensorReading::NoMixture);
            } else {
                heat(&mut engine, *m, temps[i]);
            }
        }

        meltdowns += engine.tick().meltdowns;

        for (i, (m, _)) in machines.iter().enumerate() {
            let Some(record) = engine.record(*m) else {
                continue;
            };
            let now = record.overheat_elapsed().as_secs();
            let prev = before[i].unwrap_or(0);
            if now != 0 && now != prev + 1 {
                violations.push(format!("tick {}: {:?} timer {} -> {}", tick, m, prev, now));
            }
            if !record.is_overheating() && now != 0 {
                violations.push(format!("tick {}: {:?} idle with timer {}", tick, m, now));
            }
        }
    }

    if verbose {
        println!("  {} meltdowns across {} machines", meltdowns, machines.len());
    }

    vec![check(
        "walk_timer_invariants",
        violations.is_empty(),
        if violations.is_empty() {
            format!("2000 ticks clean, {} meltdowns", meltdowns)
        } else {
            violations[..violations.len().min(5)].join("; ")
        },
    )]
}

// ── 8. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Save/Load ---");
    let mut engine = headless_engine();
    let m = place(&mut engine, "ChemMaster", SafetyConfig::default());
    heat(&mut engine, m, 340.0);
    for _ in 0..25 {
        engine.tick();
    }

    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        return vec![check("persist_save", false, format!("{}", e))];
    }

    let mut loaded = headless_engine();
    if let Err(e) = loaded.load(&buffer[..]) {
        return vec![check("persist_load", false, format!("{}", e))];
    }

    let timers: Vec<u64> = loaded
        .world
        .query::<&machsafe_logic::SafetyRecord>()
        .iter()
        .map(|(_, r)| r.overheat_elapsed().as_secs())
        .collect();

    vec![check(
        "persist_roundtrip",
        timers == vec![25] && loaded.sim_time() == engine.sim_time(),
        format!("{} bytes, timers {:?}", buffer.len(), timers),
    )]
}
