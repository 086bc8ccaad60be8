use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use ricochet_core::emitter::EmitterMode;
use ricochet_core::entity::Faction;
use ricochet_core::projectile::ProjectileKind;
use ricochet_core::{SimConfig, Simulation};

/// Player with a deflector, a ring of enemies, and a field of live waves.
fn crowded_arena(config: SimConfig, enemies: usize, waves: usize) -> Simulation {
    let mut sim = Simulation::new(config, 1).expect("bench config is valid");
    let player = sim.spawn_player(Vec2::ZERO);
    if let Ok(deflector) = sim.spawn_deflector(player) {
        sim.toggle_deflector(deflector);
    }

    let gate = sim.add_gate(Vec2::ZERO);
    for i in 0..enemies {
        let angle = i as f32 / enemies as f32 * std::f32::consts::TAU;
        let enemy = sim.spawn_enemy(Vec2::from_angle(angle) * 12.0, EmitterMode::Ai);
        let _ = sim.add_gate_member(gate, enemy);
    }
    for i in 0..waves {
        let angle = i as f32 * 0.37;
        let origin = Vec2::from_angle(angle) * 20.0;
        sim.spawn_projectile(ProjectileKind::Standard, origin, -origin, Faction::Enemy, None);
    }
    sim
}

fn bench_step_small(c: &mut Criterion) {
    let mut sim = crowded_arena(SimConfig::default(), 4, 16);
    c.bench_function("step_small", |b| b.iter(|| black_box(&mut sim).step()));
}

fn bench_step_crowded(c: &mut Criterion) {
    // Purge on player hit is off so the wave field stays populated
    let mut config = SimConfig::default();
    config.damage.purge_on_player_hit = false;
    let mut sim = crowded_arena(config, 16, 200);

    c.bench_function("step_crowded", |b| b.iter(|| black_box(&mut sim).step()));
}

fn bench_second_of_play(c: &mut Criterion) {
    c.bench_function("second_of_play", |b| {
        b.iter(|| {
            let mut sim = crowded_arena(SimConfig::default(), 8, 32);
            sim.run(black_box(60));
            black_box(sim.take_events().len())
        })
    });
}

criterion_group!(benches, bench_step_small, bench_step_crowded, bench_second_of_play);
criterion_main!(benches);
