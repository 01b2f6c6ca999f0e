//! Enemy spawning and the per-archetype motion programs.

use std::f32::consts::TAU;

use glam::Vec2;
use limitless_engine::{EngineContext, GameEvent, Rng, Timer};

use crate::events::{FX_TELEGRAPH_RING, SOUND_TELEGRAPH};
use crate::settings::DifficultyProfile;
use crate::world::{bounce, Archetype, Bullet, Enemy, Motion, World, BULLET_RADIUS, ENEMY_RADIUS};

const EDGE_MARGIN: f32 = 30.0;
const DASH_SPEED: f32 = 150.0;
const DASH_MS: f64 = 280.0;
const ORBIT_SPEED: f32 = 60.0;
const ORBIT_RATE: f32 = 1.8;
const SWEEP_SPEED: f32 = 50.0;
const SHOT_SPEED: f32 = 160.0;
const BULLET_TTL_MS: f64 = 2500.0;
/// Shooter telegraphs are shorter than dash telegraphs.
const SHOT_TELEGRAPH_SCALE: f32 = 0.6;

/// Weights in archetype order, active from `from_secs` of elapsed run time.
#[derive(Debug, Clone, Copy)]
pub struct WeightRow {
    pub from_secs: u32,
    pub weights: [u32; 6],
}

const fn row(from_secs: u32, weights: [u32; 6]) -> WeightRow {
    WeightRow { from_secs, weights }
}

const STAGE_1: [WeightRow; 3] = [
    row(0, [60, 20, 10, 5, 5, 0]),
    row(30, [45, 20, 15, 10, 5, 5]),
    row(60, [35, 20, 20, 10, 5, 10]),
];
const STAGE_2: [WeightRow; 2] = [
    row(0, [40, 20, 15, 10, 10, 5]),
    row(45, [30, 15, 20, 15, 10, 10]),
];
const STAGE_3: [WeightRow; 2] = [
    row(0, [30, 15, 20, 15, 10, 10]),
    row(60, [25, 10, 25, 15, 10, 15]),
];

/// Weight rows for a stage. Stages past the last table reuse it.
pub fn weight_table(stage: u32) -> &'static [WeightRow] {
    match stage {
        0 | 1 => &STAGE_1,
        2 => &STAGE_2,
        _ => &STAGE_3,
    }
}

/// The last row whose threshold has passed.
pub fn active_weights(stage: u32, elapsed_secs: u32) -> [u32; 6] {
    let table = weight_table(stage);
    table
        .iter()
        .rev()
        .find(|r| r.from_secs <= elapsed_secs)
        .unwrap_or(&table[0])
        .weights
}

/// Cumulative-weight roulette. Zero-weight archetypes are never picked.
pub fn pick_archetype(weights: &[u32; 6], rng: &mut Rng) -> Archetype {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return Archetype::Seeker;
    }
    let mut roll = rng.next_int(total);
    for (archetype, &w) in Archetype::ALL.iter().zip(weights) {
        if roll < w {
            return *archetype;
        }
        roll -= w;
    }
    Archetype::Seeker
}

/// HP for a fresh enemy.
pub fn enemy_hp(archetype: Archetype, stage: u32, hp_mul: f32) -> u32 {
    let base = archetype.base_hp() + (stage.max(1) - 1) / 2;
    ((base as f32 * hp_mul).round() as u32).max(1)
}

/// Uniform point on a random edge, inset by the spawn margin.
pub fn spawn_point(size: Vec2, rng: &mut Rng) -> Vec2 {
    let along_x = rng.range(EDGE_MARGIN, (size.x - EDGE_MARGIN).max(EDGE_MARGIN + 1.0));
    let along_y = rng.range(EDGE_MARGIN, (size.y - EDGE_MARGIN).max(EDGE_MARGIN + 1.0));
    match rng.next_int(4) {
        0 => Vec2::new(along_x, EDGE_MARGIN),
        1 => Vec2::new(size.x - EDGE_MARGIN, along_y),
        2 => Vec2::new(along_x, size.y - EDGE_MARGIN),
        _ => Vec2::new(EDGE_MARGIN, along_y),
    }
}

/// Timed enemy spawning for one run.
pub struct EnemySpawner {
    timer: Timer,
    base_delay: f32,
    profile: DifficultyProfile,
    stage: u32,
    /// Full telegraph length for this difficulty.
    telegraph_ms: f32,
}

impl EnemySpawner {
    pub fn new(profile: DifficultyProfile, stage: u32, telegraph_ms: f32) -> Self {
        Self {
            timer: Timer::repeating(profile.spawn_delay_ms),
            base_delay: profile.spawn_delay_ms,
            profile,
            stage,
            telegraph_ms,
        }
    }

    pub fn set_telegraph_ms(&mut self, telegraph_ms: f32) {
        self.telegraph_ms = telegraph_ms;
    }

    pub fn delay(&self) -> f32 {
        self.timer.delay()
    }

    pub fn base_delay(&self) -> f32 {
        self.base_delay
    }

    pub fn set_delay(&mut self, delay_ms: f32) {
        self.timer.set_delay(delay_ms);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.timer.set_paused(paused);
    }

    /// Advance the cadence. Returns how many enemies are due.
    pub fn tick(&mut self, dt_ms: f32) -> u32 {
        self.timer.tick(dt_ms)
    }

    /// Spawn one enemy on an edge, type drawn from the stage table.
    pub fn spawn_one(
        &self,
        world: &mut World,
        ctx: &mut EngineContext,
        rng: &mut Rng,
        elapsed_secs: u32,
        now: f64,
    ) -> Option<usize> {
        let weights = active_weights(self.stage, elapsed_secs);
        let archetype = pick_archetype(&weights, rng);
        let pos = spawn_point(world.size, rng);
        self.spawn(world, ctx, rng, archetype, pos, now)
    }

    /// Spawn a specific archetype at `pos`. `None` when the pool is full.
    pub fn spawn(
        &self,
        world: &mut World,
        ctx: &mut EngineContext,
        rng: &mut Rng,
        archetype: Archetype,
        pos: Vec2,
        now: f64,
    ) -> Option<usize> {
        let speed = rng.range(40.0, 80.0) * self.profile.enemy_speed_mul;
        let toward_player = (world.player.pos - pos).normalize_or_zero();
        let (vel, motion) = match archetype {
            Archetype::Seeker => (toward_player * speed, Motion::Seek),
            Archetype::Patroller => {
                let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
                let vel = if rng.chance(0.5) {
                    Vec2::new(sign * speed, 0.0)
                } else {
                    Vec2::new(0.0, sign * speed)
                };
                (vel, Motion::Patrol)
            }
            Archetype::Dasher => (
                Vec2::ZERO,
                Motion::Dash {
                    next_dash_at: now + rng.range(400.0, 1000.0) as f64,
                    dash_until: 0.0,
                    telegraphed: false,
                },
            ),
            Archetype::Orbiter => (
                Vec2::ZERO,
                Motion::Orbit {
                    angle: rng.range(0.0, TAU),
                    radius: rng.range(30.0, 70.0),
                },
            ),
            Archetype::Sweeper => {
                let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
                (Vec2::new(sign * SWEEP_SPEED, 0.0), Motion::Sweep)
            }
            Archetype::Shooter => (
                Vec2::ZERO,
                Motion::Shoot {
                    next_shot_at: now + rng.range(600.0, 1100.0) as f64,
                    telegraphed: false,
                },
            ),
        };
        let enemy = Enemy {
            id: ctx.next_id(),
            archetype,
            pos,
            vel,
            hp: enemy_hp(archetype, self.stage, self.profile.hp_mul),
            speed,
            motion,
        };
        let slot = world.enemies.acquire(enemy);
        if slot.is_none() {
            log::warn!("enemy pool full; skipping {archetype:?}");
        }
        slot
    }

    /// Run every enemy's motion program and integrate positions.
    pub fn update_enemies(
        &self,
        world: &mut World,
        ctx: &mut EngineContext,
        rng: &mut Rng,
        now: f64,
        dt: f32,
    ) {
        let player = world.player.pos;
        let size = world.size;
        let mut shots: Vec<Vec2> = Vec::new();

        for (_, e) in world.enemies.iter_mut() {
            match &mut e.motion {
                Motion::Seek => {
                    e.vel = (player - e.pos).normalize_or_zero() * e.speed;
                }
                Motion::Patrol | Motion::Sweep => {
                    e.vel = bounce(e.pos, e.vel, ENEMY_RADIUS, size);
                }
                Motion::Dash {
                    next_dash_at,
                    dash_until,
                    telegraphed,
                } => {
                    let tele = self.telegraph_ms as f64;
                    if now >= *dash_until {
                        if now >= *next_dash_at {
                            let heading = (player - e.pos).normalize_or_zero();
                            e.vel = heading * DASH_SPEED;
                            *dash_until = now + DASH_MS;
                            *next_dash_at = now + 1200.0 + rng.range(-200.0, 200.0) as f64;
                            *telegraphed = false;
                        } else {
                            e.vel = Vec2::ZERO;
                            if !*telegraphed && now + tele >= *next_dash_at {
                                *telegraphed = true;
                                ctx.emit_event(GameEvent::new(
                                    FX_TELEGRAPH_RING,
                                    e.pos.x,
                                    e.pos.y,
                                    self.telegraph_ms,
                                ));
                            }
                        }
                    }
                }
                Motion::Orbit { angle, radius } => {
                    *angle = (*angle + ORBIT_RATE * dt) % TAU;
                    *radius = (*radius + (now / 600.0).sin() as f32 * 6.0 * dt).clamp(20.0, 90.0);
                    let target = player + Vec2::from_angle(*angle) * *radius;
                    e.vel = (target - e.pos).normalize_or_zero() * ORBIT_SPEED;
                }
                Motion::Shoot {
                    next_shot_at,
                    telegraphed,
                } => {
                    e.vel = Vec2::ZERO;
                    let tele = (self.telegraph_ms * SHOT_TELEGRAPH_SCALE) as f64;
                    if !*telegraphed && now + tele >= *next_shot_at {
                        *telegraphed = true;
                        ctx.emit_event(GameEvent::new(
                            FX_TELEGRAPH_RING,
                            e.pos.x,
                            e.pos.y,
                            tele as f32,
                        ));
                        ctx.emit_sound(SOUND_TELEGRAPH);
                    }
                    if now >= *next_shot_at {
                        shots.push(e.pos);
                        *next_shot_at = now + rng.range(800.0, 1300.0) as f64;
                        *telegraphed = false;
                    }
                }
            }
            e.pos = world_clamp(e.pos + e.vel * dt, size);
        }

        let speed = (SHOT_SPEED * self.profile.bullet_speed_mul).round();
        for from in shots {
            let dir = (player - from).normalize_or_zero();
            if dir == Vec2::ZERO {
                continue;
            }
            fire_bullet(world, from, dir * speed, now);
        }
    }
}

fn world_clamp(pos: Vec2, size: Vec2) -> Vec2 {
    pos.clamp(Vec2::splat(ENEMY_RADIUS), size - Vec2::splat(ENEMY_RADIUS))
}

/// Put a hostile bullet into play.
pub fn fire_bullet(world: &mut World, from: Vec2, vel: Vec2, now: f64) {
    let bullet = Bullet {
        pos: from,
        vel,
        expires_at: now + BULLET_TTL_MS,
    };
    if world.bullets.acquire(bullet).is_none() {
        log::debug!("bullet pool full");
    }
}

/// Move hostile bullets and expire old or off-screen ones.
pub fn update_bullets(world: &mut World, now: f64, dt: f32) {
    let mut expired = Vec::new();
    for (i, b) in world.bullets.iter_mut() {
        b.pos += b.vel * dt;
        if now >= b.expires_at {
            expired.push(i);
        }
    }
    for i in expired {
        world.bullets.release(i);
    }
    let out: Vec<usize> = world
        .bullets
        .iter()
        .filter(|(_, b)| !world.contains(b.pos, BULLET_RADIUS * 4.0))
        .map(|(i, _)| i)
        .collect();
    for i in out {
        world.bullets.release(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;
    use crate::world::{WORLD_HEIGHT, WORLD_WIDTH};

    fn setup() -> (World, EngineContext, Rng, EnemySpawner) {
        let profile = DifficultyProfile::for_stage(Difficulty::Standard, 1);
        (
            World::new(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT)),
            EngineContext::new(),
            Rng::new(11),
            EnemySpawner::new(profile, 1, 200.0),
        )
    }

    #[test]
    fn rows_switch_at_thresholds() {
        assert_eq!(active_weights(1, 0), [60, 20, 10, 5, 5, 0]);
        assert_eq!(active_weights(1, 29), [60, 20, 10, 5, 5, 0]);
        assert_eq!(active_weights(1, 30), [45, 20, 15, 10, 5, 5]);
        assert_eq!(active_weights(1, 500), [35, 20, 20, 10, 5, 10]);
        assert_eq!(active_weights(2, 45), [30, 15, 20, 15, 10, 10]);
        assert_eq!(active_weights(7, 0), [30, 15, 20, 15, 10, 10]);
    }

    #[test]
    fn roulette_follows_weights() {
        let mut rng = Rng::new(1234);
        let weights = active_weights(1, 0);
        let mut counts = [0u32; 6];
        let n = 20_000;
        for _ in 0..n {
            counts[pick_archetype(&weights, &mut rng).index()] += 1;
        }
        // Shooter has zero weight in the opening row
        assert_eq!(counts[5], 0);
        for (i, &w) in weights.iter().enumerate() {
            let expected = w as f32 / 100.0;
            let observed = counts[i] as f32 / n as f32;
            assert!(
                (observed - expected).abs() < 0.02,
                "archetype {i}: {observed} vs {expected}"
            );
        }
    }

    #[test]
    fn hp_scales_with_stage_and_difficulty() {
        assert_eq!(enemy_hp(Archetype::Seeker, 1, 1.0), 1);
        assert_eq!(enemy_hp(Archetype::Sweeper, 3, 1.0), 5);
        assert_eq!(enemy_hp(Archetype::Seeker, 1, 0.4), 1);
        assert_eq!(enemy_hp(Archetype::Dasher, 1, 1.15), 3);
    }

    #[test]
    fn spawn_points_sit_on_an_edge() {
        let mut rng = Rng::new(5);
        let size = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT);
        for _ in 0..200 {
            let p = spawn_point(size, &mut rng);
            let on_edge = p.x == EDGE_MARGIN
                || p.y == EDGE_MARGIN
                || p.x == size.x - EDGE_MARGIN
                || p.y == size.y - EDGE_MARGIN;
            assert!(on_edge, "{p:?}");
        }
    }

    #[test]
    fn seeker_rehomes_every_step() {
        let (mut world, mut ctx, mut rng, spawner) = setup();
        let slot = spawner
            .spawn(&mut world, &mut ctx, &mut rng, Archetype::Seeker, Vec2::new(100.0, 100.0), 0.0)
            .unwrap();
        world.player.pos = Vec2::new(100.0, 400.0);
        spawner.update_enemies(&mut world, &mut ctx, &mut rng, 16.0, 0.016);
        let e = world.enemies.get(slot).unwrap();
        assert!(e.vel.x.abs() < 1e-4 && e.vel.y > 0.0);
    }

    #[test]
    fn dasher_telegraphs_then_dashes() {
        let (mut world, mut ctx, mut rng, spawner) = setup();
        let slot = spawner
            .spawn(&mut world, &mut ctx, &mut rng, Archetype::Dasher, Vec2::new(100.0, 100.0), 0.0)
            .unwrap();
        let next = match world.enemies.get(slot).unwrap().motion {
            Motion::Dash { next_dash_at, .. } => next_dash_at,
            _ => unreachable!(),
        };
        spawner.update_enemies(&mut world, &mut ctx, &mut rng, next - 100.0, 0.016);
        assert_eq!(ctx.events.len(), 1);
        assert_eq!(ctx.events[0].kind, FX_TELEGRAPH_RING);
        assert_eq!(world.enemies.get(slot).unwrap().vel, Vec2::ZERO);

        spawner.update_enemies(&mut world, &mut ctx, &mut rng, next, 0.016);
        let e = world.enemies.get(slot).unwrap();
        assert!((e.vel.length() - DASH_SPEED).abs() < 1e-3);
        // Only one telegraph per dash
        assert_eq!(ctx.events.len(), 1);
    }

    #[test]
    fn shooter_fires_at_player() {
        let (mut world, mut ctx, mut rng, spawner) = setup();
        spawner
            .spawn(&mut world, &mut ctx, &mut rng, Archetype::Shooter, Vec2::new(100.0, 100.0), 0.0)
            .unwrap();
        world.player.pos = Vec2::new(400.0, 100.0);
        spawner.update_enemies(&mut world, &mut ctx, &mut rng, 1200.0, 0.016);
        assert_eq!(world.bullets.len(), 1);
        let (_, b) = world.bullets.iter().next().unwrap();
        assert!((b.vel - Vec2::new(160.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn bullets_expire() {
        let (mut world, _, _, _) = setup();
        fire_bullet(&mut world, Vec2::new(50.0, 50.0), Vec2::new(10.0, 0.0), 0.0);
        update_bullets(&mut world, 2000.0, 0.016);
        assert_eq!(world.bullets.len(), 1);
        update_bullets(&mut world, 2500.0, 0.016);
        assert!(world.bullets.is_empty());
    }
}
