//! End-of-run boss: spawns when the countdown runs low, hovers, and rotates through
//! three telegraphed attacks until its HP is gone.

use std::f32::consts::TAU;

use glam::Vec2;
use limitless_engine::{EngineContext, GameEvent, Instance};

use crate::events::{
    FX_BOSS_BURST, FX_TELEGRAPH_ARC, FX_TELEGRAPH_LINE, FX_TELEGRAPH_RING, SOUND_BOSS_DEATH,
    SOUND_BOSS_SPAWN, SOUND_TELEGRAPH, SPRITE_BOSS,
};
use crate::spawner::fire_bullet;
use crate::world::World;

pub const BOSS_RADIUS: f32 = 24.0;
const BASE_HP: f32 = 120.0;
const HP_PER_STAGE: f32 = 40.0;
const PATTERN_PERIOD_MS: f64 = 1400.0;
/// Telegraph must leave room for the attack inside one period.
const MAX_TELEGRAPH_MS: f32 = 1000.0;
const ANCHOR_ABOVE_PLAYER: f32 = 120.0;

const RING_BULLETS: u32 = 16;
const RING_SPEED: f32 = 140.0;
const FAN_BULLETS: u32 = 7;
const FAN_STEP_DEG: f32 = 12.0;
const FAN_SPEED: f32 = 170.0;
const DASH_COUNT: u32 = 3;
const DASH_MS: f64 = 180.0;
const DASH_SPEED: f32 = 260.0;
const DASH_OFFSET_DEG: f32 = 30.0;
const DEATH_BURSTS: u32 = 5;

/// Attack patterns, used in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Ring,
    AimedFan,
    ZigzagDash,
}

impl Pattern {
    const CYCLE: [Pattern; 3] = [Pattern::Ring, Pattern::AimedFan, Pattern::ZigzagDash];
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Hover,
    /// Warning shown; the attack commits at `fire_at` along `bearing`.
    Telegraph {
        pattern: Pattern,
        fire_at: f64,
        bearing: f32,
    },
    Dashing {
        bearing: f32,
        index: u32,
        until: f64,
    },
}

#[derive(Debug, Clone)]
pub struct BossState {
    pub hp: u32,
    pub hp_max: u32,
    /// Hover center.
    pub anchor: Vec2,
    pub pos: Vec2,
    pub pattern_index: usize,
    pub last_attack_at: f64,
    spawned_at: f64,
    vel: Vec2,
    action: Action,
}

/// Encounter state machine: dormant, then active, then defeated.
pub struct BossEncounter {
    state: Option<BossState>,
    spawned: bool,
    defeated: bool,
    telegraph_ms: f32,
    bullet_speed_mul: f32,
}

/// Remaining seconds at which the boss arrives.
pub fn trigger_seconds(planned_secs: u32) -> u32 {
    ((0.4 * planned_secs as f32).round() as u32).max(10)
}

/// Boss HP for a stage.
pub fn boss_hp(stage: u32, hp_mul: f32) -> u32 {
    let base = BASE_HP + (stage.max(1) - 1) as f32 * HP_PER_STAGE;
    ((base * hp_mul).round() as u32).max(1)
}

impl BossEncounter {
    pub fn new(telegraph_ms: f32, bullet_speed_mul: f32) -> Self {
        Self {
            state: None,
            spawned: false,
            defeated: false,
            telegraph_ms: telegraph_ms.min(MAX_TELEGRAPH_MS),
            bullet_speed_mul,
        }
    }

    pub fn set_telegraph_ms(&mut self, telegraph_ms: f32) {
        self.telegraph_ms = telegraph_ms.min(MAX_TELEGRAPH_MS);
    }

    /// One-shot trigger check.
    pub fn should_spawn(&self, remaining_secs: u32, planned_secs: u32) -> bool {
        !self.spawned && remaining_secs <= trigger_seconds(planned_secs)
    }

    pub fn has_spawned(&self) -> bool {
        self.spawned
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn state(&self) -> Option<&BossState> {
        self.state.as_ref()
    }

    /// Position and radius while active.
    pub fn body(&self) -> Option<(Vec2, f32)> {
        self.state.as_ref().map(|s| (s.pos, BOSS_RADIUS))
    }

    /// Bring the boss in above the player. Returns its HP.
    pub fn spawn(&mut self, world: &World, ctx: &mut EngineContext, hp: u32, now: f64) -> u32 {
        let anchor = world.clamp(
            world.player.pos - Vec2::new(0.0, ANCHOR_ABOVE_PLAYER),
            BOSS_RADIUS * 2.0,
        );
        self.spawned = true;
        self.state = Some(BossState {
            hp,
            hp_max: hp,
            anchor,
            pos: anchor,
            pattern_index: 0,
            last_attack_at: now,
            spawned_at: now,
            vel: Vec2::ZERO,
            action: Action::Hover,
        });
        ctx.emit_sound(SOUND_BOSS_SPAWN);
        log::info!("boss spawned with {hp} hp");
        hp
    }

    /// Apply damage, clamping at zero. Returns true on the hit that defeats it.
    pub fn damage(&mut self, amount: u32) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        state.hp = state.hp.saturating_sub(amount);
        state.hp == 0
    }

    /// Remove a defeated boss and play its death bursts.
    pub fn explode(&mut self, ctx: &mut EngineContext) {
        let Some(state) = self.state.take() else {
            return;
        };
        self.defeated = true;
        for i in 0..DEATH_BURSTS {
            let angle = i as f32 * TAU / DEATH_BURSTS as f32;
            let at = state.pos + Vec2::from_angle(angle) * (BOSS_RADIUS * 0.6);
            ctx.emit_event(GameEvent::new(FX_BOSS_BURST, at.x, at.y, i as f32));
        }
        ctx.emit_sound(SOUND_BOSS_DEATH);
        log::info!("boss defeated");
    }

    /// Drop the boss without death effects (run teardown).
    pub fn despawn(&mut self) {
        self.state = None;
    }

    /// Hover, telegraph and attack.
    pub fn update(&mut self, world: &mut World, ctx: &mut EngineContext, now: f64, dt: f32) {
        let telegraph_ms = self.telegraph_ms as f64;
        let bullet_mul = self.bullet_speed_mul;
        let Some(boss) = self.state.as_mut() else {
            return;
        };
        let player = world.player.pos;

        match boss.action {
            Action::Hover | Action::Telegraph { .. } => {
                let t = ((now - boss.spawned_at) / 1000.0) as f32;
                let wobble = Vec2::new(40.0 * (1.3 * t).sin(), 16.0 * (2.6 * t).sin());
                boss.pos = world.clamp(boss.anchor + wobble, BOSS_RADIUS);
            }
            Action::Dashing { .. } => {
                boss.pos = world.clamp(boss.pos + boss.vel * dt, BOSS_RADIUS);
            }
        }

        match boss.action {
            Action::Hover => {
                if now - boss.last_attack_at >= PATTERN_PERIOD_MS {
                    let pattern = Pattern::CYCLE[boss.pattern_index % Pattern::CYCLE.len()];
                    let bearing = (player - boss.pos).to_angle();
                    let kind = match pattern {
                        Pattern::Ring => FX_TELEGRAPH_RING,
                        Pattern::AimedFan => FX_TELEGRAPH_ARC,
                        Pattern::ZigzagDash => FX_TELEGRAPH_LINE,
                    };
                    let payload = match pattern {
                        Pattern::Ring => telegraph_ms as f32,
                        _ => bearing,
                    };
                    ctx.emit_event(GameEvent::new(kind, boss.pos.x, boss.pos.y, payload));
                    ctx.emit_sound(SOUND_TELEGRAPH);
                    boss.last_attack_at = now;
                    boss.action = Action::Telegraph {
                        pattern,
                        fire_at: now + telegraph_ms,
                        bearing,
                    };
                }
            }
            Action::Telegraph {
                pattern,
                fire_at,
                bearing,
            } => {
                if now >= fire_at {
                    boss.pattern_index = (boss.pattern_index + 1) % Pattern::CYCLE.len();
                    let from = boss.pos;
                    match pattern {
                        Pattern::Ring => {
                            boss.action = Action::Hover;
                            for i in 0..RING_BULLETS {
                                let angle = i as f32 * TAU / RING_BULLETS as f32;
                                let vel = Vec2::from_angle(angle) * RING_SPEED * bullet_mul;
                                fire_bullet(world, from, vel, now);
                            }
                        }
                        Pattern::AimedFan => {
                            boss.action = Action::Hover;
                            let step = FAN_STEP_DEG.to_radians();
                            let mid = (FAN_BULLETS - 1) as f32 / 2.0;
                            for i in 0..FAN_BULLETS {
                                let angle = bearing + (i as f32 - mid) * step;
                                let vel = Vec2::from_angle(angle) * FAN_SPEED * bullet_mul;
                                fire_bullet(world, from, vel, now);
                            }
                        }
                        Pattern::ZigzagDash => {
                            boss.vel = Vec2::from_angle(bearing + dash_offset(0)) * DASH_SPEED;
                            boss.action = Action::Dashing {
                                bearing,
                                index: 0,
                                until: now + DASH_MS,
                            };
                        }
                    }
                }
            }
            Action::Dashing {
                bearing,
                index,
                until,
            } => {
                if now >= until {
                    let next = index + 1;
                    if next < DASH_COUNT {
                        boss.vel = Vec2::from_angle(bearing + dash_offset(next)) * DASH_SPEED;
                        boss.action = Action::Dashing {
                            bearing,
                            index: next,
                            until: now + DASH_MS,
                        };
                    } else {
                        boss.vel = Vec2::ZERO;
                        boss.anchor = boss.pos;
                        boss.spawned_at = now;
                        boss.action = Action::Hover;
                    }
                }
            }
        }
    }

    pub fn publish(&self, out: &mut Vec<Instance>) {
        if let Some(s) = &self.state {
            out.push(Instance::new(s.pos, SPRITE_BOSS, s.vel.to_angle()));
        }
    }
}

/// Alternating angular offset for dash `index`.
fn dash_offset(index: u32) -> f32 {
    let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
    sign * DASH_OFFSET_DEG.to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{WORLD_HEIGHT, WORLD_WIDTH};

    fn setup() -> (BossEncounter, World, EngineContext) {
        (
            BossEncounter::new(200.0, 1.0),
            World::new(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT)),
            EngineContext::new(),
        )
    }

    #[test]
    fn trigger_threshold_has_a_floor() {
        assert_eq!(trigger_seconds(90), 36);
        assert_eq!(trigger_seconds(20), 10);
    }

    #[test]
    fn spawns_once() {
        let (mut boss, world, mut ctx) = setup();
        assert!(boss.should_spawn(36, 90));
        assert!(!boss.should_spawn(37, 90));
        boss.spawn(&world, &mut ctx, boss_hp(1, 1.0), 0.0);
        assert!(boss.has_spawned());
        assert!(!boss.should_spawn(5, 90));
        assert_eq!(boss.state().map(|s| s.hp), Some(120));
    }

    #[test]
    fn overkill_clamps_to_zero_and_defeats() {
        let (mut boss, world, mut ctx) = setup();
        boss.spawn(&world, &mut ctx, 1, 0.0);
        assert!(boss.damage(2));
        assert_eq!(boss.state().map(|s| s.hp), Some(0));
        boss.explode(&mut ctx);
        assert!(boss.is_defeated());
        assert!(!boss.is_active());
        let bursts = ctx.events.iter().filter(|e| e.kind == FX_BOSS_BURST).count();
        assert_eq!(bursts, DEATH_BURSTS as usize);
        // Dead bosses take no more damage
        assert!(!boss.damage(5));
    }

    #[test]
    fn patterns_rotate_in_order() {
        let (mut boss, mut world, mut ctx) = setup();
        boss.spawn(&world, &mut ctx, 120, 0.0);
        let dt = 1.0 / 60.0;
        let mut now = 0.0;

        // Ring: telegraph at 1400, 16 bullets once it resolves
        while now < 1400.0 + 200.0 + 20.0 {
            now += dt as f64 * 1000.0;
            boss.update(&mut world, &mut ctx, now, dt);
        }
        assert_eq!(world.bullets.len(), RING_BULLETS as usize);
        assert_eq!(boss.state().map(|s| s.pattern_index), Some(1));

        // Fan: 7 more at the next period
        world.bullets.clear();
        while now < 2800.0 + 200.0 + 20.0 {
            now += dt as f64 * 1000.0;
            boss.update(&mut world, &mut ctx, now, dt);
        }
        assert_eq!(world.bullets.len(), FAN_BULLETS as usize);
        assert_eq!(boss.state().map(|s| s.pattern_index), Some(2));
    }

    #[test]
    fn fan_aims_where_player_was_at_telegraph() {
        let (mut boss, mut world, mut ctx) = setup();
        boss.spawn(&world, &mut ctx, 120, 0.0);
        if let Some(s) = boss.state.as_mut() {
            s.pattern_index = 1;
        }
        let start = boss.state().map(|s| s.pos).unwrap_or_default();
        world.player.pos = start + Vec2::new(200.0, 0.0);
        boss.update(&mut world, &mut ctx, 1400.0, 0.0);
        // Player flees to the other side before the fan commits
        world.player.pos = start - Vec2::new(200.0, 0.0);
        boss.update(&mut world, &mut ctx, 1700.0, 0.0);
        assert_eq!(world.bullets.len(), FAN_BULLETS as usize);
        let mean: Vec2 = world.bullets.iter().map(|(_, b)| b.vel).sum();
        assert!(mean.x > 0.0, "fan should point at the old bearing");
    }

    #[test]
    fn zigzag_dashes_three_times_then_hovers() {
        let (mut boss, mut world, mut ctx) = setup();
        boss.spawn(&world, &mut ctx, 120, 0.0);
        if let Some(s) = boss.state.as_mut() {
            s.pattern_index = 2;
        }
        boss.update(&mut world, &mut ctx, 1400.0, 0.0);
        let lines = ctx.events.iter().filter(|e| e.kind == FX_TELEGRAPH_LINE).count();
        assert_eq!(lines, 1);
        boss.update(&mut world, &mut ctx, 1600.0, 0.0);
        assert!(matches!(boss.state().map(|s| s.action), Some(Action::Dashing { index: 0, .. })));
        boss.update(&mut world, &mut ctx, 1780.0, 0.0);
        boss.update(&mut world, &mut ctx, 1960.0, 0.0);
        assert!(matches!(boss.state().map(|s| s.action), Some(Action::Dashing { index: 2, .. })));
        boss.update(&mut world, &mut ctx, 2140.0, 0.0);
        assert_eq!(boss.state().map(|s| s.action), Some(Action::Hover));
        assert!(world.bullets.is_empty());
    }
}
