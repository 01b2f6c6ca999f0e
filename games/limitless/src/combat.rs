//! Player offence and defence: auto-attack, hit resolution, area pulses, drones,
//! magnet, contact damage and regeneration.

use std::f32::consts::TAU;

use glam::Vec2;
use limitless_engine::{EngineContext, GameEvent, Instance, Timer};

use crate::boss::BossEncounter;
use crate::build::PlayerBuild;
use crate::events::{
    FX_BLAST, FX_HIT, FX_SHAKE, FX_STATIC_PULSE, SOUND_BLAST, SOUND_ENEMY_HIT, SOUND_PICKUP,
    SOUND_PLAYER_HURT, SOUND_SHOOT, SOUND_STATIC, SPRITE_DRONE,
};
use crate::world::{
    overlaps, Orb, Projectile, Target, World, BULLET_RADIUS, ENEMY_RADIUS, ORB_RADIUS,
    PLAYER_RADIUS, PROJECTILE_RADIUS,
};

const PROJECTILE_TTL_MS: f64 = 1500.0;
const FAN_STEP_DEG: f32 = 14.0;
const HIT_IMMUNITY_MS: f64 = 100.0;
const BLAST_PERIOD_MS: f32 = 5000.0;
const BLAST_RADIUS_SCALE: f32 = 1.4;
const BLAST_DAMAGE: u32 = 1;
const MAGNET_PULL_SPEED: f32 = 120.0;
const INVULNERABLE_MS: f64 = 700.0;
const REGEN_DELAY_MS: f32 = 2500.0;
const REGEN_INTERVAL_MS: f32 = 1000.0;
const REGEN_AMOUNT: u32 = 1;
const DRONE_ORBIT_RADIUS: f32 = 48.0;
const DRONE_ANGULAR_SPEED: f32 = 3.0;
const DRONE_RADIUS: f32 = 6.0;
const DRONE_HIT_COOLDOWN_MS: f64 = 400.0;
const ORB_VALUE: u32 = 1;

/// What a damage pass achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatReport {
    pub kills: u32,
    pub boss_defeated: bool,
}

impl CombatReport {
    pub fn merge(&mut self, other: CombatReport) {
        self.kills += other.kills;
        self.boss_defeated |= other.boss_defeated;
    }
}

/// Result of the player-damage pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerHit {
    Unharmed,
    Hurt,
    Defeated,
}

/// A body that can be struck this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitTarget {
    Enemy(usize, Target),
    Boss,
}

impl HitTarget {
    fn key(self) -> Target {
        match self {
            HitTarget::Enemy(_, key) => key,
            HitTarget::Boss => Target::Boss,
        }
    }
}

/// Timers and per-drone bookkeeping for one run.
pub struct CombatResolver {
    attack: Timer,
    blast: Timer,
    static_field: Timer,
    drone_angle: f32,
    /// Recent drone strikes: target and the time it may be hit again.
    drone_hits: Vec<Vec<(Target, f64)>>,
    since_damage_ms: f32,
    regen_acc_ms: f32,
    /// Practice sandbox: kills drop no XP, the player takes no damage.
    pub sandbox: bool,
    pub screen_shake: bool,
}

impl CombatResolver {
    pub fn new(build: &PlayerBuild) -> Self {
        Self {
            attack: Timer::repeating(build.attack_cooldown),
            blast: Timer::repeating(BLAST_PERIOD_MS),
            static_field: Timer::repeating(build.static_field.cooldown),
            drone_angle: 0.0,
            drone_hits: Vec::new(),
            since_damage_ms: 0.0,
            regen_acc_ms: 0.0,
            sandbox: false,
            screen_shake: true,
        }
    }

    /// Restart the attack cadence after the fire rate changed.
    pub fn reschedule_attack(&mut self, build: &PlayerBuild) {
        self.attack.set_delay(build.attack_cooldown);
        self.attack.reset();
    }

    /// Pick up a new static field cooldown without losing progress.
    pub fn sync_static_field(&mut self, build: &PlayerBuild) {
        self.static_field.set_delay(build.static_field.cooldown);
    }

    pub fn attack_remaining(&self) -> f32 {
        self.attack.remaining()
    }

    // ---- Offence ----

    /// Fire the auto-attack for every elapsed period.
    pub fn update_attack(
        &mut self,
        world: &mut World,
        build: &PlayerBuild,
        boss: &BossEncounter,
        ctx: &mut EngineContext,
        now: f64,
        dt_ms: f32,
    ) {
        for _ in 0..self.attack.tick(dt_ms) {
            fire_volley(world, build, boss, ctx, now);
        }
    }

    /// Move player projectiles, retire stale ones and resolve hits.
    pub fn update_projectiles(
        &mut self,
        world: &mut World,
        boss: &mut BossEncounter,
        ctx: &mut EngineContext,
        now: f64,
        dt: f32,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        let mut stale = Vec::new();
        for (i, p) in world.projectiles.iter_mut() {
            p.pos += p.vel * dt;
            if now >= p.expires_at {
                stale.push(i);
            }
        }
        for (i, p) in world.projectiles.iter() {
            if !world.contains(p.pos, PROJECTILE_RADIUS) && !stale.contains(&i) {
                stale.push(i);
            }
        }
        for i in stale {
            world.projectiles.release(i);
        }

        let live: Vec<usize> = world.projectiles.iter().map(|(i, _)| i).collect();
        for i in live {
            let Some(p) = world.projectiles.get(i) else {
                continue;
            };
            if now < p.immune_until {
                continue;
            }
            let (pos, damage, last_hit) = (p.pos, p.damage, p.last_hit);
            let Some(target) = find_hit(world, boss, pos, PROJECTILE_RADIUS, |t| Some(t) != last_hit)
            else {
                continue;
            };
            self.strike(world, boss, ctx, target, damage, &mut report);
            let Some(p) = world.projectiles.get_mut(i) else {
                continue;
            };
            if p.pierce_remaining > 0 {
                p.pierce_remaining -= 1;
                p.immune_until = now + HIT_IMMUNITY_MS;
                p.last_hit = Some(target.key());
            } else {
                world.projectiles.release(i);
            }
        }
        report
    }

    /// Periodic blast around the player, once blast is owned.
    pub fn update_blast(
        &mut self,
        world: &mut World,
        build: &PlayerBuild,
        boss: &mut BossEncounter,
        ctx: &mut EngineContext,
        dt_ms: f32,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        if !build.has_blast {
            return report;
        }
        for _ in 0..self.blast.tick(dt_ms) {
            let radius = build.blast_radius * BLAST_RADIUS_SCALE;
            let center = world.player.pos;
            ctx.emit_event(GameEvent::new(FX_BLAST, center.x, center.y, radius));
            ctx.emit_sound(SOUND_BLAST);
            report.merge(self.pulse(world, boss, ctx, center, radius, BLAST_DAMAGE));
        }
        report
    }

    /// Static field pulse, once the upgrade has a level.
    pub fn update_static_field(
        &mut self,
        world: &mut World,
        build: &PlayerBuild,
        boss: &mut BossEncounter,
        ctx: &mut EngineContext,
        dt_ms: f32,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        let field = &build.static_field;
        if field.level == 0 {
            return report;
        }
        for _ in 0..self.static_field.tick(dt_ms) {
            let center = world.player.pos;
            ctx.emit_event(GameEvent::new(FX_STATIC_PULSE, center.x, center.y, field.radius));
            ctx.emit_sound(SOUND_STATIC);
            report.merge(self.pulse(world, boss, ctx, center, field.radius, field.damage));
        }
        report
    }

    /// Rotate the drones and let them strike what they touch.
    pub fn update_drones(
        &mut self,
        world: &mut World,
        build: &PlayerBuild,
        boss: &mut BossEncounter,
        ctx: &mut EngineContext,
        now: f64,
        dt: f32,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        let count = build.drone.level as usize;
        self.drone_hits.resize_with(count, Vec::new);
        if count == 0 {
            return report;
        }
        self.drone_angle = (self.drone_angle + DRONE_ANGULAR_SPEED * dt) % TAU;

        for k in 0..count {
            self.drone_hits[k].retain(|&(_, until)| now < until);
            let pos = self.drone_position(world.player.pos, k, count);
            let cooling: Vec<Target> = self.drone_hits[k].iter().map(|&(t, _)| t).collect();
            let mut touching = Vec::new();
            for (i, e) in world.enemies.iter() {
                let key = Target::Enemy(e.id);
                if overlaps(pos, DRONE_RADIUS, e.pos, ENEMY_RADIUS) && !cooling.contains(&key) {
                    touching.push(HitTarget::Enemy(i, key));
                }
            }
            if let Some((bpos, bradius)) = boss.body() {
                if overlaps(pos, DRONE_RADIUS, bpos, bradius) && !cooling.contains(&Target::Boss) {
                    touching.push(HitTarget::Boss);
                }
            }
            for target in touching {
                self.drone_hits[k].push((target.key(), now + DRONE_HIT_COOLDOWN_MS));
                self.strike(world, boss, ctx, target, build.drone.damage, &mut report);
            }
        }
        report
    }

    fn drone_position(&self, center: Vec2, index: usize, count: usize) -> Vec2 {
        let angle = self.drone_angle + index as f32 * TAU / count as f32;
        center + Vec2::from_angle(angle) * DRONE_ORBIT_RADIUS
    }

    pub fn publish_drones(&self, world: &World, out: &mut Vec<Instance>) {
        let count = self.drone_hits.len();
        for k in 0..count {
            let pos = self.drone_position(world.player.pos, k, count);
            out.push(Instance::new(pos, SPRITE_DRONE, 0.0));
        }
    }

    /// Damage everything within `radius` of `center` once.
    fn pulse(
        &mut self,
        world: &mut World,
        boss: &mut BossEncounter,
        ctx: &mut EngineContext,
        center: Vec2,
        radius: f32,
        damage: u32,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        let mut inside: Vec<HitTarget> = world
            .enemies
            .iter()
            .filter(|(_, e)| overlaps(center, radius, e.pos, ENEMY_RADIUS))
            .map(|(i, e)| HitTarget::Enemy(i, Target::Enemy(e.id)))
            .collect();
        if let Some((bpos, bradius)) = boss.body() {
            if overlaps(center, radius, bpos, bradius) {
                inside.push(HitTarget::Boss);
            }
        }
        for target in inside {
            self.strike(world, boss, ctx, target, damage, &mut report);
        }
        report
    }

    /// Apply damage to one target and settle kills.
    fn strike(
        &mut self,
        world: &mut World,
        boss: &mut BossEncounter,
        ctx: &mut EngineContext,
        target: HitTarget,
        damage: u32,
        report: &mut CombatReport,
    ) {
        match target {
            HitTarget::Enemy(slot, _) => {
                let Some(enemy) = world.enemies.get_mut(slot) else {
                    return;
                };
                enemy.hp = enemy.hp.saturating_sub(damage);
                let pos = enemy.pos;
                ctx.emit_sound(SOUND_ENEMY_HIT);
                if enemy.hp > 0 {
                    return;
                }
                world.enemies.release(slot);
                ctx.emit_event(GameEvent::new(FX_HIT, pos.x, pos.y, 0.0));
                if !self.sandbox {
                    let orb = Orb {
                        pos,
                        vel: Vec2::ZERO,
                        value: ORB_VALUE,
                    };
                    if world.orbs.acquire(orb).is_none() {
                        log::warn!("orb pool full; xp dropped");
                    }
                }
                report.kills += 1;
            }
            HitTarget::Boss => {
                if boss.damage(damage) {
                    boss.explode(ctx);
                    report.boss_defeated = true;
                }
            }
        }
    }

    // ---- Collection ----

    /// Pull orbs inside the magnet radius toward the player.
    pub fn update_magnet(&mut self, world: &mut World, build: &PlayerBuild, dt: f32) {
        if !build.has_magnet {
            return;
        }
        let player = world.player.pos;
        let r2 = build.magnet_radius * build.magnet_radius;
        for (_, orb) in world.orbs.iter_mut() {
            let to_player = player - orb.pos;
            if to_player.length_squared() <= r2 {
                orb.vel = to_player.normalize_or_zero() * MAGNET_PULL_SPEED;
                orb.pos += orb.vel * dt;
            } else {
                orb.vel = Vec2::ZERO;
            }
        }
    }

    /// Collect touching orbs. Returns the XP gained.
    pub fn collect_orbs(&mut self, world: &mut World, ctx: &mut EngineContext) -> u32 {
        let player = world.player.pos;
        let touching: Vec<(usize, u32)> = world
            .orbs
            .iter()
            .filter(|(_, o)| overlaps(player, PLAYER_RADIUS, o.pos, ORB_RADIUS))
            .map(|(i, o)| (i, o.value))
            .collect();
        let mut gained = 0;
        for (i, value) in touching {
            world.orbs.release(i);
            gained += value;
        }
        if gained > 0 {
            ctx.emit_sound(SOUND_PICKUP);
        }
        gained
    }

    // ---- Defence ----

    /// Contact with enemies, the boss or hostile bullets. Bullets that touch the
    /// player are consumed even while invulnerable.
    pub fn update_player_damage(
        &mut self,
        world: &mut World,
        build: &mut PlayerBuild,
        boss: &BossEncounter,
        ctx: &mut EngineContext,
        damage: u32,
        now: f64,
    ) -> PlayerHit {
        let player = world.player.pos;
        let bullets: Vec<usize> = world
            .bullets
            .iter()
            .filter(|(_, b)| overlaps(player, PLAYER_RADIUS, b.pos, BULLET_RADIUS))
            .map(|(i, _)| i)
            .collect();
        let mut touched = !bullets.is_empty();
        for i in bullets {
            world.bullets.release(i);
        }
        touched |= world
            .enemies
            .iter()
            .any(|(_, e)| overlaps(player, PLAYER_RADIUS, e.pos, ENEMY_RADIUS));
        if let Some((bpos, bradius)) = boss.body() {
            touched |= overlaps(player, PLAYER_RADIUS, bpos, bradius);
        }

        if !touched || self.sandbox || now < world.player.invulnerable_until {
            return PlayerHit::Unharmed;
        }
        world.player.invulnerable_until = now + INVULNERABLE_MS;
        self.reset_regen();
        ctx.emit_sound(SOUND_PLAYER_HURT);
        if self.screen_shake {
            ctx.emit_event(GameEvent::new(FX_SHAKE, player.x, player.y, damage as f32));
        }
        if build.take_damage(damage) {
            PlayerHit::Defeated
        } else {
            PlayerHit::Hurt
        }
    }

    /// Restart the regen delay and drop any partial interval.
    pub fn reset_regen(&mut self) {
        self.since_damage_ms = 0.0;
        self.regen_acc_ms = 0.0;
    }

    /// Regenerate after a quiet period. Returns HP restored.
    pub fn update_regen(&mut self, build: &mut PlayerBuild, dt_ms: f32) -> u32 {
        if build.hp >= build.max_hp {
            self.regen_acc_ms = 0.0;
            return 0;
        }
        let before = self.since_damage_ms;
        self.since_damage_ms += dt_ms;
        if self.since_damage_ms < REGEN_DELAY_MS {
            return 0;
        }
        self.regen_acc_ms += self.since_damage_ms - before.max(REGEN_DELAY_MS);
        let mut healed = 0;
        while self.regen_acc_ms >= REGEN_INTERVAL_MS && build.hp < build.max_hp {
            self.regen_acc_ms -= REGEN_INTERVAL_MS;
            build.heal(REGEN_AMOUNT);
            healed += REGEN_AMOUNT;
        }
        healed
    }
}

/// Aim at the nearest target (or keep the last aim) and emit the fan.
fn fire_volley(
    world: &mut World,
    build: &PlayerBuild,
    boss: &BossEncounter,
    ctx: &mut EngineContext,
    now: f64,
) {
    let origin = world.player.pos;
    if let Some(target) = nearest_target(world, boss, origin) {
        let aim = (target - origin).normalize_or_zero();
        if aim != Vec2::ZERO {
            world.player.aim = aim;
        }
    }
    let base = world.player.aim.to_angle();
    let step = FAN_STEP_DEG.to_radians();
    let mid = (build.projectile_count.max(1) - 1) as f32 / 2.0;
    for i in 0..build.projectile_count.max(1) {
        let dir = Vec2::from_angle(base + (i as f32 - mid) * step);
        let shot = Projectile {
            pos: origin,
            vel: dir * build.projectile_speed,
            damage: build.projectile_damage,
            pierce_remaining: build.pierce_count,
            expires_at: now + PROJECTILE_TTL_MS,
            immune_until: 0.0,
            last_hit: None,
        };
        if world.projectiles.acquire(shot).is_none() {
            log::debug!("projectile pool full");
            break;
        }
    }
    ctx.emit_sound(SOUND_SHOOT);
}

/// Closest enemy or boss by squared distance; first found wins ties.
pub fn nearest_target(world: &World, boss: &BossEncounter, from: Vec2) -> Option<Vec2> {
    let mut best: Option<(f32, Vec2)> = None;
    let candidates = world
        .enemies
        .iter()
        .map(|(_, e)| e.pos)
        .chain(boss.body().map(|(pos, _)| pos));
    for pos in candidates {
        let d2 = from.distance_squared(pos);
        if best.map_or(true, |(b, _)| d2 < b) {
            best = Some((d2, pos));
        }
    }
    best.map(|(_, pos)| pos)
}

/// First body overlapping a circle at `pos` that passes `allowed`.
fn find_hit(
    world: &World,
    boss: &BossEncounter,
    pos: Vec2,
    radius: f32,
    allowed: impl Fn(Target) -> bool,
) -> Option<HitTarget> {
    for (i, e) in world.enemies.iter() {
        let key = Target::Enemy(e.id);
        if overlaps(pos, radius, e.pos, ENEMY_RADIUS) && allowed(key) {
            return Some(HitTarget::Enemy(i, key));
        }
    }
    let (bpos, bradius) = boss.body()?;
    (overlaps(pos, radius, bpos, bradius) && allowed(Target::Boss)).then_some(HitTarget::Boss)
}
