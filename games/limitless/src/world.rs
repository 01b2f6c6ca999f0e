//! Arena entities and their pools.

use glam::Vec2;
use limitless_engine::{EntityId, Instance, Pool};

use crate::events::{
    SPRITE_ENEMY_BASE, SPRITE_ENEMY_BULLET, SPRITE_PLAYER, SPRITE_PROJECTILE, SPRITE_XP_ORB,
};

pub const WORLD_WIDTH: f32 = 1280.0;
pub const WORLD_HEIGHT: f32 = 720.0;

pub const PLAYER_RADIUS: f32 = 8.0;
pub const ENEMY_RADIUS: f32 = 7.0;
pub const PROJECTILE_RADIUS: f32 = 3.0;
pub const BULLET_RADIUS: f32 = 4.0;
pub const ORB_RADIUS: f32 = 4.0;

const MAX_ENEMIES: usize = 160;
const MAX_PROJECTILES: usize = 128;
const MAX_BULLETS: usize = 192;
const MAX_ORBS: usize = 256;

/// Enemy behaviour classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Archetype {
    /// Homes in on the player every step.
    #[default]
    Seeker,
    /// Walks a straight line and bounces off the walls.
    Patroller,
    /// Waits, telegraphs, then dashes at the player.
    Dasher,
    /// Circles the player.
    Orbiter,
    /// Slow horizontal sweeps.
    Sweeper,
    /// Stands still and fires telegraphed shots.
    Shooter,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Seeker,
        Archetype::Patroller,
        Archetype::Dasher,
        Archetype::Orbiter,
        Archetype::Sweeper,
        Archetype::Shooter,
    ];

    pub fn index(self) -> usize {
        match self {
            Archetype::Seeker => 0,
            Archetype::Patroller => 1,
            Archetype::Dasher => 2,
            Archetype::Orbiter => 3,
            Archetype::Sweeper => 4,
            Archetype::Shooter => 5,
        }
    }

    /// HP before stage and difficulty scaling.
    pub fn base_hp(self) -> u32 {
        match self {
            Archetype::Seeker => 1,
            Archetype::Patroller => 2,
            Archetype::Dasher => 3,
            Archetype::Orbiter => 3,
            Archetype::Sweeper => 4,
            Archetype::Shooter => 2,
        }
    }
}

/// Per-archetype motion state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Motion {
    #[default]
    Seek,
    Patrol,
    Dash {
        next_dash_at: f64,
        dash_until: f64,
        telegraphed: bool,
    },
    Orbit {
        angle: f32,
        radius: f32,
    },
    Sweep,
    Shoot {
        next_shot_at: f64,
        telegraphed: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub archetype: Archetype,
    pub pos: Vec2,
    pub vel: Vec2,
    pub hp: u32,
    pub speed: f32,
    pub motion: Motion,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            id: EntityId(0),
            archetype: Archetype::Seeker,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            hp: 1,
            speed: 0.0,
            motion: Motion::Seek,
        }
    }
}

/// What a player projectile last struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Enemy(EntityId),
    Boss,
}

#[derive(Debug, Clone, Default)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: u32,
    pub pierce_remaining: u32,
    pub expires_at: f64,
    pub immune_until: f64,
    pub last_hit: Option<Target>,
}

/// Hostile shot from a shooter or the boss.
#[derive(Debug, Clone, Default)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Orb {
    pub pos: Vec2,
    pub vel: Vec2,
    pub value: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Last direction the auto-attack fired in.
    pub aim: Vec2,
    pub invulnerable_until: f64,
}

/// Everything that moves in the arena.
pub struct World {
    pub size: Vec2,
    pub player: Player,
    pub enemies: Pool<Enemy>,
    pub projectiles: Pool<Projectile>,
    pub bullets: Pool<Bullet>,
    pub orbs: Pool<Orb>,
}

impl World {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            player: Player {
                pos: size * 0.5,
                aim: Vec2::X,
                ..Player::default()
            },
            enemies: Pool::with_capacity(MAX_ENEMIES),
            projectiles: Pool::with_capacity(MAX_PROJECTILES),
            bullets: Pool::with_capacity(MAX_BULLETS),
            orbs: Pool::with_capacity(MAX_ORBS),
        }
    }

    /// Keep a circle of `radius` inside the arena.
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        pos.clamp(Vec2::splat(radius), self.size - Vec2::splat(radius))
    }

    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.y >= -margin
            && pos.x <= self.size.x + margin
            && pos.y <= self.size.y + margin
    }

    /// Remove every enemy, shot and orb.
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.bullets.clear();
        self.orbs.clear();
    }

    /// Append the drawable snapshot of pooled entities.
    pub fn publish(&self, out: &mut Vec<Instance>) {
        out.push(Instance::new(self.player.pos, SPRITE_PLAYER, self.player.aim.to_angle()));
        for (_, e) in self.enemies.iter() {
            let kind = SPRITE_ENEMY_BASE + e.archetype.index() as f32;
            out.push(Instance::new(e.pos, kind, e.vel.to_angle()));
        }
        for (_, p) in self.projectiles.iter() {
            out.push(Instance::new(p.pos, SPRITE_PROJECTILE, p.vel.to_angle()));
        }
        for (_, b) in self.bullets.iter() {
            out.push(Instance::new(b.pos, SPRITE_ENEMY_BULLET, b.vel.to_angle()));
        }
        for (_, o) in self.orbs.iter() {
            out.push(Instance::new(o.pos, SPRITE_XP_ORB, 0.0));
        }
    }
}

/// Circle overlap test.
pub fn overlaps(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Reflect `vel` off the arena walls for a body of `radius` at `pos`.
pub fn bounce(pos: Vec2, vel: Vec2, radius: f32, size: Vec2) -> Vec2 {
    let mut vel = vel;
    if (pos.x <= radius && vel.x < 0.0) || (pos.x >= size.x - radius && vel.x > 0.0) {
        vel.x = -vel.x;
    }
    if (pos.y <= radius && vel.y < 0.0) || (pos.y >= size.y - radius && vel.y > 0.0) {
        vel.y = -vel.y;
    }
    vel
}
