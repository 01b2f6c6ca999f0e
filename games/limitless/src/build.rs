//! The player's build: stats and upgrades carried from stage to stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::progress::Rewards;

pub const MAX_PROJECTILE_COUNT: u32 = 6;
pub const MIN_ATTACK_COOLDOWN_MS: f32 = 180.0;
pub const MAX_PIERCE: u32 = 3;
pub const MAX_MAGNET_RADIUS: f32 = 320.0;
pub const MAX_BLAST_RADIUS: f32 = 400.0;
pub const MAX_MOVE_SPEED: f32 = 400.0;
pub const MAX_PROJECTILE_SPEED: f32 = 600.0;
pub const MAX_PROJECTILE_DAMAGE: u32 = 8;
pub const MAX_STATIC_FIELD_LEVEL: u32 = 5;
pub const MAX_DRONE_LEVEL: u32 = 4;
pub const DEFAULT_MAX_HP: u32 = 6;
pub const REWARD_MAGNET_RADIUS: f32 = 100.0;

/// XP needed to leave `level`.
pub fn xp_threshold(level: u32) -> u32 {
    5 + level * 5
}

/// Every upgrade the level-up offer can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeKind {
    FireRate,
    ProjectileCount,
    MoveSpeed,
    ProjectileSpeed,
    ProjectileDamage,
    Pierce,
    StaticField,
    Drone,
    Magnet,
    Blast,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 10] = [
        UpgradeKind::FireRate,
        UpgradeKind::ProjectileCount,
        UpgradeKind::MoveSpeed,
        UpgradeKind::ProjectileSpeed,
        UpgradeKind::ProjectileDamage,
        UpgradeKind::Pierce,
        UpgradeKind::StaticField,
        UpgradeKind::Drone,
        UpgradeKind::Magnet,
        UpgradeKind::Blast,
    ];

    /// Short text for the choice card.
    pub fn label(self) -> &'static str {
        match self {
            UpgradeKind::FireRate => "Fire Rate +20%",
            UpgradeKind::ProjectileCount => "+1 Projectile",
            UpgradeKind::MoveSpeed => "Move Speed +10%",
            UpgradeKind::ProjectileSpeed => "Projectile Speed +15%",
            UpgradeKind::ProjectileDamage => "+1 Damage",
            UpgradeKind::Pierce => "+1 Pierce",
            UpgradeKind::StaticField => "Static Field",
            UpgradeKind::Drone => "Orbiting Drone",
            UpgradeKind::Magnet => "Magnet Radius +25%",
            UpgradeKind::Blast => "Blast Radius +20%",
        }
    }

    /// Whether this upgrade can still change `build`.
    pub fn is_available(self, build: &PlayerBuild) -> bool {
        match self {
            UpgradeKind::FireRate => true,
            UpgradeKind::ProjectileCount => build.projectile_count < MAX_PROJECTILE_COUNT,
            UpgradeKind::MoveSpeed => build.speed < MAX_MOVE_SPEED,
            UpgradeKind::ProjectileSpeed => build.projectile_speed < MAX_PROJECTILE_SPEED,
            UpgradeKind::ProjectileDamage => build.projectile_damage < MAX_PROJECTILE_DAMAGE,
            UpgradeKind::Pierce => build.pierce_count < MAX_PIERCE,
            UpgradeKind::StaticField => build.static_field.level < MAX_STATIC_FIELD_LEVEL,
            UpgradeKind::Drone => build.drone.level < MAX_DRONE_LEVEL,
            UpgradeKind::Magnet => build.has_magnet && build.magnet_radius < MAX_MAGNET_RADIUS,
            UpgradeKind::Blast => build.has_blast && build.blast_radius < MAX_BLAST_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticFieldStats {
    pub level: u32,
    pub cooldown: f32,
    pub radius: f32,
    pub damage: u32,
}

impl Default for StaticFieldStats {
    fn default() -> Self {
        Self {
            level: 0,
            cooldown: 4500.0,
            radius: 120.0,
            damage: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneStats {
    pub level: u32,
    pub damage: u32,
}

impl Default for DroneStats {
    fn default() -> Self {
        Self { level: 0, damage: 1 }
    }
}

/// Persisted player state. Times are milliseconds, speeds world units per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBuild {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub speed: f32,
    pub attack_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_count: u32,
    pub projectile_damage: u32,
    pub pierce_count: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub has_magnet: bool,
    pub magnet_radius: f32,
    pub has_blast: bool,
    pub blast_radius: f32,
    pub static_field: StaticFieldStats,
    pub drone: DroneStats,
    pub upgrade_levels: BTreeMap<UpgradeKind, u32>,
}

impl Default for PlayerBuild {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next: xp_threshold(1),
            speed: 160.0,
            attack_cooldown: 800.0,
            projectile_speed: 300.0,
            projectile_count: 1,
            projectile_damage: 1,
            pierce_count: 0,
            hp: DEFAULT_MAX_HP,
            max_hp: DEFAULT_MAX_HP,
            has_magnet: false,
            magnet_radius: REWARD_MAGNET_RADIUS,
            has_blast: false,
            blast_radius: 100.0,
            static_field: StaticFieldStats::default(),
            drone: DroneStats::default(),
            upgrade_levels: BTreeMap::new(),
        }
    }
}

impl PlayerBuild {
    /// Bring a loaded record back inside its invariants.
    pub fn sanitize(&mut self) {
        self.level = self.level.max(1);
        if self.xp_to_next == 0 {
            self.xp_to_next = xp_threshold(self.level);
        }
        self.max_hp = self.max_hp.max(1);
        self.hp = self.hp.min(self.max_hp);
        self.speed = self.speed.clamp(1.0, MAX_MOVE_SPEED);
        self.attack_cooldown = self.attack_cooldown.max(MIN_ATTACK_COOLDOWN_MS);
        self.projectile_speed = self.projectile_speed.clamp(1.0, MAX_PROJECTILE_SPEED);
        self.projectile_count = self.projectile_count.clamp(1, MAX_PROJECTILE_COUNT);
        self.projectile_damage = self.projectile_damage.clamp(1, MAX_PROJECTILE_DAMAGE);
        self.pierce_count = self.pierce_count.min(MAX_PIERCE);
        self.magnet_radius = self.magnet_radius.clamp(0.0, MAX_MAGNET_RADIUS);
        self.blast_radius = self.blast_radius.clamp(0.0, MAX_BLAST_RADIUS);
        self.static_field.level = self.static_field.level.min(MAX_STATIC_FIELD_LEVEL);
        self.drone.level = self.drone.level.min(MAX_DRONE_LEVEL);
    }

    /// Turn on the abilities earned by clearing stages.
    pub fn grant_rewards(&mut self, rewards: &Rewards) {
        if rewards.magnet && !self.has_magnet {
            self.has_magnet = true;
            self.magnet_radius = self.magnet_radius.max(REWARD_MAGNET_RADIUS);
        }
        if rewards.blast {
            self.has_blast = true;
        }
    }

    /// Apply one upgrade. Every rule is clamped to its cap.
    pub fn apply(&mut self, kind: UpgradeKind) {
        match kind {
            UpgradeKind::FireRate => {
                self.attack_cooldown =
                    (self.attack_cooldown * 0.8).round().max(MIN_ATTACK_COOLDOWN_MS);
            }
            UpgradeKind::ProjectileCount => {
                self.projectile_count = (self.projectile_count + 1).min(MAX_PROJECTILE_COUNT);
            }
            UpgradeKind::MoveSpeed => {
                self.speed = (self.speed * 1.1).round().min(MAX_MOVE_SPEED);
            }
            UpgradeKind::ProjectileSpeed => {
                self.projectile_speed = (self.projectile_speed * 1.15).round().min(MAX_PROJECTILE_SPEED);
            }
            UpgradeKind::ProjectileDamage => {
                self.projectile_damage = (self.projectile_damage + 1).min(MAX_PROJECTILE_DAMAGE);
            }
            UpgradeKind::Pierce => {
                self.pierce_count = (self.pierce_count + 1).min(MAX_PIERCE);
            }
            UpgradeKind::StaticField => {
                let field = &mut self.static_field;
                field.level = (field.level + 1).min(MAX_STATIC_FIELD_LEVEL);
                if field.level >= 2 {
                    field.radius = (field.radius + 15.0).min(200.0);
                    field.cooldown = (field.cooldown - 500.0).max(2000.0);
                }
                field.damage = 1 + (field.level - 1) / 2;
            }
            UpgradeKind::Drone => {
                self.drone.level = (self.drone.level + 1).min(MAX_DRONE_LEVEL);
                self.drone.damage = 1 + self.drone.level / 3;
            }
            UpgradeKind::Magnet => {
                self.magnet_radius = (self.magnet_radius * 1.25).min(MAX_MAGNET_RADIUS);
            }
            UpgradeKind::Blast => {
                self.blast_radius = (self.blast_radius * 1.2).min(MAX_BLAST_RADIUS);
            }
        }
        *self.upgrade_levels.entry(kind).or_insert(0) += 1;
    }

    /// Subtract HP, never below zero. Returns true when the player is down.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }

    /// Add HP, never above max.
    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn heal_full(&mut self) {
        self.hp = self.max_hp;
    }

    /// Add XP. Returns how many levels were gained.
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = xp_threshold(self.level);
            gained += 1;
        }
        gained
    }

    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        self.upgrade_levels.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitless_engine::from_json_lenient;

    #[test]
    fn one_threshold_is_one_level() {
        let mut b = PlayerBuild::default();
        assert_eq!(b.xp_to_next, 10);
        assert_eq!(b.add_xp(10), 1);
        assert_eq!(b.level, 2);
        assert_eq!(b.xp_to_next, 15);
        assert_eq!(b.xp, 0);
    }

    #[test]
    fn big_pickup_crosses_several_levels() {
        let mut b = PlayerBuild::default();
        assert_eq!(b.add_xp(10 + 15 + 3), 2);
        assert_eq!(b.level, 3);
        assert_eq!(b.xp, 3);
    }

    #[test]
    fn hp_stays_in_bounds() {
        let mut b = PlayerBuild::default();
        let ops: [(bool, u32); 8] = [
            (true, 2),
            (false, 1),
            (true, 10),
            (false, 3),
            (false, 50),
            (true, 1),
            (false, 0),
            (true, 7),
        ];
        for (damage, amount) in ops {
            if damage {
                b.take_damage(amount);
            } else {
                b.heal(amount);
            }
            assert!(b.hp <= b.max_hp);
        }
        assert_eq!(b.hp, 0);
    }

    #[test]
    fn fire_rate_floors_at_minimum() {
        let mut b = PlayerBuild::default();
        for _ in 0..30 {
            b.apply(UpgradeKind::FireRate);
        }
        assert_eq!(b.attack_cooldown, MIN_ATTACK_COOLDOWN_MS);
        assert_eq!(b.upgrade_level(UpgradeKind::FireRate), 30);
    }

    #[test]
    fn capped_upgrades_leave_the_pool() {
        let mut b = PlayerBuild::default();
        for _ in 0..10 {
            b.apply(UpgradeKind::ProjectileCount);
            b.apply(UpgradeKind::Pierce);
        }
        assert_eq!(b.projectile_count, MAX_PROJECTILE_COUNT);
        assert_eq!(b.pierce_count, MAX_PIERCE);
        assert!(!UpgradeKind::ProjectileCount.is_available(&b));
        assert!(!UpgradeKind::Pierce.is_available(&b));
    }

    #[test]
    fn magnet_needs_reward_and_caps() {
        let mut b = PlayerBuild::default();
        assert!(!UpgradeKind::Magnet.is_available(&b));
        b.grant_rewards(&Rewards {
            magnet: true,
            blast: false,
        });
        assert!(UpgradeKind::Magnet.is_available(&b));
        for _ in 0..10 {
            b.apply(UpgradeKind::Magnet);
        }
        assert_eq!(b.magnet_radius, MAX_MAGNET_RADIUS);
        assert!(!UpgradeKind::Magnet.is_available(&b));
    }

    #[test]
    fn static_field_grows_with_level() {
        let mut b = PlayerBuild::default();
        b.apply(UpgradeKind::StaticField);
        assert_eq!(b.static_field.level, 1);
        assert_eq!(b.static_field.cooldown, 4500.0);
        assert_eq!(b.static_field.damage, 1);
        b.apply(UpgradeKind::StaticField);
        b.apply(UpgradeKind::StaticField);
        assert_eq!(b.static_field.level, 3);
        assert_eq!(b.static_field.cooldown, 3500.0);
        assert_eq!(b.static_field.radius, 150.0);
        assert_eq!(b.static_field.damage, 2);
    }

    #[test]
    fn export_is_stable() {
        let mut b = PlayerBuild::default();
        b.apply(UpgradeKind::Drone);
        b.apply(UpgradeKind::FireRate);
        let first = serde_json::to_string(&b).unwrap();
        let second = serde_json::to_string(&b).unwrap();
        assert_eq!(first, second);
        let back: PlayerBuild = from_json_lenient(&first);
        assert_eq!(back, b);
    }

    #[test]
    fn corrupt_fields_fall_back_individually() {
        let mut b: PlayerBuild =
            from_json_lenient(r#"{"level":3,"hp":"lots","maxHp":8,"projectileCount":99}"#);
        b.sanitize();
        assert_eq!(b.level, 3);
        assert_eq!(b.max_hp, 8);
        assert_eq!(b.hp, DEFAULT_MAX_HP);
        assert_eq!(b.projectile_count, MAX_PROJECTILE_COUNT);
    }
}
