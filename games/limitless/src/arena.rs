//! Run lifecycle: one arena run from spawn-in to the summary screen.

use glam::Vec2;
use limitless_engine::{
    EngineContext, Game, GameConfig, GameEvent, InputEvent, InputQueue, Rng, SceneClock, Timer,
};

use crate::boss::{boss_hp, BossEncounter};
use crate::build::{PlayerBuild, UpgradeKind};
use crate::combat::{CombatReport, CombatResolver, PlayerHit};
use crate::events::*;
use crate::input::{
    parse_transcript, Command, Direction, FaceSample, GestureBridge, InputNormalizer, UiAction,
};
use crate::perf::PerformanceMonitor;
use crate::progress::{
    clear_build, load_build, mark_tutorial_seen, save_build, tutorial_seen, Progress, Rewards,
};
use crate::progression::ProgressionEngine;
use crate::scan::{Overlay, ScanController};
use crate::settings::{planned_run_seconds, DifficultyProfile, Settings};
use crate::spawner::{spawn_point, update_bullets, EnemySpawner};
use crate::world::{Archetype, World, PLAYER_RADIUS, WORLD_HEIGHT, WORLD_WIDTH};

const FIXED_DT: f32 = 1.0 / 60.0;
const OPENING_PACK: usize = 6;
const RUN_TICK_MS: f32 = 1000.0;
const PAUSE_ITEMS: usize = 2;

/// Where the run is. Only `Active` advances the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Active,
    /// Waiting for an upgrade choice.
    LevelUp,
    Paused,
    Over(EndReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOverItem {
    NextStage,
    Retry,
    Menu,
}

pub struct Arena {
    settings: Settings,
    rng: Rng,
    clock: SceneClock,
    phase: RunPhase,
    progress: Progress,
    stage: u32,
    profile: DifficultyProfile,
    planned_secs: u32,
    remaining: u32,
    run_timer: Timer,
    kills: u32,
    /// Sandbox run: no clock, no XP, no damage taken.
    practice: bool,
    /// First-launch drill: a fixed pack, then the real run.
    drill: bool,
    world: World,
    build: PlayerBuild,
    input: InputNormalizer,
    gestures: GestureBridge,
    spawner: EnemySpawner,
    combat: CombatResolver,
    progression: ProgressionEngine,
    boss: BossEncounter,
    scan: ScanController,
    perf: PerformanceMonitor,
    overlay: Option<Overlay>,
    run_over_items: Vec<RunOverItem>,
    last_hud: Option<Notice>,
    /// Input is handled by the first fixed step of each frame only.
    fresh_input: bool,
}

impl Arena {
    pub fn new() -> Self {
        let settings = Settings::default();
        let profile = DifficultyProfile::for_stage(settings.difficulty, 1);
        let telegraph = profile.telegraph_ms(&settings);
        let build = PlayerBuild::default();
        Self {
            rng: Rng::new(42),
            clock: SceneClock::new(),
            phase: RunPhase::Active,
            progress: Progress::default(),
            stage: 1,
            profile,
            planned_secs: planned_run_seconds(1),
            remaining: planned_run_seconds(1),
            run_timer: Timer::repeating(RUN_TICK_MS),
            kills: 0,
            practice: false,
            drill: false,
            world: World::new(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT)),
            input: InputNormalizer::new(&settings),
            gestures: GestureBridge::new(&settings),
            spawner: EnemySpawner::new(profile, 1, telegraph),
            combat: CombatResolver::new(&build),
            progression: ProgressionEngine::new(),
            boss: BossEncounter::new(telegraph, profile.bullet_speed_mul),
            scan: ScanController::new(&settings),
            perf: PerformanceMonitor::new(),
            overlay: None,
            run_over_items: Vec::new(),
            last_hud: None,
            fresh_input: true,
            build,
            settings,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn is_practice(&self) -> bool {
        self.practice
    }

    // ---- Run setup ----

    /// Reset everything for a fresh run on `stage`.
    fn start_run(&mut self, ctx: &mut EngineContext, stage: u32, practice: bool, drill: bool) {
        let stage = stage.max(1);
        self.stage = stage;
        self.practice = practice;
        self.drill = drill;
        self.profile = DifficultyProfile::for_stage(self.settings.difficulty, stage);
        let telegraph = self.profile.telegraph_ms(&self.settings);
        self.planned_secs = planned_run_seconds(stage);
        self.remaining = self.planned_secs;
        self.run_timer = Timer::repeating(RUN_TICK_MS);
        self.kills = 0;
        self.world = World::new(Vec2::new(WORLD_WIDTH, WORLD_HEIGHT));

        let mut build = if practice {
            PlayerBuild::default()
        } else {
            load_build(ctx.store.as_ref()).unwrap_or_default()
        };
        build.grant_rewards(&Rewards::load(ctx.store.as_ref()));
        self.build = build;

        self.input.stop();
        self.spawner = EnemySpawner::new(self.profile, stage, telegraph);
        self.spawner.set_paused(drill);
        self.combat = CombatResolver::new(&self.build);
        self.combat.sandbox = practice;
        self.combat.screen_shake = self.settings.screen_shake;
        self.progression.reset();
        self.boss = BossEncounter::new(telegraph, self.profile.bullet_speed_mul);
        self.scan.close();
        self.overlay = None;
        self.run_over_items.clear();
        self.clock = SceneClock::new();
        self.phase = RunPhase::Active;

        for _ in 0..OPENING_PACK {
            let pos = spawn_point(self.world.size, &mut self.rng);
            self.spawner
                .spawn(&mut self.world, ctx, &mut self.rng, Archetype::Seeker, pos, 0.0);
        }
        log::info!(
            "stage {stage} started ({} s{}{})",
            self.planned_secs,
            if practice { ", practice" } else { "" },
            if drill { ", drill" } else { "" },
        );
    }

    /// Take a new settings snapshot and hand it to every component.
    fn apply_settings(&mut self, settings: Settings) {
        self.input.apply_settings(&settings);
        self.gestures.apply_settings(&settings);
        self.scan.apply_settings(&settings);
        self.combat.screen_shake = settings.screen_shake;
        let telegraph = self.profile.telegraph_ms(&settings);
        self.spawner.set_telegraph_ms(telegraph);
        self.boss.set_telegraph_ms(telegraph);
        self.settings = settings;
        log::debug!("settings applied: {:?}", self.settings);
    }

    // ---- Suspension ----

    fn suspend(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.clock.pause();
        self.world.player.vel = Vec2::ZERO;
    }

    fn resume(&mut self, ctx: &mut EngineContext) {
        self.phase = RunPhase::Active;
        self.clock.resume();
        self.close_overlay();
        ctx.emit_notice(&Notice::Resumed);
    }

    fn open_overlay(&mut self, ctx: &mut EngineContext, overlay: Overlay, items: usize) {
        self.overlay = Some(overlay);
        self.scan.open(items);
        if self.scan.is_enabled() {
            ctx.emit_notice(&Notice::ScanFocus { overlay, index: 0 });
        }
    }

    fn close_overlay(&mut self) {
        self.overlay = None;
        self.scan.close();
    }

    fn open_pause(&mut self, ctx: &mut EngineContext) {
        if self.phase != RunPhase::Active {
            return;
        }
        self.suspend(RunPhase::Paused);
        ctx.emit_notice(&Notice::PauseOpened);
        self.open_overlay(ctx, Overlay::Pause, PAUSE_ITEMS);
        log::info!("paused");
    }

    fn open_level_up(&mut self, ctx: &mut EngineContext) {
        let Some(choices) = self.progression.open_offer(&self.build, &mut self.rng) else {
            return;
        };
        self.suspend(RunPhase::LevelUp);
        ctx.emit_sound(SOUND_LEVEL_UP);
        let count = choices.len();
        ctx.emit_notice(&Notice::LevelUpOffered {
            level: self.build.level,
            choices,
        });
        self.open_overlay(ctx, Overlay::LevelUp, count);
    }

    fn resolve_level_up(&mut self, ctx: &mut EngineContext, index: usize) {
        let Some(kind) = self.progression.resolve(&mut self.build, index) else {
            log::debug!("ignoring choice {index}");
            return;
        };
        self.combat.reset_regen();
        match kind {
            UpgradeKind::FireRate => self.combat.reschedule_attack(&self.build),
            UpgradeKind::StaticField => self.combat.sync_static_field(&self.build),
            _ => {}
        }
        ctx.emit_notice(&Notice::UpgradeApplied {
            kind,
            level: self.build.upgrade_level(kind),
        });
        self.close_overlay();
        if self.progression.has_pending() {
            self.open_level_up(ctx);
        } else {
            self.resume(ctx);
        }
    }

    // ---- Run end ----

    fn end_run(&mut self, ctx: &mut EngineContext, reason: EndReason) {
        if matches!(self.phase, RunPhase::Over(_)) {
            return;
        }
        self.suspend(RunPhase::Over(reason));
        self.close_overlay();
        self.progression.reset();
        self.boss.despawn();

        let mut tokens_earned = 0;
        match reason {
            EndReason::Time => {
                self.build.heal_full();
                save_build(ctx.store.as_mut(), &self.build);
                tokens_earned = self.progress.record_success(self.stage, self.kills);
                self.progress.current_stage = self.stage;
                self.progress.save(ctx.store.as_mut());
                let mut rewards = Rewards::load(ctx.store.as_ref());
                if rewards.grant_for_stage(self.stage) {
                    rewards.save(ctx.store.as_mut());
                    log::info!("stage {} reward granted", self.stage);
                }
            }
            EndReason::Defeat => clear_build(ctx.store.as_mut()),
        }

        let next_stage_unlocked =
            reason == EndReason::Time && self.progress.is_unlocked(self.stage + 1);
        self.run_over_items.clear();
        if next_stage_unlocked {
            self.run_over_items.push(RunOverItem::NextStage);
        }
        self.run_over_items.push(RunOverItem::Retry);
        self.run_over_items.push(RunOverItem::Menu);

        let survived = self.planned_secs.saturating_sub(self.remaining);
        log::info!(
            "run over: {reason:?} on stage {} after {survived} s, {} kills",
            self.stage,
            self.kills
        );
        ctx.emit_notice(&Notice::RunOver {
            reason,
            stage: self.stage,
            survived,
            level: self.build.level,
            kills: self.kills,
            tokens_earned,
            next_stage_unlocked,
        });
        let items = self.run_over_items.len();
        self.open_overlay(ctx, Overlay::RunOver, items);
    }

    fn retry(&mut self, ctx: &mut EngineContext) {
        clear_build(ctx.store.as_mut());
        self.start_run(ctx, self.stage, false, false);
    }

    fn next_stage(&mut self, ctx: &mut EngineContext) {
        let next = self.stage + 1;
        if !self.progress.is_unlocked(next) {
            log::warn!("stage {next} is locked");
            return;
        }
        self.progress.current_stage = next;
        self.progress.save(ctx.store.as_mut());
        self.start_run(ctx, next, false, false);
    }

    fn set_practice(&mut self, ctx: &mut EngineContext, active: bool, drill: bool) {
        if !active {
            mark_tutorial_seen(ctx.store.as_mut());
        }
        self.start_run(ctx, self.progress.current_stage, active, drill);
        ctx.emit_notice(&Notice::Practice { active });
    }

    // ---- Commands ----

    /// Choose item `index` in whatever overlay is open.
    fn select(&mut self, ctx: &mut EngineContext, index: usize) {
        match self.overlay {
            Some(Overlay::LevelUp) => self.resolve_level_up(ctx, index),
            Some(Overlay::Pause) => match index {
                0 => self.resume(ctx),
                1 => ctx.emit_notice(&Notice::UiRequest {
                    action: UiAction::OpenSettings,
                }),
                _ => {}
            },
            Some(Overlay::RunOver) => match self.run_over_items.get(index).copied() {
                Some(RunOverItem::NextStage) => self.next_stage(ctx),
                Some(RunOverItem::Retry) => self.retry(ctx),
                Some(RunOverItem::Menu) => {
                    self.close_overlay();
                    ctx.emit_notice(&Notice::MenuRequested);
                }
                None => {}
            },
            None => {}
        }
    }

    fn activate_focus(&mut self, ctx: &mut EngineContext) {
        if let Some(index) = self.scan.activate() {
            self.select(ctx, index);
        }
    }

    fn nudge(&mut self, direction: Direction) {
        if self.phase == RunPhase::Active {
            let distance = self.gestures.nudge_distance();
            self.input
                .nudge_towards(direction, distance, self.world.player.pos);
        }
    }

    fn run_command(&mut self, ctx: &mut EngineContext, command: Command) {
        log::debug!("command: {command:?}");
        match command {
            Command::Move(direction) => self.nudge(direction),
            Command::Stop => self.input.stop(),
            Command::Select(index) => self.select(ctx, index),
            Command::Ui(action) => ctx.emit_notice(&Notice::UiRequest { action }),
        }
    }

    fn face_changed(&mut self, ctx: &mut EngineContext, change: Option<Option<Direction>>) {
        if let Some(direction) = change {
            ctx.emit_notice(&Notice::FaceDirection { direction });
        }
    }

    fn handle_input(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        for event in input.iter() {
            match event {
                InputEvent::PointerDown { x, y } => {
                    let pos = Vec2::new(*x, *y);
                    self.input.pointer_down(pos);
                    if self.phase == RunPhase::Active && self.input.target().is_some() {
                        ctx.emit_event(GameEvent::new(FX_CLICK_MARKER, pos.x, pos.y, 0.0));
                    }
                }
                InputEvent::PointerMove { x, y } => self.input.pointer_move(Vec2::new(*x, *y)),
                InputEvent::PointerUp { .. } => {}
                InputEvent::KeyDown { key_code } => match *key_code {
                    KEY_UP => self.input.set_key(Direction::Up, true),
                    KEY_DOWN => self.input.set_key(Direction::Down, true),
                    KEY_LEFT => self.input.set_key(Direction::Left, true),
                    KEY_RIGHT => self.input.set_key(Direction::Right, true),
                    KEY_ESCAPE | KEY_P => match self.phase {
                        RunPhase::Active => self.open_pause(ctx),
                        RunPhase::Paused => self.resume(ctx),
                        _ => {}
                    },
                    KEY_1 | KEY_2 | KEY_3 => self.select(ctx, (*key_code - KEY_1) as usize),
                    KEY_SPACE | KEY_ENTER => self.activate_focus(ctx),
                    _ => {}
                },
                InputEvent::KeyUp { key_code } => match *key_code {
                    KEY_UP => self.input.set_key(Direction::Up, false),
                    KEY_DOWN => self.input.set_key(Direction::Down, false),
                    KEY_LEFT => self.input.set_key(Direction::Left, false),
                    KEY_RIGHT => self.input.set_key(Direction::Right, false),
                    _ => {}
                },
                InputEvent::Custom { kind, a, b, c } => match *kind {
                    CUSTOM_SELECT => self.select(ctx, a.max(0.0) as usize),
                    CUSTOM_PAUSE => self.open_pause(ctx),
                    CUSTOM_RESUME => {
                        if self.phase == RunPhase::Paused {
                            self.resume(ctx);
                        }
                    }
                    CUSTOM_TUTORIAL_PRACTICE => self.set_practice(ctx, true, true),
                    CUSTOM_TUTORIAL_PLAY | CUSTOM_START_REAL_RUN => {
                        self.set_practice(ctx, false, false)
                    }
                    CUSTOM_START_PRACTICE => {
                        let stage = (*a as u32).clamp(1, self.progress.highest_unlocked);
                        self.start_run(ctx, stage, true, false);
                        ctx.emit_notice(&Notice::Practice { active: true });
                    }
                    CUSTOM_RETRY => self.retry(ctx),
                    CUSTOM_NEXT_STAGE => self.next_stage(ctx),
                    CUSTOM_FACE_SAMPLE => {
                        let sample = FaceSample {
                            eye_slope: *a,
                            eye_span: *b,
                            nose_offset: *c,
                        };
                        let change = self.gestures.observe(sample);
                        self.face_changed(ctx, change);
                    }
                    CUSTOM_FACE_LOST => {
                        let change = self.gestures.lost();
                        self.face_changed(ctx, change);
                    }
                    CUSTOM_MOVE => {
                        if let Some(direction) = Direction::from_code(*a as u32) {
                            self.nudge(direction);
                        }
                    }
                    CUSTOM_STOP => self.input.stop(),
                    CUSTOM_SCAN_ACTIVATE => self.activate_focus(ctx),
                    other => log::debug!("unknown custom event {other}"),
                },
                InputEvent::Text { kind, text } => match *kind {
                    TEXT_SETTINGS => self.apply_settings(Settings::from_json(text)),
                    TEXT_VOICE => match parse_transcript(text) {
                        Some(command) => self.run_command(ctx, command),
                        None => log::debug!("unrecognized transcript {text:?}"),
                    },
                    other => log::debug!("unknown text event {other}"),
                },
            }
        }
    }

    // ---- Simulation ----

    /// One gameplay step in the fixed order: movement, spawning, enemies, boss,
    /// attacks, magnet, drones, area pulses, contact damage, regeneration.
    fn step(&mut self, ctx: &mut EngineContext) {
        let dt = FIXED_DT;
        let dt_ms = self.clock.advance(dt * 1000.0);
        let now = self.clock.now();

        let player = self.world.player.pos;
        let dir = self.input.move_vector(player);
        let speed = self.build.speed * self.input.speed_multiplier();
        self.world.player.vel = dir * speed;
        self.world.player.pos = self
            .world
            .clamp(player + self.world.player.vel * dt, PLAYER_RADIUS);

        let elapsed_secs = self.planned_secs.saturating_sub(self.remaining);
        for _ in 0..self.spawner.tick(dt_ms) {
            self.spawner
                .spawn_one(&mut self.world, ctx, &mut self.rng, elapsed_secs, now);
        }
        if !self.practice {
            for _ in 0..self.run_timer.tick(dt_ms) {
                self.remaining = self.remaining.saturating_sub(1);
            }
            if self.remaining == 0 {
                self.end_run(ctx, EndReason::Time);
                return;
            }
        }

        self.spawner
            .update_enemies(&mut self.world, ctx, &mut self.rng, now, dt);
        update_bullets(&mut self.world, now, dt);

        if !self.practice && self.boss.should_spawn(self.remaining, self.planned_secs) {
            let hp = boss_hp(self.stage, self.profile.hp_mul);
            self.boss.spawn(&self.world, ctx, hp, now);
            self.spawner.set_paused(true);
            self.run_timer.set_paused(true);
            ctx.emit_notice(&Notice::BossSpawned { hp });
        }
        self.boss.update(&mut self.world, ctx, now, dt);

        let mut report = CombatReport::default();
        self.combat
            .update_attack(&mut self.world, &self.build, &self.boss, ctx, now, dt_ms);
        report.merge(
            self.combat
                .update_projectiles(&mut self.world, &mut self.boss, ctx, now, dt),
        );
        self.combat.update_magnet(&mut self.world, &self.build, dt);
        let xp = self.combat.collect_orbs(&mut self.world, ctx);
        if xp > 0 {
            self.progression.gain_xp(&mut self.build, xp);
        }
        report.merge(self.combat.update_drones(
            &mut self.world,
            &self.build,
            &mut self.boss,
            ctx,
            now,
            dt,
        ));
        report.merge(self.combat.update_static_field(
            &mut self.world,
            &self.build,
            &mut self.boss,
            ctx,
            dt_ms,
        ));
        report.merge(
            self.combat
                .update_blast(&mut self.world, &self.build, &mut self.boss, ctx, dt_ms),
        );
        self.kills += report.kills;
        if report.boss_defeated {
            self.end_run(ctx, EndReason::Time);
            return;
        }

        let hit = self.combat.update_player_damage(
            &mut self.world,
            &mut self.build,
            &self.boss,
            ctx,
            self.profile.damage_to_player,
            now,
        );
        if hit == PlayerHit::Defeated {
            self.end_run(ctx, EndReason::Defeat);
            return;
        }
        self.combat.update_regen(&mut self.build, dt_ms);

        if self.drill && self.world.enemies.is_empty() {
            log::info!("drill cleared");
            self.set_practice(ctx, false, false);
            return;
        }
        if self.progression.has_pending() {
            self.open_level_up(ctx);
        }
    }

    fn publish(&self, ctx: &mut EngineContext) {
        ctx.instances.clear();
        self.world.publish(&mut ctx.instances);
        self.combat.publish_drones(&self.world, &mut ctx.instances);
        self.boss.publish(&mut ctx.instances);
    }

    /// Emit a HUD notice when anything on it changed.
    fn sync_hud(&mut self, ctx: &mut EngineContext) {
        let boss = self.boss.state();
        let hud = Notice::Hud {
            hp: self.build.hp,
            max_hp: self.build.max_hp,
            level: self.build.level,
            xp: self.build.xp,
            xp_to_next: self.build.xp_to_next,
            remaining: self.remaining,
            kills: self.kills,
            boss_hp: boss.map(|s| s.hp),
            boss_max_hp: boss.map(|s| s.hp_max),
        };
        if self.last_hud.as_ref() != Some(&hud) {
            ctx.emit_notice(&hud);
            self.last_hud = Some(hud);
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Arena {
    fn config(&self) -> GameConfig {
        GameConfig {
            fixed_dt: FIXED_DT,
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            max_instances: 1024,
            max_sounds: 32,
            max_events: 128,
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        self.rng = Rng::new(ctx.seed);
        let settings = Settings::load(ctx.store.as_ref());
        self.apply_settings(settings);
        self.progress = Progress::load(ctx.store.as_ref());
        if tutorial_seen(ctx.store.as_ref()) {
            self.start_run(ctx, self.progress.current_stage, false, false);
        } else {
            self.start_run(ctx, self.progress.current_stage, true, true);
            ctx.emit_notice(&Notice::Practice { active: true });
        }
        self.publish(ctx);
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        if std::mem::take(&mut self.fresh_input) {
            self.handle_input(ctx, input);
        }
        if self.phase == RunPhase::Active {
            self.step(ctx);
        } else {
            self.world.player.vel = Vec2::ZERO;
        }
        self.publish(ctx);
        self.sync_hud(ctx);
    }

    fn on_frame(&mut self, ctx: &mut EngineContext, frame_dt: f32) {
        self.fresh_input = true;
        let frame_ms = frame_dt * 1000.0;

        if let Some(change) = self.perf.sample(frame_ms) {
            let delay = change.adjust_delay(self.spawner.delay(), self.spawner.base_delay());
            self.spawner.set_delay(delay);
            ctx.emit_notice(&Notice::Hint {
                text: change.hint(),
            });
        }

        if let Some(overlay) = self.overlay {
            let tick = self.scan.tick(frame_ms);
            if let Some(index) = tick.moved {
                ctx.emit_notice(&Notice::ScanFocus { overlay, index });
            }
            if let Some(index) = tick.activated {
                self.select(ctx, index);
            }
        }

        if let Some(direction) = self.gestures.tick(frame_ms) {
            self.nudge(direction);
        }
        self.publish(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{BUILD_KEY, PROGRESS_KEY, TUTORIAL_KEY};
    use crate::world::{Enemy, Orb};
    use limitless_engine::{EntityId, KeyValueStore, MemoryStore};

    fn context(tutorial_done: bool) -> EngineContext {
        let mut store = MemoryStore::new();
        if tutorial_done {
            store.set(TUTORIAL_KEY, "1");
        }
        EngineContext::with_store(Box::new(store))
    }

    fn started() -> (Arena, EngineContext) {
        let mut ctx = context(true);
        let mut arena = Arena::new();
        arena.init(&mut ctx);
        ctx.take_outbox();
        (arena, ctx)
    }

    fn frame(arena: &mut Arena, ctx: &mut EngineContext, events: &[InputEvent]) {
        let mut queue = InputQueue::new();
        for event in events {
            queue.push(event.clone());
        }
        ctx.clear_frame_data();
        arena.on_frame(ctx, FIXED_DT);
        arena.update(ctx, &queue);
    }

    fn frames(arena: &mut Arena, ctx: &mut EngineContext, count: usize) {
        for _ in 0..count {
            frame(arena, ctx, &[]);
        }
    }

    fn custom(kind: u32, a: f32) -> InputEvent {
        InputEvent::Custom {
            kind,
            a,
            b: 0.0,
            c: 0.0,
        }
    }

    fn key(key_code: u32) -> InputEvent {
        InputEvent::KeyDown { key_code }
    }

    /// Drop an orb worth `value` XP on the player.
    fn feed_xp(arena: &mut Arena, value: u32) {
        let pos = arena.world.player.pos;
        arena.world.orbs.acquire(Orb {
            pos,
            vel: Vec2::ZERO,
            value,
        });
    }

    fn enemy_on_player(arena: &mut Arena) {
        let pos = arena.world.player.pos;
        arena.world.enemies.acquire(Enemy {
            id: EntityId(9999),
            pos,
            hp: 100,
            ..Enemy::default()
        });
    }

    #[test]
    fn run_opens_with_six_seekers() {
        let (arena, _ctx) = started();
        assert_eq!(arena.phase(), RunPhase::Active);
        assert!(!arena.is_practice());
        assert_eq!(arena.world.enemies.len(), OPENING_PACK);
        assert!(arena
            .world
            .enemies
            .iter()
            .all(|(_, e)| e.archetype == Archetype::Seeker));
        assert_eq!(arena.remaining, 90);
    }

    #[test]
    fn first_launch_drills_then_plays() {
        let mut ctx = context(false);
        let mut arena = Arena::new();
        arena.init(&mut ctx);
        assert!(arena.is_practice());
        assert!(arena.drill);
        assert!(ctx.take_outbox().contains(r#"{"type":"practice","active":true}"#));

        // Spawning is held during the drill
        frames(&mut arena, &mut ctx, 200);
        assert!(arena.world.enemies.len() <= OPENING_PACK);

        arena.world.enemies.clear();
        frame(&mut arena, &mut ctx, &[]);
        assert!(!arena.is_practice());
        assert!(tutorial_seen(ctx.store.as_ref()));
        assert_eq!(arena.world.enemies.len(), OPENING_PACK);
        assert!(ctx.take_outbox().contains(r#"{"type":"practice","active":false}"#));
    }

    #[test]
    fn practice_never_ends_or_hurts() {
        let (mut arena, mut ctx) = started();
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_START_PRACTICE, 1.0)]);
        assert!(arena.is_practice());
        enemy_on_player(&mut arena);
        frames(&mut arena, &mut ctx, 120);
        assert_eq!(arena.build.hp, arena.build.max_hp);
        assert_eq!(arena.remaining, 90);
        assert_eq!(arena.phase(), RunPhase::Active);
    }

    #[test]
    fn level_up_freezes_the_run() {
        let (mut arena, mut ctx) = started();
        arena.build.hp = 3;
        feed_xp(&mut arena, 10);
        frame(&mut arena, &mut ctx, &[]);
        assert_eq!(arena.phase(), RunPhase::LevelUp);
        assert!(ctx.take_outbox().contains(r#""type":"levelUpOffered""#));
        assert!(arena.clock.is_paused());

        let clock = arena.clock.now();
        let attack = arena.combat.attack_remaining();
        let enemies: Vec<Vec2> = arena.world.enemies.iter().map(|(_, e)| e.pos).collect();
        let remaining = arena.remaining;
        frames(&mut arena, &mut ctx, 300);
        assert_eq!(arena.clock.now(), clock);
        assert_eq!(arena.combat.attack_remaining(), attack);
        assert_eq!(arena.remaining, remaining);
        assert_eq!(arena.world.player.vel, Vec2::ZERO);
        let after: Vec<Vec2> = arena.world.enemies.iter().map(|(_, e)| e.pos).collect();
        assert_eq!(after, enemies);

        frame(&mut arena, &mut ctx, &[custom(CUSTOM_SELECT, 0.0)]);
        assert_eq!(arena.phase(), RunPhase::Active);
        assert_eq!(arena.build.hp, arena.build.max_hp);
        assert!(ctx.take_outbox().contains(r#""type":"upgradeApplied""#));
    }

    #[test]
    fn queued_level_ups_open_back_to_back() {
        let (mut arena, mut ctx) = started();
        feed_xp(&mut arena, 25);
        frame(&mut arena, &mut ctx, &[]);
        assert_eq!(arena.phase(), RunPhase::LevelUp);
        frame(&mut arena, &mut ctx, &[key(KEY_1)]);
        assert_eq!(arena.phase(), RunPhase::LevelUp);
        frame(&mut arena, &mut ctx, &[key(KEY_2)]);
        assert_eq!(arena.phase(), RunPhase::Active);
        assert_eq!(arena.build.upgrade_levels.values().sum::<u32>(), 2);
    }

    #[test]
    fn pause_and_resume_by_keyboard() {
        let (mut arena, mut ctx) = started();
        frame(&mut arena, &mut ctx, &[key(KEY_ESCAPE)]);
        assert_eq!(arena.phase(), RunPhase::Paused);
        assert!(ctx.take_outbox().contains(r#"{"type":"pauseOpened"}"#));
        let clock = arena.clock.now();
        frames(&mut arena, &mut ctx, 30);
        assert_eq!(arena.clock.now(), clock);
        // Focus starts on "resume"
        frame(&mut arena, &mut ctx, &[key(KEY_SPACE)]);
        assert_eq!(arena.phase(), RunPhase::Active);
        assert!(ctx.take_outbox().contains(r#"{"type":"resumed"}"#));
    }

    #[test]
    fn pause_settings_item_requests_the_panel() {
        let (mut arena, mut ctx) = started();
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_PAUSE, 0.0)]);
        ctx.take_outbox();
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_SELECT, 1.0)]);
        assert!(ctx
            .take_outbox()
            .contains(r#"{"type":"uiRequest","action":{"action":"openSettings"}}"#));
        assert_eq!(arena.phase(), RunPhase::Paused);
    }

    #[test]
    fn defeat_ends_once_and_drops_the_build() {
        let (mut arena, mut ctx) = started();
        ctx.store.set(BUILD_KEY, "{}");
        arena.build.hp = 1;
        enemy_on_player(&mut arena);
        frame(&mut arena, &mut ctx, &[]);
        assert_eq!(arena.phase(), RunPhase::Over(EndReason::Defeat));
        assert!(ctx.store.get(BUILD_KEY).is_none());
        let outbox = ctx.take_outbox();
        assert_eq!(outbox.matches(r#""type":"runOver""#).count(), 1);
        assert!(outbox.contains(r#""reason":"defeat""#));

        frames(&mut arena, &mut ctx, 10);
        assert!(!ctx.take_outbox().contains("runOver"));
    }

    #[test]
    fn boss_arrives_and_stops_the_clock() {
        let (mut arena, mut ctx) = started();
        arena.remaining = 36;
        frame(&mut arena, &mut ctx, &[]);
        assert!(arena.boss.is_active());
        assert!(ctx.take_outbox().contains(r#"{"type":"bossSpawned","hp":120}"#));
        arena.combat.sandbox = true;
        frames(&mut arena, &mut ctx, 180);
        assert_eq!(arena.remaining, 36);
    }

    #[test]
    fn overkilling_the_boss_is_a_timed_success() {
        let (mut arena, mut ctx) = started();
        arena.remaining = 36;
        frame(&mut arena, &mut ctx, &[]);
        arena.boss.damage(119);
        arena.build.apply(UpgradeKind::StaticField);
        arena.build.static_field.damage = 2;
        arena.build.static_field.radius = 2000.0;
        arena.build.static_field.cooldown = 50.0;
        arena.combat.sync_static_field(&arena.build);
        arena.build.hp = 2;
        frames(&mut arena, &mut ctx, 5);

        assert_eq!(arena.phase(), RunPhase::Over(EndReason::Time));
        assert!(arena.boss.is_defeated());
        let outbox = ctx.take_outbox();
        assert!(outbox.contains(r#""reason":"time""#));

        let saved = ctx.store.get(BUILD_KEY).unwrap_or_default();
        let exported: PlayerBuild = serde_json::from_str(&saved).unwrap();
        assert_eq!(exported.hp, exported.max_hp);
        assert_eq!(exported.static_field.level, 1);

        let progress: Progress = serde_json::from_str(&ctx.store.get(PROGRESS_KEY).unwrap()).unwrap();
        assert_eq!(progress.tokens, 2 + arena.kills / 10);
        assert_eq!(progress.highest_unlocked, 1);
        assert!(Rewards::load(ctx.store.as_ref()).magnet);
    }

    #[test]
    fn exporting_twice_writes_the_same_record() {
        let (mut arena, mut ctx) = started();
        arena.end_run(&mut ctx, EndReason::Time);
        let first = ctx.store.get(BUILD_KEY);
        save_build(ctx.store.as_mut(), &arena.build);
        assert_eq!(ctx.store.get(BUILD_KEY), first);
    }

    #[test]
    fn carried_build_and_rewards_shape_the_next_run() {
        let (mut arena, mut ctx) = started();
        arena.build.apply(UpgradeKind::Pierce);
        arena.end_run(&mut ctx, EndReason::Time);
        // Retry keeps nothing
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_RETRY, 0.0)]);
        assert_eq!(arena.build.pierce_count, 0);
        assert!(arena.build.has_magnet);

        arena.build.apply(UpgradeKind::Pierce);
        arena.end_run(&mut ctx, EndReason::Time);
        arena.start_run(&mut ctx, 1, false, false);
        assert_eq!(arena.build.pierce_count, 1);
    }

    #[test]
    fn run_over_menu_lists_next_stage_once_unlocked() {
        let (mut arena, mut ctx) = started();
        arena.progress.tokens = 10;
        arena.kills = 10;
        arena.end_run(&mut ctx, EndReason::Time);
        assert!(arena.progress.is_unlocked(2));
        assert_eq!(
            arena.run_over_items,
            vec![RunOverItem::NextStage, RunOverItem::Retry, RunOverItem::Menu]
        );
        frame(&mut arena, &mut ctx, &[key(KEY_1)]);
        assert_eq!(arena.stage(), 2);
        assert_eq!(arena.remaining, 105);
        assert_eq!(arena.phase(), RunPhase::Active);
    }

    #[test]
    fn voice_and_custom_moves_nudge_the_player() {
        let (mut arena, mut ctx) = started();
        let origin = arena.world.player.pos;
        frame(
            &mut arena,
            &mut ctx,
            &[InputEvent::Text {
                kind: TEXT_VOICE,
                text: "go left".to_string(),
            }],
        );
        assert_eq!(arena.input.target(), Some(origin - Vec2::new(160.0, 0.0)));
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_STOP, 0.0)]);
        assert_eq!(arena.input.target(), None);
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_MOVE, 1.0)]);
        assert!(arena.input.target().is_some_and(|t| t.y > origin.y));
    }

    #[test]
    fn voice_settings_phrases_become_ui_requests() {
        let (mut arena, mut ctx) = started();
        frame(
            &mut arena,
            &mut ctx,
            &[InputEvent::Text {
                kind: TEXT_VOICE,
                text: "high contrast please".to_string(),
            }],
        );
        assert!(ctx.take_outbox().contains(r#""action":{"action":"toggleContrast"}"#));
        assert!(!arena.settings.high_contrast);
    }

    #[test]
    fn settings_event_reconfigures_input() {
        let (mut arena, mut ctx) = started();
        frame(
            &mut arena,
            &mut ctx,
            &[InputEvent::Text {
                kind: TEXT_SETTINGS,
                text: r#"{"movementMode":"follow","scanMode":true,"followGain":"bad"}"#.to_string(),
            }],
        );
        assert_eq!(arena.input.mode(), crate::settings::MovementMode::Follow);
        assert!(arena.scan.is_enabled());
        assert_eq!(arena.settings.follow_gain, 1.0);
    }

    #[test]
    fn face_tilt_repeats_nudges() {
        let (mut arena, mut ctx) = started();
        frame(&mut arena, &mut ctx, &[InputEvent::Custom {
            kind: CUSTOM_FACE_SAMPLE,
            a: 0.2,
            b: 1.0,
            c: 0.0,
        }]);
        assert!(ctx
            .take_outbox()
            .contains(r#"{"type":"faceDirection","direction":"left"}"#));
        assert_eq!(arena.input.target(), None);
        // First nudge after one repeat interval (300 ms)
        frames(&mut arena, &mut ctx, 19);
        assert!(arena.input.target().is_some());
        frame(&mut arena, &mut ctx, &[custom(CUSTOM_FACE_LOST, 0.0)]);
        assert!(ctx
            .take_outbox()
            .contains(r#"{"type":"faceDirection","direction":null}"#));
    }

    #[test]
    fn held_arrow_moves_the_player() {
        let (mut arena, mut ctx) = started();
        let x = arena.world.player.pos.x;
        frame(&mut arena, &mut ctx, &[key(KEY_RIGHT)]);
        frames(&mut arena, &mut ctx, 10);
        assert!(arena.world.player.pos.x > x);
        frame(&mut arena, &mut ctx, &[InputEvent::KeyUp { key_code: KEY_RIGHT }]);
        let stopped = arena.world.player.pos.x;
        frames(&mut arena, &mut ctx, 10);
        assert_eq!(arena.world.player.pos.x, stopped);
    }

    #[test]
    fn slow_frames_stretch_spawn_delay() {
        let (mut arena, mut ctx) = started();
        let base = arena.spawner.delay();
        for _ in 0..60 {
            ctx.clear_frame_data();
            arena.on_frame(&mut ctx, 0.040);
        }
        assert_eq!(arena.spawner.delay(), base + 600.0);
        assert!(ctx.take_outbox().contains(r#""type":"hint""#));
    }

    #[test]
    fn dwell_activates_the_focused_overlay_item() {
        let (mut arena, mut ctx) = started();
        frame(
            &mut arena,
            &mut ctx,
            &[InputEvent::Text {
                kind: TEXT_SETTINGS,
                text: r#"{"scanMode":true,"scanInterval":5000,"dwellEnabled":true,"dwellTime":300}"#
                    .to_string(),
            }],
        );
        frame(&mut arena, &mut ctx, &[key(KEY_P)]);
        assert_eq!(arena.phase(), RunPhase::Paused);
        frames(&mut arena, &mut ctx, 20);
        assert_eq!(arena.phase(), RunPhase::Active);
    }
}
