use serde::Serialize;

use crate::api::types::{EntityId, GameEvent, Instance, SoundEvent};
use crate::core::storage::{KeyValueStore, MemoryStore};
use crate::input::queue::InputQueue;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of render instances published per frame (default: 512).
    pub max_instances: usize,
    /// Maximum number of sound events per frame (default: 32).
    pub max_sounds: usize,
    /// Maximum number of game events per frame (default: 64).
    pub max_events: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
            max_instances: 512,
            max_sounds: 32,
            max_events: 64,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, load persisted records, spawn the opening wave.
    fn init(&mut self, ctx: &mut EngineContext);

    /// One fixed simulation step. Input is visible to every step of the frame.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Called once per rendered frame, before the fixed steps, with the real frame time
    /// in seconds. Use it for wall-clock concerns that must keep running while the
    /// simulation is paused.
    fn on_frame(&mut self, _ctx: &mut EngineContext, _frame_dt: f32) {}
}

/// Mutable access to engine state, passed to every `Game` hook.
pub struct EngineContext {
    pub sounds: Vec<SoundEvent>,
    pub events: Vec<GameEvent>,
    /// Render snapshot, rebuilt by the game each frame.
    pub instances: Vec<Instance>,
    /// Serialized notifications for the UI layer, drained by the host.
    pub outbox: Vec<String>,
    /// Persistent key-value storage.
    pub store: Box<dyn KeyValueStore>,
    /// Seed for the game's random source.
    pub seed: u64,
    next_id: u32,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_store(Box::new(MemoryStore::new()))
    }

    /// Create an EngineContext backed by the given store.
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            sounds: Vec::new(),
            events: Vec::new(),
            instances: Vec::new(),
            outbox: Vec::new(),
            store,
            seed: 42,
            next_id: 1,
        }
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a sound event to be forwarded to TypeScript.
    pub fn emit_sound(&mut self, event: SoundEvent) {
        self.sounds.push(event);
    }

    /// Emit a game event to be forwarded to TypeScript.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Serialize a notification into the outbox.
    /// A value that fails to serialize is dropped with a warning.
    pub fn emit_notice<T: Serialize>(&mut self, notice: &T) {
        match serde_json::to_string(notice) {
            Ok(json) => self.outbox.push(json),
            Err(err) => log::warn!("dropping notice: {err}"),
        }
    }

    /// Take every queued notification as one JSON array.
    pub fn take_outbox(&mut self) -> String {
        let items = std::mem::take(&mut self.outbox);
        format!("[{}]", items.join(","))
    }

    /// Clear per-frame transient data (sounds, events, instances).
    /// The outbox survives until the host drains it.
    pub fn clear_frame_data(&mut self) {
        self.sounds.clear();
        self.events.clear();
        self.instances.clear();
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
