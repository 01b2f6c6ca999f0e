use limitless_engine::bridge::protocol::{
    HEADER_EVENT_COUNT, HEADER_FLOATS, HEADER_FRAME_COUNTER, HEADER_INSTANCE_COUNT,
    HEADER_OUTBOX_PENDING, HEADER_SOUND_COUNT,
};
use limitless_engine::{
    EngineContext, FixedTimestep, Game, GameConfig, InputEvent, InputQueue, KeyValueStore,
    MemoryStore, ProtocolLayout,
};

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free functions
/// via `#[wasm_bindgen]`, because wasm-bindgen cannot export generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    initialized: bool,
    header: [f32; HEADER_FLOATS],
    /// Flat buffer of sound event IDs for shared-buffer reads.
    sound_buffer: Vec<u8>,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        Self::with_store(game, Box::new(MemoryStore::new()))
    }

    /// Create a runner whose context persists through `store`.
    pub fn with_store(game: G, store: Box<dyn KeyValueStore>) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        let layout = ProtocolLayout::from_config(&config);
        let sound_buffer = Vec::with_capacity(config.max_sounds);

        Self {
            game,
            ctx: EngineContext::with_store(store),
            input: InputQueue::new(),
            timestep,
            layout,
            config,
            initialized: false,
            header: [0.0; HEADER_FLOATS],
            sound_buffer,
        }
    }

    /// Seed the game's random source. Call before `init`.
    pub fn set_seed(&mut self, seed: u64) {
        self.ctx.seed = seed;
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.config = self.game.config();
        self.layout = ProtocolLayout::from_config(&self.config);
        self.layout.write_header(&self.config, &mut self.header);
        self.game.init(&mut self.ctx);
        self.initialized = true;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame tick: frame hook, fixed updates, then pack buffers.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        // Clear per-frame transient data
        self.ctx.clear_frame_data();

        self.game.on_frame(&mut self.ctx, dt);

        // Fixed timestep accumulation
        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
        }

        // Input is only dropped once at least one step has seen it
        if steps > 0 {
            self.input.drain();
        }

        self.enforce_capacities();

        // Pack sound events into flat buffer
        self.sound_buffer.clear();
        for sound in &self.ctx.sounds {
            self.sound_buffer.push(sound.0 as u8);
        }

        self.header[HEADER_FRAME_COUNTER] += 1.0;
        self.header[HEADER_INSTANCE_COUNT] = self.ctx.instances.len() as f32;
        self.header[HEADER_SOUND_COUNT] = self.sound_buffer.len() as f32;
        self.header[HEADER_EVENT_COUNT] = self.ctx.events.len() as f32;
        self.header[HEADER_OUTBOX_PENDING] = self.ctx.outbox.len() as f32;
    }

    fn enforce_capacities(&mut self) {
        if self.ctx.instances.len() > self.layout.max_instances {
            log::debug!(
                "instance overflow: {} > {}",
                self.ctx.instances.len(),
                self.layout.max_instances
            );
            self.ctx.instances.truncate(self.layout.max_instances);
        }
        self.ctx.sounds.truncate(self.layout.max_sounds);
        self.ctx.events.truncate(self.layout.max_events);
    }

    /// Drain queued notifications as a JSON array.
    pub fn take_outbox(&mut self) -> String {
        self.header[HEADER_OUTBOX_PENDING] = 0.0;
        self.ctx.take_outbox()
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    // ---- Pointer accessors for shared-buffer reads ----

    pub fn header_ptr(&self) -> *const f32 {
        self.header.as_ptr()
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.ctx.instances.as_ptr() as *const f32
    }

    pub fn instance_count(&self) -> u32 {
        self.ctx.instances.len() as u32
    }

    pub fn sound_events_ptr(&self) -> *const u8 {
        self.sound_buffer.as_ptr()
    }

    pub fn sound_events_len(&self) -> u32 {
        self.sound_buffer.len() as u32
    }

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len() as u32
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    // ---- Capacity accessors (read by TypeScript via wasm_bindgen exports) ----

    pub fn max_instances(&self) -> u32 {
        self.layout.max_instances as u32
    }

    pub fn max_sounds(&self) -> u32 {
        self.layout.max_sounds as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitless_engine::{GameEvent, SoundEvent};

    #[derive(Default)]
    struct Counter {
        frames: u32,
        steps: u32,
        keys_seen: u32,
    }

    impl Game for Counter {
        fn init(&mut self, ctx: &mut EngineContext) {
            ctx.emit_notice(&"ready");
        }

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.steps += 1;
            self.keys_seen += input.len() as u32;
            ctx.emit_sound(SoundEvent(1));
            ctx.emit_event(GameEvent::new(1.0, 0.0, 0.0, 0.0));
        }

        fn on_frame(&mut self, _ctx: &mut EngineContext, _frame_dt: f32) {
            self.frames += 1;
        }
    }

    #[test]
    fn tick_before_init_is_ignored() {
        let mut runner = GameRunner::new(Counter::default());
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game().frames, 0);
    }

    #[test]
    fn tick_runs_frame_hook_and_fixed_steps() {
        let mut runner = GameRunner::new(Counter::default());
        runner.init();
        runner.push_input(InputEvent::KeyDown { key_code: 32 });
        runner.tick(2.0 / 60.0 + 0.001);
        assert_eq!(runner.game().frames, 1);
        assert_eq!(runner.game().steps, 2);
        // Both steps of the frame see the same input
        assert_eq!(runner.game().keys_seen, 2);
        assert_eq!(runner.sound_events_len(), 2);
        assert_eq!(runner.game_events_len(), 2);
    }

    #[test]
    fn input_waits_for_a_step() {
        let mut runner = GameRunner::new(Counter::default());
        runner.init();
        runner.push_input(InputEvent::KeyDown { key_code: 32 });
        runner.tick(0.001);
        assert_eq!(runner.game().steps, 0);
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.game().keys_seen, 1);
    }

    #[test]
    fn outbox_drains_once() {
        let mut runner = GameRunner::new(Counter::default());
        runner.init();
        assert_eq!(runner.take_outbox(), r#"["ready"]"#);
        assert_eq!(runner.take_outbox(), "[]");
    }
}
