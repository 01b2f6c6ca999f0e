pub mod api;
pub mod bridge;
pub mod core;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::game::{EngineContext, Game, GameConfig};
pub use api::types::{EntityId, GameEvent, Instance, SoundEvent};
pub use bridge::protocol::ProtocolLayout;
pub use core::pool::Pool;
pub use core::rng::Rng;
pub use core::storage::{from_json_lenient, load_lenient, save_json, KeyValueStore, MemoryStore};
pub use core::time::{FixedTimestep, SceneClock, Timer};
pub use input::queue::{InputEvent, InputQueue};
