//! Limitless: an accessibility-first survival arena.
//!
//! The crate is the whole game core. Rendering, audio and the settings UI live in the
//! TypeScript host, which reads the shared buffer and the JSON outbox.

use wasm_bindgen::prelude::*;
use limitless_engine::*;

pub mod arena;
pub mod boss;
pub mod build;
pub mod combat;
pub mod events;
pub mod input;
pub mod perf;
pub mod progress;
pub mod progression;
pub mod scan;
pub mod settings;
pub mod spawner;
pub mod world;

pub use arena::Arena;

limitless_web::export_game!(Arena, "limitless");
