use bytemuck::{Pod, Zeroable};

/// Unique identifier for a live gameplay object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// A sound event emitted by the game logic.
/// The numeric value maps to a game-defined cue in the TypeScript audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct SoundEvent(pub u32);

/// A game event communicated from Rust to TypeScript via the shared buffer.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }
}

/// One drawable object in the frame snapshot.
/// The renderer maps `kind` to a sprite; the engine never interprets it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub x: f32,
    pub y: f32,
    pub kind: f32,
    pub rotation: f32,
}

impl Instance {
    pub const FLOATS: usize = 4;

    pub fn new(pos: glam::Vec2, kind: f32, rotation: f32) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            kind,
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_structs_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<GameEvent>(), GameEvent::FLOATS * 4);
        assert_eq!(std::mem::size_of::<Instance>(), Instance::FLOATS * 4);
    }

    #[test]
    fn instances_cast_to_floats() {
        let items = [Instance::new(glam::Vec2::new(1.0, 2.0), 3.0, 0.5)];
        let floats: &[f32] = bytemuck::cast_slice(&items);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.5]);
    }
}
