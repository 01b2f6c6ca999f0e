/// Shared-buffer layout.
/// Must stay in sync with the TypeScript host's `protocol.ts`.
///
/// Layout (all values in f32 / 4 bytes):
/// ```text
/// [Header: 12 floats]
/// [Instances: max_instances × 4 floats]
/// [Sounds: max_sounds × 1 float]
/// [Events: max_events × 4 floats]
/// ```
///
/// Capacities are written once into the header at init.
/// TypeScript reads them from the header to compute offsets dynamically.

use crate::api::game::GameConfig;
use crate::api::types::{GameEvent, Instance};

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 12;

/// Header field indices.
pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_PROTOCOL_VERSION: usize = 2;
pub const HEADER_WORLD_WIDTH: usize = 3;
pub const HEADER_WORLD_HEIGHT: usize = 4;
pub const HEADER_MAX_INSTANCES: usize = 5;
pub const HEADER_INSTANCE_COUNT: usize = 6;
pub const HEADER_MAX_SOUNDS: usize = 7;
pub const HEADER_SOUND_COUNT: usize = 8;
pub const HEADER_MAX_EVENTS: usize = 9;
pub const HEADER_EVENT_COUNT: usize = 10;
pub const HEADER_OUTBOX_PENDING: usize = 11;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per render instance: x, y, kind, rotation.
pub const INSTANCE_FLOATS: usize = Instance::FLOATS;

/// Floats per game event: kind, a, b, c.
pub const EVENT_FLOATS: usize = GameEvent::FLOATS;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    /// Maximum render instances.
    pub max_instances: usize,
    /// Maximum sound events per frame.
    pub max_sounds: usize,
    /// Maximum game events per frame.
    pub max_events: usize,

    /// Size of instance data section in floats.
    pub instance_data_floats: usize,
    /// Size of sound data section in floats.
    pub sound_data_floats: usize,
    /// Size of event data section in floats.
    pub event_data_floats: usize,

    /// Offset (in floats) where instance data begins.
    pub instance_data_offset: usize,
    /// Offset (in floats) where sound data begins.
    pub sound_data_offset: usize,
    /// Offset (in floats) where event data begins.
    pub event_data_offset: usize,

    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    /// Compute layout from raw capacity values.
    pub fn new(max_instances: usize, max_sounds: usize, max_events: usize) -> Self {
        let instance_data_floats = max_instances * INSTANCE_FLOATS;
        let sound_data_floats = max_sounds;
        let event_data_floats = max_events * EVENT_FLOATS;

        let instance_data_offset = HEADER_FLOATS;
        let sound_data_offset = instance_data_offset + instance_data_floats;
        let event_data_offset = sound_data_offset + sound_data_floats;

        let buffer_total_floats = event_data_offset + event_data_floats;
        let buffer_total_bytes = buffer_total_floats * 4;

        Self {
            max_instances,
            max_sounds,
            max_events,
            instance_data_floats,
            sound_data_floats,
            event_data_floats,
            instance_data_offset,
            sound_data_offset,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes,
        }
    }

    /// Compute layout from a GameConfig.
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_instances, config.max_sounds, config.max_events)
    }

    /// Write the static header fields.
    pub fn write_header(&self, config: &GameConfig, header: &mut [f32; HEADER_FLOATS]) {
        header[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        header[HEADER_WORLD_WIDTH] = config.world_width;
        header[HEADER_WORLD_HEIGHT] = config.world_height;
        header[HEADER_MAX_INSTANCES] = self.max_instances as f32;
        header[HEADER_MAX_SOUNDS] = self.max_sounds as f32;
        header[HEADER_MAX_EVENTS] = self.max_events as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_default_config_matches_expected_sizes() {
        let layout = ProtocolLayout::from_config(&GameConfig::default());
        assert_eq!(layout.max_instances, 512);
        assert_eq!(layout.max_sounds, 32);
        assert_eq!(layout.max_events, 64);
        assert_eq!(layout.instance_data_floats, 512 * 4);
        assert_eq!(layout.event_data_floats, 64 * 4);
        assert_eq!(
            layout.buffer_total_floats,
            HEADER_FLOATS + 512 * 4 + 32 + 64 * 4
        );
        assert_eq!(layout.buffer_total_bytes, layout.buffer_total_floats * 4);
    }

    #[test]
    fn offsets_are_contiguous() {
        let layout = ProtocolLayout::new(100, 10, 20);
        assert_eq!(layout.instance_data_offset, HEADER_FLOATS);
        assert_eq!(layout.sound_data_offset, layout.instance_data_offset + layout.instance_data_floats);
        assert_eq!(layout.event_data_offset, layout.sound_data_offset + layout.sound_data_floats);
        assert_eq!(layout.buffer_total_floats, layout.event_data_offset + layout.event_data_floats);
    }

    #[test]
    fn header_carries_world_and_capacities() {
        let config = GameConfig {
            world_width: 1280.0,
            world_height: 720.0,
            ..GameConfig::default()
        };
        let layout = ProtocolLayout::from_config(&config);
        let mut header = [0.0; HEADER_FLOATS];
        layout.write_header(&config, &mut header);
        assert_eq!(header[HEADER_WORLD_WIDTH], 1280.0);
        assert_eq!(header[HEADER_MAX_EVENTS], 64.0);
        assert_eq!(header[HEADER_PROTOCOL_VERSION], PROTOCOL_VERSION);
    }
}
