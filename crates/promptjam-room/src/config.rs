//! Room tuning knobs.

use std::time::Duration;

/// Configuration shared by every room a registry spawns.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a room survives without its game master before it
    /// resets and expires.
    pub gm_grace: Duration,
    /// Capacity of each room's command channel.
    pub command_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            gm_grace: Duration::from_secs(5),
            command_buffer: 64,
        }
    }
}
