pub mod composer; // Mood analysis and the generative melody loop
pub mod config;
pub mod keyboard; // Note table and key routing
pub mod metronome;
pub mod piano; // The engine: one timeline, every component
pub mod recorder;
pub mod status;
pub mod synth; // Voice management, sustain and the built-in tone
pub mod timeline; // Sample-accurate scheduling

pub use config::{ConfigError, PianoConfig};
pub use keyboard::Note;
pub use piano::{Notification, Piano, TimelineEvent};
pub use status::PianoStatus;

/// Largest block the audio callback renders in one go
pub const MAX_BLOCK_SIZE: usize = 2048;
