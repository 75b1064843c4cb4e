// Purpose: Voice management, polyphony, sustain
// This layer sits between note input and whatever actually makes the sound

pub mod capture;
pub mod envelope;
pub mod poly;
pub mod tone;
pub mod voice;

pub use capture::{CaptureSynth, SynthCall};
pub use poly::{Release, VoiceManager};
pub use tone::ToneSynth;
pub use voice::{Synthesizer, Voice, VoiceId};
