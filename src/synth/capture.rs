//! CaptureSynth - a silent synthesizer that writes down what it was asked to do
//!
//! Used for headless runs, tests and benchmarks where only the note
//! lifecycle matters, not the audio.

use std::collections::HashMap;

use super::voice::{Synthesizer, VoiceId};

/// One call made against the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthCall {
    Start { id: VoiceId, frequency: f32, gain: f32 },
    Stop { id: VoiceId },
    Click { frequency: f32, gain: f32 },
}

#[derive(Debug, Default)]
pub struct CaptureSynth {
    calls: Vec<SynthCall>,
    /// Voices started and not yet stopped: id → frequency
    sounding: HashMap<VoiceId, f32>,
    next_id: u64,
}

impl CaptureSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SynthCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of voices started and not stopped
    pub fn sounding(&self) -> usize {
        self.sounding.len()
    }

    /// Whether a voice at `frequency` is currently sounding
    pub fn is_sounding(&self, frequency: f32) -> bool {
        self.sounding.values().any(|&f| f == frequency)
    }

    /// Frequencies of every click, in order
    pub fn clicks(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SynthCall::Click { frequency, .. } => Some(*frequency),
                _ => None,
            })
            .collect()
    }
}

impl Synthesizer for CaptureSynth {
    fn start_voice(&mut self, frequency: f32, gain: f32) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;

        self.sounding.insert(id, frequency);
        self.calls.push(SynthCall::Start { id, frequency, gain });
        id
    }

    fn stop_voice(&mut self, id: VoiceId) {
        self.sounding.remove(&id);
        self.calls.push(SynthCall::Stop { id });
    }

    fn click(&mut self, frequency: f32, gain: f32) {
        self.calls.push(SynthCall::Click { frequency, gain });
    }
}
