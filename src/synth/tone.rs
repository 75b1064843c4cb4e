//! ToneSynth - the piano's built-in sound
//!
//! Each voice is a sine fundamental with two softer overtones, shaped by a
//! piano-style envelope. Stopped voices keep rendering through their release
//! and are dropped once silent.
//!
//! # How It Works
//!
//! 1. Fundamental + 2nd harmonic (0.35) + 3rd harmonic (0.12) for a warm, struck tone
//! 2. Fast attack (5ms), long decay (400ms) into a 45% ring
//! 3. Release (350ms) when the voice is stopped
//! 4. Clicks use the same oscillator with a one-shot 40ms envelope
//! 5. The mix goes through `tanh` so chords saturate softly instead of clipping

use std::f32::consts::TAU;

use super::envelope::Envelope;
use super::voice::{Synthesizer, VoiceId};

const HARMONICS: [(f32, f32); 3] = [(1.0, 1.0), (2.0, 0.35), (3.0, 0.12)];
const HARMONIC_SUM: f32 = 1.0 + 0.35 + 0.12;

struct ToneVoice {
    id: VoiceId,
    frequency: f32,
    gain: f32,
    /// Fundamental phase, 0.0-1.0
    phase: f32,
    envelope: Envelope,
}

impl ToneVoice {
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let level = self.envelope.next_level();

        let mut value = 0.0;
        for (multiple, amplitude) in HARMONICS {
            value += (TAU * self.phase * multiple).sin() * amplitude;
        }

        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        value / HARMONIC_SUM * level * self.gain
    }
}

pub struct ToneSynth {
    sample_rate: f32,
    voices: Vec<ToneVoice>,
    next_id: u64,
}

impl ToneSynth {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            voices: Vec::with_capacity(32),
            next_id: 0,
        }
    }

    /// Mix every voice into `out` (overwrites the buffer).
    pub fn render(&mut self, out: &mut [f32]) {
        let sample_rate = self.sample_rate;

        for sample in out.iter_mut() {
            let mut mix = 0.0;
            for voice in &mut self.voices {
                mix += voice.next_sample(sample_rate);
            }
            *sample = mix.tanh();
        }

        self.voices.retain(|v| v.envelope.is_active());
    }

    /// Voices still producing sound, including ones in release
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn spawn(&mut self, frequency: f32, gain: f32, mut envelope: Envelope) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;

        envelope.note_on();
        self.voices.push(ToneVoice {
            id,
            frequency,
            gain,
            phase: 0.0,
            envelope,
        });
        id
    }
}

impl Synthesizer for ToneSynth {
    fn start_voice(&mut self, frequency: f32, gain: f32) -> VoiceId {
        self.spawn(frequency, gain, Envelope::piano(self.sample_rate))
    }

    fn stop_voice(&mut self, id: VoiceId) {
        if let Some(voice) = self.voices.iter_mut().find(|v| v.id == id) {
            voice.envelope.note_off();
        }
    }

    fn click(&mut self, frequency: f32, gain: f32) {
        self.spawn(frequency, gain, Envelope::click(self.sample_rate));
    }
}
