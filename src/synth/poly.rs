//! Voice management - polyphony and the sustain pedal
//!
//! One live voice per note. Pressing a note that is already sounding stops
//! the old voice before starting the new one, so a re-struck key never leaves
//! a ghost voice ringing underneath.
//!
//! The sustain pedal changes what release means: with the pedal down, a
//! released note keeps sounding and goes into the held set. Lifting the pedal
//! stops everything in the held set in one call.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::keyboard::Note;

use super::voice::{Synthesizer, Voice};

/// Result of releasing a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The voice was stopped
    Stopped,
    /// Sustain is down; the note keeps ringing until the pedal lifts
    Held,
    /// Nothing was sounding for that note
    Silent,
}

/// Sustain pedal state: the flag plus notes released while it was down.
#[derive(Debug, Default)]
struct SustainState {
    active: bool,
    held: BTreeSet<Note>,
}

pub struct VoiceManager<S: Synthesizer> {
    synth: S,
    voices: BTreeMap<Note, Voice>,
    sustain: SustainState,
    /// Master volume, 0-100
    volume: f32,
}

impl<S: Synthesizer> VoiceManager<S> {
    pub fn new(synth: S) -> Self {
        Self {
            synth,
            voices: BTreeMap::new(),
            sustain: SustainState::default(),
            volume: 100.0,
        }
    }

    /// Key down: start a voice for `note`, replacing any voice already sounding.
    pub fn press(&mut self, note: Note) {
        if let Some(old) = self.voices.remove(&note) {
            debug!("retrigger {}", note);
            old.stop(&mut self.synth);
        }

        // The key is down again, so it is no longer held by the pedal
        self.sustain.held.remove(&note);

        let gain = self.master_gain();
        let voice = Voice::start(&mut self.synth, note, gain);
        self.voices.insert(note, voice);
    }

    /// Key up. Under sustain the note is held instead of stopped.
    pub fn release(&mut self, note: Note) -> Release {
        if self.sustain.active {
            self.sustain.held.insert(note);
            return Release::Held;
        }

        match self.voices.remove(&note) {
            Some(voice) => {
                voice.stop(&mut self.synth);
                Release::Stopped
            }
            None => Release::Silent,
        }
    }

    /// Set master volume as a percentage. Applies to voices started afterwards.
    pub fn set_volume(&mut self, percent: f32) {
        self.volume = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
    }

    /// Pedal down / up. Lifting the pedal stops every held note and returns them.
    pub fn set_sustain(&mut self, active: bool) -> Vec<Note> {
        let was_active = self.sustain.active;
        self.sustain.active = active;

        if !was_active || active {
            return Vec::new();
        }

        let held = std::mem::take(&mut self.sustain.held);
        let mut stopped = Vec::with_capacity(held.len());
        for note in held {
            if let Some(voice) = self.voices.remove(&note) {
                voice.stop(&mut self.synth);
                stopped.push(note);
            }
        }
        stopped
    }

    /// Stop every voice and forget the held set. Returns the notes that were sounding.
    pub fn all_notes_off(&mut self) -> Vec<Note> {
        self.sustain.held.clear();
        let voices = std::mem::take(&mut self.voices);
        voices
            .into_values()
            .map(|voice| {
                let note = voice.note();
                voice.stop(&mut self.synth);
                note
            })
            .collect()
    }

    /// Sounding notes, lowest first
    pub fn active_notes(&self) -> Vec<Note> {
        self.voices.keys().copied().collect()
    }

    pub fn is_active(&self, note: Note) -> bool {
        self.voices.contains_key(&note)
    }

    pub fn voice(&self, note: Note) -> Option<&Voice> {
        self.voices.get(&note)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_sustained(&self) -> bool {
        self.sustain.active
    }

    /// Notes released while the pedal was down, lowest first
    pub fn held_notes(&self) -> Vec<Note> {
        self.sustain.held.iter().copied().collect()
    }

    pub fn volume_percent(&self) -> f32 {
        self.volume
    }

    /// Output scaling applied to new voices (volume / 100)
    pub fn master_gain(&self) -> f32 {
        self.volume / 100.0
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }
}
