use crate::keyboard::Note;

/// Identifies one tone inside a [`Synthesizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// The sound source behind the piano.
///
/// Given a frequency it starts a tone; given a stop signal it lets the tone
/// ring out through its release. How the tone is shaped is up to the
/// implementation - the voice manager only ever starts and stops.
pub trait Synthesizer {
    /// Start a sustained tone. Sound begins immediately.
    fn start_voice(&mut self, frequency: f32, gain: f32) -> VoiceId;

    /// Release a tone. It falls silent once its release envelope finishes.
    fn stop_voice(&mut self, id: VoiceId);

    /// One short blip that stops by itself (metronome).
    fn click(&mut self, frequency: f32, gain: f32);
}

impl<S: Synthesizer + ?Sized> Synthesizer for Box<S> {
    fn start_voice(&mut self, frequency: f32, gain: f32) -> VoiceId {
        (**self).start_voice(frequency, gain)
    }

    fn stop_voice(&mut self, id: VoiceId) {
        (**self).stop_voice(id)
    }

    fn click(&mut self, frequency: f32, gain: f32) {
        (**self).click(frequency, gain)
    }
}

/// One sounding instance of a note.
#[derive(Debug, PartialEq)]
pub struct Voice {
    note: Note,
    id: VoiceId,
    /// Master gain the voice was started with
    gain: f32,
}

impl Voice {
    /// Start a tone for `note` on `synth`.
    pub fn start<S: Synthesizer>(synth: &mut S, note: Note, gain: f32) -> Self {
        let id = synth.start_voice(note.frequency(), gain);
        Self { note, id, gain }
    }

    /// Send the stop signal. Consumes the voice so it can only be stopped once.
    pub fn stop<S: Synthesizer>(self, synth: &mut S) {
        synth.stop_voice(self.id);
    }

    pub fn note(&self) -> Note {
        self.note
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}
