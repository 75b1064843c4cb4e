//! Input routing - physical keys to notes and transport actions
//!
//! The home row plays the white keys and the row above it the black keys,
//! the same layout most browser and DAW "computer keyboard" pianos use:
//!
//! ```text
//!   w e   t y u   o p
//!  a s d f g h j k l ;
//! ```
//!
//! Everything else on the keyboard is either a control key or ignored.

use super::notes::{self, Note};

/// Default key layout, lowest note first.
const NOTE_KEYS: [(char, Note); notes::NOTE_COUNT] = [
    ('a', notes::C4),
    ('w', notes::Cs4),
    ('s', notes::D4),
    ('e', notes::Ds4),
    ('d', notes::E4),
    ('f', notes::F4),
    ('t', notes::Fs4),
    ('g', notes::G4),
    ('y', notes::Gs4),
    ('h', notes::A4),
    ('u', notes::As4),
    ('j', notes::B4),
    ('k', notes::C5),
    ('o', notes::Cs5),
    ('l', notes::D5),
    ('p', notes::Ds5),
    (';', notes::E5),
];

/// Non-note controls reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Sustain pedal (held with the space bar)
    Sustain,
    ToggleRecording,
    PlayRecording,
    ToggleMetronome,
    StopComposing,
    VolumeDown,
    VolumeUp,
    BpmDown,
    BpmUp,
    /// Compose the mood at this position in the mood table
    ComposeMood(usize),
    /// Start typing a free-text mood description
    MoodPrompt,
}

/// What a key press resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Note(Note),
    Action(Action),
}

/// Maps physical key identifiers to notes and actions.
#[derive(Debug, Clone, Default)]
pub struct InputRouter;

impl InputRouter {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a key. Unmapped keys give `None`.
    pub fn route(&self, key: char) -> Option<Routed> {
        let key = key.to_ascii_lowercase();

        if let Some(note) = self.note_for(key) {
            return Some(Routed::Note(note));
        }

        let action = match key {
            ' ' => Action::Sustain,
            'z' => Action::ToggleRecording,
            'x' => Action::PlayRecording,
            'c' => Action::ToggleMetronome,
            'v' => Action::StopComposing,
            '[' => Action::VolumeDown,
            ']' => Action::VolumeUp,
            ',' => Action::BpmDown,
            '.' => Action::BpmUp,
            '/' => Action::MoodPrompt,
            // 1..9 pick moods 0..8, 0 picks the tenth
            '1'..='9' => Action::ComposeMood(key as usize - '1' as usize),
            '0' => Action::ComposeMood(9),
            _ => return None,
        };
        Some(Routed::Action(action))
    }

    /// The note a key plays, if any.
    pub fn note_for(&self, key: char) -> Option<Note> {
        NOTE_KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, note)| note)
    }

    /// The key that plays `note` (for drawing key labels).
    pub fn key_for(&self, note: Note) -> Option<char> {
        NOTE_KEYS
            .iter()
            .find(|(_, n)| *n == note)
            .map(|&(k, _)| k)
    }
}
