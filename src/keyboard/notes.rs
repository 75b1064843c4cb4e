/*
Note Table
==========

The piano spans 17 keys, C4 (middle C) up to E5. Every key has exactly one
identifier ("C4", "C#4", ...) and one frequency. The table is fixed: a `Note`
can only be built from an entry in it, so the rest of the crate never has to
handle an out-of-range note.

Frequencies are 12-tone equal temperament around A4 = 440 Hz, rounded to
hundredths the way piano tuning charts print them:

    f(n) = 440 * 2^((n - 69) / 12)      n = MIDI note number

Naming Convention:
- Identifiers use sharps: "C#4", "F#4", "A#4".
- Parsing also accepts flats ("Db4") and lowercase ("c#4").
- Rust constants spell sharps with an `s`: Cs4, Fs4, As4.

Key layout (index → identifier):

    0 C4   1 C#4   2 D4   3 D#4   4 E4   5 F4   6 F#4   7 G4   8 G#4
    9 A4  10 A#4  11 B4  12 C5  13 C#5  14 D5  15 D#5  16 E5
*/

use std::fmt;
use std::str::FromStr;

/// Number of keys on the instrument.
pub const NOTE_COUNT: usize = 17;

const TABLE: [(&str, f32); NOTE_COUNT] = [
    ("C4", 261.63),
    ("C#4", 277.18),
    ("D4", 293.66),
    ("D#4", 311.13),
    ("E4", 329.63),
    ("F4", 349.23),
    ("F#4", 369.99),
    ("G4", 392.00),
    ("G#4", 415.30),
    ("A4", 440.00),
    ("A#4", 466.16),
    ("B4", 493.88),
    ("C5", 523.25),
    ("C#5", 554.37),
    ("D5", 587.33),
    ("D#5", 622.25),
    ("E5", 659.25),
];

/// A key on the piano.
///
/// Opaque index into the note table. Cheap to copy, ordered by pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Note(u8);

#[allow(non_upper_case_globals)]
mod constants {
    use super::Note;

    pub const C4: Note = Note(0);
    pub const Cs4: Note = Note(1);
    pub const D4: Note = Note(2);
    pub const Ds4: Note = Note(3);
    pub const E4: Note = Note(4);
    pub const F4: Note = Note(5);
    pub const Fs4: Note = Note(6);
    pub const G4: Note = Note(7);
    pub const Gs4: Note = Note(8);
    pub const A4: Note = Note(9); // A440 tuning reference
    pub const As4: Note = Note(10);
    pub const B4: Note = Note(11);
    pub const C5: Note = Note(12);
    pub const Cs5: Note = Note(13);
    pub const D5: Note = Note(14);
    pub const Ds5: Note = Note(15);
    pub const E5: Note = Note(16);
}

pub use constants::*;

impl Note {
    /// Every key, lowest first.
    pub const ALL: [Note; NOTE_COUNT] = [
        C4, Cs4, D4, Ds4, E4, F4, Fs4, G4, Gs4, A4, As4, B4, C5, Cs5, D5, Ds5, E5,
    ];

    /// Look up a key by its position on the keyboard (0 = C4).
    pub fn from_index(index: usize) -> Option<Note> {
        (index < NOTE_COUNT).then(|| Note(index as u8))
    }

    /// Parse an identifier such as "C#5", "Db4" or "e5".
    ///
    /// Returns `None` for anything outside the table.
    pub fn from_name(name: &str) -> Option<Note> {
        let name = name.trim();
        let mut chars = name.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let rest = chars.as_str();

        let (accidental, octave) = match rest.chars().next()? {
            '#' => (1i32, &rest[1..]),
            'b' => (-1i32, &rest[1..]),
            _ => (0i32, rest),
        };

        let semitone = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let octave: i32 = octave.parse().ok()?;

        // Index relative to C4
        let index = (octave - 4) * 12 + semitone + accidental;
        usize::try_from(index).ok().and_then(Note::from_index)
    }

    /// Identifier as shown to the player, e.g. "C#4".
    pub fn name(self) -> &'static str {
        TABLE[self.0 as usize].0
    }

    /// Pitch in Hz.
    pub fn frequency(self) -> f32 {
        TABLE[self.0 as usize].1
    }

    /// Position on the keyboard (0 = C4).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the raised (black) keys.
    pub fn is_sharp(self) -> bool {
        self.name().contains('#')
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A note identifier that is not on the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNote(pub String);

impl fmt::Display for UnknownNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown note '{}' (expected C4 through E5)", self.0)
    }
}

impl std::error::Error for UnknownNote {}

impl FromStr for Note {
    type Err = UnknownNote;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::from_name(s).ok_or_else(|| UnknownNote(s.to_string()))
    }
}

impl TryFrom<String> for Note {
    type Error = UnknownNote;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.name().to_string()
    }
}
