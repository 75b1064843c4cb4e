//! Mood profiles and keyword matching
//!
//! A mood is a static recipe: a scale to draw the melody from, a handful of
//! chords to color it, a rhythm cycle (ms per note), a pattern tag and a list
//! of keywords. Free text is matched against the keywords to pick a mood.
//!
//! Matching is case-insensitive substring search. Each keyword counts once per
//! text, however many times it appears. The highest score wins; ties go to
//! the mood listed first. No match at all falls back to `calm`.

use crate::keyboard::notes::*;
use crate::keyboard::Note;

/// Mood used when text matches no keyword
pub const FALLBACK_MOOD: &str = "calm";

#[derive(Debug)]
pub struct MoodProfile {
    /// Lookup key, lowercase
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    pub scale: &'static [Note],
    pub chords: &'static [&'static [Note]],
    /// Note durations in ms, cycled
    pub rhythm: &'static [u32],
    /// Melody pattern tag
    pub pattern: &'static str,
    /// Base step in ms, used when `rhythm` is empty
    pub tempo_ms: u32,
    pub keywords: &'static [&'static str],
}

impl MoodProfile {
    /// Length of rhythm step `cursor` in ms, wrapping around the cycle.
    pub fn step_ms(&self, cursor: usize) -> u32 {
        if self.rhythm.is_empty() {
            return self.tempo_ms;
        }
        self.rhythm[cursor % self.rhythm.len()]
    }

    /// Number of distinct keywords found in `text` (already lowercased).
    fn score(&self, text: &str) -> usize {
        self.keywords.iter().filter(|k| text.contains(*k)).count()
    }
}

static MOODS: [MoodProfile; 10] = [
    MoodProfile {
        key: "joy",
        name: "Joyful",
        scale: &[C4, D4, E4, F4, G4, A4, B4, C5],
        chords: &[&[C4, E4, G4], &[F4, A4, C5], &[G4, B4, D5], &[A4, C5, E5]],
        rhythm: &[300, 300, 600, 300, 300, 600],
        pattern: "playful",
        tempo_ms: 300,
        keywords: &["happy", "joy", "cheer", "glad", "smile", "fun", "delight", "celebrat", "sunny"],
    },
    MoodProfile {
        key: "sad",
        name: "Melancholy",
        scale: &[D4, E4, F4, G4, A4, As4, C5, D5],
        chords: &[&[D4, F4, A4], &[As4, D5], &[G4, As4, D5], &[A4, Cs5, E5]],
        rhythm: &[800, 400, 800, 1200],
        pattern: "descending",
        tempo_ms: 800,
        keywords: &["sad", "lonely", "melanchol", "tear", "cry", "grief", "sorrow", "miss", "blue"],
    },
    MoodProfile {
        key: "calm",
        name: "Calm",
        scale: &[C4, D4, E4, G4, A4, C5, D5, E5],
        chords: &[&[C4, G4, C5], &[A4, C5, E5], &[D4, G4, A4]],
        rhythm: &[600, 600, 900],
        pattern: "gentle",
        tempo_ms: 600,
        keywords: &["calm", "peace", "relax", "quiet", "serene", "gentle", "still", "breathe", "soft"],
    },
    MoodProfile {
        key: "epic",
        name: "Epic",
        scale: &[C4, D4, E4, F4, G4, A4, B4, C5, D5, E5],
        chords: &[&[C4, E4, G4], &[G4, B4, D5], &[A4, C5, E5], &[F4, A4, C5]],
        rhythm: &[400, 400, 400, 800, 1200],
        pattern: "heroic",
        tempo_ms: 400,
        keywords: &["epic", "hero", "battle", "victory", "brave", "adventure", "glory", "triumph", "legend"],
    },
    MoodProfile {
        key: "mystery",
        name: "Mysterious",
        scale: &[C4, Cs4, E4, F4, G4, Gs4, As4, C5],
        chords: &[&[C4, Ds4, Fs4], &[Cs4, F4, Gs4], &[E4, G4, As4]],
        rhythm: &[900, 600, 1200],
        pattern: "sparse",
        tempo_ms: 900,
        keywords: &["myster", "dark", "secret", "shadow", "strange", "night", "unknown", "hidden", "eerie"],
    },
    MoodProfile {
        key: "rain",
        name: "Rainy Day",
        scale: &[E5, D5, C5, A4, G4, E4, D4, C4],
        chords: &[&[A4, C5, E5], &[F4, A4, C5], &[C4, E4, G4]],
        rhythm: &[200, 200, 400, 200, 600],
        pattern: "cascading",
        tempo_ms: 250,
        keywords: &["rain", "drizzle", "drop", "wet", "umbrella", "puddle", "grey", "cloud"],
    },
    MoodProfile {
        key: "storm",
        name: "Stormy",
        scale: &[C4, Cs4, Ds4, Fs4, G4, A4, As4, C5],
        chords: &[&[C4, Ds4, Fs4], &[Cs4, E4, G4], &[Fs4, A4, C5]],
        rhythm: &[150, 150, 300, 150, 450],
        pattern: "chaotic",
        tempo_ms: 150,
        keywords: &["storm", "thunder", "lightning", "wind", "chaos", "angry", "rage", "fury", "wild"],
    },
    MoodProfile {
        key: "dreamy",
        name: "Dreamy",
        scale: &[C4, E4, G4, A4, B4, D5, E5],
        chords: &[&[C4, E4, G4, B4], &[A4, C5, E5], &[F4, A4, C5, E5]],
        rhythm: &[700, 500, 900],
        pattern: "flowing",
        tempo_ms: 700,
        keywords: &["dream", "float", "sleep", "magic", "wonder", "star", "fantasy", "drift"],
    },
    MoodProfile {
        key: "energetic",
        name: "Energetic",
        scale: &[E4, Fs4, Gs4, A4, B4, Cs5, D5, E5],
        chords: &[&[E4, Gs4, B4], &[A4, Cs5, E5], &[B4, Ds5]],
        rhythm: &[150, 150, 150, 300],
        pattern: "jumping",
        tempo_ms: 150,
        keywords: &["energ", "dance", "party", "excit", "fast", "jump", "power", "hype", "run"],
    },
    MoodProfile {
        key: "hopeful",
        name: "Hopeful",
        scale: &[C4, D4, E4, G4, A4, B4, C5, D5, E5],
        chords: &[&[C4, E4, G4], &[G4, B4, D5], &[A4, C5, E5], &[F4, A4, C5]],
        rhythm: &[500, 500, 500, 1000],
        pattern: "ascending",
        tempo_ms: 500,
        keywords: &["hope", "dawn", "morning", "rise", "bright", "new day", "tomorrow", "better"],
    },
];

/// Every mood, in matching and menu order.
pub fn moods() -> &'static [MoodProfile] {
    &MOODS
}

/// Look up a mood by key, ignoring case.
pub fn find_mood(key: &str) -> Option<&'static MoodProfile> {
    let key = key.trim();
    MOODS.iter().find(|m| m.key.eq_ignore_ascii_case(key))
}

/// Pick the mood whose keywords best match `text`.
pub fn analyze_mood(text: &str) -> &'static MoodProfile {
    let text = text.to_lowercase();

    let mut best: Option<(&'static MoodProfile, usize)> = None;
    for mood in &MOODS {
        let score = mood.score(&text);
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((mood, score));
        }
    }

    match best {
        Some((mood, _)) => mood,
        None => fallback(),
    }
}

fn fallback() -> &'static MoodProfile {
    MOODS
        .iter()
        .find(|m| m.key == FALLBACK_MOOD)
        .unwrap_or(&MOODS[0])
}
