/*
Melody Patterns
===============

A mood names a pattern tag; the tag picks how a melody is walked out of the
mood's scale. Some patterns are fixed shapes, some roll dice for every step.
Whatever the rule, every index is clamped into the scale, so a short scale
only ever repeats its top note instead of reading past the end.

  Pattern      Steps  Rule (i = step, len = scale length)
  ─────────────────────────────────────────────────────────────────────
  ascending      8    scale[min(i, len-1)]                 i = 0..7
  descending     8    scale[min(i, len-1)]                 i = 7..0
  playful        8    i + random offset in -2..=2, clamped
  cascading      8    uniformly random index
  chaotic        8    uniformly random index
  jumping        8    uniformly random index
  gentle         8    random walk of ±1 starting from the middle
  flowing        8    same walk as gentle
  heroic         9    degrees 0 2 4 7 9 7 4 2 0 (9 → 7 if the scale is shorter)
  sparse         4    scale[i*2]
  (anything else) 8   uniformly random index

The walk for gentle/flowing takes its step before emitting, so the first
note is already one step away from the middle of the scale.
*/

use rand::Rng;

use crate::keyboard::Note;

const STEPS: usize = 8;

/// How a melody is generated from a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MelodyPattern {
    Ascending,
    Descending,
    Playful,
    Cascading,
    Chaotic,
    Jumping,
    Gentle,
    Flowing,
    Heroic,
    Sparse,
    /// Fallback for unrecognized tags
    Random,
}

impl MelodyPattern {
    /// Look up a pattern by tag. Unknown tags fall back to `Random`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ascending" => Self::Ascending,
            "descending" => Self::Descending,
            "playful" => Self::Playful,
            "cascading" => Self::Cascading,
            "chaotic" => Self::Chaotic,
            "jumping" => Self::Jumping,
            "gentle" => Self::Gentle,
            "flowing" => Self::Flowing,
            "heroic" => Self::Heroic,
            "sparse" => Self::Sparse,
            _ => Self::Random,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
            Self::Playful => "playful",
            Self::Cascading => "cascading",
            Self::Chaotic => "chaotic",
            Self::Jumping => "jumping",
            Self::Gentle => "gentle",
            Self::Flowing => "flowing",
            Self::Heroic => "heroic",
            Self::Sparse => "sparse",
            Self::Random => "random",
        }
    }

    /// Generate a melody from `scale`. An empty scale gives an empty melody.
    pub fn generate<R: Rng + ?Sized>(self, scale: &[Note], rng: &mut R) -> Vec<Note> {
        if scale.is_empty() {
            return Vec::new();
        }

        let last = scale.len() - 1;
        let at = |index: usize| scale[index.min(last)];
        let at_signed = |index: i64| scale[index.clamp(0, last as i64) as usize];

        match self {
            Self::Ascending => (0..STEPS).map(at).collect(),
            Self::Descending => (0..STEPS).rev().map(at).collect(),
            Self::Playful => (0..STEPS)
                .map(|i| at_signed(i as i64 + rng.random_range(-2..=2i64)))
                .collect(),
            Self::Cascading | Self::Chaotic | Self::Jumping | Self::Random => (0..STEPS)
                .map(|_| scale[rng.random_range(0..scale.len())])
                .collect(),
            Self::Gentle | Self::Flowing => {
                let mut index = (scale.len() / 2) as i64;
                (0..STEPS)
                    .map(|_| {
                        index += if rng.random_bool(0.5) { 1 } else { -1 };
                        index = index.clamp(0, last as i64);
                        scale[index as usize]
                    })
                    .collect()
            }
            Self::Heroic => {
                let peak = if scale.len() > 9 { 9 } else { 7 };
                [0, 2, 4, 7, peak, 7, 4, 2, 0].into_iter().map(at).collect()
            }
            Self::Sparse => (0..4).map(|i| at(i * 2)).collect(),
        }
    }
}
